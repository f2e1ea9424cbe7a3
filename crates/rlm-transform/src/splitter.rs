//! Incremental JSON array splitter
//!
//! Feeds on arbitrary byte chunks and hands back the raw bytes of each
//! top-level array element as soon as its last byte arrives. Only the
//! element currently being read is buffered, so the array as a whole never
//! has to fit in memory.
//!
//! The splitter tracks brackets and string literals only. Elements are
//! checked for well-formedness by the caller when they are parsed.

use crate::error::IngestError;

/// Raw bytes of one array element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawElement {
    /// Byte offset of the element's first byte in the input
    pub offset: u64,
    /// Element bytes, without surrounding whitespace or separators
    pub bytes: Vec<u8>,
    /// Deepest container nesting inside the element (0 for scalars)
    pub depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    BeforeArray,
    ExpectValueOrEnd,
    ExpectValue,
    InValue(ValueKind),
    AfterValue,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Container,
    String,
    Scalar,
}

/// Byte-level state machine over one JSON array document
#[derive(Debug)]
pub struct ArraySplitter {
    state: State,
    depth: usize,
    peak: usize,
    in_string: bool,
    escaped: bool,
    current: Vec<u8>,
    start: u64,
    offset: u64,
}

impl ArraySplitter {
    /// Create splitter positioned before the opening bracket
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::BeforeArray,
            depth: 0,
            peak: 0,
            in_string: false,
            escaped: false,
            current: Vec::new(),
            start: 0,
            offset: 0,
        }
    }

    /// Whether the closing bracket has been seen
    #[inline]
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Consume a chunk and return every element it completed
    ///
    /// # Errors
    /// - `IngestError::NotAnArray` if the document does not start with `[`
    /// - `IngestError::Syntax` for misplaced separators
    /// - `IngestError::TrailingData` for content after the closing `]`
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<RawElement>, IngestError> {
        let mut completed = Vec::new();
        for &byte in chunk {
            if let Some(element) = self.step(byte)? {
                completed.push(element);
            }
            self.offset += 1;
        }
        Ok(completed)
    }

    /// Signal end of input
    ///
    /// # Errors
    /// Returns `IngestError::UnexpectedEof` unless the array was closed
    pub fn finish(&self) -> Result<(), IngestError> {
        if self.is_done() {
            Ok(())
        } else {
            Err(IngestError::UnexpectedEof {
                offset: self.offset,
            })
        }
    }

    fn step(&mut self, byte: u8) -> Result<Option<RawElement>, IngestError> {
        match self.state {
            State::BeforeArray => match byte {
                b if is_whitespace(b) => {}
                // UTF-8 byte order mark
                0xEF | 0xBB | 0xBF if self.offset < 3 => {}
                b'[' => self.state = State::ExpectValueOrEnd,
                other => {
                    return Err(IngestError::NotAnArray {
                        offset: self.offset,
                        found: char::from(other),
                    })
                }
            },
            State::ExpectValueOrEnd | State::ExpectValue => match byte {
                b if is_whitespace(b) => {}
                b']' if self.state == State::ExpectValueOrEnd => self.state = State::Done,
                b']' | b',' => {
                    return Err(IngestError::syntax(
                        self.offset,
                        format!("expected value, found '{}'", char::from(byte)),
                    ))
                }
                _ => self.begin_value(byte),
            },
            State::InValue(kind) => return Ok(self.continue_value(kind, byte)),
            State::AfterValue => match byte {
                b if is_whitespace(b) => {}
                b',' => self.state = State::ExpectValue,
                b']' => self.state = State::Done,
                other => {
                    return Err(IngestError::syntax(
                        self.offset,
                        format!("expected ',' or ']', found '{}'", char::from(other)),
                    ))
                }
            },
            State::Done => {
                if !is_whitespace(byte) {
                    return Err(IngestError::TrailingData {
                        offset: self.offset,
                    });
                }
            }
        }
        Ok(None)
    }

    fn begin_value(&mut self, byte: u8) {
        self.start = self.offset;
        self.current.push(byte);
        let kind = match byte {
            b'{' | b'[' => {
                self.depth = 1;
                self.peak = 1;
                ValueKind::Container
            }
            b'"' => ValueKind::String,
            _ => ValueKind::Scalar,
        };
        self.state = State::InValue(kind);
    }

    fn continue_value(&mut self, kind: ValueKind, byte: u8) -> Option<RawElement> {
        match kind {
            ValueKind::Container => {
                self.current.push(byte);
                if self.in_string {
                    self.scan_string_byte(byte);
                    return None;
                }
                match byte {
                    b'"' => self.in_string = true,
                    b'{' | b'[' => {
                        self.depth += 1;
                        self.peak = self.peak.max(self.depth);
                    }
                    b'}' | b']' => {
                        self.depth -= 1;
                        if self.depth == 0 {
                            return Some(self.complete(State::AfterValue));
                        }
                    }
                    _ => {}
                }
                None
            }
            ValueKind::String => {
                self.current.push(byte);
                self.in_string = true;
                self.scan_string_byte(byte);
                if self.in_string {
                    None
                } else {
                    Some(self.complete(State::AfterValue))
                }
            }
            ValueKind::Scalar => match byte {
                b if is_whitespace(b) => Some(self.complete(State::AfterValue)),
                b',' => Some(self.complete(State::ExpectValue)),
                b']' => Some(self.complete(State::Done)),
                _ => {
                    self.current.push(byte);
                    None
                }
            },
        }
    }

    fn scan_string_byte(&mut self, byte: u8) {
        if self.escaped {
            self.escaped = false;
        } else if byte == b'\\' {
            self.escaped = true;
        } else if byte == b'"' {
            self.in_string = false;
        }
    }

    fn complete(&mut self, next: State) -> RawElement {
        self.state = next;
        self.depth = 0;
        self.in_string = false;
        self.escaped = false;
        RawElement {
            offset: self.start,
            bytes: std::mem::take(&mut self.current),
            depth: std::mem::take(&mut self.peak),
        }
    }
}

impl Default for ArraySplitter {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}
