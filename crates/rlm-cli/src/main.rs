//! `rlm-transform` batch driver
//!
//! Streams a batch file (or stdin) through the transformer and prints each
//! batch event as one JSON line. Logs go to stderr, filtered by `RUST_LOG`.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use rlm_transform::{BatchEvent, TransformConfig, Transformer};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::AsyncRead;
use tracing_subscriber::EnvFilter;

/// Exit status when the input stream was malformed
const EXIT_INGEST_FAILED: i32 = 2;

fn cli() -> Command {
    Command::new("rlm-transform")
        .version(rlm_transform::VERSION)
        .about("Apply record link migration change lists to a JSON batch")
        .long_about(
            "Reads a JSON array of {record, changes, sourceRecord?, linkData?} elements \
             and writes one JSON event per line to stdout.",
        )
        .arg(
            Arg::new("input")
                .value_parser(value_parser!(PathBuf))
                .help("Batch file to read (stdin when omitted or '-')"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("validate")
                .long("validate")
                .action(ArgAction::SetTrue)
                .overrides_with("no-validate")
                .help("Run the validation pass on final records"),
        )
        .arg(
            Arg::new("no-validate")
                .long("no-validate")
                .action(ArgAction::SetTrue)
                .help("Skip the validation pass"),
        )
        .arg(
            Arg::new("fix")
                .long("fix")
                .action(ArgAction::SetTrue)
                .overrides_with("no-fix")
                .help("Let the validation pass repair final records"),
        )
        .arg(
            Arg::new("no-fix")
                .long("no-fix")
                .action(ArgAction::SetTrue)
                .help("Never repair final records"),
        )
        .arg(
            Arg::new("max-in-flight")
                .long("max-in-flight")
                .value_parser(value_parser!(usize))
                .help("Limit concurrent conversions (unbounded by default)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .action(ArgAction::SetTrue)
                .help("Write logs to stderr as JSON"),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    if json {
        builder.json().with_current_span(true).init();
    } else {
        builder.compact().init();
    }
}

fn load_config(args: &ArgMatches) -> Result<TransformConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => TransformConfig::default(),
    };

    if args.get_flag("validate") {
        config.validate = true;
    }
    if args.get_flag("no-validate") {
        config.validate = false;
    }
    if args.get_flag("fix") {
        config.fix = true;
    }
    if args.get_flag("no-fix") {
        config.fix = false;
    }
    if let Some(max) = args.get_one::<usize>("max-in-flight") {
        config = config.with_max_in_flight(*max);
    }
    Ok(config)
}

async fn open_input(args: &ArgMatches) -> Result<Box<dyn AsyncRead + Unpin + Send>> {
    match args.get_one::<PathBuf>("input") {
        Some(path) if path.as_os_str() != "-" => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening {}", path.display()))?;
            Ok(Box::new(file))
        }
        _ => Ok(Box::new(tokio::io::stdin())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli().get_matches();
    init_tracing(args.get_flag("log-json"));

    let config = load_config(&args)?;
    tracing::debug!(?config, "configuration loaded");

    let input = open_input(&args).await?;
    let mut events = Transformer::new(config).ingest(input);

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    let mut ingest_failed = false;

    while let Some(event) = events.recv().await {
        ingest_failed |= matches!(event, BatchEvent::Error(_));
        serde_json::to_writer(&mut out, &event.to_value()).context("writing event")?;
        out.write_all(b"\n").context("writing event")?;
    }
    out.flush().context("flushing output")?;

    if ingest_failed {
        drop(out);
        std::process::exit(EXIT_INGEST_FAILED);
    }
    Ok(())
}
