use tokenwire::adapters::ReqwestHttpClient;
use tokenwire::cli::{
    exit_code, handle_version_command, parse_args, verbosity_filter, CliCommand, StreamArgs,
    TerminalSink, USAGE,
};
use tokenwire::config::{StreamConfig, TokenParseFailure};
use tokenwire::stream::StreamController;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber. `RUST_LOG` wins over `-v` flags.
fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity_filter(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Build the session config from the environment plus CLI overrides.
fn build_config(args: &StreamArgs) -> Result<StreamConfig> {
    let mut config = StreamConfig::from_env().wrap_err("Invalid TOKENWIRE_* configuration")?;
    if args.strict {
        config.decoder = config
            .decoder
            .with_token_parse_failure(TokenParseFailure::Terminate);
    }
    if args.no_inference {
        config.decoder = config.decoder.with_infer_event_name(false);
    }
    Ok(config)
}

async fn run(args: StreamArgs) -> Result<i32> {
    let payload: Value =
        serde_json::from_str(&args.payload).wrap_err("--payload is not valid JSON")?;
    let config = build_config(&args)?;

    let client = match config.connect_timeout {
        Some(timeout) => ReqwestHttpClient::with_connect_timeout(timeout)?,
        None => ReqwestHttpClient::new(),
    };

    let shutdown = CancellationToken::new();
    let handler_token = shutdown.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .wrap_err("Failed to install Ctrl+C handler")?;

    let controller = StreamController::new(client, TerminalSink::stdio(), config);
    controller.start(args.url, payload).await;

    let outcome = tokio::select! {
        outcome = controller.wait() => outcome,
        _ = shutdown.cancelled() => {
            tracing::info!("Interrupted, stopping stream");
            controller.stop().await;
            controller.wait().await
        }
    };

    Ok(exit_code(outcome.as_ref()))
}

fn main() -> Result<()> {
    // Handle flags that need no runtime before any initialization
    let args = match parse_args(std::env::args()) {
        CliCommand::Version => handle_version_command(),
        CliCommand::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        CliCommand::Invalid(message) => {
            eprintln!("error: {}\n\n{}", message, USAGE);
            std::process::exit(2);
        }
        CliCommand::Stream(args) => args,
    };

    color_eyre::install()?;
    init_tracing(args.verbosity);

    let runtime = tokio::runtime::Runtime::new()?;
    let code = runtime.block_on(run(args))?;
    drop(runtime);

    std::process::exit(code);
}
