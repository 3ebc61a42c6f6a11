//! Local invocation harness for the API Gateway proxy adapter.
//!
//! Reads proxy integration events as JSON (a single event or an array of
//! events), dispatches each through an echo pipeline and prints one proxy
//! response per line on stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```text
//! rustack-lambda-proxy-invoke [--pretty] [--function NAME] [EVENT_FILE | -]
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PROXY_DEFAULT_STATUS_CODE` | `200` | Status when the pipeline sets none |
//! | `PROXY_DEFAULT_RESPONSE_ENCODING` | `text` | Encoding for unknown content types (`text` or `base64`) |
//! | `PROXY_RETHROW_ERRORS` | `false` | Surface pipeline failures as a non-zero exit status |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod echo;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use hyper::service::service_fn;
use tokio::io::AsyncReadExt;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rustack_lambda_proxy::{
    DispatchError, InvocationDispatcher, LambdaContext, ProxyConfig, ServiceProcessor,
};

const USAGE: &str = "usage: rustack-lambda-proxy-invoke [--pretty] [--function NAME] [EVENT_FILE | -]";

/// Command line options.
#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    /// Event file; stdin when absent.
    input: Option<PathBuf>,
    /// Pretty-print responses.
    pretty: bool,
    /// Function name reported to the pipeline.
    function_name: String,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Options> {
    let mut options = Options {
        function_name: "local".to_owned(),
        ..Options::default()
    };
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--pretty" => options.pretty = true,
            "--function" => {
                options.function_name = args.next().context("--function requires a value")?;
            }
            "-h" | "--help" => bail!("{USAGE}"),
            "-" => options.input = None,
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
            path => options.input = Some(PathBuf::from(path)),
        }
    }
    Ok(options)
}

/// Initialize the tracing subscriber on stderr.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn log_level() -> String {
    std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned())
}

async fn read_input(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read event file {}", path.display())),
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("failed to read events from stdin")?;
            Ok(buf)
        }
    }
}

/// Split the input document into individual events.
fn events(document: serde_json::Value) -> Vec<serde_json::Value> {
    match document {
        serde_json::Value::Array(events) => events,
        event => vec![event],
    }
}

fn render(response: &serde_json::Value, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(response)
    } else {
        serde_json::to_string(response)
    };
    rendered.context("failed to render proxy response")
}

#[tokio::main]
async fn main() -> Result<()> {
    let options = parse_args(std::env::args().skip(1))?;

    init_tracing(&log_level())?;
    let config = ProxyConfig::from_env();
    info!(
        default_status_code = config.default_status_code,
        default_response_encoding = %config.default_response_encoding,
        rethrow_errors = config.rethrow_errors,
        "starting proxy invocation harness",
    );

    let input = read_input(options.input.as_ref()).await?;
    let document: serde_json::Value =
        serde_json::from_str(&input).context("input is not valid JSON")?;

    let dispatcher =
        InvocationDispatcher::new(ServiceProcessor::new(service_fn(echo::handle)), &config);

    let mut failures = 0_usize;
    for (index, event) in events(document).into_iter().enumerate() {
        let lambda = LambdaContext::local(options.function_name.as_str());
        let response = match dispatcher.dispatch_json(event, lambda).await {
            Ok(response) => response,
            Err(DispatchError::Rethrown { failure, response }) => {
                error!(index, error_type = failure.classification_name(), "{failure}");
                failures += 1;
                serde_json::to_value(&*response).context("failed to serialize proxy response")?
            }
            Err(err) => return Err(err).with_context(|| format!("event {index} failed")),
        };
        println!("{}", render(&response, options.pretty)?);
    }

    if failures > 0 {
        bail!("{failures} event(s) failed while processing");
    }
    Ok(())
}
