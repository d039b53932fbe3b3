mod commands;
mod invocation;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, FromArgMatches, Parser};
use commands::{Command, CommandContext};
use invocation::{InvocationContext, API_KEY, CONFIG, OUTPUT_FORMAT, PRETTY, VERBOSE};
use lamp_api::error::ApiError;
use lamp_api::retry::RetryConfig;
use lamp_api::{ApiClient, HttpSettings, ProxySettings};
use lamp_config::{Configuration, Overrides};
use lamp_output::{OutputFormat, OutputRenderer};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "lamp", version, about = "Command line interface for OpsGenie", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let matches = Cli::command().args(invocation::global_args()).get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };
    let invocation = InvocationContext::from_matches(&matches);

    match run(cli.command, &invocation).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, invocation: &InvocationContext) -> Result<()> {
    let overrides = Overrides {
        api_key: invocation.get_val(API_KEY).map(str::to_string),
        config_path: invocation.get_val(CONFIG).map(PathBuf::from),
    };
    let config = Configuration::load(&overrides)?;
    init_tracing(invocation.is_set(VERBOSE), &config)?;

    let client = build_client(&config)?;
    let renderer = OutputRenderer::new(
        OutputFormat::from_flag(invocation.get_val(OUTPUT_FORMAT).unwrap_or("json")),
        invocation.is_set(PRETTY),
    );
    let ctx = CommandContext {
        client: &client,
        renderer: &renderer,
        invocation,
    };

    commands::execute(command, &ctx).await
}

fn build_client(config: &Configuration) -> Result<ApiClient> {
    let settings = HttpSettings {
        connect_timeout: config.connection_timeout,
        request_timeout: config.request_timeout,
        proxy: config.proxy.as_ref().map(|proxy| ProxySettings {
            host: proxy.host.clone(),
            port: proxy.port,
            username: proxy.username.clone(),
            password: proxy.password.clone(),
            tls: proxy.tls,
        }),
        retry: RetryConfig::with_attempts(config.retry_count.saturating_add(1)),
        ..HttpSettings::default()
    };

    let client = ApiClient::with_settings(&config.api_url, &settings)
        .with_context(|| format!("Failed to create API client for {}", config.api_url))?;
    Ok(client.with_genie_key(config.api_key.clone()))
}

/// `RUST_LOG` wins, then `-v`, then the configured log level. Logs go to
/// stderr unless a log file is configured.
fn init_tracing(verbose: bool, config: &Configuration) -> Result<()> {
    let default = if verbose {
        "warn,lamp=debug,lamp_api=debug,lamp_config=debug"
    } else {
        config.log_level.as_str()
    };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default)
            .with_context(|| format!("Invalid log level '{default}'"))?,
    };

    let builder = fmt().with_env_filter(filter).with_target(false);
    let result = match &config.log_path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    result.map_err(|err| anyhow!("failed to initialize logger: {err}"))
}

fn report(err: &anyhow::Error) {
    eprintln!("Error: {err:#}");
    if let Some(hint) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ApiError>())
        .and_then(ApiError::suggestion)
    {
        eprintln!("Hint: {hint}");
    }
}
