//! asg-deregister — takes terminated autoscaling instances out of Zabbix.
//!
//! Reads one SNS event document per `--event` (or stdin), and for each one
//! disables-and-marks or deletes the Zabbix host registered for the
//! terminated instance. Prints one result line per event on stdout; logs go
//! to stderr.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use asg_core::config::load_dotenv;
use asg_core::{Config, KmsDecryptor};
use asg_handler::Handler;
use asg_zabbix::ZabbixClient;

// ── CLI ─────────────────────────────────────────────────────────────

/// Deregister terminated autoscaling instances from Zabbix.
#[derive(Parser, Debug)]
#[command(name = "asg-deregister", version, about)]
struct Cli {
    /// SNS event document to handle (repeatable, `-` for stdin).
    #[arg(long = "event", value_name = "PATH")]
    events: Vec<PathBuf>,

    /// Config profile; keys are looked up as `{PROFILE}_{KEY}` first.
    #[arg(long, env = "ASG_PROFILE")]
    profile: Option<String>,

    /// Delete hosts instead of disabling them (overrides DELETING_HOST).
    #[arg(long)]
    delete: bool,

    /// Verbose logging (overrides DEBUG).
    #[arg(long)]
    debug: bool,

    /// Print each outcome as a JSON object instead of the bare result string.
    #[arg(long)]
    json: bool,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    let cli = Cli::parse();

    // The log level depends on the profiled DEBUG key, so config comes first.
    let config = build_config(&cli)?;
    init_tracing(log_filter(&config));

    info!(profile = config.profile_label(), "Initializing environment");
    let config = decrypt_config(config).await?;
    config.log_summary();

    let sources = if cli.events.is_empty() {
        vec![PathBuf::from("-")]
    } else {
        cli.events.clone()
    };

    let failures = run(&config, &sources, cli.json).await?;
    if failures > 0 {
        anyhow::bail!("{failures} of {} invocations failed", sources.len());
    }
    Ok(())
}

/// Handle each source in turn. Returns the number of failed invocations; an
/// unreadable source counts as one and does not stop the run.
async fn run(config: &Config, sources: &[PathBuf], json: bool) -> anyhow::Result<usize> {
    let timeout = Duration::from_secs(config.request_timeout_secs);

    let mut failures = 0usize;
    for source in sources {
        let raw = match read_event(source) {
            Ok(raw) => raw,
            Err(e) => {
                error!(source = %source.display(), error = %format!("{e:#}"), "Invocation failed");
                failures += 1;
                continue;
            }
        };

        // A fresh client per event: one login per invocation.
        let client = ZabbixClient::new(&config.zabbix_url, timeout)?;
        let handler = Handler::new(config, &client);

        match handler.handle_json(&raw).await {
            Ok(outcome) => {
                if json {
                    println!("{}", serde_json::to_string(&outcome)?);
                } else {
                    println!("{outcome}");
                }
            }
            Err(e) => {
                error!(source = %source.display(), error = %e, "Invocation failed");
                failures += 1;
            }
        }
    }
    Ok(failures)
}

/// `debug` when the config asks for it, else `RUST_LOG` or `info`.
fn log_filter(config: &Config) -> EnvFilter {
    if config.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn init_tracing(filter: EnvFilter) {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.profile {
        Some(profile) => Config::for_profile(profile)?,
        None => Config::from_env()?,
    };
    if cli.delete {
        config.delete_mode = true;
    }
    if cli.debug {
        config.debug = true;
    }
    Ok(config)
}

async fn decrypt_config(config: Config) -> anyhow::Result<Config> {
    if !config.credentials_encrypted {
        return Ok(config);
    }
    let kms = KmsDecryptor::new(&config.aws_region).await;
    config
        .decrypt_credentials(&kms)
        .await
        .context("cannot decrypt zabbix credentials")
}

fn read_event(source: &Path) -> anyhow::Result<String> {
    if source == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("cannot read SNS event from stdin")?;
        return Ok(raw);
    }
    std::fs::read_to_string(source)
        .with_context(|| format!("cannot read SNS event from {}", source.display()))
}
