//! network-test probes which WebRTC transports work from this network.
//!
//! It loads a STUN/TURN server list issued by a credential service, runs one
//! connectivity probe per connection mode at the same time, and prints the
//! per-mode results as JSON once every probe finished. Ctrl-C stops the
//! probes still running; they are reported as `stopped`.
//!
//! ```text
//! cargo run --example network-test -- --server-list https://example.com/ice-servers.json
//! cargo run --example network-test -- --provider xirsys --server-list servers.json \
//!     --mode stun --mode turn-tls
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use env_logger::Target;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use netprobe::mode::ConnectionMode;
use netprobe::peer::webrtc::WebrtcConnector;
use netprobe::probe::ProbeConfigBuilder;
use netprobe::server::{NatServiceProvider, ServerListInput};
use netprobe::suite::run_suite;

#[derive(Parser)]
#[command(name = "network-test")]
#[command(author = "Rain Liu <yliu@webrtc.rs>")]
#[command(version = "0.1.0")]
#[command(about = "Probes STUN and TURN connectivity from this network.", long_about = None)]
struct Cli {
    #[arg(short, long)]
    debug: bool,
    #[arg(short, long, default_value_t = format!("INFO"))]
    log_level: String,
    #[arg(short, long, default_value_t = format!(""))]
    output_log_file: String,

    /// Credential service that issued the server list: twilio or xirsys.
    #[arg(short, long, default_value_t = format!("twilio"))]
    provider: String,
    /// HTTP(S) URL or local path of the server list JSON.
    #[arg(short, long)]
    server_list: String,
    /// Connection mode to probe; repeat for several. Probes every mode if omitted.
    #[arg(short, long)]
    mode: Vec<String>,
    #[arg(long, default_value_t = 15000)]
    deadline_ms: u64,
    #[arg(long, default_value_t = 7500)]
    flush_ms: u64,
    /// Also gather candidates on loopback interfaces.
    #[arg(long)]
    loopback: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output_log_file = cli.output_log_file;
    let log_level = log::LevelFilter::from_str(&cli.log_level)?;

    if cli.debug {
        env_logger::Builder::new()
            .target(if !output_log_file.is_empty() {
                Target::Pipe(Box::new(
                    OpenOptions::new()
                        .create(true)
                        .write(true)
                        .truncate(true)
                        .open(output_log_file)?,
                ))
            } else {
                Target::Stderr
            })
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{}:{} [{}] {} - {}",
                    record.file().unwrap_or("unknown"),
                    record.line().unwrap_or(0),
                    record.level(),
                    chrono::Local::now().format("%H:%M:%S.%6f"),
                    record.args()
                )
            })
            .filter(None, log_level)
            .init();
    }

    let provider = NatServiceProvider::from_str(&cli.provider)?;
    let modes = parse_modes(&cli.mode)?;
    let servers = load_server_list(provider, &cli.server_list).await?;

    let config = ProbeConfigBuilder::new()
        .with_deadline(Duration::from_millis(cli.deadline_ms))
        .with_flush_delay(Duration::from_millis(cli.flush_ms))
        .build();
    let connector = Arc::new(WebrtcConnector::new().with_loopback_candidates(cli.loopback));

    let stop = CancellationToken::new();
    let ctrl_c_stop = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("ctrl-c received, stopping running probes");
            ctrl_c_stop.cancel();
        }
    });

    eprintln!(
        "Probing {} mode(s), this takes up to {:?}. Press ctrl-c to stop",
        modes.len(),
        config.deadline()
    );
    let report = run_suite(connector, &modes, &servers, config, stop).await?;

    for (mode, entry) in report.iter() {
        match (&entry.result, &entry.error) {
            (Some(status), _) => {
                info!("{mode}: {status} ({} local candidates)", entry.ice_candidates.len())
            }
            (None, Some(err)) => warn!("{mode}: {err}"),
            (None, None) => {}
        }
    }
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn parse_modes(raw: &[String]) -> Result<Vec<ConnectionMode>> {
    if raw.is_empty() {
        return Ok(ConnectionMode::ALL.to_vec());
    }
    raw.iter()
        .map(|mode| match ConnectionMode::from(mode.as_str()) {
            ConnectionMode::Unspecified => bail!("unknown connection mode {mode}"),
            parsed => Ok(parsed),
        })
        .collect()
}

async fn load_server_list(provider: NatServiceProvider, source: &str) -> Result<ServerListInput> {
    let remote = source.starts_with("http://") || source.starts_with("https://");
    let value: serde_json::Value = if remote {
        info!("fetching {provider} server list from {source}");
        reqwest::get(source)
            .await
            .with_context(|| format!("fetching {source}"))?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("decoding {source}"))?
    } else {
        let raw = tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("reading {source}"))?;
        serde_json::from_str(&raw).with_context(|| format!("decoding {source}"))?
    };

    Ok(ServerListInput::from_value(provider, value)?)
}
