//! Fan-out hub server
//!
//! Run with: cargo run --bin fanout-server -- [OPTIONS]
//!
//! Examples:
//!   fanout-server                              # binds to [::]:8080
//!   fanout-server --bind localhost:9000        # binds to 127.0.0.1:9000
//!   fanout-server --root ./public --path /ws   # serve ./public, upgrade on /ws
//!
//! Connect with any WebSocket client, e.g.:
//!   websocat ws://localhost:8080/echo

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use fanout_rs::hub::config::{DEFAULT_INTAKE_CAPACITY, DEFAULT_OUTBOUND_CAPACITY};
use fanout_rs::server::config::DEFAULT_PORT;
use fanout_rs::{HubConfig, HubServer, ServerConfig};

#[derive(Debug, Parser)]
#[command(name = "fanout-server", version, about = "WebSocket fan-out hub")]
struct Args {
    /// Address to bind to (IP:PORT, IP, or localhost[:PORT])
    #[arg(long, default_value = "[::]:8080", value_parser = parse_bind_addr)]
    bind: SocketAddr,

    /// Directory to serve static files from
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// WebSocket endpoint path
    #[arg(long, default_value = "/echo")]
    path: String,

    /// Seconds between heartbeat pings
    #[arg(long, default_value_t = 5)]
    heartbeat_secs: u64,

    /// Outbound messages queued per client before it is dropped as too slow
    #[arg(long, default_value_t = DEFAULT_OUTBOUND_CAPACITY)]
    outbound_capacity: usize,

    /// Commands queued for the hub before submitters wait
    #[arg(long, default_value_t = DEFAULT_INTAKE_CAPACITY)]
    intake_capacity: usize,
}

/// Parse a bind address
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:8080
/// - "localhost:9000" -> 127.0.0.1:9000
/// - "127.0.0.1" -> 127.0.0.1:8080
/// - "[::]:8080" -> [::]:8080
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!("invalid bind address '{arg}', expected IP:PORT, IP or localhost"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fanout_rs=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    let hub = HubConfig::default()
        .heartbeat_interval(Duration::from_secs(args.heartbeat_secs.max(1)))
        .outbound_capacity(args.outbound_capacity)
        .intake_capacity(args.intake_capacity);

    let config = ServerConfig::default()
        .bind(args.bind)
        .ws_path(args.path)
        .static_root(args.root)
        .hub(hub);

    let server = HubServer::new(config);
    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
