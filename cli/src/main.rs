//! nodefwd CLI — probe and submit against a set of node endpoints.
//!
//! Usage:
//! ```bash
//! # Liveness probe across the pool
//! nodefwd health --url ws://node-a:8455,ws://node-b:8455
//!
//! # Current chain height
//! nodefwd height --url ws://node-a:8455
//!
//! # Submit a signed transaction
//! nodefwd submit --url ws://node-a:8455 --tx a1b2c3 --mode await-ack
//! ```

use std::env;
use std::process;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use nodefwd_core::{Forwarder, ForwarderConfig, ForwardError, RetryConfig, StatusInfo, SubmitMode};
use nodefwd_ws::WsConnector;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "health" => cmd_health(&args[2..]).await,
        "height" => cmd_height(&args[2..]).await,
        "submit" => cmd_submit(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("nodefwd {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", render_error(&e));
        process::exit(1);
    }
}

fn print_usage() {
    println!("nodefwd {}", env!("CARGO_PKG_VERSION"));
    println!("Route health probes, height queries and transaction submissions");
    println!("across a pool of equivalent node endpoints\n");
    println!("USAGE:");
    println!("    nodefwd <COMMAND>\n");
    println!("COMMANDS:");
    println!("    health     Probe the endpoint pool");
    println!("    height     Query the current chain height");
    println!("    submit     Submit a signed transaction payload");
    println!("    version    Print version");
    println!("    help       Print this help\n");
    println!("SHARED FLAGS:");
    println!("    --url <u1,u2,..>   Endpoint addresses  [required]");
    println!("    --retries <n>      Retry budget per operation  [default: 3]\n");
    println!("SUBMIT FLAGS:");
    println!("    --tx <hex>         Signed transaction payload  [required]");
    println!("    --mode <tag>       fire-and-forget | await-ack | await-inclusion");
    println!("                       [default: await-ack]");
}

/// Structured status when the failure carries one, opaque error otherwise.
fn render_error(e: &anyhow::Error) -> String {
    if let Some(fwd) = e.downcast_ref::<ForwardError>() {
        if let Some(status) = StatusInfo::from_error(fwd) {
            return status.to_string();
        }
    }
    e.to_string()
}

async fn connect(args: &[String]) -> Result<Forwarder> {
    let urls: Vec<String> = parse_flag(args, "--url")
        .ok_or_else(|| anyhow!("--url is required"))?
        .split(',')
        .map(str::to_owned)
        .collect();

    let max_retries = match parse_flag(args, "--retries") {
        Some(n) => n.parse::<u32>().context("--retries must be a number")?,
        None => 3,
    };

    let config = ForwarderConfig {
        retry: RetryConfig {
            max_retries,
            ..Default::default()
        },
        request_timeout: Duration::from_secs(30),
    };

    let fwd = Forwarder::connect(&urls, &WsConnector::new(), config).await?;
    Ok(fwd)
}

async fn cmd_health(args: &[String]) -> Result<()> {
    let fwd = connect(args).await?;
    let outcome = fwd.health_check().await;
    let closed = fwd.shutdown().await;
    outcome?;
    closed?;
    println!("Status: OK");
    Ok(())
}

async fn cmd_height(args: &[String]) -> Result<()> {
    let fwd = connect(args).await?;
    let outcome = fwd.last_block_height().await;
    let closed = fwd.shutdown().await;
    println!("Height: {}", outcome?);
    closed?;
    Ok(())
}

async fn cmd_submit(args: &[String]) -> Result<()> {
    let tx_hex = parse_flag(args, "--tx").ok_or_else(|| anyhow!("--tx is required"))?;
    let payload = hex::decode(tx_hex.trim_start_matches("0x"))
        .context("--tx must be a hex-encoded payload")?;
    let mode = match parse_flag(args, "--mode").as_deref() {
        None | Some("await-ack") => SubmitMode::AwaitAck,
        Some("fire-and-forget") => SubmitMode::FireAndForget,
        Some("await-inclusion") => SubmitMode::AwaitInclusion,
        Some(other) => return Err(anyhow!("unknown submission mode: {other}")),
    };

    let fwd = connect(args).await?;
    let outcome = fwd.submit_transaction(&payload, mode).await;
    let closed = fwd.shutdown().await;
    outcome?;
    closed?;
    println!("Submitted ({mode})");
    Ok(())
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}
