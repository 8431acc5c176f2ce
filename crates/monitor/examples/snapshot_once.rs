//! Example: fetch one snapshot from a node and print it, plus the guard verdict.
//!
//! Usage: cargo run -p pox-monitor --example snapshot_once -- --node-url URL [--api-url URL]

use pox_monitor::{fetch_snapshot, guard, PoxSchedule, StacksClient};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args: Vec<String> = std::env::args().collect();
    let mut node_url = String::new();
    let mut api_url = String::new();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--node-url" => {
                i += 1;
                node_url = args.get(i).cloned().unwrap_or_default();
            }
            "--api-url" => {
                i += 1;
                api_url = args.get(i).cloned().unwrap_or_default();
            }
            _ => {}
        }
        i += 1;
    }
    if node_url.is_empty() {
        eprintln!("Usage: snapshot_once --node-url URL [--api-url URL]");
        std::process::exit(1);
    }
    if api_url.is_empty() {
        api_url = node_url.clone();
    }

    let client = StacksClient::new(node_url, api_url, Duration::from_secs(10))?;
    let rt = tokio::runtime::Runtime::new()?;
    let snap = rt.block_on(fetch_snapshot(&client))?;
    println!(
        "burn={} cycle={} stx={} txs={} signers={:?} next_signers={:?}",
        snap.burn_height,
        snap.reward_cycle_id,
        snap.stx_height,
        snap.tx_count,
        snap.current_signers.as_ref().map(|s| s.len()),
        snap.next_signer_count(),
    );
    match guard::check(&snap, &PoxSchedule::default()) {
        Some(cond) => println!("{}", cond),
        None => println!("signer set ok"),
    }
    Ok(())
}
