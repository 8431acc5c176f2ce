//! Common helpers for integration tests: an in-process fake Stacks node.
#![allow(dead_code)]

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Chain state served by [FakeNode]. Edit through [FakeNode::update].
#[derive(Debug, Clone, Default)]
pub struct ChainState {
    pub burn_height: u64,
    pub reward_cycle_id: u64,
    pub stx_height: u64,
    pub tx_count: u64,
    /// Signer keys per cycle; a missing cycle answers 404.
    pub stacker_sets: HashMap<u64, Vec<String>>,
    /// While true, every endpoint answers 503.
    pub down: bool,
}

/// Fake node serving `/v2/info`, `/v2/pox`, `/v2/stacker_set/{cycle}` and
/// `/extended/v2/blocks/latest` on 127.0.0.1 with a dynamic port.
pub struct FakeNode {
    pub url: String,
    state: Arc<Mutex<ChainState>>,
    task: JoinHandle<()>,
}

impl FakeNode {
    pub async fn spawn(initial: ChainState) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await.context("bind fake node")?;
        let url = format!("http://{}", listener.local_addr()?);
        let state = Arc::new(Mutex::new(initial));
        let shared = Arc::clone(&state);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let shared = Arc::clone(&shared);
                tokio::spawn(async move {
                    let _ = serve(stream, shared).await;
                });
            }
        });
        Ok(Self { url, state, task })
    }

    pub fn update(&self, f: impl FnOnce(&mut ChainState)) {
        let mut guard = self.state.lock().unwrap();
        f(&mut *guard);
    }
}

impl Drop for FakeNode {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn signer_keys(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("0x02{:064x}", i)).collect()
}

async fn serve(mut stream: TcpStream, state: Arc<Mutex<ChainState>>) -> Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let request = String::from_utf8_lossy(&buf);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let (status, body) = route(&path, &state.lock().unwrap());
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        _ => "Service Unavailable",
    };
    let body = body.to_string();
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

fn route(path: &str, state: &ChainState) -> (u16, Value) {
    if state.down {
        return (503, json!({ "error": "node unavailable" }));
    }
    match path {
        "/v2/info" => (200, json!({ "burn_block_height": state.burn_height })),
        "/v2/pox" => (
            200,
            json!({
                "reward_cycle_id": state.reward_cycle_id,
                "current_burnchain_block_height": state.burn_height,
                "first_burnchain_block_height": 0,
                "reward_cycle_length": 20,
                "prepare_phase_block_length": 5,
            }),
        ),
        "/extended/v2/blocks/latest" => (
            200,
            json!({ "height": state.stx_height, "tx_count": state.tx_count }),
        ),
        _ => match path
            .strip_prefix("/v2/stacker_set/")
            .and_then(|c| c.parse::<u64>().ok())
            .and_then(|c| state.stacker_sets.get(&c))
        {
            Some(keys) => {
                let signers: Vec<Value> = keys
                    .iter()
                    .map(|k| json!({ "signer_key": k, "weight": 1, "stacked_amt": 1000 }))
                    .collect();
                (200, json!({ "stacker_set": { "rewarded_addresses": [], "signers": signers } }))
            }
            None => (404, json!({ "err_msg": "not found" })),
        },
    }
}

/// Poll `url` until it answers with a success status.
pub async fn wait_for_http(url: &str) -> Result<()> {
    let client = reqwest::Client::builder().no_proxy().build()?;
    for _ in 0..30 {
        if let Ok(resp) = client.get(url).send().await {
            if resp.status().is_success() {
                return Ok(());
            }
        }
        sleep(Duration::from_millis(100)).await;
    }
    anyhow::bail!("fake node not ready");
}
