//! Snapshot fetcher: reads pox info, the latest block and stacker sets from a Stacks node.
//!
//! [NodeSource] is the seam between the monitor and the network; [StacksClient] is the
//! reqwest implementation talking to the node RPC (`/v2/...`) and the Stacks API
//! (`/extended/v2/...`).

use crate::error::{MonitorError, Result};
use crate::snapshot::{SignerKey, SignerSet, Snapshot};
use async_trait::async_trait;
use futures_util::future::{join, try_join};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Subset of `GET /v2/pox`.
#[derive(Debug, Clone, Deserialize)]
pub struct PoxInfo {
    pub reward_cycle_id: u64,
    /// Missing while the node is still booting.
    #[serde(default)]
    pub current_burnchain_block_height: Option<u64>,
    #[serde(default)]
    pub first_burnchain_block_height: Option<u64>,
    #[serde(default)]
    pub reward_cycle_length: Option<u64>,
    #[serde(default)]
    pub prepare_phase_block_length: Option<u64>,
}

/// Subset of `GET /extended/v2/blocks/latest`.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    #[serde(default)]
    pub tx_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct StackerSetResponse {
    stacker_set: StackerSetBody,
}

#[derive(Debug, Clone, Deserialize)]
struct StackerSetBody {
    #[serde(default)]
    signers: Vec<StackerSetSigner>,
}

#[derive(Debug, Clone, Deserialize)]
struct StackerSetSigner {
    signer_key: SignerKey,
}

impl From<StackerSetResponse> for SignerSet {
    fn from(resp: StackerSetResponse) -> Self {
        SignerSet::new(
            resp.stacker_set
                .signers
                .into_iter()
                .map(|s| s.signer_key)
                .collect(),
        )
    }
}

/// Where node state comes from.
#[async_trait]
pub trait NodeSource: Send + Sync {
    async fn pox_info(&self) -> Result<PoxInfo>;

    async fn latest_block(&self) -> Result<BlockInfo>;

    /// Signer set for `cycle`. An error means the set is unreachable this round.
    async fn stacker_set(&self, cycle: u64) -> Result<SignerSet>;

    /// Succeeds once the node answers RPC requests.
    async fn ready(&self) -> Result<()>;
}

/// Fetch one round's [Snapshot].
///
/// Pox info and the latest block are required: either failing fails the round. The two
/// stacker-set lookups are issued together and each degrades to `None` on failure.
pub async fn fetch_snapshot<S: NodeSource + ?Sized>(source: &S) -> Result<Snapshot> {
    let (pox, block) = try_join(source.pox_info(), source.latest_block()).await?;
    let cycle = pox.reward_cycle_id;
    let next_cycle = cycle.saturating_add(1);
    let (current, next) = join(source.stacker_set(cycle), source.stacker_set(next_cycle)).await;
    let current_signers = current
        .map_err(|e| tracing::debug!(cycle, reason = %e, "stacker set unavailable"))
        .ok();
    let next_signers = next
        .map_err(|e| tracing::debug!(cycle = next_cycle, reason = %e, "stacker set unavailable"))
        .ok();
    Ok(Snapshot {
        burn_height: pox.current_burnchain_block_height.unwrap_or(0),
        reward_cycle_id: cycle,
        stx_height: block.height,
        tx_count: block.tx_count,
        current_signers,
        next_signers,
        next_cycle_id: next_cycle,
        observed_at: Instant::now(),
    })
}

/// HTTP client for a Stacks node and its API.
#[derive(Debug, Clone)]
pub struct StacksClient {
    http_client: reqwest::Client,
    node_url: String,
    api_url: String,
}

impl StacksClient {
    pub fn new(
        node_url: impl Into<String>,
        api_url: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .no_proxy()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http_client,
            node_url: trim_slash(node_url.into()),
            api_url: trim_slash(api_url.into()),
        })
    }

    pub fn node_url(&self) -> &str {
        &self.node_url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        let resp = self.http_client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(MonitorError::Status { url, status });
        }
        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| MonitorError::Decode(format!("{}: {}", url, e)))
    }
}

fn trim_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[async_trait]
impl NodeSource for StacksClient {
    async fn pox_info(&self) -> Result<PoxInfo> {
        self.get_json(format!("{}/v2/pox", self.node_url)).await
    }

    async fn latest_block(&self) -> Result<BlockInfo> {
        self.get_json(format!("{}/extended/v2/blocks/latest", self.api_url))
            .await
    }

    async fn stacker_set(&self, cycle: u64) -> Result<SignerSet> {
        let resp: StackerSetResponse = self
            .get_json(format!("{}/v2/stacker_set/{}", self.node_url, cycle))
            .await?;
        let set = SignerSet::from(resp);
        let malformed = set.malformed_keys();
        if malformed > 0 {
            tracing::warn!(cycle, malformed, "stacker set contains malformed signer keys");
        }
        Ok(set)
    }

    async fn ready(&self) -> Result<()> {
        let _: serde_json::Value = self.get_json(format!("{}/v2/info", self.node_url)).await?;
        Ok(())
    }
}
