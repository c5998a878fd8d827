use crate::constants::CHAIN_PATH;
use async_trait::async_trait;
use ledger_core::{ChainSnapshot, ChainSource, LedgerError, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Fetches `GET http://{peer}/chain` from other nodes.
#[derive(Clone, Debug)]
pub struct HttpChainSource {
    http: Client,
}

impl HttpChainSource {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl ChainSource for HttpChainSource {
    async fn fetch_chain(&self, peer: &str) -> Result<ChainSnapshot> {
        let url = format!("http://{peer}{CHAIN_PATH}");
        debug!(%url, "fetching peer chain");
        let unreachable = |e: reqwest::Error| LedgerError::PeerUnreachable {
            peer: peer.to_string(),
            reason: e.to_string(),
        };
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(unreachable)?;
        resp.json::<ChainSnapshot>()
            .await
            .map_err(|e| LedgerError::PeerInvalidResponse {
                peer: peer.to_string(),
                reason: e.to_string(),
            })
    }
}
