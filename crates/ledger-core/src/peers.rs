use crate::{LedgerError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;
use url::Url;

/// Known peers keyed by URL authority (`host` or `host:port`).
///
/// Kept sorted so a resolution pass always visits peers in the same order.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct PeerRegistry {
    nodes: BTreeMap<String, String>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `address` (an absolute `http` URL) with a comment.
    /// Returns the authority it was stored under. Re-registering an authority
    /// overwrites its comment.
    pub fn register(&mut self, address: &str, comment: impl Into<String>) -> Result<String> {
        let authority = peer_authority(address)?;
        info!(peer = %authority, "peer registered");
        self.nodes.insert(authority.clone(), comment.into());
        Ok(authority)
    }

    pub fn get(&self, authority: &str) -> Option<&str> {
        self.nodes.get(authority).map(String::as_str)
    }

    pub fn contains(&self, authority: &str) -> bool {
        self.nodes.contains_key(authority)
    }

    /// Authorities in iteration order.
    pub fn addresses(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.nodes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Parse a peer URL down to its authority. Default ports are dropped the way
/// `url` normalises them, so `http://h:80` and `http://h` are the same peer.
///
/// Only `http` is accepted: peers are always fetched over plain http, so an
/// `https` authority would lose its port and be dialled on the wrong one.
pub fn peer_authority(address: &str) -> Result<String> {
    let url = Url::parse(address.trim())
        .map_err(|e| LedgerError::InvalidInput(format!("peer address {address:?}: {e}")))?;
    if url.scheme() != "http" {
        return Err(LedgerError::InvalidInput(format!(
            "peer address {address:?}: unsupported scheme {}",
            url.scheme()
        )));
    }
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| LedgerError::InvalidInput(format!("peer address {address:?}: no host")))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
