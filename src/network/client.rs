use log::debug;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::protocol::{ChainResponse, NewBlockchainResponse, NodesResponse, PingResponse};
use crate::blockchain::Block;
use crate::error::{LedgerError, Result};

#[derive(Serialize)]
struct PushBody<'a> {
    chain: &'a [Block],
    nodes_updated: &'a [String],
}

/// HTTP client for the inter-node operations. Every call is bounded by the
/// configured timeout; failures come back as `LedgerError::Peer`.
#[derive(Debug, Clone)]
pub struct PeerClient {
    http: Client,
}

impl PeerClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Config(format!("http client: {e}")))?;
        Ok(Self { http })
    }

    fn url(node: &str, path: &str) -> String {
        format!("http://{node}{path}")
    }

    async fn get_json<T: DeserializeOwned>(&self, node: &str, path: &str) -> Result<T> {
        let url = Self::url(node, path);
        debug!("PEER - GET {url}");
        self.http
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| LedgerError::peer(node, e))?
            .json::<T>()
            .await
            .map_err(|e| LedgerError::peer(node, e))
    }

    /// Liveness probe against `GET /ping`.
    pub async fn ping(&self, node: &str) -> bool {
        match self.get_json::<PingResponse>(node, "/ping").await {
            Ok(resp) => resp.message == "pong",
            Err(e) => {
                debug!("PEER - {e}");
                false
            }
        }
    }

    pub async fn fetch_chain(&self, node: &str) -> Result<ChainResponse> {
        self.get_json(node, "/get_chain").await
    }

    pub async fn fetch_nodes(&self, node: &str) -> Result<Vec<String>> {
        let resp: NodesResponse = self.get_json(node, "/get_my_nodes").await?;
        Ok(resp.nodes)
    }

    pub async fn push_chain(
        &self,
        node: &str,
        chain: &[Block],
        nodes_updated: &[String],
    ) -> Result<NewBlockchainResponse> {
        let url = Self::url(node, "/new_blockchain");
        debug!("PEER - POST {url} ({} blocks)", chain.len());
        self.http
            .post(&url)
            .json(&PushBody {
                chain,
                nodes_updated,
            })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| LedgerError::peer(node, e))?
            .json()
            .await
            .map_err(|e| LedgerError::peer(node, e))
    }
}
