use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::RequestPolicy;
use crate::error::{PulseError, Result};
use crate::models::TransactionHistoryQuery;
use crate::net;

/// Read-only access to a block explorer's transaction history.
#[async_trait]
pub trait TransactionExplorer: Send + Sync {
    /// Returns the raw transaction records matching `query`, in explorer order.
    async fn list_transactions(&self, query: &TransactionHistoryQuery) -> Result<Vec<Value>>;
}

/// Etherscan-compatible `module=account&action=txlist` client.
#[derive(Clone)]
pub struct HttpExplorer {
    client: reqwest::Client,
    base_url: Url,
    policy: RequestPolicy,
}

#[derive(Deserialize)]
struct TxListResponse {
    #[serde(default)]
    message: Option<String>,
    result: Option<Value>,
}

impl HttpExplorer {
    pub fn new(base_url: Url, policy: RequestPolicy) -> Result<Self> {
        let client = net::http_client(&policy)?;
        Ok(Self {
            client,
            base_url,
            policy,
        })
    }

    pub fn txlist_url(&self, query: &TransactionHistoryQuery) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("module", "account")
            .append_pair("action", "txlist")
            .append_pair("address", &query.contract_address)
            .append_pair("startblock", &query.range.from_block.to_string())
            .append_pair("endblock", &query.range.to_block.to_string())
            .append_pair("sort", query.sort.as_str())
            .append_pair("offset", &query.page_size.to_string())
            .append_pair("page", &query.page.to_string());
        url
    }

    async fn fetch_once(&self, url: &Url) -> Result<Vec<Value>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PulseError::transport("explorer", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PulseError::status("explorer", status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PulseError::transport("explorer", e))?;
        parse_txlist(&body)
    }
}

#[async_trait]
impl TransactionExplorer for HttpExplorer {
    async fn list_transactions(&self, query: &TransactionHistoryQuery) -> Result<Vec<Value>> {
        let url = self.txlist_url(query);
        debug!("querying explorer: {}", url);
        net::with_retry(&self.policy, "explorer txlist", || self.fetch_once(&url)).await
    }
}

fn parse_txlist(body: &[u8]) -> Result<Vec<Value>> {
    let parsed: TxListResponse = serde_json::from_slice(body).map_err(|e| {
        PulseError::MalformedResponse(format!("explorer body is not a txlist object: {}", e))
    })?;

    match parsed.result {
        Some(Value::Array(records)) => Ok(records),
        // Etherscan-style APIs put error text in `result` (e.g. rate limits).
        Some(other) => Err(PulseError::MalformedResponse(format!(
            "explorer `result` is not a list (message: {}, result: {})",
            parsed.message.as_deref().unwrap_or("none"),
            other
        ))),
        None => Err(PulseError::MalformedResponse(
            "explorer response is missing `result`".to_string(),
        )),
    }
}
