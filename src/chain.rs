use async_trait::async_trait;
use ethers_providers::{Http, Middleware, Provider, ProviderError, RpcError};
use url::Url;

use crate::config::RequestPolicy;
use crate::error::{PulseError, Result};
use crate::net;

/// Source of the connected chain's head height.
#[async_trait]
pub trait BlockHeightSource: Send + Sync {
    async fn current_block(&self) -> Result<u64>;
}

#[derive(Clone)]
pub struct EthChain {
    provider: Provider<Http>,
    policy: RequestPolicy,
}

impl EthChain {
    pub fn new(rpc_url: Url, policy: RequestPolicy) -> Result<Self> {
        let client = net::http_client(&policy)?;
        let transport = Http::new_with_client(rpc_url, client);
        let provider = Provider::new(transport);
        Ok(Self { provider, policy })
    }
}

#[async_trait]
impl BlockHeightSource for EthChain {
    async fn current_block(&self) -> Result<u64> {
        let latest = net::with_retry(&self.policy, "eth_blockNumber", || async {
            self.provider
                .get_block_number()
                .await
                .map_err(chain_error)
        })
        .await?;
        Ok(latest.as_u64())
    }
}

/// A reply we could not decode is final; every other provider error is left
/// to the retry policy.
fn chain_error(err: ProviderError) -> PulseError {
    if err.as_serde_error().is_some() {
        return PulseError::MalformedResponse(format!("eth_blockNumber reply: {}", err));
    }
    PulseError::transport("eth_blockNumber", err)
}

/// Fixed head height, for one-shot inspection at a known block.
#[derive(Debug, Clone, Copy)]
pub struct PinnedHeight(pub u64);

#[async_trait]
impl BlockHeightSource for PinnedHeight {
    async fn current_block(&self) -> Result<u64> {
        Ok(self.0)
    }
}
