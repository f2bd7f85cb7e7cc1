use async_trait::async_trait;
use ethers_core::types::Address;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::chain::BlockHeightSource;
use crate::classifier::InteractionClassifier;
use crate::dialog::{self, ComposeContext, Notification, RenderTree};
use crate::error::{PulseError, Result};
use crate::explorer::TransactionExplorer;
use crate::feedback::{FeedbackState, UserInputEvent};
use crate::models::{Classification, PopularityTier};

pub const HELLO_METHOD: &str = "hello";

/// The capability set every host entry point is built on.
#[async_trait]
pub trait PopularityEngine: Send + Sync {
    /// Contract inspected by the explicit `hello` request.
    fn contract_address(&self) -> &str;

    async fn current_block(&self) -> Result<u64>;

    async fn classify(&self, contract_address: &str, current_block: u64) -> Result<Classification>;

    fn compose(&self, classification: &Classification, context: &ComposeContext) -> RenderTree {
        dialog::compose(
            classification.tier,
            classification.current_block(),
            classification.interaction_count,
            context,
        )
    }
}

pub struct PopularityService<B, E> {
    chain: B,
    classifier: InteractionClassifier<E>,
}

impl<B, E> PopularityService<B, E>
where
    B: BlockHeightSource,
    E: TransactionExplorer,
{
    pub fn new(chain: B, classifier: InteractionClassifier<E>) -> Self {
        Self { chain, classifier }
    }
}

#[async_trait]
impl<B, E> PopularityEngine for PopularityService<B, E>
where
    B: BlockHeightSource,
    E: TransactionExplorer,
{
    fn contract_address(&self) -> &str {
        &self.classifier.config().contract_address
    }

    async fn current_block(&self) -> Result<u64> {
        self.chain.current_block().await
    }

    async fn classify(&self, contract_address: &str, current_block: u64) -> Result<Classification> {
        self.classifier.classify(contract_address, current_block).await
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    /// Origin of the dapp that sent the request, when the host knows it.
    #[serde(default)]
    pub origin: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEvent {
    #[serde(default)]
    pub transaction_origin: Option<String>,
    pub chain_id: String,
    pub transaction: ObservedTransaction,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservedTransaction {
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserInputRequest {
    #[serde(default)]
    pub state: FeedbackState,
    pub event: UserInputEvent,
    pub tier: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserInputOutcome {
    pub state: FeedbackState,
    pub content: RenderTree,
}

async fn inspect<P>(engine: &P, contract_address: &str) -> Result<Classification>
where
    P: PopularityEngine + ?Sized,
{
    let current_block = engine.current_block().await?;
    engine.classify(contract_address, current_block).await
}

/// Explicit request entry point. Only `hello` is recognised; anything else is
/// rejected before any network call.
pub async fn on_rpc_request<P>(engine: &P, request: &RpcRequest) -> Result<Notification>
where
    P: PopularityEngine + ?Sized,
{
    if request.method != HELLO_METHOD {
        return Err(PulseError::UnknownRequestMethod {
            method: request.method.clone(),
        });
    }

    let contract_address = engine.contract_address().to_string();
    let classification = inspect(engine, &contract_address).await?;
    info!(
        "hello: {} is {} ({} interactions)",
        contract_address, classification.tier, classification.interaction_count
    );

    let context = ComposeContext {
        origin: request.origin.clone(),
        ..ComposeContext::request()
    };
    let content = engine.compose(&classification, &context);
    Ok(Notification::alert(content, context.origin))
}

/// Transaction insight entry point: classifies the transaction's recipient.
pub async fn on_transaction<P>(engine: &P, event: &TransactionEvent) -> Result<Notification>
where
    P: PopularityEngine + ?Sized,
{
    let to = event.transaction.to.ok_or_else(|| {
        PulseError::InvalidParams("transaction has no recipient (`to`)".to_string())
    })?;
    let contract_address = format!("0x{:x}", to);

    let classification = inspect(engine, &contract_address).await?;
    info!(
        "transaction on chain {} to {}: {} ({} interactions)",
        event.chain_id, contract_address, classification.tier, classification.interaction_count
    );

    let context = match &event.transaction_origin {
        Some(origin) => ComposeContext::transaction(origin.clone()),
        None => ComposeContext {
            source: dialog::InvocationSource::Transaction,
            ..ComposeContext::default()
        },
    };
    let content = engine.compose(&classification, &context);
    Ok(Notification::alert(content, context.origin))
}

/// Feedback button entry point. Pure: the host supplies the prior state and
/// the tier the dialog was rendered with.
pub fn on_user_input(request: &UserInputRequest) -> Result<UserInputOutcome> {
    let tier: PopularityTier = request.tier.parse()?;
    let state = request.state.apply(&request.event)?;
    let action = state
        .recorded_action()
        .ok_or_else(|| PulseError::InvalidParams("no feedback action recorded".to_string()))?;
    info!("feedback recorded: {:?} for {} tier", action, tier);

    Ok(UserInputOutcome {
        state,
        content: dialog::compose_acknowledgement(tier, action),
    })
}
