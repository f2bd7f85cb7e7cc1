mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use contract_pulse::api::{self, AppState};
use contract_pulse::chain::{EthChain, PinnedHeight};
use contract_pulse::classifier::InteractionClassifier;
use contract_pulse::config::Config;
use contract_pulse::dialog::{ComposeContext, Notification};
use contract_pulse::explorer::HttpExplorer;
use contract_pulse::service::{PopularityEngine, PopularityService};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    let explorer = HttpExplorer::new(
        config.classifier.explorer_base_url.clone(),
        config.request_policy,
    )
    .context("failed to build explorer client")?;
    let classifier = InteractionClassifier::new(explorer, config.classifier.clone());

    match cli.command {
        Commands::Serve { addr } => {
            let chain = EthChain::new(config.eth_rpc_url.clone(), config.request_policy)
                .context("failed to build chain client")?;
            let state = AppState {
                engine: Arc::new(PopularityService::new(chain, classifier)),
            };
            let bind = addr.unwrap_or_else(|| config.http_bind_addr.clone());
            api::run_http_server(&bind, state).await?;
        }
        Commands::Inspect { address, block } => {
            let notification = match block {
                Some(height) => {
                    let engine = PopularityService::new(PinnedHeight(height), classifier);
                    inspect(&engine, address).await?
                }
                None => {
                    let chain = EthChain::new(config.eth_rpc_url.clone(), config.request_policy)
                        .context("failed to build chain client")?;
                    let engine = PopularityService::new(chain, classifier);
                    inspect(&engine, address).await?
                }
            };
            println!("{}", serde_json::to_string_pretty(&notification)?);
        }
    }

    Ok(())
}

async fn inspect(
    engine: &dyn PopularityEngine,
    address: Option<String>,
) -> anyhow::Result<Notification> {
    let address = address.unwrap_or_else(|| engine.contract_address().to_string());
    let current_block = engine
        .current_block()
        .await
        .context("failed to read current block")?;
    let classification = engine
        .classify(&address, current_block)
        .await
        .with_context(|| format!("failed to classify {}", address))?;
    tracing::info!(
        "{} at block {}: {} interactions, {} tier",
        address,
        current_block,
        classification.interaction_count,
        classification.tier
    );

    let content = engine.compose(&classification, &ComposeContext::request());
    Ok(Notification::alert(content, None))
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}
