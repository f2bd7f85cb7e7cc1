use tracing::debug;

use crate::config::{ClassifierConfig, TierThresholds};
use crate::error::Result;
use crate::explorer::TransactionExplorer;
use crate::models::{
    BlockRange, Classification, PopularityTier, SortOrder, TransactionHistoryQuery,
};

/// Maps an interaction count to its tier. Boundary counts fall into the
/// lower tier.
pub fn tier_for_count(count: usize, thresholds: TierThresholds) -> PopularityTier {
    if count > thresholds.high {
        PopularityTier::High
    } else if count > thresholds.medium {
        PopularityTier::Medium
    } else {
        PopularityTier::Low
    }
}

pub struct InteractionClassifier<E> {
    explorer: E,
    config: ClassifierConfig,
}

impl<E: TransactionExplorer> InteractionClassifier<E> {
    pub fn new(explorer: E, config: ClassifierConfig) -> Self {
        Self { explorer, config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn query_for(
        &self,
        contract_address: &str,
        current_block: u64,
    ) -> TransactionHistoryQuery {
        TransactionHistoryQuery {
            contract_address: contract_address.to_string(),
            range: BlockRange::ending_at(current_block, self.config.block_window_size),
            sort: SortOrder::Desc,
            page_size: self.config.page_size,
            page: 0,
        }
    }

    pub async fn classify(
        &self,
        contract_address: &str,
        current_block: u64,
    ) -> Result<Classification> {
        let query = self.query_for(contract_address, current_block);
        let records = self.explorer.list_transactions(&query).await?;

        // The explorer caps the page; anything beyond it is indistinguishable.
        let interaction_count = records.len().min(query.page_size);
        let tier = tier_for_count(interaction_count, self.config.tier_thresholds);
        debug!(
            "classified {} over blocks {}..={}: {} interactions -> {}",
            contract_address, query.range.from_block, query.range.to_block, interaction_count, tier
        );

        Ok(Classification {
            tier,
            interaction_count,
            range: query.range,
        })
    }
}
