use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PulseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockRange {
    pub from_block: u64,
    pub to_block: u64,
}

impl BlockRange {
    /// Window of `window` blocks ending at `current_block`, clamped at genesis.
    pub fn ending_at(current_block: u64, window: u64) -> Self {
        Self {
            from_block: current_block.saturating_sub(window),
            to_block: current_block,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionHistoryQuery {
    pub contract_address: String,
    pub range: BlockRange,
    pub sort: SortOrder,
    pub page_size: usize,
    pub page: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PopularityTier {
    High,
    Medium,
    Low,
}

impl PopularityTier {
    pub fn as_str(self) -> &'static str {
        match self {
            PopularityTier::High => "high",
            PopularityTier::Medium => "medium",
            PopularityTier::Low => "low",
        }
    }
}

impl fmt::Display for PopularityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PopularityTier {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(PopularityTier::High),
            "medium" => Ok(PopularityTier::Medium),
            "low" => Ok(PopularityTier::Low),
            _ => Err(PulseError::InvalidTier(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    #[default]
    Happy,
    Unhappy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackAction {
    Positive,
    Negative,
}

impl FeedbackAction {
    /// Name of the button control that emits this action.
    pub fn control_name(self) -> &'static str {
        match self {
            FeedbackAction::Positive => "feedback-positive",
            FeedbackAction::Negative => "feedback-negative",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FeedbackAction::Positive => "I'm happy",
            FeedbackAction::Negative => "I'm NOT happy",
        }
    }

    pub fn from_control_name(name: &str) -> Option<Self> {
        [FeedbackAction::Positive, FeedbackAction::Negative]
            .into_iter()
            .find(|action| action.control_name() == name)
    }

    pub fn sentiment(self) -> Sentiment {
        match self {
            FeedbackAction::Positive => Sentiment::Happy,
            FeedbackAction::Negative => Sentiment::Unhappy,
        }
    }
}

/// Outcome of one classifier run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub tier: PopularityTier,
    pub interaction_count: usize,
    pub range: BlockRange,
}

impl Classification {
    pub fn current_block(&self) -> u64 {
        self.range.to_block
    }
}
