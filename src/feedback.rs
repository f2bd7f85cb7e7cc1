use serde::{Deserialize, Serialize};

use crate::error::{PulseError, Result};
use crate::models::FeedbackAction;

/// Per-dialog feedback state. The host keeps it between invocations and
/// posts it back with every input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FeedbackState {
    #[default]
    AwaitingFeedback,
    FeedbackRecorded { action: FeedbackAction },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserInputKind {
    ButtonClick,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInputEvent {
    #[serde(rename = "type")]
    pub kind: UserInputKind,
    pub name: String,
}

impl FeedbackState {
    /// Applies one input event. Only the first feedback action counts.
    pub fn apply(self, event: &UserInputEvent) -> Result<FeedbackState> {
        if let FeedbackState::FeedbackRecorded { .. } = self {
            return Err(PulseError::FeedbackAlreadyRecorded);
        }

        let action = FeedbackAction::from_control_name(&event.name).ok_or_else(|| {
            PulseError::InvalidParams(format!("unknown feedback control {:?}", event.name))
        })?;
        Ok(FeedbackState::FeedbackRecorded { action })
    }

    pub fn recorded_action(self) -> Option<FeedbackAction> {
        match self {
            FeedbackState::AwaitingFeedback => None,
            FeedbackState::FeedbackRecorded { action } => Some(action),
        }
    }
}
