//! Host-agnostic dialog trees.
//!
//! Everything here is pure: the same inputs always produce the same tree and
//! nothing touches the network.

use serde::Serialize;

use crate::models::{FeedbackAction, PopularityTier, Sentiment};

pub const FEEDBACK_PROMPT: &str = "After interacting with the contract, please provide feedback. \
Your vote will only count if you interacted with the contract in the last 24 hours.";

/// Placeholder shown in place of vote totals, which are never aggregated.
pub const UNRESOLVED_COUNT: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonVariant {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Component {
    Panel {
        children: Vec<Component>,
    },
    Image {
        value: String,
    },
    Text {
        value: String,
    },
    Divider,
    Button {
        value: String,
        name: String,
        variant: ButtonVariant,
    },
}

impl Component {
    fn text(value: impl Into<String>) -> Self {
        Component::Text {
            value: value.into(),
        }
    }

    fn feedback_button(action: FeedbackAction) -> Self {
        let variant = match action {
            FeedbackAction::Positive => ButtonVariant::Primary,
            FeedbackAction::Negative => ButtonVariant::Secondary,
        };
        Component::Button {
            value: action.label().to_string(),
            name: action.control_name().to_string(),
            variant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RenderTree {
    root: Component,
}

impl RenderTree {
    pub fn panel(children: Vec<Component>) -> Self {
        Self {
            root: Component::Panel { children },
        }
    }

    pub fn children(&self) -> &[Component] {
        match &self.root {
            Component::Panel { children } => children,
            other => std::slice::from_ref(other),
        }
    }
}

/// Which host entry point a dialog is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationSource {
    #[default]
    Request,
    Transaction,
}

impl InvocationSource {
    fn vote_labels(self) -> (&'static str, &'static str) {
        match self {
            InvocationSource::Request => ("Upvotes", "Downvotes"),
            InvocationSource::Transaction => ("Happy users", "Unhappy users"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeContext {
    pub origin: Option<String>,
    pub source: InvocationSource,
    pub sentiment: Sentiment,
}

impl ComposeContext {
    pub fn request() -> Self {
        Self::default()
    }

    pub fn transaction(origin: impl Into<String>) -> Self {
        Self {
            origin: Some(origin.into()),
            source: InvocationSource::Transaction,
            sentiment: Sentiment::Happy,
        }
    }
}

pub fn icon_for(tier: PopularityTier, sentiment: Sentiment) -> &'static str {
    match (sentiment, tier) {
        (Sentiment::Happy, PopularityTier::High) => "happy-high.png",
        (Sentiment::Happy, PopularityTier::Medium) => "happy-medium.png",
        (Sentiment::Happy, PopularityTier::Low) => "happy-low.png",
        (Sentiment::Unhappy, PopularityTier::High) => "unhappy-high.png",
        (Sentiment::Unhappy, PopularityTier::Medium) => "unhappy-medium.png",
        (Sentiment::Unhappy, PopularityTier::Low) => "unhappy-low.png",
    }
}

/// Builds the popularity dialog.
///
/// Children are always, in order: tier icon, current block, interaction
/// count, the two vote placeholders, a divider, the feedback prompt and the
/// positive then negative feedback buttons.
pub fn compose(
    tier: PopularityTier,
    current_block: u64,
    interaction_count: usize,
    context: &ComposeContext,
) -> RenderTree {
    let (up_label, down_label) = context.source.vote_labels();
    RenderTree::panel(vec![
        Component::Image {
            value: icon_for(tier, context.sentiment).to_string(),
        },
        Component::text(format!("Current block: **{}**", current_block)),
        Component::text(format!("Popularity: **{}**", interaction_count)),
        Component::text(format!("{}: {}", up_label, UNRESOLVED_COUNT)),
        Component::text(format!("{}: {}", down_label, UNRESOLVED_COUNT)),
        Component::Divider,
        Component::text(FEEDBACK_PROMPT),
        Component::feedback_button(FeedbackAction::Positive),
        Component::feedback_button(FeedbackAction::Negative),
    ])
}

/// Dialog shown once the user has picked a feedback action.
pub fn compose_acknowledgement(tier: PopularityTier, action: FeedbackAction) -> RenderTree {
    RenderTree::panel(vec![
        Component::Image {
            value: icon_for(tier, action.sentiment()).to_string(),
        },
        Component::text(format!("Feedback recorded: **{}**", action.label())),
        Component::Divider,
        Component::text("Thanks for helping other users judge this contract."),
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogKind {
    Alert,
}

/// What a handler hands back to the host for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: DialogKind,
    pub content: RenderTree,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl Notification {
    pub fn alert(content: RenderTree, origin: Option<String>) -> Self {
        Self {
            kind: DialogKind::Alert,
            content,
            origin,
        }
    }
}
