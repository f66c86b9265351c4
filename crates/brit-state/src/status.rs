//! # Publication Status

use serde::{Deserialize, Serialize};

use brit_core::ValidationError;

/// The publication status of a reviewable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationStatus {
    /// Visible to the owner and staff only. Initial state.
    Private,
    /// Submitted and awaiting a moderator's decision.
    Review,
    /// Approved and publicly visible.
    Published,
    /// Rejected by a moderator; the owner may revise and resubmit.
    Declined,
    /// Retired from active use. No further transitions.
    Archived,
}

impl PublicationStatus {
    /// All states, in lifecycle order.
    pub const ALL: [PublicationStatus; 5] = [
        Self::Private,
        Self::Review,
        Self::Published,
        Self::Declined,
        Self::Archived,
    ];

    /// Canonical lowercase name, as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Review => "review",
            Self::Published => "published",
            Self::Declined => "declined",
            Self::Archived => "archived",
        }
    }

    /// Human-readable label, used as the reason in dependency reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Private => "Private",
            Self::Review => "Under review",
            Self::Published => "Published",
            Self::Declined => "Declined",
            Self::Archived => "Archived",
        }
    }

    /// Parse a canonical name. Returns `None` for anything else.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "private" => Some(Self::Private),
            "review" => Some(Self::Review),
            "published" => Some(Self::Published),
            "declined" => Some(Self::Declined),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    /// Whether no transition leaves this state.
    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }

    /// Target states reachable by a single transition method.
    pub fn valid_transitions(&self) -> &'static [PublicationStatus] {
        match self {
            Self::Private => &[Self::Review],
            Self::Review => &[Self::Private, Self::Published, Self::Declined],
            Self::Published => &[Self::Archived],
            Self::Declined => &[Self::Review, Self::Private],
            Self::Archived => &[],
        }
    }

    /// Whether objects in this state are publicly visible.
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Published | Self::Archived)
    }
}

impl std::str::FromStr for PublicationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

impl std::fmt::Display for PublicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
