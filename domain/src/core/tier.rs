//! Model cost tiers.

use serde::{Deserialize, Serialize};

/// Cost/capability class of a model call (Value Object)
///
/// Tiers are strictly ordered: `Cheap < Capable < Premium`. Escalation
/// always moves one step up via [`Tier::next`]; nothing in the engine
/// moves a tier down except explicit cost downgrades at spawn time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Cheap,
    #[default]
    Capable,
    Premium,
}

impl Tier {
    /// All tiers in ascending order
    pub const ALL: [Tier; 3] = [Tier::Cheap, Tier::Capable, Tier::Premium];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Cheap => "cheap",
            Tier::Capable => "capable",
            Tier::Premium => "premium",
        }
    }

    /// The next tier up, or `None` at Premium
    pub fn next(&self) -> Option<Tier> {
        match self {
            Tier::Cheap => Some(Tier::Capable),
            Tier::Capable => Some(Tier::Premium),
            Tier::Premium => None,
        }
    }

    /// The next tier down, or `None` at Cheap
    pub fn previous(&self) -> Option<Tier> {
        match self {
            Tier::Cheap => None,
            Tier::Capable => Some(Tier::Cheap),
            Tier::Premium => Some(Tier::Capable),
        }
    }

    /// Escalate one step, saturating at Premium
    pub fn escalated(&self) -> Tier {
        self.next().unwrap_or(Tier::Premium)
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cheap" => Ok(Tier::Cheap),
            "capable" => Ok(Tier::Capable),
            "premium" => Ok(Tier::Premium),
            other => Err(format!("unknown tier: {}", other)),
        }
    }
}
