use serde::{Deserialize, Serialize};
use std::fmt;

/// Reflection tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Narrow, tactical, every cycle
    Junior,
    /// Full-context, strategic, periodic
    Senior,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Junior => "junior",
            Self::Senior => "senior",
        }
    }

    /// Tier to run on `cycle` (1-based): senior on the first cycle and every
    /// `senior_every` cycles after it, junior otherwise. Zero disables senior.
    pub fn for_cycle(cycle: u64, senior_every: u64) -> Self {
        if senior_every > 0 && cycle.saturating_sub(1) % senior_every == 0 {
            Self::Senior
        } else {
            Self::Junior
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a tier sees and what it may change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierProfile {
    pub tier: Tier,

    /// Most recent log entries in context; `None` for the whole window
    pub log_entries: Option<usize>,

    /// Most recent reflections in context; `None` for all retained
    pub reflections: Option<usize>,

    /// Restrict the snapshot to the near/mid slice
    pub local_only: bool,

    /// Output may replace goals and plans
    pub edits_goals: bool,

    /// Append deterministic tactical annotations to the note
    pub annotates: bool,
}

impl TierProfile {
    pub fn junior() -> Self {
        Self {
            tier: Tier::Junior,
            log_entries: Some(3),
            reflections: Some(1),
            local_only: true,
            edits_goals: false,
            annotates: true,
        }
    }

    pub fn senior() -> Self {
        Self {
            tier: Tier::Senior,
            log_entries: None,
            reflections: None,
            local_only: false,
            edits_goals: true,
            annotates: false,
        }
    }

    pub fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::Junior => Self::junior(),
            Tier::Senior => Self::senior(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_cadence() {
        let tiers: Vec<_> = (1..=7).map(|c| Tier::for_cycle(c, 3)).collect();
        assert_eq!(
            tiers,
            vec![
                Tier::Senior,
                Tier::Junior,
                Tier::Junior,
                Tier::Senior,
                Tier::Junior,
                Tier::Junior,
                Tier::Senior
            ]
        );
        assert!((1..10).all(|c| Tier::for_cycle(c, 0) == Tier::Junior));
        assert!((1..10).all(|c| Tier::for_cycle(c, 1) == Tier::Senior));
    }
}
