//! Runtime configuration for the ledger core.

/// What to do when a stored collection cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedDataPolicy {
    /// Treat the collection as empty and log a warning.
    #[default]
    Recover,
    /// Surface `DbError::Malformed` to the caller.
    Fail,
}

/// Limits used to flag a pack as running low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualThresholds {
    /// A pack with this many sessions or fewer is low.
    pub low_balance: u32,
    /// A pack expiring within this many days is low.
    pub expiry_warning_days: i64,
}

impl Default for VisualThresholds {
    fn default() -> Self {
        Self {
            low_balance: 1,
            expiry_warning_days: 7,
        }
    }
}

/// Core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// Handling of corrupt persisted collections
    pub malformed_data: MalformedDataPolicy,
    /// Visual-state thresholds
    pub visual: VisualThresholds,
    /// Active packs at or below this balance count as "low sessions" in the overview
    pub overview_low_balance: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            malformed_data: MalformedDataPolicy::default(),
            visual: VisualThresholds::default(),
            overview_low_balance: 2,
        }
    }
}

impl CoreConfig {
    /// Configuration that refuses to silently drop corrupt data.
    pub fn strict() -> Self {
        Self {
            malformed_data: MalformedDataPolicy::Fail,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::default();
        assert_eq!(config.malformed_data, MalformedDataPolicy::Recover);
        assert_eq!(config.visual.low_balance, 1);
        assert_eq!(config.visual.expiry_warning_days, 7);
        assert_eq!(config.overview_low_balance, 2);
    }

    #[test]
    fn test_strict() {
        let config = CoreConfig::strict();
        assert_eq!(config.malformed_data, MalformedDataPolicy::Fail);
        assert_eq!(config.visual, VisualThresholds::default());
    }
}
