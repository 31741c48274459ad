//! Replication config types.
//!
//! These mirror the shape the host hands us: a primary region, an
//! autoscale gate, and one entry per replicated table. All types are
//! plain serde structs; nothing here talks to the control plane.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, ConfigResult};

/// A region identifier, e.g. "us-west-2".
pub type RegionId = String;

/// Logical name of a table resource in the template document.
pub type LogicalName = String;

/// Env var overriding the substitution retry total.
pub const RETRY_ENV: &str = "GLOBETAB_RETRY";

/// Env var overriding the inter-attempt pause in milliseconds.
pub const RETRY_PAUSE_ENV: &str = "GLOBETAB_RETRY_PAUSE_MILLIS";

/// Top-level replication configuration, supplied by the host and
/// immutable for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplicationConfig {
    /// Region the tables are first created in. Every phase treats a
    /// missing primary region as "not configured" and no-ops.
    pub primary_region: Option<RegionId>,
    /// Gates synthesis of autoscaling resources.
    #[serde(default)]
    pub autoscale: bool,
    /// One entry per globally replicated table.
    #[serde(default)]
    pub tables: Vec<GlobalTableConfig>,
}

impl ReplicationConfig {
    /// Tables that actually request replication (non-empty `add_regions`).
    pub fn replicated_tables(&self) -> impl Iterator<Item = &GlobalTableConfig> {
        self.tables.iter().filter(|t| t.is_replicated())
    }
}

/// Per-table replication and capacity settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalTableConfig {
    /// Logical name of the table resource.
    pub table: LogicalName,
    /// Regions that should hold a replica of this table.
    #[serde(default)]
    pub add_regions: Vec<RegionId>,
    /// Read-dimension autoscaling capacity.
    pub read: Option<CapacityConfig>,
    /// Write-dimension autoscaling capacity.
    pub write: Option<CapacityConfig>,
}

impl GlobalTableConfig {
    /// Whether this table requests any replica regions at all.
    pub fn is_replicated(&self) -> bool {
        !self.add_regions.is_empty()
    }
}

/// Capacity bounds and target utilization for one table dimension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapacityConfig {
    pub minimum: u64,
    pub maximum: u64,
    /// Target utilization as a fraction in (0, 1]; emitted as a
    /// target-tracking percentage (scaled by 100).
    pub usage: f64,
    /// Scheduled capacity overrides.
    #[serde(default)]
    pub actions: Vec<ScheduledAction>,
}

impl CapacityConfig {
    /// Check capacity bounds and usage range.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.minimum > self.maximum {
            return Err(ConfigError::CapacityBounds {
                minimum: self.minimum,
                maximum: self.maximum,
            });
        }
        if !(self.usage > 0.0 && self.usage <= 1.0) {
            return Err(ConfigError::UsageOutOfRange(self.usage));
        }
        for action in &self.actions {
            if action.minimum > action.maximum {
                return Err(ConfigError::ActionBounds {
                    name: action.name.clone(),
                    minimum: action.minimum,
                    maximum: action.maximum,
                });
            }
        }
        Ok(())
    }
}

/// A scheduled capacity change (cron-driven min/max override).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledAction {
    pub name: String,
    /// Cron expression, e.g. "cron(0 8 * * ? *)".
    pub schedule: String,
    pub minimum: u64,
    pub maximum: u64,
}

/// Which of the two observed substitution policies to run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubstitutionMode {
    /// Look up ARNs whenever the local region is not the primary region;
    /// retry failed lookups with a fixed pause and fail the run once the
    /// budget is exhausted.
    #[default]
    RetryDescribe,
    /// Look up ARNs whenever the local region itself appears in a table's
    /// `add_regions`; no retry — a retryable failure falls back to a
    /// deferred intrinsic reference for that table only.
    FallbackReference,
}

/// Retry budget for the substitution engine's describe-table lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub retries: u32,
    /// Fixed pause between attempts (no jitter, no backoff growth).
    pub pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 30,
            pause: Duration::from_millis(10_000),
        }
    }
}

impl RetryPolicy {
    /// Read the policy from `GLOBETAB_RETRY` / `GLOBETAB_RETRY_PAUSE_MILLIS`,
    /// falling back to the defaults for unset or unparsable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            retries: env_u64(RETRY_ENV).map_or(defaults.retries, |v| v as u32),
            pause: env_u64(RETRY_PAUSE_ENV)
                .map_or(defaults.pause, Duration::from_millis),
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var = key, value = %raw, "ignoring unparsable tunable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capacity(minimum: u64, maximum: u64, usage: f64) -> CapacityConfig {
        CapacityConfig {
            minimum,
            maximum,
            usage,
            actions: Vec::new(),
        }
    }

    #[test]
    fn valid_capacity_passes() {
        assert!(capacity(5, 50, 0.7).validate().is_ok());
        assert!(capacity(1, 1, 1.0).validate().is_ok());
    }

    #[test]
    fn inverted_bounds_rejected() {
        let err = capacity(50, 5, 0.7).validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::CapacityBounds {
                minimum: 50,
                maximum: 5
            }
        );
    }

    #[test]
    fn usage_outside_unit_interval_rejected() {
        assert!(capacity(1, 2, 0.0).validate().is_err());
        assert!(capacity(1, 2, 1.2).validate().is_err());
        assert!(capacity(1, 2, -0.5).validate().is_err());
    }

    #[test]
    fn scheduled_action_bounds_checked() {
        let mut cap = capacity(1, 10, 0.5);
        cap.actions.push(ScheduledAction {
            name: "night".to_string(),
            schedule: "cron(0 20 * * ? *)".to_string(),
            minimum: 8,
            maximum: 2,
        });
        assert!(matches!(
            cap.validate(),
            Err(ConfigError::ActionBounds { .. })
        ));
    }

    #[test]
    fn config_deserializes_from_host_json() {
        let cfg: ReplicationConfig = serde_json::from_value(serde_json::json!({
            "primary_region": "us-east-1",
            "autoscale": true,
            "tables": [
                {
                    "table": "Orders",
                    "add_regions": ["us-west-2", "eu-west-1"],
                    "read": { "minimum": 5, "maximum": 50, "usage": 0.7 }
                },
                { "table": "Audit" }
            ]
        }))
        .unwrap();

        assert_eq!(cfg.primary_region.as_deref(), Some("us-east-1"));
        assert!(cfg.autoscale);
        assert_eq!(cfg.tables.len(), 2);
        assert!(cfg.tables[0].is_replicated());
        assert!(!cfg.tables[1].is_replicated());
        assert_eq!(cfg.replicated_tables().count(), 1);
        assert!(cfg.tables[1].read.is_none());
    }

    #[test]
    fn retry_policy_defaults_and_env_override() {
        // Defaults first, with the vars known to be unset.
        unsafe {
            std::env::remove_var(RETRY_ENV);
            std::env::remove_var(RETRY_PAUSE_ENV);
        }
        let policy = RetryPolicy::from_env();
        assert_eq!(policy.retries, 30);
        assert_eq!(policy.pause, Duration::from_millis(10_000));

        unsafe {
            std::env::set_var(RETRY_ENV, "3");
            std::env::set_var(RETRY_PAUSE_ENV, "250");
        }
        let policy = RetryPolicy::from_env();
        assert_eq!(policy.retries, 3);
        assert_eq!(policy.pause, Duration::from_millis(250));

        unsafe {
            std::env::set_var(RETRY_ENV, "not-a-number");
            std::env::remove_var(RETRY_PAUSE_ENV);
        }
        assert_eq!(RetryPolicy::from_env().retries, 30);

        unsafe {
            std::env::remove_var(RETRY_ENV);
        }
    }

    #[test]
    fn substitution_mode_defaults_to_retry() {
        assert_eq!(SubstitutionMode::default(), SubstitutionMode::RetryDescribe);
    }
}
