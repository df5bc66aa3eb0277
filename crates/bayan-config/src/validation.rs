// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty paths, positive time bounds, and catalog
//! entry consistency.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::BayanConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &BayanConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.warehouse.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "warehouse.database_path must not be empty".to_string(),
        });
    }

    if config.warehouse.query_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "warehouse.query_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.pool.cooldown_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "pool.cooldown_secs must be at least 1".to_string(),
        });
    }

    if config.pool.max_consecutive_failures == 0 {
        errors.push(ConfigError::Validation {
            message: "pool.max_consecutive_failures must be at least 1".to_string(),
        });
    }

    if config.agent.stage_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "agent.stage_timeout_secs must be at least 1".to_string(),
        });
    }

    for (i, key) in config.gemini.api_keys.iter().enumerate() {
        if key.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("gemini.api_keys[{i}] must not be empty"),
            });
        }
    }

    if !(0.0..=1.0).contains(&config.composer.decline_threshold) {
        errors.push(ConfigError::Validation {
            message: format!(
                "composer.decline_threshold must be between 0.0 and 1.0, got {}",
                config.composer.decline_threshold
            ),
        });
    }

    // Catalog entries must have unique ids and at least one alias each.
    let mut seen_metrics = HashSet::new();
    for metric in &config.catalog.metrics {
        if !seen_metrics.insert(&metric.id) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate metric id `{}` in [[catalog.metrics]]", metric.id),
            });
        }
        if metric.aliases.is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("metric `{}` must have at least one alias", metric.id),
            });
        }
        if !matches!(metric.aggregate.as_str(), "sum" | "avg" | "count") {
            errors.push(ConfigError::Validation {
                message: format!(
                    "metric `{}` aggregate must be one of sum, avg, count; got `{}`",
                    metric.id, metric.aggregate
                ),
            });
        }
    }

    let mut seen_dimensions = HashSet::new();
    for dim in &config.catalog.dimensions {
        if !seen_dimensions.insert(&dim.id) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "duplicate dimension id `{}` in [[catalog.dimensions]]",
                    dim.id
                ),
            });
        }
        if dim.aliases.is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("dimension `{}` must have at least one alias", dim.id),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MetricEntry;

    #[test]
    fn default_config_validates() {
        let config = BayanConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = BayanConfig::default();
        config.warehouse.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))));
    }

    #[test]
    fn zero_cooldown_fails_validation() {
        let mut config = BayanConfig::default();
        config.pool.cooldown_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("cooldown_secs"))));
    }

    #[test]
    fn blank_api_key_fails_validation() {
        let mut config = BayanConfig::default();
        config.gemini.api_keys = vec!["good-key".to_string(), "  ".to_string()];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("api_keys[1]"))));
    }

    #[test]
    fn duplicate_metric_id_fails_validation() {
        let mut config = BayanConfig::default();
        let entry = MetricEntry {
            id: "revenue".to_string(),
            aliases: vec!["revenue".to_string()],
            fact_table: "factResellerSales".to_string(),
            value_column: "SalesAmount".to_string(),
            aggregate: "sum".to_string(),
            date_column: "OrderDate".to_string(),
        };
        config.catalog.metrics = vec![entry.clone(), entry];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("duplicate metric id"))));
    }

    #[test]
    fn bad_aggregate_fails_validation() {
        let mut config = BayanConfig::default();
        config.catalog.metrics = vec![MetricEntry {
            id: "revenue".to_string(),
            aliases: vec!["revenue".to_string()],
            fact_table: "factResellerSales".to_string(),
            value_column: "SalesAmount".to_string(),
            aggregate: "median".to_string(),
            date_column: "OrderDate".to_string(),
        }];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("aggregate"))));
    }

    #[test]
    fn valid_custom_config_passes() {
        let mut config = BayanConfig::default();
        config.gemini.api_keys = vec!["k1".to_string(), "k2".to_string()];
        config.warehouse.database_path = "/srv/dw/warehouse.db".to_string();
        config.composer.decline_threshold = 0.05;
        assert!(validate_config(&config).is_ok());
    }
}
