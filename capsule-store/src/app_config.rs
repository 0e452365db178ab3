use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Tunable booking-funnel rules. Defaults mirror the platform constants;
/// any of these can be overridden per deployment through the layered
/// config sources below.
#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// TTL granted when a hold is first created (confirmation stage).
    #[serde(default = "default_confirmation_hold_seconds")]
    pub confirmation_hold_seconds: u64,
    /// TTL granted when a hold advances to the payment stage.
    #[serde(default = "default_payment_hold_seconds")]
    pub payment_hold_seconds: u64,
    /// Upper bound on a hold's total life across all extensions.
    #[serde(default = "default_max_hold_lifetime_seconds")]
    pub max_hold_lifetime_seconds: u64,
    /// How often the background sweep reclaims expired holds.
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
    /// Largest blocked-night share a recommended room may carry.
    #[serde(default = "default_partial_availability_threshold")]
    pub partial_availability_threshold: f64,
    /// Recommendation list cap.
    #[serde(default = "default_recommendation_limit")]
    pub recommendation_limit: usize,
}

fn default_confirmation_hold_seconds() -> u64 {
    300
}
fn default_payment_hold_seconds() -> u64 {
    600
}
fn default_max_hold_lifetime_seconds() -> u64 {
    900
}
fn default_sweep_interval_seconds() -> u64 {
    60
}
fn default_partial_availability_threshold() -> f64 {
    0.33
}
fn default_recommendation_limit() -> usize {
    5
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            confirmation_hold_seconds: default_confirmation_hold_seconds(),
            payment_hold_seconds: default_payment_hold_seconds(),
            max_hold_lifetime_seconds: default_max_hold_lifetime_seconds(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
            partial_availability_threshold: default_partial_availability_threshold(),
            recommendation_limit: default_recommendation_limit(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of CAPSULE)
            // Eg.. `CAPSULE__DATABASE__URL=...` would set the database url
            .add_source(config::Environment::with_prefix("CAPSULE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_rules_defaults() {
        let rules = BusinessRules::default();
        assert_eq!(rules.confirmation_hold_seconds, 300);
        assert_eq!(rules.payment_hold_seconds, 600);
        assert_eq!(rules.max_hold_lifetime_seconds, 900);
        assert!((rules.partial_availability_threshold - 0.33).abs() < f64::EPSILON);
        assert_eq!(rules.recommendation_limit, 5);
    }
}
