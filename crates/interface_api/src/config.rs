//! API configuration
//!
//! Settings come from `API_`-prefixed environment variables, optionally
//! seeded from a `.env` file by the binary. Engine settings are nested under
//! `API_ENGINE__`, e.g. `API_ENGINE__LABOR_RATE=90`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::info;

use core_kernel::Currency;
use domain_estimation::{
    CostRuleTable, EstimationDefaults, EstimationError, OverrideResolver, SeverityClassifier,
    SeverityThresholds, ThresholdPair,
};

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Maximum pooled database connections
    pub max_connections: u32,
    /// Log level
    pub log_level: String,
    /// Estimation engine settings
    pub engine: EngineConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/estimation".to_string(),
            max_connections: 10,
            log_level: "info".to_string(),
            engine: EngineConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    ///
    /// Any malformed value is an error; nothing falls back to defaults once
    /// a variable is set.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::load(Self::environment())
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix("API")
            .prefix_separator("_")
            .separator("__")
    }

    fn load(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(environment)
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Estimation engine settings consumed once at startup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default labor rate per hour
    pub labor_rate: Decimal,
    /// Default markup percentage
    pub markup_percentage: Decimal,
    /// ISO currency code for every amount the engine produces
    pub currency: String,
    /// JSON cost table; the built-in table is used when unset
    pub cost_table_path: Option<String>,
    pub confidence_moderate: f64,
    pub confidence_severe: f64,
    pub area_moderate: f64,
    pub area_severe: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let thresholds = SeverityThresholds::default();
        Self {
            labor_rate: dec!(75.00),
            markup_percentage: dec!(20.0),
            currency: "USD".to_string(),
            cost_table_path: None,
            confidence_moderate: thresholds.confidence.moderate,
            confidence_severe: thresholds.confidence.severe,
            area_moderate: thresholds.area.moderate,
            area_severe: thresholds.area.severe,
        }
    }
}

impl EngineConfig {
    pub fn currency(&self) -> Result<Currency, EstimationError> {
        Ok(self.currency.parse::<Currency>()?)
    }

    /// Loads the configured cost table, or the built-in one
    pub fn cost_table(&self) -> Result<CostRuleTable, EstimationError> {
        let currency = self.currency()?;
        match &self.cost_table_path {
            Some(path) => CostRuleTable::from_path(path, currency),
            None => {
                let table = CostRuleTable::standard(currency);
                info!(rules = table.len(), "Using built-in cost table");
                Ok(table)
            }
        }
    }

    pub fn classifier(&self) -> Result<SeverityClassifier, EstimationError> {
        SeverityClassifier::new(SeverityThresholds {
            confidence: ThresholdPair::new(self.confidence_moderate, self.confidence_severe)?,
            area: ThresholdPair::new(self.area_moderate, self.area_severe)?,
        })
    }

    pub fn resolver(&self) -> Result<OverrideResolver, EstimationError> {
        OverrideResolver::new(EstimationDefaults {
            labor_rate: self.labor_rate,
            markup_percentage: self.markup_percentage,
            currency: self.currency()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engine_config_builds() {
        let engine = EngineConfig::default();
        assert_eq!(engine.cost_table().unwrap().len(), 33);
        assert!(engine.classifier().is_ok());
        assert_eq!(engine.resolver().unwrap().defaults().labor_rate, dec!(75));
    }

    #[test]
    fn test_unknown_currency_rejected() {
        let engine = EngineConfig {
            currency: "XYZ".to_string(),
            ..EngineConfig::default()
        };
        assert!(matches!(engine.resolver(), Err(EstimationError::Financial(_))));
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let engine = EngineConfig {
            area_moderate: 0.5,
            area_severe: 0.1,
            ..EngineConfig::default()
        };
        assert!(matches!(engine.classifier(), Err(EstimationError::InvalidThresholds(_))));
    }

    fn load_from(vars: &[(&str, &str)]) -> Result<ApiConfig, config::ConfigError> {
        let source = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<config::Map<String, String>>();
        ApiConfig::load(ApiConfig::environment().source(Some(source)))
    }

    #[test]
    fn test_engine_settings_from_environment() {
        let config = load_from(&[
            ("API_PORT", "9090"),
            ("API_ENGINE__LABOR_RATE", "90"),
            ("API_ENGINE__CURRENCY", "EUR"),
            ("API_ENGINE__COST_TABLE_PATH", "/etc/costs.json"),
        ])
        .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.engine.labor_rate, dec!(90));
        assert_eq!(config.engine.currency, "EUR");
        assert_eq!(config.engine.cost_table_path.as_deref(), Some("/etc/costs.json"));
        assert_eq!(config.engine.markup_percentage, dec!(20.0));
    }

    #[test]
    fn test_malformed_value_is_an_error() {
        let result = load_from(&[
            ("API_PORT", "not-a-port"),
            ("API_ENGINE__LABOR_RATE", "90"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_variables_yields_defaults() {
        let config = load_from(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.engine.labor_rate, dec!(75.00));
    }

    #[test]
    fn test_server_addr() {
        let config = ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ..ApiConfig::default()
        };
        assert_eq!(config.server_addr(), "127.0.0.1:3000");
    }
}
