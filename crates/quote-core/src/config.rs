//! # Pricing Configuration
//!
//! Discount factors, promo codes, and the service catalog, loaded from a TOML
//! file such as `config/pricing.toml`. Every section is optional and falls
//! back to the built-in values.
//!
//! ```toml
//! [policy]
//! deposit_fraction = 0.5
//! local_market_factor = 1.15
//! contract_signer_factor = 0.75
//! bundle_factor = 0.9
//!
//! [promo_codes.newbuddy]
//! factor = 0.8
//! description = "20% off for new businesses"
//! requires_new_business = true
//!
//! [[services]]
//! category = "web"
//! key = "landing"
//! name = "Landing Page"
//! base_price = 1200
//! ```

use crate::pricing::DiscountPolicy;
use crate::promo::PromoTable;
use crate::service::{ServiceCatalog, ServiceOffering};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors loading or validating pricing configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse pricing config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid pricing config: {0}")]
    Invalid(String),
}

/// Everything the pricing engine and promo lookup are configured with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default)]
    pub policy: DiscountPolicy,

    #[serde(default = "PromoTable::builtin")]
    pub promo_codes: PromoTable,

    #[serde(default = "builtin_services")]
    pub services: Vec<ServiceOffering>,
}

fn builtin_services() -> Vec<ServiceOffering> {
    ServiceCatalog::builtin().services
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            policy: DiscountPolicy::default(),
            promo_codes: PromoTable::builtin(),
            services: builtin_services(),
        }
    }
}

impl PricingConfig {
    /// Parse and validate a TOML document
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut config: PricingConfig = toml::from_str(toml_str)?;
        config.promo_codes = config.promo_codes.normalized();
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// The service catalog view of `services`
    pub fn catalog(&self) -> ServiceCatalog {
        ServiceCatalog {
            services: self.services.clone(),
        }
    }

    /// Reject factors that would make the engine's output meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.policy;
        check_unit_interval("policy.deposit_fraction", p.deposit_fraction)?;
        check_unit_interval("policy.contract_signer_factor", p.contract_signer_factor)?;
        check_unit_interval("policy.bundle_factor", p.bundle_factor)?;
        if p.local_market_factor < Decimal::ONE {
            return Err(ConfigError::Invalid(format!(
                "policy.local_market_factor must be >= 1, got {}",
                p.local_market_factor
            )));
        }

        for (code, promo) in self.promo_codes.iter() {
            check_unit_interval(&format!("promo_codes.{}.factor", code), promo.factor)?;
            if promo.description.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "promo_codes.{}.description is empty",
                    code
                )));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for service in &self.services {
            if service.base_price < Decimal::ZERO {
                return Err(ConfigError::Invalid(format!(
                    "service {} has a negative base_price",
                    service.id()
                )));
            }
            if !seen.insert(service.id()) {
                return Err(ConfigError::Invalid(format!(
                    "service {} is defined twice",
                    service.id()
                )));
            }
        }

        Ok(())
    }
}

fn check_unit_interval(name: &str, value: Decimal) -> Result<(), ConfigError> {
    if value > Decimal::ZERO && value <= Decimal::ONE {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{} must be in (0, 1], got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PricingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.catalog().services.len(), 6);
        assert_eq!(config.promo_codes.len(), 2);
    }

    #[test]
    fn test_empty_document_uses_builtins() {
        let config = PricingConfig::from_toml("").unwrap();
        assert_eq!(config.policy, DiscountPolicy::default());
        assert!(config.promo_codes.get("newbuddy").is_some());
        assert!(config.catalog().get("content:videoEditing").is_some());
    }

    #[test]
    fn test_full_document() {
        let toml_str = r#"
            [policy]
            deposit_fraction = 0.3
            bundle_factor = 0.85

            [promo_codes.SPRING]
            factor = 0.9
            description = "Spring special"

            [[services]]
            category = "web"
            key = "shop"
            name = "Online Shop"
            base_price = 4200
            description = "Storefront with checkout"
        "#;
        let config = PricingConfig::from_toml(toml_str).unwrap();

        assert_eq!(config.policy.deposit_fraction, Decimal::new(3, 1));
        assert_eq!(config.policy.bundle_factor, Decimal::new(85, 2));
        // Unspecified factors keep their defaults.
        assert_eq!(config.policy.contract_signer_factor, Decimal::new(75, 2));
        assert!(config.promo_codes.get("spring").is_some());
        assert!(config.promo_codes.get("newbuddy").is_none());

        let catalog = config.catalog();
        assert_eq!(catalog.services.len(), 1);
        assert_eq!(catalog.get("web:shop").unwrap().base_price, Decimal::new(4200, 0));
    }

    #[test]
    fn test_invalid_factors_rejected() {
        let err = PricingConfig::from_toml("[policy]\ndeposit_fraction = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = PricingConfig::from_toml("[policy]\nlocal_market_factor = 0.9\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = PricingConfig::from_toml(
            "[promo_codes.bad]\nfactor = 1.5\ndescription = \"too generous\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_duplicate_service_rejected() {
        let toml_str = r#"
            [[services]]
            category = "web"
            key = "landing"
            name = "Landing Page"
            base_price = 1200

            [[services]]
            category = "web"
            key = "landing"
            name = "Landing Page Again"
            base_price = 900
        "#;
        assert!(matches!(
            PricingConfig::from_toml(toml_str),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            PricingConfig::from_toml("[policy\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_shipped_config_matches_builtins() {
        let config = PricingConfig::from_toml(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../config/pricing.toml"
        )))
        .unwrap();

        assert_eq!(config.policy, DiscountPolicy::default());
        assert_eq!(config.promo_codes, PromoTable::builtin());
        let shipped: Vec<_> = config.services.iter().map(|s| (s.id(), s.base_price)).collect();
        let builtin: Vec<_> = builtin_services().iter().map(|s| (s.id(), s.base_price)).collect();
        assert_eq!(shipped, builtin);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            PricingConfig::from_file("/nonexistent/pricing.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
