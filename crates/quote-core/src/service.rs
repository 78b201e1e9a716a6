//! # Service Types
//!
//! The agency's purchasable services and the buyer's selection of them.
//! The catalog is loaded from the `[[services]]` tables of the pricing config.

use crate::error::{CheckoutError, CheckoutResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// One line item the buyer has toggled on.
///
/// Built fresh on every toggle; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSelection {
    /// Stable key, unique within one calculation (e.g. "web:landing")
    pub id: String,

    /// Display name
    pub name: String,

    /// Price in major units before any discount
    pub base_price: Decimal,

    /// Grouping label, display only
    #[serde(default)]
    pub category: String,
}

/// Largest base price, in dollars, accepted for a single service
pub const MAX_BASE_PRICE: Decimal = Decimal::from_parts(10_000_000, 0, 0, false, 0);

/// Check a client-built selection: ids unique, prices within bounds.
pub fn validate_selections(services: &[ServiceSelection]) -> CheckoutResult<()> {
    let mut seen = HashSet::with_capacity(services.len());
    for service in services {
        if !seen.insert(service.id.as_str()) {
            return Err(CheckoutError::validation(
                "services",
                format!("Service selected twice: {}", service.id),
            ));
        }
        if service.base_price.abs() > MAX_BASE_PRICE {
            return Err(CheckoutError::validation(
                "services",
                format!("Price out of range for {}", service.id),
            ));
        }
    }
    Ok(())
}

impl ServiceSelection {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        base_price: Decimal,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            base_price,
            category: category.into(),
        }
    }
}

/// A service the agency offers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOffering {
    /// Category key (e.g. "web", "brand", "content")
    pub category: String,

    /// Service key within the category (e.g. "landing")
    pub key: String,

    /// Display name
    pub name: String,

    /// Starting price in major units
    #[serde(alias = "base_price")]
    pub base_price: Decimal,

    /// Short description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Whether this service can currently be ordered
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl ServiceOffering {
    pub fn new(
        category: impl Into<String>,
        key: impl Into<String>,
        name: impl Into<String>,
        base_price: Decimal,
    ) -> Self {
        Self {
            category: category.into(),
            key: key.into(),
            name: name.into(),
            base_price,
            description: String::new(),
            active: true,
        }
    }

    /// Builder: set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// The `category:key` identifier used by selections
    pub fn id(&self) -> String {
        format!("{}:{}", self.category, self.key)
    }

    /// Turn this offering into a selection at its list price
    pub fn select(&self) -> ServiceSelection {
        ServiceSelection::new(self.id(), self.name.clone(), self.base_price, self.category.clone())
    }
}

/// Service catalog (loaded from config)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceCatalog {
    #[serde(default)]
    pub services: Vec<ServiceOffering>,
}

impl ServiceCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            services: Vec::new(),
        }
    }

    /// The agency's published price list
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.add(ServiceOffering::new("web", "landing", "Landing Page", Decimal::new(1200, 0)));
        catalog.add(ServiceOffering::new("web", "basic", "Basic Site", Decimal::new(2500, 0)));
        catalog.add(ServiceOffering::new("brand", "logo", "Logo Design", Decimal::new(600, 0)));
        catalog.add(ServiceOffering::new("brand", "rebrand", "Re-Branding", Decimal::new(1800, 0)));
        catalog.add(ServiceOffering::new(
            "content",
            "photoRetouching",
            "Photo Retouching",
            Decimal::new(250, 0),
        ));
        catalog.add(ServiceOffering::new(
            "content",
            "videoEditing",
            "Video Editing",
            Decimal::new(700, 0),
        ));
        catalog
    }

    /// Add a service to the catalog
    pub fn add(&mut self, service: ServiceOffering) {
        self.services.push(service);
    }

    /// Find a service by its `category:key` identifier
    pub fn get(&self, id: &str) -> Option<&ServiceOffering> {
        let (category, key) = id.split_once(':')?;
        self.services
            .iter()
            .find(|s| s.category == category && s.key == key)
    }

    /// Get all active services
    pub fn active_services(&self) -> impl Iterator<Item = &ServiceOffering> {
        self.services.iter().filter(|s| s.active)
    }

    /// Active services grouped by category, in key order
    pub fn by_category(&self) -> BTreeMap<&str, Vec<&ServiceOffering>> {
        let mut grouped: BTreeMap<&str, Vec<&ServiceOffering>> = BTreeMap::new();
        for service in self.active_services() {
            grouped.entry(service.category.as_str()).or_default().push(service);
        }
        grouped
    }

    /// Build a selection from identifiers, rejecting unknown, inactive, or
    /// repeated services.
    pub fn select<S: AsRef<str>>(&self, ids: &[S]) -> CheckoutResult<Vec<ServiceSelection>> {
        let selections = ids
            .iter()
            .map(|id| {
                let id = id.as_ref();
                self.get(id)
                    .filter(|s| s.active)
                    .map(ServiceOffering::select)
                    .ok_or_else(|| {
                        CheckoutError::validation("services", format!("Unknown service: {}", id))
                    })
            })
            .collect::<CheckoutResult<Vec<_>>>()?;
        validate_selections(&selections)?;
        Ok(selections)
    }

    /// Check if catalog is empty
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offering_id_and_select() {
        let offering = ServiceOffering::new("brand", "logo", "Logo Design", Decimal::new(600, 0))
            .with_description("Primary mark plus two variants");

        assert_eq!(offering.id(), "brand:logo");
        let selection = offering.select();
        assert_eq!(selection.id, "brand:logo");
        assert_eq!(selection.base_price, Decimal::new(600, 0));
        assert_eq!(selection.category, "brand");
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = ServiceCatalog::builtin();

        let landing = catalog.get("web:landing").unwrap();
        assert_eq!(landing.base_price, Decimal::new(1200, 0));
        assert!(catalog.get("web:nope").is_none());
        assert!(catalog.get("landing").is_none());

        let grouped = catalog.by_category();
        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped["content"].len(), 2);
    }

    #[test]
    fn test_select_rejects_unknown_and_duplicates() {
        let catalog = ServiceCatalog::builtin();

        let picked = catalog.select(&["web:landing", "brand:logo"]).unwrap();
        assert_eq!(picked.len(), 2);

        assert!(catalog.select(&["web:landing", "web:landing"]).is_err());
        assert!(catalog.select(&["web:unknown"]).is_err());
    }

    #[test]
    fn test_validate_selections() {
        let landing = ServiceSelection::new("web:landing", "Landing Page", Decimal::new(1200, 0), "web");
        let logo = ServiceSelection::new("brand:logo", "Logo Design", Decimal::new(600, 0), "brand");
        assert!(validate_selections(&[landing.clone(), logo]).is_ok());
        assert!(validate_selections(&[]).is_ok());

        let err = validate_selections(&[landing.clone(), landing.clone()]).unwrap_err();
        assert!(matches!(err, CheckoutError::Validation { ref field, .. } if field == "services"));
        assert!(err.to_string().contains("selected twice"));

        let mut huge = landing;
        huge.base_price = "60000000000000000000000000000".parse().unwrap();
        assert!(validate_selections(&[huge.clone()]).is_err());
        huge.base_price = -huge.base_price;
        assert!(validate_selections(&[huge]).is_err());

        let at_limit = ServiceSelection::new("web:basic", "Basic Site", MAX_BASE_PRICE, "web");
        assert!(validate_selections(&[at_limit]).is_ok());
    }

    #[test]
    fn test_selection_wire_format() {
        let json = r#"{"id":"web:landing","name":"Landing Page","basePrice":1200,"category":"web"}"#;
        let selection: ServiceSelection = serde_json::from_str(json).unwrap();
        assert_eq!(selection.base_price, Decimal::new(1200, 0));
        assert_eq!(selection.name, "Landing Page");
    }
}
