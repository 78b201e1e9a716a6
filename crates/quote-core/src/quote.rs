//! # Quote and Checkout Session Types
//!
//! A [`CheckoutQuote`] is the finalized (services, buyer, pricing) triple the
//! front end sends once the buyer confirms. A [`CheckoutSession`] is what the
//! payment provider hands back.

use crate::error::{CheckoutError, CheckoutResult};
use crate::money::{round_currency, to_fixed, to_minor_units};
use crate::pricing::{BuyerContext, PricingBreakdown};
use crate::service::{validate_selections, ServiceSelection};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// The intake form as submitted: contact details plus pricing flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeForm {
    #[serde(default)]
    pub business_name: String,

    #[serde(default)]
    pub contact_email: String,

    #[serde(default)]
    pub contact_phone: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,

    /// Sent as either a number or a string depending on the form version
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub years_active: Option<String>,

    #[serde(flatten)]
    pub context: BuyerContext,
}

impl IntakeForm {
    /// Check the fields checkout cannot do without.
    pub fn validate(&self) -> CheckoutResult<()> {
        if self.business_name.trim().is_empty() {
            return Err(CheckoutError::validation("businessName", "is required"));
        }
        validate_email(&self.contact_email)?;
        let digits = self.contact_phone.chars().filter(|c| c.is_ascii_digit()).count();
        if digits < 7 {
            return Err(CheckoutError::validation(
                "contactPhone",
                "must be a valid phone number",
            ));
        }
        Ok(())
    }

    /// Non-empty website URL, if one was given
    pub fn website(&self) -> Option<&str> {
        self.website_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Minimal shape check: one `@`, something on both sides, a dot in the domain.
pub fn validate_email(email: &str) -> CheckoutResult<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(CheckoutError::validation(
            "contactEmail",
            "must be a valid email address",
        ))
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) if s.trim().is_empty() => None,
        Some(Raw::Text(s)) => Some(s.trim().to_string()),
        Some(Raw::Int(n)) => Some(n.to_string()),
        Some(Raw::Float(n)) => Some(n.to_string()),
        None => None,
    })
}

/// Checkout mode. Deposits are always one-time payments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutMode {
    /// One-time payment
    #[default]
    Payment,
}

impl CheckoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutMode::Payment => "payment",
        }
    }
}

/// A confirmed quote ready to be turned into a checkout session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutQuote {
    pub services: Vec<ServiceSelection>,

    pub form_data: IntakeForm,

    /// Trusted as computed by the caller
    pub pricing: PricingBreakdown,

    /// Prevents duplicate sessions when the caller retries
    #[serde(default = "generate_idempotency_key")]
    pub idempotency_key: String,
}

fn generate_idempotency_key() -> String {
    Uuid::new_v4().to_string()
}

impl CheckoutQuote {
    /// Create a quote with a fresh idempotency key
    pub fn new(
        services: Vec<ServiceSelection>,
        form_data: IntakeForm,
        pricing: PricingBreakdown,
    ) -> Self {
        Self {
            services,
            form_data,
            pricing,
            idempotency_key: generate_idempotency_key(),
        }
    }

    /// Set idempotency key
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = key.into();
        self
    }

    /// Check what the adapter needs before any network call.
    ///
    /// Pricing arithmetic is not re-checked.
    pub fn validate(&self) -> CheckoutResult<()> {
        if self.services.is_empty() {
            return Err(CheckoutError::validation("services", "select at least one service"));
        }
        validate_selections(&self.services)?;
        validate_email(&self.form_data.contact_email)?;
        self.deposit_cents().map(|_| ())
    }

    /// Deposit in cents, rejecting amounts the provider cannot charge
    pub fn deposit_cents(&self) -> CheckoutResult<i64> {
        let cents = to_minor_units(self.pricing.deposit).ok_or_else(|| {
            CheckoutError::InvalidRequest(format!(
                "Deposit amount out of range: {}",
                self.pricing.deposit
            ))
        })?;
        if cents <= 0 {
            return Err(CheckoutError::InvalidRequest(
                "Deposit amount must be greater than zero".to_string(),
            ));
        }
        Ok(cents)
    }

    /// Line item title, e.g. "Project Deposit (50%)"
    pub fn deposit_label(&self) -> String {
        if self.pricing.total <= Decimal::ZERO {
            return "Project Deposit".to_string();
        }
        self.pricing
            .deposit
            .checked_div(self.pricing.total)
            .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
            .and_then(|percent| percent.round().to_i64())
            .map(|percent| format!("Project Deposit ({}%)", percent))
            .unwrap_or_else(|| "Project Deposit".to_string())
    }

    /// Service names, comma separated
    pub fn service_summary(&self) -> String {
        self.services
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Promo code as typed, if any
    pub fn promo_code(&self) -> Option<&str> {
        self.form_data
            .context
            .promo_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Key/value pairs attached to the provider session. Values are strings
    /// because that is all the provider's metadata accepts.
    pub fn metadata(&self) -> BTreeMap<String, String> {
        let form = &self.form_data;
        let pricing = &self.pricing;
        let names: Vec<&str> = self.services.iter().map(|s| s.name.as_str()).collect();

        let mut meta = BTreeMap::new();
        meta.insert("businessName".to_string(), form.business_name.trim().to_string());
        meta.insert("email".to_string(), form.contact_email.trim().to_string());
        meta.insert("phone".to_string(), form.contact_phone.trim().to_string());
        if let Some(url) = form.website() {
            meta.insert("websiteUrl".to_string(), url.to_string());
        }
        if let Some(years) = &form.years_active {
            meta.insert("yearsActive".to_string(), years.clone());
        }
        meta.insert(
            "services".to_string(),
            serde_json::to_string(&names).unwrap_or_default(),
        );
        meta.insert("subtotal".to_string(), to_fixed(pricing.subtotal));
        meta.insert("discount".to_string(), to_fixed(pricing.discounts.total));
        meta.insert("total".to_string(), to_fixed(pricing.total));
        meta.insert("depositAmount".to_string(), to_fixed(pricing.deposit));
        meta.insert(
            "remaining".to_string(),
            to_fixed(round_currency(pricing.total).saturating_sub(round_currency(pricing.deposit))),
        );
        if let Some(code) = self.promo_code() {
            meta.insert("promoCode".to_string(), crate::promo::normalize_code(code));
        }
        meta.insert("idempotencyKey".to_string(), self.idempotency_key.clone());
        meta
    }
}

/// Status of a checkout session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStatus {
    /// Session created, awaiting payment
    #[default]
    Open,
    /// Payment completed successfully
    Complete,
    /// Session expired
    Expired,
}

/// A checkout session created by a payment provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider's session ID
    pub session_id: String,

    /// Provider name (e.g., "stripe", "mock")
    pub provider: String,

    /// URL to redirect the buyer to
    pub checkout_url: String,

    /// Amount the session will charge, in cents
    pub amount_cents: i64,

    #[serde(default)]
    pub status: CheckoutStatus,

    /// When the session expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// The key the session was created under
    pub idempotency_key: String,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl CheckoutSession {
    /// Create a new checkout session
    pub fn new(
        session_id: impl Into<String>,
        provider: impl Into<String>,
        checkout_url: impl Into<String>,
        amount_cents: i64,
        idempotency_key: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            provider: provider.into(),
            checkout_url: checkout_url.into(),
            amount_cents,
            status: CheckoutStatus::Open,
            expires_at: None,
            idempotency_key: idempotency_key.into(),
            created_at: Utc::now(),
        }
    }

    /// Check if session is still valid
    pub fn is_active(&self) -> bool {
        matches!(self.status, CheckoutStatus::Open)
            && self.expires_at.map(|exp| exp > Utc::now()).unwrap_or(true)
    }
}
