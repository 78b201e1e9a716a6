//! # Pricing Engine
//!
//! Turns a service selection and a buyer context into a [`PricingBreakdown`].
//!
//! Adjustments compound left to right on the running total, never on the
//! original subtotal:
//!
//! ```text
//! subtotal ──► market markup ──► contract signer ──► promo ──► bundle ──► total
//!               (× 1.15)          (× 0.75)           (× f)     (× 0.90)
//! ```
//!
//! Every step is skipped when its condition does not hold. The calculation is
//! pure and total: it never fails and never panics on well-typed input.

use crate::money::round_currency;
use crate::service::ServiceSelection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Named discount factors, passed explicitly into every calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscountPolicy {
    /// Share of the total collected up front, in (0, 1]
    pub deposit_fraction: Decimal,

    /// Markup multiplier for buyers in above-average markets, >= 1
    pub local_market_factor: Decimal,

    /// Multiplier kept when the buyer signs immediately, in (0, 1]
    pub contract_signer_factor: Decimal,

    /// Multiplier kept when two or more services are selected, in (0, 1]
    pub bundle_factor: Decimal,
}

impl Default for DiscountPolicy {
    fn default() -> Self {
        Self {
            deposit_fraction: Decimal::new(5, 1),
            local_market_factor: Decimal::new(115, 2),
            contract_signer_factor: Decimal::new(75, 2),
            bundle_factor: Decimal::new(90, 2),
        }
    }
}

/// Buyer-supplied flags that drive discount eligibility.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerContext {
    /// Business has been operating for less than a year
    #[serde(default)]
    pub new_business: bool,

    /// Buyer commits to the contract immediately
    #[serde(default)]
    pub ready_to_sign: bool,

    /// Buyer's local market prices run above the reference average
    #[serde(default)]
    pub local_market_high: bool,

    /// Raw promo code as typed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
}

impl BuyerContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_new_business(mut self, value: bool) -> Self {
        self.new_business = value;
        self
    }

    pub fn with_ready_to_sign(mut self, value: bool) -> Self {
        self.ready_to_sign = value;
        self
    }

    pub fn with_local_market_high(mut self, value: bool) -> Self {
        self.local_market_high = value;
        self
    }

    pub fn with_promo_code(mut self, code: impl Into<String>) -> Self {
        self.promo_code = Some(code.into());
        self
    }
}

/// Amount moved at each pricing step.
///
/// `market_adjustment` is an amount *added*; the other three are amounts
/// removed. `total` counts only the removals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountBreakdown {
    #[serde(default)]
    pub market_adjustment: Decimal,
    #[serde(default)]
    pub contract_signer: Decimal,
    #[serde(default)]
    pub new_sba: Decimal,
    #[serde(default)]
    pub bundle_savings: Decimal,
    #[serde(default)]
    pub total: Decimal,
}

impl DiscountBreakdown {
    /// Sum of the three reductions, excluding the market markup
    pub fn reductions(&self) -> Decimal {
        self.contract_signer + self.new_sba + self.bundle_savings
    }

    /// True if no step moved the price
    pub fn is_empty(&self) -> bool {
        self.market_adjustment.is_zero()
            && self.contract_signer.is_zero()
            && self.new_sba.is_zero()
            && self.bundle_savings.is_zero()
    }
}

/// The engine's sole output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingBreakdown {
    pub subtotal: Decimal,
    #[serde(default)]
    pub discounts: DiscountBreakdown,
    pub total: Decimal,
    pub deposit: Decimal,
    #[serde(default)]
    pub remaining: Decimal,
}

impl PricingBreakdown {
    /// Round every amount to cents for display or the wire.
    ///
    /// `remaining` is derived from the rounded total and deposit so the split
    /// still adds up exactly.
    pub fn rounded(&self) -> Self {
        let total = round_currency(self.total);
        let deposit = round_currency(self.deposit);
        Self {
            subtotal: round_currency(self.subtotal),
            discounts: DiscountBreakdown {
                market_adjustment: round_currency(self.discounts.market_adjustment),
                contract_signer: round_currency(self.discounts.contract_signer),
                new_sba: round_currency(self.discounts.new_sba),
                bundle_savings: round_currency(self.discounts.bundle_savings),
                total: round_currency(self.discounts.total),
            },
            total,
            deposit,
            remaining: total.saturating_sub(deposit),
        }
    }
}

/// Compute the price breakdown for a selection.
///
/// `promo_factor` is the already-resolved factor of a valid promo code (see
/// [`crate::promo::PromoTable::resolve`]). It only applies to new businesses,
/// and factors outside (0, 1] are ignored.
///
/// The returned breakdown keeps full precision; call
/// [`PricingBreakdown::rounded`] before showing it.
pub fn calculate_pricing(
    services: &[ServiceSelection],
    context: &BuyerContext,
    promo_factor: Option<Decimal>,
    policy: &DiscountPolicy,
) -> PricingBreakdown {
    // Saturating arithmetic: client-supplied prices must never panic the engine.
    let subtotal = services
        .iter()
        .fold(Decimal::ZERO, |acc, s| acc.saturating_add(s.base_price));
    let mut discounts = DiscountBreakdown::default();
    let mut running = subtotal;

    if context.local_market_high {
        let increase = running.saturating_mul(policy.local_market_factor - Decimal::ONE);
        running = running.saturating_add(increase);
        discounts.market_adjustment = increase;
    }

    if context.ready_to_sign {
        let reduction = running.saturating_mul(Decimal::ONE - policy.contract_signer_factor);
        running = running.saturating_sub(reduction);
        discounts.contract_signer = reduction;
    }

    if let Some(factor) = promo_factor.filter(|f| is_valid_factor(*f)) {
        if context.new_business {
            let reduction = running.saturating_mul(Decimal::ONE - factor);
            running = running.saturating_sub(reduction);
            discounts.new_sba = reduction;
        }
    }

    if services.len() > 1 {
        let reduction = running.saturating_mul(Decimal::ONE - policy.bundle_factor);
        running = running.saturating_sub(reduction);
        discounts.bundle_savings = reduction;
    }

    // Adding the markup back leaves exactly the three reductions.
    discounts.total = subtotal
        .saturating_sub(running)
        .saturating_add(discounts.market_adjustment);

    let total = running.max(Decimal::ZERO);
    let deposit = total.saturating_mul(policy.deposit_fraction).max(Decimal::ZERO);

    PricingBreakdown {
        subtotal,
        discounts,
        total,
        deposit,
        remaining: total.saturating_sub(deposit),
    }
}

fn is_valid_factor(factor: Decimal) -> bool {
    factor > Decimal::ZERO && factor <= Decimal::ONE
}
