//! # Promo Redemption Counter
//!
//! Capacity-limited promo codes ("first 25 clients") need somewhere to count
//! redemptions. The pricing engine never sees this; resolution asks the
//! counter for remaining slots before handing out a factor.

use crate::error::{CheckoutError, CheckoutResult};
use crate::pricing::BuyerContext;
use crate::promo::{normalize_code, PromoTable, PromoValidation, FULLY_REDEEMED_MESSAGE};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Tracks how many times capacity-limited codes have been used.
#[async_trait]
pub trait RedemptionCounter: Send + Sync {
    /// Slots left for a code. Codes the counter does not track have none.
    async fn remaining_slots(&self, code: &str) -> CheckoutResult<u32>;

    /// Claim one slot. The check and the increment are a single step, so two
    /// buyers racing for the last slot cannot both succeed.
    async fn record_redemption(&self, code: &str) -> CheckoutResult<()>;

    /// Give back a slot claimed for a checkout that was never created
    async fn release_redemption(&self, code: &str) -> CheckoutResult<()>;
}

/// Type alias for a shared redemption counter (dynamic dispatch)
pub type BoxedRedemptionCounter = Arc<dyn RedemptionCounter>;

#[derive(Debug, Clone, Copy)]
struct Slot {
    capacity: u32,
    used: u32,
}

/// Process-local counter, seeded from the promo table's capacities.
///
/// Counts reset on restart.
#[derive(Debug, Default)]
pub struct InMemoryRedemptionCounter {
    slots: RwLock<HashMap<String, Slot>>,
}

impl InMemoryRedemptionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track every limited code in the table
    pub fn from_table(table: &PromoTable) -> Self {
        let slots = table
            .iter()
            .filter_map(|(code, promo)| {
                promo
                    .limited_quantity
                    .map(|capacity| (code.clone(), Slot { capacity, used: 0 }))
            })
            .collect();
        Self {
            slots: RwLock::new(slots),
        }
    }

    /// Builder: track a code with an initial usage count
    pub fn with_usage(self, code: &str, capacity: u32, used: u32) -> Self {
        if let Ok(mut slots) = self.slots.write() {
            slots.insert(normalize_code(code), Slot { capacity, used });
        }
        self
    }
}

fn poisoned() -> CheckoutError {
    CheckoutError::Internal("redemption counter lock poisoned".to_string())
}

#[async_trait]
impl RedemptionCounter for InMemoryRedemptionCounter {
    async fn remaining_slots(&self, code: &str) -> CheckoutResult<u32> {
        let slots = self.slots.read().map_err(|_| poisoned())?;
        Ok(slots
            .get(&normalize_code(code))
            .map(|slot| slot.capacity.saturating_sub(slot.used))
            .unwrap_or(0))
    }

    async fn record_redemption(&self, code: &str) -> CheckoutResult<()> {
        let mut slots = self.slots.write().map_err(|_| poisoned())?;
        match slots.get_mut(&normalize_code(code)) {
            Some(slot) if slot.used < slot.capacity => {
                slot.used += 1;
                Ok(())
            }
            Some(_) => Err(CheckoutError::InvalidPromoCode {
                code: code.to_string(),
                message: FULLY_REDEEMED_MESSAGE.to_string(),
            }),
            None => Err(CheckoutError::InvalidPromoCode {
                code: code.to_string(),
                message: "Promo code is not capacity-limited".to_string(),
            }),
        }
    }

    async fn release_redemption(&self, code: &str) -> CheckoutResult<()> {
        let mut slots = self.slots.write().map_err(|_| poisoned())?;
        if let Some(slot) = slots.get_mut(&normalize_code(code)) {
            slot.used = slot.used.saturating_sub(1);
        }
        Ok(())
    }
}

/// Resolve a code, then reject it if its capacity is used up.
///
/// Codes without a `limited_quantity` never consult the counter.
pub async fn resolve_with_capacity(
    table: &PromoTable,
    counter: &dyn RedemptionCounter,
    raw: &str,
    context: &BuyerContext,
) -> CheckoutResult<PromoValidation> {
    let validation = table.resolve(raw, context);
    if !validation.valid {
        return Ok(validation);
    }

    let limited = table
        .get(raw)
        .map(|promo| promo.limited_quantity.is_some())
        .unwrap_or(false);
    if limited && counter.remaining_slots(raw).await? == 0 {
        return Ok(PromoValidation::rejected(
            validation.code,
            FULLY_REDEEMED_MESSAGE,
        ));
    }

    Ok(validation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counter_seeded_from_table() {
        let table = PromoTable::builtin();
        let counter = InMemoryRedemptionCounter::from_table(&table);

        assert_eq!(counter.remaining_slots("santafe25").await.unwrap(), 25);
        assert_eq!(counter.remaining_slots("SANTAFE25 ").await.unwrap(), 25);
        // Unlimited codes are not tracked.
        assert_eq!(counter.remaining_slots("newbuddy").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_record_redemption() {
        let counter = InMemoryRedemptionCounter::new().with_usage("first3", 3, 1);

        counter.record_redemption("first3").await.unwrap();
        assert_eq!(counter.remaining_slots("first3").await.unwrap(), 1);
        counter.record_redemption("first3").await.unwrap();
        assert_eq!(counter.remaining_slots("first3").await.unwrap(), 0);
        assert!(counter.record_redemption("first3").await.is_err());
        assert!(counter.record_redemption("untracked").await.is_err());
    }

    #[tokio::test]
    async fn test_release_redemption() {
        let counter = InMemoryRedemptionCounter::new().with_usage("last1", 1, 0);

        counter.record_redemption("last1").await.unwrap();
        assert_eq!(counter.remaining_slots("last1").await.unwrap(), 0);
        counter.release_redemption("LAST1").await.unwrap();
        assert_eq!(counter.remaining_slots("last1").await.unwrap(), 1);

        // Releasing more than was claimed never grows capacity.
        counter.release_redemption("last1").await.unwrap();
        assert_eq!(counter.remaining_slots("last1").await.unwrap(), 1);
        counter.release_redemption("untracked").await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_never_overshoot() {
        let counter = Arc::new(InMemoryRedemptionCounter::new().with_usage("santafe25", 25, 20));

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let counter = counter.clone();
                tokio::spawn(async move { counter.record_redemption("santafe25").await.is_ok() })
            })
            .collect();

        let mut claimed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                claimed += 1;
            }
        }

        assert_eq!(claimed, 5);
        assert_eq!(counter.remaining_slots("santafe25").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_exhausted_code_rejected() {
        let table = PromoTable::builtin();
        let counter = InMemoryRedemptionCounter::from_table(&table).with_usage("santafe25", 25, 25);

        let result = resolve_with_capacity(&table, &counter, "santafe25", &BuyerContext::new())
            .await
            .unwrap();
        assert!(!result.valid);
        assert_eq!(result.message, FULLY_REDEEMED_MESSAGE);
        assert_eq!(result.factor(), None);
    }

    #[tokio::test]
    async fn test_unlimited_code_skips_counter() {
        let table = PromoTable::builtin();
        let counter = InMemoryRedemptionCounter::new();
        let context = BuyerContext::new().with_new_business(true);

        let result = resolve_with_capacity(&table, &counter, "newbuddy", &context)
            .await
            .unwrap();
        assert!(result.valid);
    }

    #[tokio::test]
    async fn test_invalid_code_passes_through() {
        let table = PromoTable::builtin();
        let counter = InMemoryRedemptionCounter::from_table(&table);

        let result = resolve_with_capacity(&table, &counter, "nope", &BuyerContext::new())
            .await
            .unwrap();
        assert!(!result.valid);
        assert_eq!(result.message, "Invalid promo code");
    }
}
