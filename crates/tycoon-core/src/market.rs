//! Per-resource sell prices with a bounded multiplicative random walk.
//!
//! Each tick every listed price is multiplied by a factor drawn uniformly
//! from `[0.98, 1.02]` and then floored at 1. There is no ceiling.

use crate::resource::{Ledger, ResourceKind};
use crate::rng::SimRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Prices never fall below this.
pub const MIN_PRICE: f64 = 1.0;

/// Lower bound of the per-tick drift factor.
pub const DRIFT_LOW: f64 = 0.98;

/// Upper bound of the per-tick drift factor.
pub const DRIFT_HIGH: f64 = 1.02;

/// Largest selectable sell amount.
pub const MAX_SELL_AMOUNT: u32 = 1_000_000;

/// Sell amounts move by this factor per step.
pub const AMOUNT_STEP_FACTOR: u32 = 10;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Direction for stepping a selected sell amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountStep {
    Increase,
    Decrease,
}

/// A completed sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub resource: ResourceKind,
    pub amount: u32,
    pub value: f64,
}

/// Errors raised by market operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarketError {
    #[error("{0} is not traded on the market")]
    NotListed(ResourceKind),

    #[error("not enough {resource} to sell: need {needed}, have {available}")]
    Insufficient {
        resource: ResourceKind,
        needed: u32,
        available: f64,
    },
}

// ---------------------------------------------------------------------------
// Market
// ---------------------------------------------------------------------------

/// Current unit prices of listed resources and the selected sell amounts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Market {
    prices: BTreeMap<ResourceKind, f64>,
    amounts: BTreeMap<ResourceKind, u32>,
}

impl Market {
    /// A market listing the given resources at their base prices, with every
    /// sell amount at 1.
    pub fn new(listings: impl IntoIterator<Item = (ResourceKind, f64)>) -> Self {
        let mut market = Self::default();
        for (kind, price) in listings {
            market.list(kind, price);
        }
        market
    }

    /// Current price, or `None` if the resource is not listed.
    pub fn price(&self, kind: ResourceKind) -> Option<f64> {
        self.prices.get(&kind).copied()
    }

    /// List a resource (or reset its price) at `price`, floored at the minimum.
    /// Money cannot be listed.
    pub fn list(&mut self, kind: ResourceKind, price: f64) {
        if kind == ResourceKind::Money {
            return;
        }
        self.prices.insert(kind, price.max(MIN_PRICE));
    }

    pub fn is_listed(&self, kind: ResourceKind) -> bool {
        self.prices.contains_key(&kind)
    }

    pub fn prices(&self) -> &BTreeMap<ResourceKind, f64> {
        &self.prices
    }

    /// Replace every listing wholesale.
    pub fn replace_prices(&mut self, prices: BTreeMap<ResourceKind, f64>) {
        self.prices.clear();
        for (kind, price) in prices {
            self.list(kind, price);
        }
    }

    /// Apply one tick of drift to every listed price.
    pub fn drift(&mut self, rng: &mut SimRng) {
        for price in self.prices.values_mut() {
            *price = (*price * rng.range(DRIFT_LOW, DRIFT_HIGH)).max(MIN_PRICE);
        }
    }

    // -- Sell amounts --

    /// Selected sell amount for a resource (1 if never changed).
    pub fn amount(&self, kind: ResourceKind) -> u32 {
        self.amounts.get(&kind).copied().unwrap_or(1)
    }

    pub fn amounts(&self) -> &BTreeMap<ResourceKind, u32> {
        &self.amounts
    }

    /// Restore a selected amount. Anything that is not a power of ten in
    /// `1..=MAX_SELL_AMOUNT` is rounded down to the nearest one that is.
    pub fn set_amount(&mut self, kind: ResourceKind, amount: u32) {
        let mut valid = 1;
        while valid < MAX_SELL_AMOUNT && valid * AMOUNT_STEP_FACTOR <= amount {
            valid *= AMOUNT_STEP_FACTOR;
        }
        self.amounts.insert(kind, valid);
    }

    /// Step the selected amount by a power of ten and return the new value.
    pub fn step_amount(&mut self, kind: ResourceKind, step: AmountStep) -> u32 {
        let current = self.amount(kind);
        let next = match step {
            AmountStep::Increase => current
                .saturating_mul(AMOUNT_STEP_FACTOR)
                .min(MAX_SELL_AMOUNT),
            AmountStep::Decrease => (current / AMOUNT_STEP_FACTOR).max(1),
        };
        self.amounts.insert(kind, next);
        next
    }

    // -- Selling --

    /// Value the selected amount would fetch right now.
    pub fn quote(&self, kind: ResourceKind) -> Result<f64, MarketError> {
        let price = self.price(kind).ok_or(MarketError::NotListed(kind))?;
        Ok(price * self.amount(kind) as f64)
    }

    /// Sell the selected amount of `kind` out of the ledger into money.
    /// Fails without touching the ledger if the resource is unlisted or the
    /// ledger holds less than the selected amount.
    pub fn sell(&self, kind: ResourceKind, ledger: &mut Ledger) -> Result<Sale, MarketError> {
        let value = self.quote(kind)?;
        let amount = self.amount(kind);
        let available = ledger.get(kind);
        if available < amount as f64 {
            return Err(MarketError::Insufficient {
                resource: kind,
                needed: amount,
                available,
            });
        }
        ledger.set(kind, available - amount as f64);
        ledger.add(ResourceKind::Money, value);
        Ok(Sale {
            resource: kind,
            amount,
            value,
        })
    }
}
