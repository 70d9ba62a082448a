use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::context::ContextValue;

/// A concrete order line as entered, checked after the governing policy is known.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLineItem {
    #[serde(default)]
    pub product_id: Option<ContextValue>,
    pub quantity: Decimal,
    #[serde(default)]
    pub discount_pct: Decimal,
    pub base_price: Decimal,
    pub final_price: Decimal,
}

impl SaleLineItem {
    pub fn new(
        quantity: Decimal,
        discount_pct: Decimal,
        base_price: Decimal,
        final_price: Decimal,
    ) -> Self {
        Self { product_id: None, quantity, discount_pct, base_price, final_price }
    }

    pub fn has_markup(&self) -> bool {
        self.final_price > self.base_price
    }

    /// Markup over the base price in percent, `(final - base) / base * 100`.
    /// `None` when a zero base price is marked up. A negative base yields a
    /// negative ratio.
    pub fn markup_pct(&self) -> Option<Decimal> {
        if !self.has_markup() {
            return Some(Decimal::ZERO);
        }
        if self.base_price.is_zero() {
            return None;
        }

        (self.final_price - self.base_price)
            .checked_div(self.base_price)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
    }
}
