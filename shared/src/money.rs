//! Money calculation utilities using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted to
//! `f64` for storage/serialization. Totals are fixed when an order is
//! created and never recomputed afterwards.

use crate::error::{AppError, ErrorCode};
use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// GST-style tax applied to the item total (5%)
pub const TAX_RATE_PERCENT: u32 = 5;

/// Flat delivery fee applied to any non-empty order
pub const DELIVERY_FEE: f64 = 20.0;

/// Maximum allowed price per item
const MAX_PRICE: f64 = 100_000.0;
/// Maximum allowed quantity per line
const MAX_QUANTITY: i64 = 99;

/// Convert an f64 into a Decimal, treating non-finite input as zero
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Round a Decimal to money precision and convert back to f64
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Validate a unit price coming from the menu table
pub fn validate_price(price: f64) -> Result<(), AppError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::with_message(
            ErrorCode::MenuItemInvalidPrice,
            format!("price must be a non-negative number, got {price}"),
        ));
    }
    if price > MAX_PRICE {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("price exceeds maximum allowed ({MAX_PRICE}), got {price}"),
        ));
    }
    Ok(())
}

/// Validate a requested line quantity
pub fn validate_quantity(quantity: i64) -> Result<(), AppError> {
    if quantity <= 0 {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("quantity must be positive, got {quantity}"),
        ));
    }
    if quantity > MAX_QUANTITY {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("quantity exceeds maximum allowed ({MAX_QUANTITY}), got {quantity}"),
        ));
    }
    Ok(())
}

/// Line total for one order item (unit price x quantity)
pub fn line_total(unit_price: f64, quantity: i64) -> f64 {
    to_f64(to_decimal(unit_price) * Decimal::from(quantity))
}

/// Computed order totals, all at money precision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTotals {
    pub item_total: f64,
    pub tax: f64,
    pub delivery_fee: f64,
    pub total_amount: f64,
}

/// Compute order totals from line totals.
///
/// Tax is 5% of the item total; the flat delivery fee applies to any
/// non-empty order. Accumulation runs in Decimal so repeated additions
/// cannot drift.
pub fn order_totals(line_totals: &[f64]) -> OrderTotals {
    let item_total: Decimal = line_totals.iter().map(|v| to_decimal(*v)).sum();
    let tax = item_total * Decimal::from(TAX_RATE_PERCENT) / Decimal::from(100);
    let delivery_fee = if item_total > Decimal::ZERO {
        to_decimal(DELIVERY_FEE)
    } else {
        Decimal::ZERO
    };
    let total = item_total + tax + delivery_fee;

    OrderTotals {
        item_total: to_f64(item_total),
        tax: to_f64(tax),
        delivery_fee: to_f64(delivery_fee),
        total_amount: to_f64(total),
    }
}

/// Express an amount in the gateway's minor unit (paise)
pub fn to_minor_units(amount: f64) -> i64 {
    (to_decimal(amount) * Decimal::from(100))
        .round()
        .to_i64()
        .unwrap_or(0)
}
