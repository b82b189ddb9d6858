//! # Cart
//!
//! The PDV shopping cart: lines, discount/addition adjustments and totals.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Operator Action          Cart Method            Cart State Change      │
//! │  ───────────────          ───────────            ─────────────────      │
//! │                                                                         │
//! │  Scan / click product ──► add_item() ──────────► merge or push line    │
//! │  Change quantity ───────► update_quantity() ───► qty = n (≤0 removes)  │
//! │  Click remove ──────────► remove_item() ───────► line dropped          │
//! │  F4 / F5 ───────────────► set_discount() / set_addition()              │
//! │  F10 ───────────────────► clear() ─────────────► lines + adjustments   │
//! │  F9 ────────────────────► checkout() ──────────► NewSale request       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Totals
//! ```text
//! subtotal = Σ unit_price × quantity
//! discount = discount.value + subtotal × discount.percent
//! addition = addition.value + subtotal × addition.percent
//! total    = max(0, subtotal − discount + addition)
//! ```
//!
//! Every step is checked; a total that would overflow comes back as
//! [`ValidationError::Overflow`] instead of a wrong number.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{NewSale, NewSaleItem, PaymentMethod, Product};
use crate::validation::{validate_amount, validate_percent, validate_price, MAX_ADJUSTMENT_CENTS};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Adjustment
// =============================================================================

/// A discount or addition: flat value plus a percentage of the subtotal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Adjustment {
    /// Flat part.
    pub value: Money,
    /// Percentage part in basis points (1000 = 10%).
    pub percent_bps: u32,
}

impl Adjustment {
    pub const fn none() -> Self {
        Adjustment {
            value: Money::zero(),
            percent_bps: 0,
        }
    }

    pub const fn flat(value: Money) -> Self {
        Adjustment {
            value,
            percent_bps: 0,
        }
    }

    pub const fn percent(bps: u32) -> Self {
        Adjustment {
            value: Money::zero(),
            percent_bps: bps,
        }
    }

    /// Money amount of this adjustment for the given subtotal, or `None`
    /// on overflow.
    ///
    /// ```rust
    /// use pdv_core::cart::Adjustment;
    /// use pdv_core::money::Money;
    ///
    /// let adj = Adjustment { value: Money::from_cents(100), percent_bps: 1000 };
    /// assert_eq!(adj.amount(Money::from_cents(2500)).unwrap().cents(), 350);
    /// ```
    pub fn amount(&self, subtotal: Money) -> Option<Money> {
        subtotal.percentage(self.percent_bps)?.checked_add(self.value)
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero() && self.percent_bps == 0
    }

    fn validate(&self, field: &str) -> Result<(), ValidationError> {
        validate_amount(field, self.value.cents(), MAX_ADJUSTMENT_CENTS)?;
        validate_percent(field, self.percent_bps)
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One product in the cart. Name and price are frozen when added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
}

impl CartLine {
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The cart.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding the same product merges)
/// - Every line quantity is in `1..=MAX_ITEM_QUANTITY`
/// - At most `MAX_CART_ITEMS` lines
/// - Unit prices are in `0..=MAX_PRICE_CENTS`
/// - Adjustment values are in `0..=MAX_ADJUSTMENT_CENTS`, percentages at
///   most 100%
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub lines: Vec<CartLine>,
    pub discount: Adjustment,
    pub addition: Adjustment,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product, or raises the quantity of its existing line.
    pub fn add_item(
        &mut self,
        product_id: &str,
        name: &str,
        unit_price: Money,
        quantity: i64,
    ) -> CoreResult<()> {
        if quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }
        validate_price("unit_price", unit_price.cents())?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            let new_qty = line.quantity + quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            line.quantity = new_qty;
            return Ok(());
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
        if self.lines.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.lines.push(CartLine {
            product_id: product_id.to_string(),
            name: name.to_string(),
            unit_price,
            quantity,
        });
        Ok(())
    }

    /// Adds a catalog product at its current price. Out-of-stock products
    /// are refused.
    pub fn add_product(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        if !product.in_stock() {
            return Err(CoreError::OutOfStock {
                name: product.name.clone(),
            });
        }
        self.add_item(&product.id, &product.name, product.price(), quantity)
    }

    /// Sets a line's quantity. Zero or less removes the line.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove_item(product_id);
        }
        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::NotInCart(product_id.to_string())),
        }
    }

    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        if self.lines.len() == before {
            Err(CoreError::NotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Empties the cart and resets both adjustments.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.discount = Adjustment::none();
        self.addition = Adjustment::none();
    }

    pub fn set_discount(&mut self, discount: Adjustment) -> CoreResult<()> {
        discount.validate("discount")?;
        self.discount = discount;
        Ok(())
    }

    pub fn set_addition(&mut self, addition: Adjustment) -> CoreResult<()> {
        addition.validate("addition")?;
        self.addition = addition;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn subtotal(&self) -> CoreResult<Money> {
        self.lines
            .iter()
            .try_fold(Money::zero(), |acc, line| acc.checked_add(line.line_total()?))
            .ok_or_else(|| ValidationError::overflow("subtotal").into())
    }

    pub fn totals(&self) -> CoreResult<CartTotals> {
        let subtotal = self.subtotal()?;
        let discount = self
            .discount
            .amount(subtotal)
            .ok_or_else(|| ValidationError::overflow("discount"))?;
        let addition = self
            .addition
            .amount(subtotal)
            .ok_or_else(|| ValidationError::overflow("addition"))?;
        let total = subtotal
            .checked_sub(discount)
            .and_then(|m| m.checked_add(addition))
            .ok_or_else(|| ValidationError::overflow("total"))?;

        Ok(CartTotals {
            item_count: self.lines.len(),
            total_quantity: self.lines.iter().map(|l| l.quantity).sum(),
            subtotal,
            discount,
            addition,
            total: total.clamp_non_negative(),
        })
    }

    /// Turns the cart into a sale request for `user_id`.
    ///
    /// When `notes` is blank and an adjustment applies, the note records the
    /// breakdown: `Subtotal: R$ 25.00 | Desconto: R$ 2.00 | Acréscimo: R$ 0.00`.
    pub fn checkout(
        &self,
        user_id: &str,
        payment_method: PaymentMethod,
        notes: Option<String>,
    ) -> CoreResult<NewSale> {
        if self.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let totals = self.totals()?;
        let notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .or_else(|| {
                if totals.discount.is_positive() || totals.addition.is_positive() {
                    Some(format!(
                        "Subtotal: R$ {} | Desconto: R$ {} | Acréscimo: R$ {}",
                        totals.subtotal.to_decimal_string(),
                        totals.discount.to_decimal_string(),
                        totals.addition.to_decimal_string(),
                    ))
                } else {
                    None
                }
            });

        let sale = NewSale {
            user_id: user_id.to_string(),
            items: self
                .lines
                .iter()
                .map(|l| NewSaleItem {
                    product_id: l.product_id.clone(),
                    quantity: l.quantity,
                    unit_price_cents: l.unit_price.cents(),
                })
                .collect(),
            discount_cents: totals.discount.cents(),
            addition_cents: totals.addition.cents(),
            payment_method,
            notes,
        };
        sale.validate()?;
        Ok(sale)
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Cart totals summary for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
    pub discount: Money,
    pub addition: Money,
    pub total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
