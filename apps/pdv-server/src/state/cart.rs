//! # Cart Store
//!
//! One PDV cart per signed-in user, kept in memory.
//!
//! ## Thread Safety
//! All carts sit behind a single `Mutex`. Critical sections are pure cart
//! operations; the lock is never held across an `.await`, so checkout
//! snapshots the cart, releases the lock, writes the sale, then clears.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Store Operations                                │
//! │                                                                         │
//! │  Request                       CartStore              Cart change       │
//! │  ───────                       ─────────              ───────────       │
//! │  GET    /api/pdv/cart ───────► with_cart() ─────────► (read only)      │
//! │  POST   /api/pdv/cart/items ─► with_cart_mut() ─────► add_product()    │
//! │  PUT    .../items/{id} ──────► with_cart_mut() ─────► update_quantity()│
//! │  DELETE .../items/{id} ──────► with_cart_mut() ─────► remove_item()    │
//! │  POST   /api/pdv/checkout ───► with_cart() ─► sale ─► clear_if_unchanged│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use pdv_core::cart::Cart;

/// Carts keyed by user id. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct CartStore {
    carts: Arc<Mutex<HashMap<String, Cart>>>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes a function with read access to the user's cart.
    ///
    /// A user without a cart sees an empty one.
    pub fn with_cart<F, R>(&self, user_id: &str, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let carts = self.carts.lock().unwrap_or_else(PoisonError::into_inner);
        match carts.get(user_id) {
            Some(cart) => f(cart),
            None => f(&Cart::new()),
        }
    }

    /// Executes a function with write access to the user's cart.
    ///
    /// ```rust,ignore
    /// state.carts.with_cart_mut(&user.id, |cart| cart.add_product(&product, 1))?;
    /// ```
    pub fn with_cart_mut<F, R>(&self, user_id: &str, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut carts = self.carts.lock().unwrap_or_else(PoisonError::into_inner);
        f(carts.entry(user_id.to_string()).or_default())
    }

    /// Clears the cart only if it still equals `snapshot`.
    ///
    /// Returns `false` when the cart changed while the sale was written.
    pub fn clear_if_unchanged(&self, user_id: &str, snapshot: &Cart) -> bool {
        let mut carts = self.carts.lock().unwrap_or_else(PoisonError::into_inner);
        match carts.get(user_id) {
            Some(cart) if cart == snapshot => {
                carts.remove(user_id);
                true
            }
            _ => false,
        }
    }

    /// Drops the user's cart (sign-out).
    pub fn discard(&self, user_id: &str) {
        self.carts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdv_core::Money;

    #[test]
    fn test_carts_are_per_user() {
        let store = CartStore::new();

        store
            .with_cart_mut("u1", |c| c.add_item("p1", "Café", Money::from_cents(1000), 2))
            .unwrap();

        assert_eq!(store.with_cart("u1", |c| c.lines.len()), 1);
        assert!(store.with_cart("u2", |c| c.is_empty()));
    }

    #[test]
    fn test_clear_if_unchanged() {
        let store = CartStore::new();
        store
            .with_cart_mut("u1", |c| c.add_item("p1", "Café", Money::from_cents(1000), 1))
            .unwrap();

        let snapshot = store.with_cart("u1", Cart::clone);

        store
            .with_cart_mut("u1", |c| c.add_item("p2", "Pão", Money::from_cents(75), 1))
            .unwrap();
        assert!(!store.clear_if_unchanged("u1", &snapshot));
        assert_eq!(store.with_cart("u1", |c| c.lines.len()), 2);

        let snapshot = store.with_cart("u1", Cart::clone);
        assert!(store.clear_if_unchanged("u1", &snapshot));
        assert!(store.with_cart("u1", |c| c.is_empty()));
    }

    #[test]
    fn test_discard() {
        let store = CartStore::new();
        store
            .with_cart_mut("u1", |c| c.add_item("p1", "Café", Money::from_cents(1000), 1))
            .unwrap();
        store.discard("u1");
        assert!(store.with_cart("u1", |c| c.is_empty()));
    }
}
