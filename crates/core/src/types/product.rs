//! Product snapshots and cart line items.
//!
//! A [`Product`] is an immutable *snapshot* of a listing as it looked when
//! the user interacted with it. It is copied into cart/favorites state at
//! add-time and does not track live price or stock changes; the backend
//! remains the source of truth for the current listing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ProductId, SellerId};

/// Snapshot of a marketplace listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    /// Price in the listing's original currency.
    pub price: Decimal,
    /// Pre-discount price, when the seller set one.
    pub original_price: Option<Decimal>,
    /// ISO 4217 code the price was entered in. Kept as a plain string: the
    /// backend accepts any code, not just the display-currency set.
    pub currency: String,
    pub images: Vec<String>,
    pub category: String,
    pub in_stock: bool,
    pub rating: Option<Decimal>,
    pub review_count: Option<u32>,
    pub seller_id: SellerId,
    pub created_at: Option<DateTime<Utc>>,
}

/// One line in the cart: a product snapshot plus a positive quantity.
///
/// Uniqueness key is the product id; the cart store merges duplicate adds
/// by summing quantities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// Line subtotal in the product's original currency.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: i64) -> Product {
        Product {
            id: ProductId::new("p-1"),
            title: "Ceramic mug".to_string(),
            description: String::new(),
            price: Decimal::from(price),
            original_price: None,
            currency: "UZS".to_string(),
            images: vec![],
            category: "home".to_string(),
            in_stock: true,
            rating: None,
            review_count: None,
            seller_id: SellerId::new("s-1"),
            created_at: None,
        }
    }

    #[test]
    fn test_line_total() {
        let item = CartItem {
            product: product(45_000),
            quantity: 3,
        };
        assert_eq!(item.line_total(), Decimal::from(135_000));
    }

    #[test]
    fn test_product_serde_roundtrip() {
        let p = product(100);
        let json = serde_json::to_string(&p).unwrap();
        let back: Product = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
