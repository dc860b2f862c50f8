//! Raw wire records and their mapping into domain types.
//!
//! The backend's query API returns loosely-shaped JSON rows; joined
//! relations may come back as a single object or a one-element array
//! depending on the relationship cardinality the query planner infers.
//! Every field here is optional so a record can always be deserialized, and
//! [`map_product_record`] is total: missing fields map to defaults and a
//! missing nested relation never makes the mapping fail.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use house_core::{Product, ProductId, SellerId};

/// Joined relation that may arrive as one object or an array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// First element, however the relation was shaped.
    pub fn into_first(self) -> Option<T> {
        match self {
            Self::One(value) => Some(value),
            Self::Many(values) => values.into_iter().next(),
        }
    }
}

/// Raw media row joined onto a product.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaRecord {
    pub url: Option<String>,
    pub media_type: Option<String>,
}

/// Raw product row as returned by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductRecord {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub currency: Option<String>,
    pub images: Option<Vec<String>>,
    pub category: Option<String>,
    pub in_stock: Option<bool>,
    pub rating: Option<Decimal>,
    pub review_count: Option<u32>,
    pub seller_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub product_media: Option<Vec<MediaRecord>>,
}

/// Raw cart row with its joined product relation.
#[derive(Debug, Clone, Deserialize)]
pub struct CartRecord {
    pub quantity: Option<u32>,
    pub products: Option<OneOrMany<ProductRecord>>,
}

/// Raw favorites/watch-later row with its joined product relation.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionRecord {
    pub product_id: Option<String>,
    pub products: Option<OneOrMany<ProductRecord>>,
}

/// Map a raw product row into a [`Product`] snapshot.
///
/// Total function: every missing field gets a default. Image URLs fall back
/// to the joined `product_media` relation when the denormalized `images`
/// column is absent.
#[must_use]
pub fn map_product_record(record: ProductRecord) -> Product {
    let images = record.images.unwrap_or_default();
    let images = if images.is_empty() {
        record
            .product_media
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| m.url)
            .collect()
    } else {
        images
    };

    Product {
        id: ProductId::new(record.id.unwrap_or_default()),
        title: record.title.unwrap_or_default(),
        description: record.description.unwrap_or_default(),
        price: record.price.unwrap_or_default(),
        original_price: record.original_price,
        currency: record.currency.unwrap_or_else(|| "UZS".to_string()),
        images,
        category: record.category.unwrap_or_default(),
        in_stock: record.in_stock.unwrap_or(true),
        rating: record.rating,
        review_count: record.review_count,
        seller_id: SellerId::new(record.seller_id.unwrap_or_default()),
        created_at: record.created_at,
    }
}
