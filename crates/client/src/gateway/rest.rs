//! REST adapter for the hosted backend's query API.
//!
//! Speaks the backend's PostgREST-style conventions: tables under
//! `/rest/v1/`, `eq.` filters in the query string, joined relations selected
//! with `products(*)`. The API key goes in both the `apikey` and
//! `Authorization` headers.

use std::sync::Arc;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, instrument};

use house_core::{CartItem, Product, ProductId, UserId};

use crate::config::ClientConfig;

use super::records::{CartRecord, CollectionRecord, map_product_record};
use super::{CollectionKind, GatewayError, RemoteGateway};

/// How much response body to keep in error messages and logs.
const BODY_SNIPPET_LEN: usize = 200;

/// Production gateway adapter over the backend REST API.
///
/// Cheaply cloneable; holds a shared `reqwest::Client`.
#[derive(Clone)]
pub struct RestGateway {
    inner: Arc<RestGatewayInner>,
}

struct RestGatewayInner {
    client: reqwest::Client,
    base: String,
    api_key: SecretString,
}

#[derive(Debug, Deserialize)]
struct QuantityRow {
    quantity: Option<u32>,
}

impl RestGateway {
    /// Create a new gateway adapter from configuration.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        let base = config.gateway_url.as_str().trim_end_matches('/').to_string();
        Self {
            inner: Arc::new(RestGatewayInner {
                client: reqwest::Client::new(),
                base,
                api_key: config.gateway_api_key.clone(),
            }),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.inner.base)
    }

    /// Send a request with auth headers and normalize failure responses.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, GatewayError> {
        let response = request
            .header("apikey", self.inner.api_key.expose_secret())
            .header(
                "Authorization",
                format!("Bearer {}", self.inner.api_key.expose_secret()),
            )
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(GatewayError::RateLimited(retry_after));
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(GatewayError::Unauthenticated);
        }

        // Body as text first for better error diagnostics
        let text = response.text().await?;

        if !status.is_success() {
            error!(
                status = %status,
                body = %text.chars().take(BODY_SNIPPET_LEN).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: text.chars().take(BODY_SNIPPET_LEN).collect(),
            });
        }

        Ok(text)
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        let text = self.send(request).await?;
        serde_json::from_str(&text).map_err(|e| {
            error!(
                error = %e,
                body = %text.chars().take(BODY_SNIPPET_LEN).collect::<String>(),
                "Failed to parse backend response"
            );
            GatewayError::Parse(e)
        })
    }

    /// Current stored quantity for a cart row, if any.
    async fn cart_quantity(
        &self,
        user: &UserId,
        product: &ProductId,
    ) -> Result<Option<u32>, GatewayError> {
        let rows: Vec<QuantityRow> = self
            .send_json(self.inner.client.get(self.table_url("cart")).query(&[
                ("user_id", format!("eq.{user}")),
                ("product_id", format!("eq.{product}")),
                ("select", "quantity".to_string()),
            ]))
            .await?;
        Ok(rows.into_iter().next().and_then(|r| r.quantity))
    }
}

impl RemoteGateway for RestGateway {
    #[instrument(skip(self), fields(user = %user))]
    async fn fetch_cart(&self, user: &UserId) -> Result<Vec<CartItem>, GatewayError> {
        let rows: Vec<CartRecord> = self
            .send_json(self.inner.client.get(self.table_url("cart")).query(&[
                ("user_id", format!("eq.{user}")),
                ("select", "quantity,products(*,product_media(*))".to_string()),
            ]))
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let product = row.products.and_then(super::records::OneOrMany::into_first)?;
                Some(CartItem {
                    product: map_product_record(product),
                    quantity: row.quantity.unwrap_or(1).max(1),
                })
            })
            .collect())
    }

    #[instrument(skip(self), fields(user = %user, product = %product))]
    async fn add_to_cart(
        &self,
        user: &UserId,
        product: &ProductId,
        quantity: u32,
    ) -> Result<(), GatewayError> {
        // Merge server-side by summing with any existing row
        match self.cart_quantity(user, product).await? {
            Some(existing) => {
                self.update_cart_quantity(user, product, existing.saturating_add(quantity))
                    .await
            }
            None => {
                self.send(
                    self.inner
                        .client
                        .post(self.table_url("cart"))
                        .header("Prefer", "return=minimal")
                        .json(&json!([{
                            "user_id": user,
                            "product_id": product,
                            "quantity": quantity,
                        }])),
                )
                .await?;
                Ok(())
            }
        }
    }

    #[instrument(skip(self), fields(user = %user, product = %product))]
    async fn update_cart_quantity(
        &self,
        user: &UserId,
        product: &ProductId,
        quantity: u32,
    ) -> Result<(), GatewayError> {
        self.send(
            self.inner
                .client
                .patch(self.table_url("cart"))
                .query(&[
                    ("user_id", format!("eq.{user}")),
                    ("product_id", format!("eq.{product}")),
                ])
                .header("Prefer", "return=minimal")
                .json(&json!({ "quantity": quantity })),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(user = %user, product = %product))]
    async fn remove_from_cart(
        &self,
        user: &UserId,
        product: &ProductId,
    ) -> Result<(), GatewayError> {
        self.send(self.inner.client.delete(self.table_url("cart")).query(&[
            ("user_id", format!("eq.{user}")),
            ("product_id", format!("eq.{product}")),
        ]))
        .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(user = %user))]
    async fn clear_cart(&self, user: &UserId) -> Result<(), GatewayError> {
        self.send(
            self.inner
                .client
                .delete(self.table_url("cart"))
                .query(&[("user_id", format!("eq.{user}"))]),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(user = %user, kind = ?kind))]
    async fn fetch_collection(
        &self,
        user: &UserId,
        kind: CollectionKind,
    ) -> Result<Vec<Product>, GatewayError> {
        let rows: Vec<CollectionRecord> = self
            .send_json(self.inner.client.get(self.table_url(kind.table())).query(&[
                ("user_id", format!("eq.{user}")),
                (
                    "select",
                    "product_id,products(*,product_media(*))".to_string(),
                ),
            ]))
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| row.products.and_then(super::records::OneOrMany::into_first))
            .map(map_product_record)
            .collect())
    }

    #[instrument(skip(self), fields(user = %user, kind = ?kind, product = %product))]
    async fn add_to_collection(
        &self,
        user: &UserId,
        kind: CollectionKind,
        product: &ProductId,
    ) -> Result<(), GatewayError> {
        self.send(
            self.inner
                .client
                .post(self.table_url(kind.table()))
                .header("Prefer", "return=minimal")
                .json(&json!([{
                    "user_id": user,
                    "product_id": product,
                }])),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(user = %user, kind = ?kind, product = %product))]
    async fn remove_from_collection(
        &self,
        user: &UserId,
        kind: CollectionKind,
        product: &ProductId,
    ) -> Result<(), GatewayError> {
        self.send(
            self.inner
                .client
                .delete(self.table_url(kind.table()))
                .query(&[
                    ("user_id", format!("eq.{user}")),
                    ("product_id", format!("eq.{product}")),
                ]),
        )
        .await?;
        Ok(())
    }
}
