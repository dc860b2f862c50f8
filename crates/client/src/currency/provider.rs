//! Exchange rate providers.
//!
//! The production provider fetches the central bank's published JSON table.
//! Rates there are quoted as "`Rate` UZS per `Nominal` units of `Ccy`", so
//! each entry is normalized to a per-unit rate. Entries that fail to parse
//! are skipped rather than failing the whole table.

use std::collections::HashMap;
use std::future::Future;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{instrument, warn};

use super::BASE_CURRENCY;

/// Errors from the rate provider.
#[derive(Debug, Error)]
pub enum RateError {
    /// HTTP request or body decode failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("Rate provider error: HTTP {status}")]
    Api { status: u16 },
}

/// Source of the full exchange rate table.
///
/// `Send` futures and a `'static` bound so the cache can refresh in a
/// background task.
pub trait RateProvider: Send + Sync + 'static {
    /// Fetch the full table: currency code to per-unit rate against the
    /// base currency.
    fn fetch_rates(
        &self,
    ) -> impl Future<Output = Result<HashMap<String, Decimal>, RateError>> + Send;
}

/// One row of the central bank's published table.
#[derive(Debug, Deserialize)]
struct CbuRate {
    #[serde(rename = "Ccy")]
    code: Option<String>,
    #[serde(rename = "Rate")]
    rate: Option<String>,
    #[serde(rename = "Nominal")]
    nominal: Option<String>,
}

/// Rate provider backed by the Central Bank of Uzbekistan JSON archive.
#[derive(Debug, Clone)]
pub struct CbuRateProvider {
    client: reqwest::Client,
    url: String,
}

impl CbuRateProvider {
    /// Create a provider for the given endpoint.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl RateProvider for CbuRateProvider {
    #[instrument(skip(self))]
    fn fetch_rates(
        &self,
    ) -> impl Future<Output = Result<HashMap<String, Decimal>, RateError>> + Send {
        let client = self.client.clone();
        let url = self.url.clone();
        async move {
            let response = client.get(&url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(RateError::Api {
                    status: status.as_u16(),
                });
            }
            let rows: Vec<CbuRate> = response.json().await?;
            Ok(build_table(rows))
        }
    }
}

/// Normalize raw rows into a per-unit rate table. The base currency always
/// maps to 1.
fn build_table(rows: Vec<CbuRate>) -> HashMap<String, Decimal> {
    let mut rates = HashMap::from([(BASE_CURRENCY.to_string(), Decimal::ONE)]);
    for row in rows {
        let (Some(code), Some(raw_rate)) = (row.code, row.rate) else {
            continue;
        };
        let Ok(rate) = raw_rate.parse::<Decimal>() else {
            warn!(%code, rate = %raw_rate, "Unparseable rate, skipping");
            continue;
        };
        // Rate is per `nominal` units; normalize to one unit
        let nominal = row
            .nominal
            .and_then(|n| n.parse::<Decimal>().ok())
            .filter(|n| !n.is_zero())
            .unwrap_or(Decimal::ONE);
        rates.insert(code, rate / nominal);
    }
    rates
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(code: &str, rate: &str, nominal: &str) -> CbuRate {
        CbuRate {
            code: Some(code.to_string()),
            rate: Some(rate.to_string()),
            nominal: Some(nominal.to_string()),
        }
    }

    #[test]
    fn test_build_table_normalizes_nominal() {
        let rates = build_table(vec![
            row("USD", "12132.48", "1"),
            // Quoted per 10 units
            row("KGS", "1387.10", "10"),
        ]);
        assert_eq!(rates.get("USD").unwrap(), &"12132.48".parse().unwrap());
        assert_eq!(rates.get("KGS").unwrap(), &"138.71".parse().unwrap());
        // Base currency is always present at 1
        assert_eq!(rates.get("UZS").unwrap(), &Decimal::ONE);
    }

    #[test]
    fn test_build_table_skips_bad_rows() {
        let rates = build_table(vec![
            row("USD", "not-a-number", "1"),
            CbuRate {
                code: None,
                rate: Some("1".to_string()),
                nominal: None,
            },
            row("EUR", "14360.00", "0"), // zero nominal treated as 1
        ]);
        assert!(!rates.contains_key("USD"));
        assert_eq!(rates.get("EUR").unwrap(), &"14360.00".parse().unwrap());
    }

    #[test]
    fn test_cbu_row_deserializes() {
        let json = r#"{"Ccy":"USD","CcyNm_EN":"US Dollar","Rate":"12132.48","Nominal":"1","Diff":"12.2","Date":"29.08.2026"}"#;
        let parsed: CbuRate = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.code.as_deref(), Some("USD"));
        assert_eq!(parsed.rate.as_deref(), Some("12132.48"));
    }
}
