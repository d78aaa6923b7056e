use serde::{Deserialize, Serialize};

use crate::{Symbol, ValidationError};

/// Point-in-time market view of a symbol.
///
/// The extended fields are `None` when only the base quote was requested.
/// When extended data was requested but could not be fetched, `short_float`
/// and `avg_volume` are `Some(0.0)` and `market_cap` stays `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: Symbol,
    pub current_price: f64,
    pub change_pct: f64,
    pub volume: u64,
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_float: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
}

impl MarketSnapshot {
    /// Builds a base snapshot from the last price and previous close.
    pub fn from_quote(
        symbol: Symbol,
        current_price: f64,
        previous_close: Option<f64>,
        volume: Option<u64>,
        currency: Option<String>,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("current_price", current_price)?;

        Ok(Self {
            symbol,
            current_price,
            change_pct: change_pct(current_price, previous_close),
            volume: volume.unwrap_or(0),
            currency,
            short_float: None,
            avg_volume: None,
            market_cap: None,
        })
    }

    pub fn with_extended(
        mut self,
        short_float: Option<f64>,
        avg_volume: Option<f64>,
        market_cap: Option<f64>,
    ) -> Self {
        self.short_float = Some(finite_or_zero(short_float));
        self.avg_volume = Some(finite_or_zero(avg_volume));
        self.market_cap = market_cap.filter(|value| value.is_finite());
        self
    }

    /// Marks extended fields as requested but unavailable.
    pub fn with_extended_unavailable(mut self) -> Self {
        self.short_float = Some(0.0);
        self.avg_volume = Some(0.0);
        self.market_cap = None;
        self
    }

    /// Short interest as a fraction of float, absent treated as zero.
    pub fn short_float_or_zero(&self) -> f64 {
        self.short_float.unwrap_or(0.0)
    }

    pub fn avg_volume_or_zero(&self) -> f64 {
        self.avg_volume.unwrap_or(0.0)
    }
}

/// Percent change from the previous close; zero when there is no usable
/// previous close.
pub fn change_pct(current_price: f64, previous_close: Option<f64>) -> f64 {
    match previous_close {
        Some(previous) if previous != 0.0 && previous.is_finite() => {
            (current_price - previous) / previous * 100.0
        }
        _ => 0.0,
    }
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|value| value.is_finite()).unwrap_or(0.0)
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
