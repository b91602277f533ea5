//! Lot-size calculator request and result value objects

use serde::{Deserialize, Serialize};

/// Inputs of the risk-based lot-size calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotSizeRequest {
    /// Account equity in USD
    pub account_size: f64,
    /// Percentage of equity risked on the trade (1.0 = 1%)
    pub risk_percent: f64,
    /// Distance to the stop loss in pips
    pub stop_loss_pips: f64,
}

impl LotSizeRequest {
    /// Create a new lot-size request with validation
    ///
    /// # Arguments
    /// * `account_size` - Equity (must be >= 0)
    /// * `risk_percent` - Risk per trade (0 < x <= 100)
    /// * `stop_loss_pips` - Stop distance (must be > 0)
    pub fn new(account_size: f64, risk_percent: f64, stop_loss_pips: f64) -> Result<Self, String> {
        let request = Self {
            account_size,
            risk_percent,
            stop_loss_pips,
        };
        request.validate()?;
        Ok(request)
    }

    /// Validate this request
    pub fn validate(&self) -> Result<(), String> {
        if !self.account_size.is_finite() || self.account_size < 0.0 {
            return Err("account_size must be non-negative".to_string());
        }
        if !self.risk_percent.is_finite() || self.risk_percent <= 0.0 || self.risk_percent > 100.0 {
            return Err("risk_percent must be in range (0, 100]".to_string());
        }
        if !self.stop_loss_pips.is_finite() || self.stop_loss_pips <= 0.0 {
            return Err("stop_loss_pips must be positive".to_string());
        }
        Ok(())
    }
}

impl Default for LotSizeRequest {
    fn default() -> Self {
        Self {
            account_size: 10_000.0,
            risk_percent: 1.0,
            stop_loss_pips: 50.0,
        }
    }
}

/// Result of the lot-size calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotSizeResult {
    /// USD lost if the stop is hit
    pub risk_amount: f64,
    /// Risk amount per pip
    pub value_per_pip: f64,
    /// Suggested standard lots, rounded to the 0.01 lot step
    pub recommended_lots: f64,
}
