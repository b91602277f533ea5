//! Risk-based lot sizing for XAUUSD and the contract specification shown next to it.

use serde::Serialize;

use crate::domain::errors::ToolError;
use crate::domain::value_objects::position_sizing::{LotSizeRequest, LotSizeResult};

/// USD value of one pip per unit in the calculator's model
const PIP_VALUE_PER_UNIT: f64 = 1.0;
/// Units per standard lot as displayed by the calculator
const UNITS_PER_LOT: f64 = 10.0;
/// Smallest tradable step
pub const MIN_LOT: f64 = 0.01;

/// One row of the contract specification table
#[derive(Debug, Clone, Serialize)]
pub struct ContractSpec {
    pub label: &'static str,
    pub value: &'static str,
}

pub fn contract_specs() -> Vec<ContractSpec> {
    vec![
        ContractSpec { label: "Contract Size", value: "100 Ounces" },
        ContractSpec { label: "Min Lot", value: "0.01 Lot" },
        ContractSpec { label: "Max Leverage", value: "1:1000" },
        ContractSpec { label: "Margin Requirement", value: "0.10%" },
        ContractSpec { label: "Market Swaps", value: "Long: -42.1 / Short: 28.5" },
    ]
}

pub struct PositionSizer;

impl PositionSizer {
    /// risk = equity * risk%; lots = risk / (pips * pip value) / 10
    pub fn calculate(request: &LotSizeRequest) -> Result<LotSizeResult, ToolError> {
        request.validate().map_err(ToolError::InvalidInput)?;

        let risk_amount = request.account_size * (request.risk_percent / 100.0);
        let value_per_pip = risk_amount / (request.stop_loss_pips * PIP_VALUE_PER_UNIT);
        let lots = value_per_pip / UNITS_PER_LOT;

        Ok(LotSizeResult {
            risk_amount: round_to(risk_amount, 0.01),
            value_per_pip,
            recommended_lots: round_to(lots, MIN_LOT),
        })
    }
}

fn round_to(value: f64, step: f64) -> f64 {
    (value / step).round() * step
}
