use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Instrument every generated or published signal is quoted on
pub const DEFAULT_PAIR: &str = "XAUUSD";

/// Probability strictly above this marks a signal VIP-only
pub const VIP_PROBABILITY_THRESHOLD: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalDirection {
    Buy,
    Sell,
}

impl std::fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalDirection::Buy => write!(f, "BUY"),
            SignalDirection::Sell => write!(f, "SELL"),
        }
    }
}

impl std::str::FromStr for SignalDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Ok(SignalDirection::Buy),
            "SELL" => Ok(SignalDirection::Sell),
            other => Err(format!("Invalid direction '{}'. Must be 'BUY' or 'SELL'", other)),
        }
    }
}

/// Lifecycle status. Nothing transitions it automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalStatus {
    Active,
    HitTp,
    HitSl,
    Closed,
}

/// A published trade recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeSignal {
    pub id: String,
    pub pair: String,
    #[serde(rename = "type")]
    pub direction: SignalDirection,
    pub entry: f64,
    pub sl: f64,
    pub tp1: f64,
    pub tp2: f64,
    pub timestamp: String,
    pub status: SignalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<String>,
    pub is_vip: bool,
    #[serde(default)]
    pub probability: f64,
}

/// Price levels of a signal before id/timestamp/status are assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalLevels {
    pub direction: SignalDirection,
    pub entry: f64,
    pub sl: f64,
    pub tp1: f64,
    pub tp2: f64,
}

impl SignalLevels {
    /// BUY needs sl < entry < tp1 < tp2, SELL the mirror image.
    pub fn is_consistent(&self) -> bool {
        match self.direction {
            SignalDirection::Buy => self.sl < self.entry && self.entry < self.tp1 && self.tp1 < self.tp2,
            SignalDirection::Sell => self.sl > self.entry && self.entry > self.tp1 && self.tp1 > self.tp2,
        }
    }
}

impl TradeSignal {
    /// Build an ACTIVE signal stamped now with a fresh id
    pub fn new(
        pair: &str,
        levels: SignalLevels,
        probability: f64,
        is_vip: bool,
        ai_analysis: Option<String>,
    ) -> Self {
        TradeSignal {
            id: generate_signal_id(),
            pair: pair.to_string(),
            direction: levels.direction,
            entry: levels.entry,
            sl: levels.sl,
            tp1: levels.tp1,
            tp2: levels.tp2,
            timestamp: Utc::now().to_rfc3339(),
            status: SignalStatus::Active,
            ai_analysis,
            is_vip,
            probability,
        }
    }

    pub fn levels(&self) -> SignalLevels {
        SignalLevels {
            direction: self.direction,
            entry: self.entry,
            sl: self.sl,
            tp1: self.tp1,
            tp2: self.tp2,
        }
    }

    pub fn has_consistent_levels(&self) -> bool {
        self.levels().is_consistent()
    }
}

/// VIP gating is derived from model confidence, boundary exclusive
pub fn is_vip_probability(probability: f64) -> bool {
    probability > VIP_PROBABILITY_THRESHOLD
}

/// 9-character lowercase alphanumeric id
pub fn generate_signal_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buy_levels() -> SignalLevels {
        SignalLevels {
            direction: SignalDirection::Buy,
            entry: 2024.50,
            sl: 2018.00,
            tp1: 2035.00,
            tp2: 2045.00,
        }
    }

    #[test]
    fn test_vip_boundary_is_exclusive() {
        assert!(is_vip_probability(91.0));
        assert!(!is_vip_probability(90.0));
        assert!(is_vip_probability(90.01));
    }

    #[test]
    fn test_buy_levels_consistent() {
        assert!(buy_levels().is_consistent());
    }

    #[test]
    fn test_sell_levels_consistent() {
        let levels = SignalLevels {
            direction: SignalDirection::Sell,
            entry: 2055.20,
            sl: 2062.00,
            tp1: 2040.00,
            tp2: 2025.00,
        };
        assert!(levels.is_consistent());
    }

    #[test]
    fn test_inverted_stop_loss_is_inconsistent() {
        let mut levels = buy_levels();
        levels.sl = 2030.0;
        assert!(!levels.is_consistent());
    }

    #[test]
    fn test_new_signal_is_active_with_fresh_id() {
        let a = TradeSignal::new(DEFAULT_PAIR, buy_levels(), 85.0, false, None);
        let b = TradeSignal::new(DEFAULT_PAIR, buy_levels(), 85.0, false, None);
        assert_eq!(a.status, SignalStatus::Active);
        assert_eq!(a.id.len(), 9);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_wire_format_matches_stored_blob() {
        let signal = TradeSignal::new(DEFAULT_PAIR, buy_levels(), 92.0, true, Some("x".into()));
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["type"], "BUY");
        assert_eq!(json["status"], "ACTIVE");
        assert_eq!(json["isVip"], true);
        assert_eq!(json["aiAnalysis"], "x");
    }

    #[test]
    fn test_status_serializes_screaming_snake() {
        assert_eq!(serde_json::to_string(&SignalStatus::HitTp).unwrap(), "\"HIT_TP\"");
        assert_eq!(serde_json::to_string(&SignalStatus::HitSl).unwrap(), "\"HIT_SL\"");
    }

    #[test]
    fn test_direction_from_str() {
        assert_eq!("buy".parse::<SignalDirection>().unwrap(), SignalDirection::Buy);
        assert_eq!(" SELL ".parse::<SignalDirection>().unwrap(), SignalDirection::Sell);
        assert!("hold".parse::<SignalDirection>().is_err());
    }
}
