//! Aggregate root persisted under a single key.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use super::post::Post;
use super::signal::{SignalDirection, SignalStatus, TradeSignal, DEFAULT_PAIR};
use super::user::User;

/// Key the whole application state is stored under
pub const DB_KEY: &str = "gold_master_db";

/// Newest-first signal list is truncated to this many entries
pub const MAX_SIGNALS: usize = 50;

/// Admin-authored ticker keeps at most this many messages
pub const MAX_TICKER_MESSAGES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub notifications: bool,
    pub auto_vip: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notifications: true,
            auto_vip: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppDatabase {
    pub signals: Vec<TradeSignal>,
    pub posts: Vec<Post>,
    pub user: Option<User>,
    pub ticker_messages: Vec<String>,
    pub settings: Settings,
}

impl AppDatabase {
    /// State written on first access
    pub fn seed() -> Self {
        let now = Utc::now();

        // Seeded signals all carry probability 85 regardless of their reference values
        let signals = vec![
            TradeSignal {
                id: "s1".to_string(),
                pair: DEFAULT_PAIR.to_string(),
                direction: SignalDirection::Buy,
                entry: 2024.50,
                sl: 2018.00,
                tp1: 2035.00,
                tp2: 2045.00,
                timestamp: now.to_rfc3339(),
                status: SignalStatus::Active,
                ai_analysis: Some(
                    "Bullish divergence observed on H1. Strong support at 2020 handled well."
                        .to_string(),
                ),
                is_vip: false,
                probability: 85.0,
            },
            TradeSignal {
                id: "s2".to_string(),
                pair: DEFAULT_PAIR.to_string(),
                direction: SignalDirection::Sell,
                entry: 2055.20,
                sl: 2062.00,
                tp1: 2040.00,
                tp2: 2025.00,
                timestamp: (now - Duration::hours(1)).to_rfc3339(),
                status: SignalStatus::Active,
                ai_analysis: Some(
                    "Double top rejection at psychological resistance. Profit target 1 hit."
                        .to_string(),
                ),
                is_vip: true,
                probability: 85.0,
            },
        ];

        let posts = vec![Post {
            id: "p1".to_string(),
            author: "Alex Trades".to_string(),
            content: "XAUUSD showing strong rejection at 2020. Watch for reversal.".to_string(),
            likes: 42,
            timestamp: now.to_rfc3339(),
            avatar: "https://picsum.photos/seed/alex/100/100".to_string(),
            is_vip: true,
        }];

        AppDatabase {
            signals,
            posts,
            user: None,
            ticker_messages: vec![
                "HIGH VOLATILITY ALERT: US CPI IN 2H 15M".to_string(),
                "XAUUSD HIT R1 (2042.80) - OVERBOUGHT SIGNALS".to_string(),
            ],
            settings: Settings::default(),
        }
    }
}
