//! Simulated XAUUSD quote driving the dashboard.
//!
//! The quote starts at a base price and takes a uniform random step in
//! `[-max_step, +max_step)` on every tick of the price timer.

use rand::Rng;
use serde::Serialize;
use std::sync::RwLock;

use crate::domain::value_objects::price::Price;

/// Daily change shown on the price card
pub const DISPLAYED_DAILY_CHANGE: f64 = 1.24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Bullish,
    Bearish,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Bullish => write!(f, "Bullish"),
            Trend::Bearish => write!(f, "Bearish"),
        }
    }
}

/// Pivot with three resistances above and three supports below
#[derive(Debug, Clone, Serialize)]
pub struct KeyLevels {
    pub resistance: [f64; 3],
    pub pivot: f64,
    pub support: [f64; 3],
}

impl Default for KeyLevels {
    fn default() -> Self {
        Self {
            resistance: [2065.20, 2054.50, 2042.80],
            pivot: 2028.50,
            support: [2012.30, 2005.10, 1992.40],
        }
    }
}

impl KeyLevels {
    pub fn trend_at(&self, price: Price) -> Trend {
        if price.value() >= self.pivot {
            Trend::Bullish
        } else {
            Trend::Bearish
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub symbol: &'static str,
    pub price: f64,
    pub change: f64,
    pub trend: Trend,
}

pub struct MarketFeed {
    price: RwLock<Price>,
    max_step: f64,
    levels: KeyLevels,
}

impl MarketFeed {
    pub fn new(base: Price, max_step: f64) -> Self {
        Self {
            price: RwLock::new(base),
            max_step: max_step.abs(),
            levels: KeyLevels::default(),
        }
    }

    pub fn price(&self) -> Price {
        match self.price.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn levels(&self) -> &KeyLevels {
        &self.levels
    }

    pub fn quote(&self) -> Quote {
        let price = self.price();
        Quote {
            symbol: "XAUUSD",
            price: price.value(),
            change: DISPLAYED_DAILY_CHANGE,
            trend: self.levels.trend_at(price),
        }
    }

    /// Apply one random step and return the new price
    pub fn tick<R: Rng + ?Sized>(&self, rng: &mut R) -> Price {
        let delta = if self.max_step > 0.0 {
            rng.gen_range(-self.max_step..self.max_step)
        } else {
            0.0
        };
        let mut guard = match self.price.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = guard.nudge(delta);
        *guard
    }
}
