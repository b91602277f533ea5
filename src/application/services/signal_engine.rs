use rand::Rng;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use super::insight_service::InsightService;
use crate::domain::entities::signal::{SignalDirection, SignalLevels, TradeSignal, DEFAULT_PAIR};
use crate::domain::services::market_feed::MarketFeed;
use crate::persistence::repository::{SessionRepository, SignalRepository};
use crate::persistence::StoreError;

const MANUAL_ANALYSIS: &str = "Manual expert override signal provided by system administrator.";

/// Admin signal form; defaults are the pre-filled values
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManualSignalForm {
    pub pair: String,
    #[serde(rename = "type")]
    pub direction: SignalDirection,
    pub entry: f64,
    pub sl: f64,
    pub tp1: f64,
    pub tp2: f64,
    pub is_vip: bool,
}

impl Default for ManualSignalForm {
    fn default() -> Self {
        Self {
            pair: DEFAULT_PAIR.to_string(),
            direction: SignalDirection::Buy,
            entry: 2024.50,
            sl: 2015.00,
            tp1: 2035.00,
            tp2: 2045.00,
            is_vip: false,
        }
    }
}

impl ManualSignalForm {
    /// ACTIVE signal with a random 80-99 probability
    pub fn into_signal<R: Rng + ?Sized>(self, rng: &mut R) -> Result<TradeSignal, String> {
        let pair = self.pair.trim();
        if pair.is_empty() {
            return Err("pair must not be empty".to_string());
        }
        if [self.entry, self.sl, self.tp1, self.tp2]
            .iter()
            .any(|p| !p.is_finite() || *p <= 0.0)
        {
            return Err("prices must be positive numbers".to_string());
        }
        let probability = rng.gen_range(80u32..100) as f64;
        Ok(TradeSignal::new(
            pair,
            SignalLevels {
                direction: self.direction,
                entry: self.entry,
                sl: self.sl,
                tp1: self.tp1,
                tp2: self.tp2,
            },
            probability,
            self.is_vip,
            Some(MANUAL_ANALYSIS.to_string()),
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Published(TradeSignal),
    NoSignal,
    /// Current user is not VIP
    Skipped,
}

/// Clears the syncing flag when dropped
struct SyncGuard<'a>(&'a AtomicBool);

impl<'a> SyncGuard<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Periodic AI signal generation for VIP sessions
pub struct SignalEngine {
    insight: Arc<InsightService>,
    signals: SignalRepository,
    session: SessionRepository,
    feed: Arc<MarketFeed>,
    syncing: AtomicBool,
}

impl SignalEngine {
    pub fn new(
        insight: Arc<InsightService>,
        signals: SignalRepository,
        session: SessionRepository,
        feed: Arc<MarketFeed>,
    ) -> Self {
        Self {
            insight,
            signals,
            session,
            feed,
            syncing: AtomicBool::new(false),
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::SeqCst)
    }

    /// One timer tick: only runs while the stored user is VIP
    pub async fn run_cycle(&self) -> Result<CycleOutcome, StoreError> {
        let vip = self
            .session
            .current_user()?
            .map(|u| u.is_vip)
            .unwrap_or(false);
        if !vip {
            debug!("Signal engine idle: no VIP session");
            return Ok(CycleOutcome::Skipped);
        }
        Ok(match self.generate_now().await? {
            Some(signal) => CycleOutcome::Published(signal),
            None => CycleOutcome::NoSignal,
        })
    }

    /// Ask the model for a signal at the current quote and publish it
    pub async fn generate_now(&self) -> Result<Option<TradeSignal>, StoreError> {
        let _guard = SyncGuard::raise(&self.syncing);
        let price = self.feed.price();

        let Some(signal) = self.insight.generate_signal(price).await else {
            return Ok(None);
        };
        self.signals.add_signal(signal.clone())?;
        info!(
            "📈 Published AI signal {} {} @ {} (VIP: {})",
            signal.direction, signal.pair, signal.entry, signal.is_vip
        );
        Ok(Some(signal))
    }
}
