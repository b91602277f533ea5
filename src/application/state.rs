use std::sync::Arc;
use tokio::sync::RwLock;

use super::actors::{LiveSession, LiveSessionSettings};
use super::services::insight_service::{InsightModels, InsightService};
use super::services::signal_engine::SignalEngine;
use super::shell::ViewShell;
use crate::config::AppConfig;
use crate::domain::repositories::live_transport::LiveTransport;
use crate::domain::repositories::text_generator::TextGenerator;
use crate::domain::services::market_feed::MarketFeed;
use crate::domain::value_objects::price::Price;
use crate::persistence::repository::{PostRepository, SessionRepository, SignalRepository};
use crate::persistence::LocalStore;
use crate::task_runner::TaskSet;

/// Shared state behind every route
#[derive(Clone)]
pub struct AppState {
    pub signals: SignalRepository,
    pub posts: PostRepository,
    pub session: SessionRepository,
    pub insight: Arc<InsightService>,
    pub engine: Arc<SignalEngine>,
    pub feed: Arc<MarketFeed>,
    pub shell: Arc<RwLock<ViewShell>>,
    pub live: Arc<LiveSession>,
}

impl AppState {
    pub fn new(
        store: Arc<LocalStore>,
        generator: Arc<dyn TextGenerator>,
        transport: Arc<dyn LiveTransport>,
        config: &AppConfig,
    ) -> Result<Self, String> {
        let signals = SignalRepository::new(store.clone());
        let posts = PostRepository::new(store.clone());
        let session = SessionRepository::new(store);

        let feed = Arc::new(MarketFeed::new(
            Price::new(config.base_price)?,
            config.price_max_step,
        ));
        let insight = Arc::new(InsightService::new(
            generator,
            InsightModels {
                commentary: config.commentary_model.clone(),
                signal: config.signal_model.clone(),
                tutor: config.tutor_model.clone(),
            },
        ));
        let engine = Arc::new(SignalEngine::new(
            insight.clone(),
            signals.clone(),
            session.clone(),
            feed.clone(),
        ));
        let live = Arc::new(LiveSession::new(
            transport,
            LiveSessionSettings {
                model: config.live_model.clone(),
                voice: config.live_voice.clone(),
                queue_capacity: config.outbound_queue_capacity,
            },
        ));

        Ok(Self {
            signals,
            posts,
            session,
            insight,
            engine,
            feed,
            shell: Arc::new(RwLock::new(ViewShell::new())),
            live,
        })
    }

    /// Price jitter and the VIP signal cycle, aborted when the set drops
    pub fn spawn_timers(&self, config: &AppConfig) -> TaskSet {
        let mut tasks = TaskSet::new();

        let feed = self.feed.clone();
        tasks.spawn_periodic("price_feed", config.price_tick(), move || {
            let feed = feed.clone();
            async move {
                let price = feed.tick(&mut rand::thread_rng());
                tracing::trace!("XAUUSD quote: {:.2}", price.value());
                Ok(())
            }
        });

        let engine = self.engine.clone();
        tasks.spawn_periodic("signal_engine", config.signal_interval(), move || {
            let engine = engine.clone();
            async move {
                engine
                    .run_cycle()
                    .await
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            }
        });

        tasks
    }
}
