use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Hosted model endpoints
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_LIVE_URL: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

pub const DEFAULT_COMMENTARY_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_SIGNAL_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_TUTOR_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_LIVE_MODEL: &str = "gemini-2.5-flash-native-audio-preview-12-2025";
pub const DEFAULT_LIVE_VOICE: &str = "Zephyr";

/// Runtime configuration of the backend
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub listen_addr: SocketAddr,

    // Generative endpoints
    pub api_base: String,
    pub live_url: String,
    pub commentary_model: String,
    pub signal_model: String,
    pub tutor_model: String,
    pub live_model: String,
    pub live_voice: String,
    pub request_timeout_seconds: u64,

    // App timers
    pub price_tick_seconds: u64,
    pub signal_interval_seconds: u64,
    pub base_price: f64,
    pub price_max_step: f64,

    // Live session
    pub outbound_queue_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),

            api_base: DEFAULT_API_BASE.to_string(),
            live_url: DEFAULT_LIVE_URL.to_string(),
            commentary_model: DEFAULT_COMMENTARY_MODEL.to_string(),
            signal_model: DEFAULT_SIGNAL_MODEL.to_string(),
            tutor_model: DEFAULT_TUTOR_MODEL.to_string(),
            live_model: DEFAULT_LIVE_MODEL.to_string(),
            live_voice: DEFAULT_LIVE_VOICE.to_string(),
            request_timeout_seconds: 30,

            price_tick_seconds: 5,       // Dashboard jitter
            signal_interval_seconds: 300, // VIP auto signals every 5 minutes
            base_price: 2024.50,
            price_max_step: 1.0,

            outbound_queue_capacity: 32,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> AppConfig {
        let mut config = AppConfig::default();

        if let Ok(dir) = std::env::var("GOLDMASTER_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }

        if let Ok(addr) = std::env::var("GOLDMASTER_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(value) => config.listen_addr = value,
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse GOLDMASTER_ADDR '{}': {}, using default: {}",
                        addr,
                        e,
                        config.listen_addr
                    );
                }
            }
        }

        override_string("GEMINI_API_BASE", &mut config.api_base);
        override_string("GEMINI_LIVE_URL", &mut config.live_url);
        override_string("COMMENTARY_MODEL", &mut config.commentary_model);
        override_string("SIGNAL_MODEL", &mut config.signal_model);
        override_string("TUTOR_MODEL", &mut config.tutor_model);
        override_string("LIVE_MODEL", &mut config.live_model);
        override_string("LIVE_VOICE", &mut config.live_voice);

        override_in_range(
            "REQUEST_TIMEOUT_SECONDS",
            &mut config.request_timeout_seconds,
            1..=300,
        );
        override_in_range("PRICE_TICK_SECONDS", &mut config.price_tick_seconds, 1..=3600);
        override_in_range(
            "SIGNAL_INTERVAL_SECONDS",
            &mut config.signal_interval_seconds,
            10..=86_400,
        );
        override_in_range(
            "OUTBOUND_QUEUE_CAPACITY",
            &mut config.outbound_queue_capacity,
            1..=1024,
        );

        if let Ok(price) = std::env::var("BASE_PRICE") {
            match price.parse::<f64>() {
                Ok(value) if value.is_finite() && value > 0.0 => config.base_price = value,
                _ => {
                    tracing::warn!(
                        "Invalid BASE_PRICE value: {} (must be a positive number), using default: {}",
                        price,
                        config.base_price
                    );
                }
            }
        }

        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn price_tick(&self) -> Duration {
        Duration::from_secs(self.price_tick_seconds)
    }

    pub fn signal_interval(&self) -> Duration {
        Duration::from_secs(self.signal_interval_seconds)
    }
}

fn override_string(var: &str, target: &mut String) {
    if let Ok(value) = std::env::var(var) {
        let value = value.trim();
        if !value.is_empty() {
            *target = value.to_string();
        }
    }
}

fn override_in_range<T>(var: &str, target: &mut T, range: std::ops::RangeInclusive<T>)
where
    T: FromStr + PartialOrd + Copy + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    let Ok(raw) = std::env::var(var) else {
        return;
    };
    match raw.parse::<T>() {
        Ok(value) if range.contains(&value) => *target = value,
        Ok(value) => {
            tracing::warn!(
                "Invalid {} value: {} (must be between {} and {}), using default: {}",
                var,
                value,
                range.start(),
                range.end(),
                target
            );
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse {} '{}': {}, using default: {}",
                var,
                raw,
                e,
                target
            );
        }
    }
}
