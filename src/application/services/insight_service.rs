use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{DEFAULT_COMMENTARY_MODEL, DEFAULT_SIGNAL_MODEL, DEFAULT_TUTOR_MODEL};
use crate::domain::entities::signal::{
    is_vip_probability, SignalDirection, SignalLevels, TradeSignal, DEFAULT_PAIR,
};
use crate::domain::errors::InsightError;
use crate::domain::repositories::text_generator::{GenerateRequest, TextGenerator};
use crate::domain::services::market_feed::Trend;
use crate::domain::value_objects::language::Language;
use crate::domain::value_objects::price::Price;

const COMMENTARY_TEMPERATURE: f32 = 0.7;
const COMMENTARY_TOP_P: f32 = 0.95;

const TUTOR_PERSONA: &str = "You are an expert commodities trader with 20 years of experience. \
Be encouraging, concise, and technical where necessary.";

/// Model names per use
#[derive(Debug, Clone)]
pub struct InsightModels {
    pub commentary: String,
    pub signal: String,
    pub tutor: String,
}

impl Default for InsightModels {
    fn default() -> Self {
        Self {
            commentary: DEFAULT_COMMENTARY_MODEL.to_string(),
            signal: DEFAULT_SIGNAL_MODEL.to_string(),
            tutor: DEFAULT_TUTOR_MODEL.to_string(),
        }
    }
}

/// Structured answer of the signal prompt
#[derive(Debug, Deserialize)]
struct GeneratedSignal {
    #[serde(rename = "type")]
    direction: String,
    entry: f64,
    sl: f64,
    tp1: f64,
    tp2: f64,
    probability: f64,
    analysis: String,
}

/// Schema the signal model must answer with
pub fn signal_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "type": { "type": "STRING", "description": "BUY or SELL" },
            "entry": { "type": "NUMBER" },
            "sl": { "type": "NUMBER" },
            "tp1": { "type": "NUMBER" },
            "tp2": { "type": "NUMBER" },
            "probability": { "type": "NUMBER", "description": "Percentage from 0-100" },
            "analysis": { "type": "STRING" }
        },
        "required": ["type", "entry", "sl", "tp1", "tp2", "probability", "analysis"]
    })
}

/// Map the model's JSON text to an ACTIVE XAUUSD signal
pub fn parse_generated_signal(text: &str) -> Result<TradeSignal, InsightError> {
    let generated: GeneratedSignal =
        serde_json::from_str(text.trim()).map_err(|e| InsightError::Malformed(e.to_string()))?;

    let direction: SignalDirection = generated
        .direction
        .parse()
        .map_err(InsightError::Malformed)?;
    let numbers = [
        generated.entry,
        generated.sl,
        generated.tp1,
        generated.tp2,
        generated.probability,
    ];
    if numbers.iter().any(|n| !n.is_finite()) {
        return Err(InsightError::Malformed("non-finite number".to_string()));
    }

    Ok(TradeSignal::new(
        DEFAULT_PAIR,
        SignalLevels {
            direction,
            entry: generated.entry,
            sl: generated.sl,
            tp1: generated.tp1,
            tp2: generated.tp2,
        },
        generated.probability,
        is_vip_probability(generated.probability),
        Some(generated.analysis),
    ))
}

/// Commentary, tutoring and signal generation over a [`TextGenerator`].
///
/// Nothing here fails towards the caller: prose degrades to the
/// per-language fallback and signals to `None`.
pub struct InsightService {
    generator: Arc<dyn TextGenerator>,
    models: InsightModels,
}

impl InsightService {
    pub fn new(generator: Arc<dyn TextGenerator>, models: InsightModels) -> Self {
        Self { generator, models }
    }

    pub async fn market_commentary(&self, price: Price, trend: Trend, language: Language) -> String {
        let prompt = format!(
            "Analyze current gold market sentiment. Current Price: ${}. Trend: {}. \
             Give a short, professional trading insight (max 100 words). {}",
            price.value(),
            trend,
            language.respond_instruction()
        );
        let request = GenerateRequest::new(&self.models.commentary, prompt)
            .with_sampling(COMMENTARY_TEMPERATURE, COMMENTARY_TOP_P);

        match self.generator.generate(request).await {
            Ok(text) => text,
            Err(e) => {
                warn!("AI analysis failed, using fallback: {}", e);
                language.fallback_commentary().to_string()
            }
        }
    }

    pub async fn tutor(&self, question: &str, language: Language) -> String {
        let prompt = format!(
            "You are the Gold Master AI Tutor. Help the user learn about gold trading. Question: {}. {}",
            question.trim(),
            language.respond_instruction()
        );
        let request =
            GenerateRequest::new(&self.models.tutor, prompt).with_system_instruction(TUTOR_PERSONA);

        match self.generator.generate(request).await {
            Ok(text) => text,
            Err(e) => {
                warn!("AI tutor failed, using fallback: {}", e);
                language.fallback_tutor().to_string()
            }
        }
    }

    /// `None` on transport failure or when the answer does not fit the schema
    pub async fn generate_signal(&self, price: Price) -> Option<TradeSignal> {
        let prompt = format!(
            "Act as a senior gold analyst. Generate a realistic XAUUSD trading signal based on current price of ${}.",
            price.value()
        );
        let request = GenerateRequest::new(&self.models.signal, prompt)
            .with_response_schema(signal_schema());

        let text = match self.generator.generate(request).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Signal generation failed: {}", e);
                return None;
            }
        };

        match parse_generated_signal(&text) {
            Ok(signal) => {
                debug!(
                    "Generated {} signal {} at {} ({}%)",
                    signal.direction, signal.id, signal.entry, signal.probability
                );
                Some(signal)
            }
            Err(e) => {
                warn!("Discarding malformed signal: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::signal::SignalStatus;
    use crate::domain::repositories::text_generator::InsightResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Canned generator recording every request
    struct MockGenerator {
        reply: Result<String, ()>,
        requests: Mutex<Vec<GenerateRequest>>,
    }

    impl MockGenerator {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn last(&self) -> GenerateRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl TextGenerator for MockGenerator {
        async fn generate(&self, request: GenerateRequest) -> InsightResult<String> {
            self.requests.lock().unwrap().push(request);
            self.reply
                .clone()
                .map_err(|_| InsightError::Status { status: 503, body: "unavailable".into() })
        }
    }

    fn service(generator: Arc<MockGenerator>) -> InsightService {
        InsightService::new(generator, InsightModels::default())
    }

    fn signal_json(probability: f64) -> String {
        json!({
            "type": "BUY", "entry": 2030.0, "sl": 2020.0, "tp1": 2040.0, "tp2": 2050.0,
            "probability": probability, "analysis": "Breakout above pivot"
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_commentary_prompt_and_sampling() {
        let generator = MockGenerator::ok("Gold is bid.");
        let insight = service(generator.clone());
        let text = insight
            .market_commentary(Price::new(2024.5).unwrap(), Trend::Bullish, Language::Th)
            .await;

        assert_eq!(text, "Gold is bid.");
        let request = generator.last();
        assert!(request.prompt.contains("Current Price: $2024.5. Trend: Bullish."));
        assert!(request.prompt.ends_with("Respond in Thai language."));
        assert_eq!(request.sampling.temperature, Some(0.7));
        assert_eq!(request.sampling.top_p, Some(0.95));
        assert_eq!(request.model, DEFAULT_COMMENTARY_MODEL);
    }

    #[tokio::test]
    async fn test_commentary_fallback_per_language() {
        let insight = service(MockGenerator::failing());
        let price = Price::new(2000.0).unwrap();
        assert_eq!(
            insight.market_commentary(price, Trend::Bearish, Language::En).await,
            "Market is currently showing neutral consolidation."
        );
        assert_eq!(
            insight.market_commentary(price, Trend::Bearish, Language::Th).await,
            "ตลาดกำลังพักฐานเฝ้ารอจังหวะเบรคเอาท์"
        );
    }

    #[tokio::test]
    async fn test_tutor_fallback_per_language() {
        let insight = service(MockGenerator::failing());
        assert_eq!(
            insight.tutor("What is a pip?", Language::En).await,
            "I am currently calibrating my market data. Please try again in a moment."
        );
        assert_eq!(
            insight.tutor("What is a pip?", Language::Th).await,
            "ขออภัย ระบบขัดข้องชั่วคราว"
        );
    }

    #[tokio::test]
    async fn test_tutor_uses_persona() {
        let generator = MockGenerator::ok("A pip is...");
        service(generator.clone()).tutor("What is a pip?", Language::En).await;
        let request = generator.last();
        assert_eq!(request.system_instruction.as_deref(), Some(TUTOR_PERSONA));
        assert!(request.prompt.contains("Question: What is a pip?."));
    }

    #[tokio::test]
    async fn test_signal_mapping() {
        let generator = MockGenerator::ok(&signal_json(85.0));
        let signal = service(generator.clone())
            .generate_signal(Price::new(2024.5).unwrap())
            .await
            .unwrap();

        assert_eq!(signal.pair, "XAUUSD");
        assert_eq!(signal.direction, SignalDirection::Buy);
        assert_eq!(signal.status, SignalStatus::Active);
        assert_eq!(signal.id.len(), 9);
        assert_eq!(signal.ai_analysis.as_deref(), Some("Breakout above pivot"));
        assert!(!signal.is_vip);
        assert!(generator.last().response_schema.is_some());
    }

    #[tokio::test]
    async fn test_vip_boundary() {
        let vip = service(MockGenerator::ok(&signal_json(91.0)))
            .generate_signal(Price::new(2024.5).unwrap())
            .await
            .unwrap();
        let not_vip = service(MockGenerator::ok(&signal_json(90.0)))
            .generate_signal(Price::new(2024.5).unwrap())
            .await
            .unwrap();
        assert!(vip.is_vip);
        assert!(!not_vip.is_vip);
    }

    #[tokio::test]
    async fn test_malformed_signal_is_none() {
        let price = Price::new(2024.5).unwrap();
        assert!(service(MockGenerator::ok("not json")).generate_signal(price).await.is_none());
        assert!(service(MockGenerator::ok(r#"{"type":"HOLD","entry":1,"sl":1,"tp1":1,"tp2":1,"probability":1,"analysis":""}"#))
            .generate_signal(price)
            .await
            .is_none());
        assert!(service(MockGenerator::ok(r#"{"type":"BUY"}"#)).generate_signal(price).await.is_none());
        assert!(service(MockGenerator::failing()).generate_signal(price).await.is_none());
    }
}
