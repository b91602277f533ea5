use serde::{Deserialize, Serialize};

/// Display language of the front end and of AI answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Th,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Th => "th",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Th => "Thai",
        }
    }

    /// Prompt suffix asking the model to answer in this language
    pub fn respond_instruction(&self) -> String {
        format!("Respond in {} language.", self.name())
    }

    /// Shown when market commentary could not be produced
    pub fn fallback_commentary(&self) -> &'static str {
        match self {
            Language::En => "Market is currently showing neutral consolidation.",
            Language::Th => "ตลาดกำลังพักฐานเฝ้ารอจังหวะเบรคเอาท์",
        }
    }

    /// Shown when the tutor could not answer
    pub fn fallback_tutor(&self) -> &'static str {
        match self {
            Language::En => {
                "I am currently calibrating my market data. Please try again in a moment."
            }
            Language::Th => "ขออภัย ระบบขัดข้องชั่วคราว",
        }
    }

    /// Status pill text while the signal engine is running or idle
    pub fn engine_status(&self, syncing: bool) -> &'static str {
        match (self, syncing) {
            (Language::En, true) => "Syncing Backend...",
            (Language::En, false) => "Engine Ready",
            (Language::Th, true) => "กำลังประมวลผล...",
            (Language::Th, false) => "ระบบพร้อมทำงาน",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_codes() {
        let th: Language = serde_json::from_str("\"th\"").unwrap();
        assert_eq!(th, Language::Th);
        assert_eq!(th.code(), "th");
        assert!(serde_json::from_str::<Language>("\"fr\"").is_err());
    }

    #[test]
    fn test_fallbacks_differ_per_language() {
        assert_ne!(Language::En.fallback_commentary(), Language::Th.fallback_commentary());
        assert_ne!(Language::En.fallback_tutor(), Language::Th.fallback_tutor());
    }
}
