/// Characters of model speech kept on screen
pub const TRANSCRIPT_WINDOW: usize = 200;

/// Rolling tail of the model's spoken output
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TranscriptWindow {
    text: String,
}

impl TranscriptWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `fragment` after a space and keep the last 200 characters
    pub fn append(&mut self, fragment: &str) -> &str {
        let joined = format!("{} {}", self.text, fragment);
        let count = joined.chars().count();
        self.text = if count > TRANSCRIPT_WINDOW {
            joined.chars().skip(count - TRANSCRIPT_WINDOW).collect()
        } else {
            joined
        };
        &self.text
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }
}
