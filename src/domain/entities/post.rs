use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::signal::generate_signal_id;

/// Social feed item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author: String,
    pub content: String,
    pub likes: u32,
    pub timestamp: String,
    pub avatar: String,
    pub is_vip: bool,
}

impl Post {
    /// A fresh post with no likes, stamped now
    pub fn new(author: &str, content: &str, avatar: &str, is_vip: bool) -> Result<Self, String> {
        let content = content.trim();
        if content.is_empty() {
            return Err("post content cannot be empty".to_string());
        }

        Ok(Post {
            id: format!("p{}", generate_signal_id()),
            author: author.to_string(),
            content: content.to_string(),
            likes: 0,
            timestamp: Utc::now().to_rfc3339(),
            avatar: avatar.to_string(),
            is_vip,
        })
    }
}
