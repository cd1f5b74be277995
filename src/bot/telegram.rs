use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Long-poll timeout passed to getUpdates
const POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// Minimal Telegram Bot API client: long-polled getUpdates plus
/// sendMessage, which is all the bot needs.
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            // Longer than the long-poll window so the server side closes first
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 20))
            .build()?;
        Ok(Self {
            http,
            base_url: format!("https://api.telegram.org/bot{}", token),
        })
    }

    pub async fn get_updates(&self, offset: i64) -> AppResult<Vec<Update>> {
        let response: ApiResponse<Vec<Update>> = self
            .http
            .get(format!("{}/getUpdates", self.base_url))
            .query(&[("timeout", POLL_TIMEOUT_SECS as i64), ("offset", offset)])
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(AppError::Telegram(
                response
                    .description
                    .unwrap_or_else(|| "getUpdates rejected".to_string()),
            ));
        }
        Ok(response.result.unwrap_or_default())
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> AppResult<()> {
        let response: ApiResponse<serde_json::Value> = self
            .http
            .post(format!("{}/sendMessage", self.base_url))
            .json(&serde_json::json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(AppError::Telegram(
                response
                    .description
                    .unwrap_or_else(|| "sendMessage rejected".to_string()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_update_payload() {
        let raw = r#"{
            "ok": true,
            "result": [{
                "update_id": 7,
                "message": {
                    "chat": {"id": 42, "type": "private"},
                    "from": {"id": 1, "is_bot": false, "username": "alice"},
                    "text": "/link"
                }
            }]
        }"#;

        let parsed: ApiResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        assert!(parsed.ok);
        let updates = parsed.result.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update_id, 7);

        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.from.as_ref().unwrap().username.as_deref(), Some("alice"));
        assert_eq!(message.text.as_deref(), Some("/link"));
    }

    #[test]
    fn tolerates_updates_without_message_or_username() {
        let raw = r#"{"ok": true, "result": [{"update_id": 8}]}"#;
        let parsed: ApiResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        assert!(parsed.result.unwrap()[0].message.is_none());

        let raw = r#"{"ok": false, "description": "Unauthorized"}"#;
        let parsed: ApiResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        assert!(!parsed.ok);
        assert_eq!(parsed.description.as_deref(), Some("Unauthorized"));
    }
}
