use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::data_source::{Notifier, SourceError};
use crate::http_client::{HttpClient, HttpRequest};
use crate::ProviderId;

const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Clone, PartialEq, Eq)]
struct Credentials {
    bot_token: String,
    chat_id: String,
}

/// Delivers Markdown messages through the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramNotifier {
    http_client: Arc<dyn HttpClient>,
    credentials: Option<Credentials>,
    request_timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        bot_token: Option<String>,
        chat_id: Option<String>,
    ) -> Self {
        let credentials = match (bot_token, chat_id) {
            (Some(bot_token), Some(chat_id))
                if !bot_token.trim().is_empty() && !chat_id.trim().is_empty() =>
            {
                Some(Credentials { bot_token, chat_id })
            }
            _ => None,
        };
        Self {
            http_client,
            credentials,
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Reads `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`.
    pub fn from_env(http_client: Arc<dyn HttpClient>) -> Self {
        Self::new(
            http_client,
            std::env::var("TELEGRAM_BOT_TOKEN").ok(),
            std::env::var("TELEGRAM_CHAT_ID").ok(),
        )
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn send_message(&self, text: &str) -> Result<(), SourceError> {
        let Some(credentials) = self.credentials.as_ref() else {
            return Err(SourceError::not_configured(
                "telegram credentials not found; set TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID",
            ));
        };

        let payload = serde_json::json!({
            "chat_id": credentials.chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });
        let request = HttpRequest::post_json(
            format!("{TELEGRAM_API}/bot{}/sendMessage", credentials.bot_token),
            &payload,
        )
        .with_timeout(self.request_timeout);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| SourceError::from_transport(ProviderId::Telegram, &error))?;

        if response.status != 200 {
            // The body carries Telegram's `description`; the token never
            // appears in it.
            return Err(SourceError::from_status(ProviderId::Telegram, response.status));
        }

        tracing::info!(chars = text.chars().count(), "telegram message sent");
        Ok(())
    }
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl Notifier for TelegramNotifier {
    fn id(&self) -> ProviderId {
        ProviderId::Telegram
    }

    fn send<'a>(
        &'a self,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), SourceError>> + Send + 'a>> {
        Box::pin(self.send_message(message))
    }
}
