use std::fmt::Write as _;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::circuit_breaker::CircuitBreaker;
use crate::data_source::{ReportContext, ReportGenerator, SourceError};
use crate::http_client::{HttpClient, HttpRequest};
use crate::ProviderId;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const MISSING_KEY_NOTICE: &str =
    "⚠️ Gemini API Key not found. Please set GEMINI_API_KEY in your .env file.";

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const PROMPT_ITEMS: usize = 5;

/// Narrative report generator backed by the Gemini `generateContent` API.
///
/// Never fails: a missing key yields [`MISSING_KEY_NOTICE`] and upstream
/// errors are rendered as `Error generating AI report: ...`.
#[derive(Clone)]
pub struct GeminiReportGenerator {
    http_client: Arc<dyn HttpClient>,
    api_key: Option<String>,
    model: String,
    circuit_breaker: Arc<CircuitBreaker>,
    request_timeout: Duration,
}

impl GeminiReportGenerator {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: DEFAULT_GEMINI_MODEL.to_owned(),
            circuit_breaker: Arc::new(CircuitBreaker::for_provider(ProviderId::Gemini)),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Reads `GEMINI_API_KEY`; the generator still works without it.
    pub fn from_env(http_client: Arc<dyn HttpClient>) -> Self {
        Self::new(http_client, std::env::var("GEMINI_API_KEY").ok())
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate_report(&self, context: ReportContext) -> String {
        let Some(api_key) = self.api_key.as_deref() else {
            return MISSING_KEY_NOTICE.to_owned();
        };

        match self.request_report(api_key, &build_prompt(&context)).await {
            Ok(report) => report,
            Err(error) => {
                tracing::warn!(symbol = %context.symbol, error = %error, "report generation failed");
                format!("Error generating AI report: {}", error.message())
            }
        }
    }

    async fn request_report(&self, api_key: &str, prompt: &str) -> Result<String, SourceError> {
        self.circuit_breaker.check()?;

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });
        let request = HttpRequest::post_json(
            format!("{GEMINI_ENDPOINT}/{}:generateContent", self.model),
            &body,
        )
        .with_header("x-goog-api-key", api_key)
        .with_timeout(self.request_timeout);

        let response = self.http_client.execute(request).await.map_err(|error| {
            self.circuit_breaker.record_failure();
            SourceError::from_transport(ProviderId::Gemini, &error)
        })?;

        if !response.is_success() {
            if response.status == 429 || response.status >= 500 {
                self.circuit_breaker.record_failure();
            }
            return Err(SourceError::from_status(ProviderId::Gemini, response.status));
        }
        self.circuit_breaker.record_success();

        parse_report(&response.body)
    }
}

impl ReportGenerator for GeminiReportGenerator {
    fn generate<'a>(
        &'a self,
        context: ReportContext,
    ) -> Pin<Box<dyn Future<Output = String> + Send + 'a>> {
        Box::pin(self.generate_report(context))
    }
}

/// Analyst prompt: market context, top discussions and headlines, and the
/// four report sections.
pub fn build_prompt(context: &ReportContext) -> String {
    let ticker = context.symbol.as_str();
    let snapshot = &context.snapshot;

    let mut discussions = String::from("Reddit Discussions:\n");
    for post in context.discussions.iter().take(PROMPT_ITEMS) {
        let _ = writeln!(discussions, "- {} (Score: {})", post.title, post.score);
    }

    let mut news = String::from("Recent News:\n");
    for item in context.headlines.iter().take(PROMPT_ITEMS) {
        let title = if item.title.is_empty() { "No Title" } else { &item.title };
        let _ = writeln!(news, "- {title} (Publisher: {})", item.source);
    }

    format!(
        "You are a senior financial analyst and sentiment expert. Analyze the following data for {ticker} and provide a concise, actionable report.\n\
\n\
Stock: {ticker}\n\
Price: ${price}\n\
Change: {change:.2}%\n\
Volume: {volume}\n\
\n\
{discussions}\n\
{news}\n\
Your report should include:\n\
1. **Sentiment Verdict**: Bullish / Bearish / Neutral (with a confidence score 1-10).\n\
2. **Key Narratives**: Summarize what investors are talking about (e.g., earnings, rumors, macro factors).\n\
3. **Risk Factors**: Identify any potential red flags mentioned in news or discussions.\n\
4. **Trading Signal**: Buy / Sell / Hold / Watch, with a brief reasoning.\n\
\n\
Keep it professional, insightful, and under 200 words. Format with Markdown.\n",
        price = snapshot.current_price,
        change = snapshot.change_pct,
        volume = snapshot.volume,
    )
}

fn parse_report(body: &str) -> Result<String, SourceError> {
    let response: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        SourceError::invalid_response(format!("failed to parse gemini response: {e}"))
    })?;

    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(SourceError::invalid_response("gemini returned no text"));
    }
    Ok(text)
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}
