mod gemini;
mod reddit;
mod telegram;
mod yahoo;

pub use gemini::{build_prompt, GeminiReportGenerator, DEFAULT_GEMINI_MODEL, MISSING_KEY_NOTICE};
pub use reddit::RedditAdapter;
pub use telegram::TelegramNotifier;
pub use yahoo::{YahooAdapter, YahooCrumb};
