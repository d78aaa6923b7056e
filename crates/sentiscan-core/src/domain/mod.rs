//! # Domain Models
//!
//! Canonical types shared by the sources, the scorers, and the pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated, uppercase ticker symbol |
//! | [`TextDocument`] | Forum post or news headline |
//! | [`MarketSnapshot`] | Price, change, volume, and optional short-interest data |
//! | [`UtcDateTime`] | UTC timestamp |

mod document;
mod market;
mod symbol;
mod timestamp;

pub use document::TextDocument;
pub use market::{change_pct, MarketSnapshot};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
