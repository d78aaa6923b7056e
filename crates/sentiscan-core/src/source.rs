use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Upstream services the scanner talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Reddit,
    Yahoo,
    Gemini,
    Telegram,
}

impl ProviderId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reddit => "reddit",
            Self::Yahoo => "yahoo",
            Self::Gemini => "gemini",
            Self::Telegram => "telegram",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
