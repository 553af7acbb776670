//! Writing tone for generated replies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tone used when drafting a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Business-appropriate language.
    #[default]
    Professional,
    /// Warm, conversational language.
    Friendly,
    /// Acknowledges a problem and apologizes.
    Apologetic,
    /// Argues for a course of action.
    Persuasive,
}

impl Tone {
    pub const ALL: [Tone; 4] = [
        Tone::Professional,
        Tone::Friendly,
        Tone::Apologetic,
        Tone::Persuasive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Professional => "Professional",
            Tone::Friendly => "Friendly",
            Tone::Apologetic => "Apologetic",
            Tone::Persuasive => "Persuasive",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tone::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown tone '{}', expected one of: professional, friendly, apologetic, persuasive",
                    s
                )
            })
    }
}
