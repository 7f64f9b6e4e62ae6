//! The closed set of reasoning architectures.

use harkaam_core::error::AgentError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    React,
    Ooda,
    Bdi,
    Lat,
    Raise,
    Rewoo,
}

impl Architecture {
    pub const ALL: [Architecture; 6] = [
        Architecture::React,
        Architecture::Ooda,
        Architecture::Bdi,
        Architecture::Lat,
        Architecture::Raise,
        Architecture::Rewoo,
    ];

    /// Lowercase identifier, as accepted by `from_str`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::React => "react",
            Architecture::Ooda => "ooda",
            Architecture::Bdi => "bdi",
            Architecture::Lat => "lat",
            Architecture::Raise => "raise",
            Architecture::Rewoo => "rewoo",
        }
    }

    /// Display name used in default agent names.
    pub fn title(&self) -> &'static str {
        match self {
            Architecture::React => "ReAct",
            Architecture::Ooda => "OODA",
            Architecture::Bdi => "BDI",
            Architecture::Lat => "LAT",
            Architecture::Raise => "RAISE",
            Architecture::Rewoo => "ReWOO",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Architecture::React => "Reasoning and acting: think, call a tool, observe, repeat",
            Architecture::Ooda => "Observe, orient, decide, act in bounded cycles",
            Architecture::Bdi => "Beliefs, desires and intentions driving concrete actions",
            Architecture::Lat => "Language agent tree search over scored candidate paths",
            Architecture::Raise => "Reasoning on an evolving scratch pad seeded with examples",
            Architecture::Rewoo => "Plan once, run parallel workers, then solve",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == wanted)
            .ok_or_else(|| {
                AgentError::InvalidConfig(format!(
                    "unknown architecture '{}' (expected one of: react, ooda, bdi, lat, raise, rewoo)",
                    s.trim()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("ReAct".parse::<Architecture>().unwrap(), Architecture::React);
        assert_eq!(" REWOO ".parse::<Architecture>().unwrap(), Architecture::Rewoo);
        assert!(matches!("tot".parse::<Architecture>(), Err(AgentError::InvalidConfig(_))));
    }

    #[test]
    fn display_round_trips() {
        for arch in Architecture::ALL {
            assert_eq!(arch.to_string().parse::<Architecture>().unwrap(), arch);
        }
    }
}
