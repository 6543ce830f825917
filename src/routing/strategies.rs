//! Event naming strategies
//!
//! Decide which event names a turn is dispatched under.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ConfigError;
use crate::value_objects::InvocationStage;

/// How `execute()` derives event names from the turn
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventNaming {
    /// The intent name, whatever the stage
    #[default]
    Plain,
    /// `<Intent>.Fulfillment` or `<Intent>.Dialog`
    StageSuffixed,
    /// The suffixed name, then the plain name
    Both,
}

impl EventNaming {
    /// Candidate event names in firing order.
    ///
    /// Without a recognised stage every strategy falls back to the plain
    /// intent name. The last entry is the name reported when nothing is
    /// registered.
    pub fn event_names(&self, intent_name: &str, stage: Option<InvocationStage>) -> Vec<String> {
        let suffixed = stage.map(|stage| format!("{intent_name}.{}", stage.suffix()));

        match (self, suffixed) {
            (Self::StageSuffixed, Some(suffixed)) => vec![suffixed],
            (Self::Both, Some(suffixed)) => vec![suffixed, intent_name.to_string()],
            _ => vec![intent_name.to_string()],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::StageSuffixed => "stage_suffixed",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for EventNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventNaming {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "stage_suffixed" | "suffixed" => Ok(Self::StageSuffixed),
            "both" => Ok(Self::Both),
            other => Err(ConfigError::InvalidValue {
                key: "event_naming".to_string(),
                value: other.to_string(),
            }),
        }
    }
}
