//! Draw configuration (range, rounds, timing), loadable from JSON or YAML

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DrawError, DrawResult};
use crate::pool::DrawRange;
use crate::round::RoundPlan;
use crate::timing::{TimingConfig, TimingProfile};

/// One round as written in a config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSpec {
    pub name: String,
    pub required_count: u32,
}

impl RoundSpec {
    pub fn new(name: impl Into<String>, required_count: u32) -> Self {
        Self {
            name: name.into(),
            required_count,
        }
    }

    /// Parse `NAME=COUNT`
    pub fn parse(s: &str) -> DrawResult<Self> {
        let invalid = || DrawError::InvalidRoundSpec(s.to_string());
        let (name, count) = s.rsplit_once('=').ok_or_else(invalid)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid());
        }
        let required_count = count
            .trim()
            .parse()
            .map_err(|_| invalid())?;
        Ok(Self::new(name, required_count))
    }
}

/// Complete draw setup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawConfig {
    pub range: DrawRange,
    pub rounds: Vec<RoundSpec>,
    #[serde(default)]
    pub timing: TimingProfile,
    /// Fixed seed for reproducible draws
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            range: DrawRange::default(),
            rounds: vec![
                RoundSpec::new("Third Prize", 3),
                RoundSpec::new("Second Prize", 2),
                RoundSpec::new("First Prize", 1),
            ],
            timing: TimingProfile::Normal,
            seed: None,
        }
    }
}

impl DrawConfig {
    /// Round plan with fresh ids, in file order
    pub fn plan(&self) -> RoundPlan {
        RoundPlan::from_specs(
            self.rounds
                .iter()
                .map(|r| (r.name.clone(), r.required_count)),
        )
    }

    pub fn timing_config(&self) -> TimingConfig {
        TimingConfig::from_profile(self.timing)
    }

    /// Check the config describes a playable draw
    pub fn validate(&self) -> DrawResult<()> {
        let size = self.range.size()?;
        self.plan().validate(size)
    }

    pub fn from_json(json: &str) -> DrawResult<Self> {
        serde_json::from_str(json).map_err(|e| DrawError::Serialization(format!("Invalid config: {}", e)))
    }

    pub fn from_yaml(yaml: &str) -> DrawResult<Self> {
        serde_yml::from_str(yaml).map_err(|e| DrawError::Serialization(format!("Invalid config: {}", e)))
    }

    /// Load by extension: `.yaml`/`.yml` as YAML, anything else as JSON
    pub fn load(path: impl AsRef<Path>) -> DrawResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

        let config = if is_yaml {
            Self::from_yaml(&text)?
        } else {
            Self::from_json(&text)?
        };
        log::debug!("[DrawConfig] Loaded {} rounds from {}", config.rounds.len(), path.display());
        Ok(config)
    }

    /// Export config as JSON
    pub fn to_json(&self) -> DrawResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| DrawError::Serialization(e.to_string()))
    }
}
