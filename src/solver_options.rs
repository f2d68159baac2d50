use crate::error::ValidationError;
use crate::max_flow::FlowAlgorithm;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which persistencies to report
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixMode {
    /// Only values that hold in every minimiser
    #[default]
    Standard,
    /// Also values that hold in at least one minimiser, applied repeatedly until nothing changes
    Strong,
}

impl FixMode {
    pub const fn name(&self) -> &'static str {
        match self {
            FixMode::Standard => "standard",
            FixMode::Strong => "strong",
        }
    }
}

impl fmt::Display for FixMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FixMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(FixMode::Standard),
            "strong" => Ok(FixMode::Strong),
            _ => Err(ValidationError::InvalidMode(s.to_string())),
        }
    }
}

/// Options for a call to [`fix_variables_with_options`](crate::preprocess::fix_variables_with_options)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixOptions {
    pub mode: FixMode,
    pub flow_algorithm: FlowAlgorithm,
    /// Solve independent components of the interaction graph on the rayon thread pool
    pub parallel: bool,
    /// Upper limit on the rounds of the strong mode fixed point, it never runs more rounds than
    /// there are variables
    pub max_rounds: usize,
}

impl FixOptions {
    pub fn new() -> Self {
        Self {
            mode: FixMode::Standard,
            flow_algorithm: FlowAlgorithm::Dinic,
            parallel: true,
            max_rounds: usize::MAX,
        }
    }

    pub const fn with_mode(mut self, mode: FixMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the mode from its name, leaving it alone if `None`
    ///
    /// # Errors
    ///
    /// Fails on an unknown mode name.
    pub fn set_mode(&mut self, mode: Option<String>) -> Result<(), ValidationError> {
        if let Some(s) = mode {
            self.mode = s.parse()?;
        }
        Ok(())
    }

    /// Sets the max-flow algorithm from its name, leaving it alone if `None`
    ///
    /// # Errors
    ///
    /// Fails on an unknown algorithm name.
    pub fn set_flow_algorithm(&mut self, algorithm: Option<String>) -> Result<(), ValidationError> {
        if let Some(s) = algorithm {
            self.flow_algorithm = s.parse()?;
        }
        Ok(())
    }
}

impl Default for FixOptions {
    fn default() -> Self {
        Self::new()
    }
}
