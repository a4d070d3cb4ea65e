//! Configuration data models
//!
//! This module defines the data structures used for configuration.

use serde::{Deserialize, Serialize};

use crate::version::climb::DEFAULT_BUILD_STEP;

/// Largest accepted initial build step
pub const MAX_BUILD_STEP: u32 = 65_536;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtilsConfig {
    /// Whether verbose notices start enabled
    pub verbose: bool,
    /// Initial step of the build number climb (1-65536)
    pub initial_build_step: u32,
}

impl Default for UtilsConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            initial_build_step: DEFAULT_BUILD_STEP,
        }
    }
}

impl UtilsConfig {
    /// Clamp out-of-range values into their accepted range
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.initial_build_step = self.initial_build_step.clamp(1, MAX_BUILD_STEP);
        self
    }
}
