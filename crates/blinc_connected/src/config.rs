//! Coordinator configuration and platform capabilities

use serde::{Deserialize, Serialize};

use crate::error::{ConnectedError, Result};

/// Capability check supplied by the platform layer
pub trait CapabilityProbe {
    /// Whether the extended connected-animation feature set is available
    ///
    /// This gates list animations, companion groups and event subscription.
    fn extended_connected_animations(&self) -> bool;
}

/// Platform capabilities, resolved once when a coordinator is built
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Extended connected-animation feature set (list items, companions)
    #[serde(default = "default_extended")]
    pub extended: bool,
}

fn default_extended() -> bool {
    true
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::extended()
    }
}

impl Capabilities {
    /// Full feature set
    pub fn extended() -> Self {
        Self { extended: true }
    }

    /// Basic feature set: the coordinator runs in no-op mode
    pub fn basic() -> Self {
        Self { extended: false }
    }

    /// Query a probe once
    pub fn detect(probe: &dyn CapabilityProbe) -> Self {
        Self {
            extended: probe.extended_connected_animations(),
        }
    }

    /// List animations and companion groups are only used when extended
    pub fn supports_list_animations(&self) -> bool {
        self.extended
    }

    /// Companions start together with their anchor only when extended
    pub fn supports_companions(&self) -> bool {
        self.extended
    }
}

/// Configuration for a [`TransitionCoordinator`](crate::TransitionCoordinator)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Platform capabilities
    #[serde(default)]
    pub capabilities: Capabilities,
    /// Frames to yield after scrolling a list item into view before the
    /// animation is started on it
    #[serde(default = "default_settle_frames")]
    pub settle_frames: u32,
    /// Upper bound, in frames, for a list start attempt. `None` waits for
    /// as long as the list control takes.
    #[serde(default)]
    pub start_budget_frames: Option<u32>,
}

fn default_settle_frames() -> u32 {
    1
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl CoordinatorConfig {
    /// Standard configuration: one settle frame, unbounded start
    pub fn standard() -> Self {
        Self {
            capabilities: Capabilities::extended(),
            settle_frames: default_settle_frames(),
            start_budget_frames: None,
        }
    }

    /// Testing configuration with a bounded start for determinism
    pub fn testing() -> Self {
        Self {
            capabilities: Capabilities::extended(),
            settle_frames: 1,
            start_budget_frames: Some(8),
        }
    }

    /// Parse a configuration from TOML
    ///
    /// ```toml
    /// settle_frames = 2
    /// start_budget_frames = 30
    ///
    /// [capabilities]
    /// extended = true
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| ConnectedError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check field ranges
    pub fn validate(&self) -> Result<()> {
        if self.start_budget_frames == Some(0) {
            return Err(ConnectedError::Config(
                "start_budget_frames must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Set the capabilities.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Resolve capabilities from a probe.
    pub fn with_probe(mut self, probe: &dyn CapabilityProbe) -> Self {
        self.capabilities = Capabilities::detect(probe);
        self
    }

    /// Set the number of settle frames.
    pub fn with_settle_frames(mut self, frames: u32) -> Self {
        self.settle_frames = frames;
        self
    }

    /// Bound list start attempts to a number of frames.
    pub fn with_start_budget(mut self, frames: Option<u32>) -> Self {
        self.start_budget_frames = frames;
        self
    }
}
