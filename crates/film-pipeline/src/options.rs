//! Per-render options.

use serde::{Deserialize, Serialize};

use film_core::{ChannelOrder, DEFAULT_MIN_EDGE};
use film_emulsion::ToneStyle;
use film_profile::PhysicsMode;

/// Caller choices layered over a film profile.
///
/// Every field defaults to "use the profile".
///
/// ```rust
/// use film_pipeline::RenderOptions;
///
/// let opts: RenderOptions = serde_yaml::from_str("grain: false\nmin_edge: 512\n").unwrap();
/// assert!(!opts.grain);
/// assert_eq!(opts.min_edge, Some(512));
/// assert!(opts.calibrate);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    /// Replaces the profile's tone curve family.
    pub tone_style: Option<ToneStyle>,
    /// Grain on or off; off skips the stage even if the profile enables it.
    pub grain: bool,
    /// Replaces the profile's physics mode.
    pub physics_mode: Option<PhysicsMode>,
    /// Shorter-edge target for standardization; `None` keeps the input size.
    pub min_edge: Option<usize>,
    /// Channel order of 8-bit input and output.
    pub channel_order: ChannelOrder,
    /// Grain seed.
    pub seed: u64,
    /// Solve per-layer exposure gains so display mid-grey stays mid-grey.
    pub calibrate: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            tone_style: None,
            grain: true,
            physics_mode: None,
            min_edge: Some(DEFAULT_MIN_EDGE),
            channel_order: ChannelOrder::Rgb,
            seed: 0,
            calibrate: true,
        }
    }
}

impl RenderOptions {
    /// Options that keep the input size.
    pub fn native_size() -> Self {
        Self {
            min_edge: None,
            ..Self::default()
        }
    }
}
