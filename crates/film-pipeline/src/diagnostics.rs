//! Render results and per-frame diagnostics.

use std::fmt;
use std::time::Duration;

use film_core::Image;

/// Numbers describing one rendered frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostics {
    /// Film profile name.
    pub film: String,
    /// Wall time for the frame.
    pub processing_time: Duration,
    /// Relative change of total layer energy across the optical stages.
    /// `None` when an active model adds light by design.
    pub energy_error: Option<f64>,
    /// Stage names in execution order.
    pub stages: Vec<&'static str>,
    /// Output `(width, height)`.
    pub output_size: (usize, usize),
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}x{} in {:.1} ms",
            self.film,
            self.output_size.0,
            self.output_size.1,
            self.processing_time.as_secs_f64() * 1000.0
        )?;
        if let Some(e) = self.energy_error {
            write!(f, ", energy error {:.2e}", e)?;
        }
        write!(f, " [{}]", self.stages.join(" > "))
    }
}

/// A rendered float frame, display-encoded RGB in [0, 1].
#[derive(Debug, Clone)]
pub struct Rendered {
    /// Output image, always 3 channels.
    pub image: Image,
    /// Frame diagnostics.
    pub diagnostics: Diagnostics,
}

/// A rendered 8-bit frame in the caller's channel order.
#[derive(Debug, Clone)]
pub struct RenderedBytes {
    /// Interleaved 3-channel samples.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Frame diagnostics.
    pub diagnostics: Diagnostics,
}
