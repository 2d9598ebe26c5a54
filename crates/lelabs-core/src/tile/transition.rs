use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::TileStyles;

/// Entry animation played when a tile first appears
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Transition {
    Fade,
    Slide,
    Scale,
    Zoom,
    Flip,
    Kaleidoscope,
    Rainbow,
    Obturator,
    SlidingDoors,
}

impl Transition {
    pub const ALL: [Transition; 9] = [
        Transition::Fade,
        Transition::Slide,
        Transition::Scale,
        Transition::Zoom,
        Transition::Flip,
        Transition::Kaleidoscope,
        Transition::Rainbow,
        Transition::Obturator,
        Transition::SlidingDoors,
    ];

    /// The calm subset the hero tile is limited to
    pub const SAFE: [Transition; 5] = [
        Transition::Fade,
        Transition::Slide,
        Transition::Scale,
        Transition::Zoom,
        Transition::Flip,
    ];

    /// Draw an entry transition for a tile.
    ///
    /// Reduced motion always gets `Fade`; the hero tile draws from
    /// [`Transition::SAFE`]; everything else from [`Transition::ALL`].
    pub fn pick<R: Rng + ?Sized>(styles: &TileStyles, reduced_motion: bool, rng: &mut R) -> Self {
        if reduced_motion {
            return Transition::Fade;
        }
        let pool: &[Transition] = if styles.is_hero() {
            &Self::SAFE
        } else {
            &Self::ALL
        };
        pool[rng.gen_range(0..pool.len())]
    }

    pub fn entry_duration(&self) -> Duration {
        let ms = match self {
            Transition::Fade => 800,
            Transition::Slide => 700,
            Transition::Scale => 600,
            Transition::Zoom => 1000,
            Transition::Flip => 800,
            Transition::Kaleidoscope => 700,
            Transition::Rainbow => 1200,
            Transition::Obturator => 1000,
            Transition::SlidingDoors => 1200,
        };
        Duration::from_millis(ms)
    }

    pub fn hover_scale(&self) -> f32 {
        match self {
            Transition::Obturator => 1.01,
            _ => 1.02,
        }
    }

    pub fn is_safe(&self) -> bool {
        Self::SAFE.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Fade => "fade",
            Transition::Slide => "slide",
            Transition::Scale => "scale",
            Transition::Zoom => "zoom",
            Transition::Flip => "flip",
            Transition::Kaleidoscope => "kaleidoscope",
            Transition::Rainbow => "rainbow",
            Transition::Obturator => "obturator",
            Transition::SlidingDoors => "sliding-doors",
        }
    }
}
