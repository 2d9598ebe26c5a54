// Tile presentation: faces, rotation, entry transitions and ambient colour
pub mod ambient;
pub mod face;
pub mod transition;

pub use ambient::{ambient_color, parse_color, Rgb};
pub use face::Face;
pub use transition::Transition;

use rand::Rng;
use std::time::{Duration, Instant};
use tracing::trace;

use crate::models::{NewsItem, Project, TileStyles};

/// Bounds of the autonomous rotation interval, in milliseconds
pub const ROTATION_MIN_MS: u64 = 15_000;
pub const ROTATION_MAX_MS: u64 = 30_000;

/// Draw the delay until the next autonomous flip
pub fn rotation_interval<R: Rng + ?Sized>(rng: &mut R) -> Duration {
    Duration::from_millis(rng.gen_range(ROTATION_MIN_MS..ROTATION_MAX_MS))
}

/// What a tile is built from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileSpec {
    pub has_image: bool,
    pub has_links: bool,
    pub target: Option<String>,
    pub custom_click: bool,
    pub reduced_motion: bool,
}

impl TileSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// A project tile navigating to its detail page
    pub fn for_project(project: &Project) -> Self {
        Self::new()
            .image(project.image.is_some())
            .links(project.has_links())
            .target(project.detail_path())
    }

    /// News tiles have no detail page of their own
    pub fn for_news(item: &NewsItem) -> Self {
        Self::new().image(item.image.is_some())
    }

    pub fn image(mut self, has_image: bool) -> Self {
        self.has_image = has_image;
        self
    }

    pub fn links(mut self, has_links: bool) -> Self {
        self.has_links = has_links;
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn custom_click(mut self, custom: bool) -> Self {
        self.custom_click = custom;
        self
    }

    pub fn reduced_motion(mut self, reduced: bool) -> Self {
        self.reduced_motion = reduced;
        self
    }
}

/// Result of activating a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome<'a> {
    /// The owner's handler runs instead of navigation
    Custom,
    Navigate(&'a str),
    Inert,
}

/// A mounted tile
///
/// The rotation timer is plain state (`next_flip_at`); the owner drives it
/// through [`Tile::tick`]. Dropping the tile drops the timer with it.
#[derive(Debug, Clone)]
pub struct Tile {
    styles: TileStyles,
    faces: Vec<Face>,
    current: Face,
    transition: Transition,
    mounted_at: Instant,
    next_flip_at: Option<Instant>,
    reduced_motion: bool,
    target: Option<String>,
    custom_click: bool,
    has_image: bool,
}

impl Tile {
    pub fn mount<R: Rng + ?Sized>(spec: TileSpec, styles: TileStyles, now: Instant, rng: &mut R) -> Self {
        let faces = Face::available(spec.has_image, spec.has_links);
        let current = faces[rng.gen_range(0..faces.len())];
        let transition = Transition::pick(&styles, spec.reduced_motion, rng);

        let mut tile = Self {
            styles,
            faces,
            current,
            transition,
            mounted_at: now,
            next_flip_at: None,
            reduced_motion: spec.reduced_motion,
            target: spec.target,
            custom_click: spec.custom_click,
            has_image: spec.has_image,
        };
        tile.schedule(now, rng);
        trace!(
            "Mounted tile on {} face with {} transition",
            tile.current,
            tile.transition.as_str()
        );
        tile
    }

    fn rotates(&self) -> bool {
        self.faces.len() > 1 && !self.reduced_motion
    }

    fn schedule<R: Rng + ?Sized>(&mut self, now: Instant, rng: &mut R) {
        self.next_flip_at = if self.rotates() {
            Some(now + rotation_interval(rng))
        } else {
            None
        };
    }

    /// Advance the rotation if it is due. Returns true when the face changed.
    pub fn tick<R: Rng + ?Sized>(&mut self, now: Instant, rng: &mut R) -> bool {
        match self.next_flip_at {
            Some(due) if now >= due => {
                self.current = self.current.next_in(&self.faces);
                self.schedule(now, rng);
                true
            }
            _ => false,
        }
    }

    /// Manual flip. Leaves the rotation schedule alone.
    pub fn flip(&mut self) -> bool {
        if !self.has_flip_control() {
            return false;
        }
        self.current = self.current.next_in(&self.faces);
        true
    }

    pub fn set_reduced_motion<R: Rng + ?Sized>(&mut self, reduced: bool, now: Instant, rng: &mut R) {
        if self.reduced_motion == reduced {
            return;
        }
        self.reduced_motion = reduced;
        self.schedule(now, rng);
    }

    pub fn has_flip_control(&self) -> bool {
        self.faces.len() > 1
    }

    pub fn current_face(&self) -> Face {
        self.current
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn transition(&self) -> Transition {
        self.transition
    }

    pub fn styles(&self) -> &TileStyles {
        &self.styles
    }

    pub fn next_flip_at(&self) -> Option<Instant> {
        self.next_flip_at
    }

    /// 0.0 at mount, 1.0 once the entry transition has finished
    pub fn entry_progress(&self, now: Instant) -> f32 {
        let total = self.transition.entry_duration().as_secs_f32();
        let elapsed = now.saturating_duration_since(self.mounted_at).as_secs_f32();
        (elapsed / total).clamp(0.0, 1.0)
    }

    pub fn ambient_color(&self) -> String {
        ambient_color(self.current, &self.styles.background, self.has_image)
    }

    /// Ambient colour as RGB, for surfaces without an alpha channel
    pub fn ambient_rgb(&self) -> Option<Rgb> {
        parse_color(&self.styles.background)
            .map(|c| c.adjust_brightness(ambient::brightness_for(self.current, self.has_image)))
    }

    pub fn click(&self) -> ClickOutcome<'_> {
        if self.custom_click {
            return ClickOutcome::Custom;
        }
        match (self.current, self.target.as_deref()) {
            (Face::Details | Face::Image, Some(target)) => ClickOutcome::Navigate(target),
            _ => ClickOutcome::Inert,
        }
    }
}
