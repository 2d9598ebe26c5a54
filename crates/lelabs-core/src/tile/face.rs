use serde::{Deserialize, Serialize};

/// One side of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Face {
    Details,
    Image,
    Links,
}

impl Face {
    /// Rotation order
    pub const ORDER: [Face; 3] = [Face::Details, Face::Image, Face::Links];

    /// Faces a tile shows, in rotation order. Details is always there.
    pub fn available(has_image: bool, has_links: bool) -> Vec<Face> {
        Self::ORDER
            .into_iter()
            .filter(|face| match face {
                Face::Details => true,
                Face::Image => has_image,
                Face::Links => has_links,
            })
            .collect()
    }

    /// Next face in `details -> image -> links -> details`, skipping the
    /// ones not in `available`
    pub fn next_in(self, available: &[Face]) -> Face {
        let start = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        (1..=Self::ORDER.len())
            .map(|step| Self::ORDER[(start + step) % Self::ORDER.len()])
            .find(|face| available.contains(face))
            .unwrap_or(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Face::Details => "details",
            Face::Image => "image",
            Face::Links => "links",
        }
    }
}

impl std::fmt::Display for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
