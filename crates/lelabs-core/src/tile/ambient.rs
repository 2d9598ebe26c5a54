// Ambient glow colour derived from the tile background and current face
use once_cell::sync::Lazy;
use regex::Regex;

use super::Face;

/// Opacity of the ambient glow
pub const AMBIENT_OPACITY: f32 = 0.35;

static RGB_FN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*[\d.]+\s*)?\)$")
        .expect("valid rgb regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `0xRRGGBB`
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as u8,
            g: ((hex >> 8) & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
        }
    }

    /// Shift every channel by `amount`, clamped to 0..=255
    pub fn adjust_brightness(self, amount: i16) -> Self {
        let shift = |c: u8| (c as i16 + amount).clamp(0, 255) as u8;
        Self::new(shift(self.r), shift(self.g), shift(self.b))
    }

    pub fn to_rgba(self, opacity: f32) -> String {
        format!("rgba({},{},{},{})", self.r, self.g, self.b, opacity)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Parse `#rrggbb`, `#rgb`, `rgb(r, g, b)` or `rgba(r, g, b, a)`
pub fn parse_color(input: &str) -> Option<Rgb> {
    let input = input.trim();

    if let Some(hex) = input.strip_prefix('#') {
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        return match hex.len() {
            6 => Some(Rgb::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let double = |i: usize| channel(&hex[i..=i].repeat(2));
                Some(Rgb::new(double(0)?, double(1)?, double(2)?))
            }
            _ => None,
        };
    }

    let caps = RGB_FN_RE.captures(input)?;
    let channel = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u16>().ok())
            .map(|v| v.min(255) as u8)
    };
    Some(Rgb::new(channel(1)?, channel(2)?, channel(3)?))
}

/// Brightness shift for a face. The image face only brightens when the
/// tile actually has an image.
pub fn brightness_for(face: Face, has_image: bool) -> i16 {
    match face {
        Face::Details => 0,
        Face::Image if has_image => 20,
        Face::Image => 0,
        Face::Links => 15,
    }
}

/// Glow colour for a tile; unparseable backgrounds pass through untouched
pub fn ambient_color(face: Face, background: &str, has_image: bool) -> String {
    match parse_color(background) {
        Some(rgb) => rgb
            .adjust_brightness(brightness_for(face, has_image))
            .to_rgba(AMBIENT_OPACITY),
        None => background.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_face_on_hero_background() {
        assert_eq!(ambient_color(Face::Details, "#23468C", true), "rgba(35,70,140,0.35)");
    }

    #[test]
    fn test_image_face_brightens_by_twenty() {
        assert_eq!(ambient_color(Face::Image, "#23468C", true), "rgba(55,90,160,0.35)");
        assert_eq!(ambient_color(Face::Image, "#23468C", false), "rgba(35,70,140,0.35)");
    }

    #[test]
    fn test_links_face_brightens_by_fifteen() {
        assert_eq!(ambient_color(Face::Links, "#23468C", false), "rgba(50,85,155,0.35)");
    }

    #[test]
    fn test_brightness_is_clamped() {
        assert_eq!(ambient_color(Face::Image, "#F5FAFF", true), "rgba(255,255,255,0.35)");
        assert_eq!(Rgb::new(10, 0, 5).adjust_brightness(-20), Rgb::new(0, 0, 0));
    }

    #[test]
    fn test_other_notations() {
        assert_eq!(parse_color("#fff"), Some(Rgb::new(255, 255, 255)));
        assert_eq!(parse_color("rgb(35, 140, 100)"), Some(Rgb::new(35, 140, 100)));
        assert_eq!(parse_color("RGBA(1,2,3,0.5)"), Some(Rgb::new(1, 2, 3)));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#GGGGGG"), None);
    }

    #[test]
    fn test_unknown_colour_passes_through() {
        assert_eq!(ambient_color(Face::Links, "tomato", false), "tomato");
        assert_eq!(ambient_color(Face::Details, "var(--accent)", false), "var(--accent)");
    }

    #[test]
    fn test_hex_output() {
        assert_eq!(Rgb::new(35, 70, 140).to_hex(), "#23468C");
        assert_eq!(Rgb::from_hex(0x23468C), Rgb::new(35, 70, 140));
    }
}
