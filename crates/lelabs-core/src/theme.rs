use crate::preferences::ThemePreference;
use crate::tile::Rgb;

/// Color theme for the terminal front-end
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
    /// Draw tiles in their own background colours
    pub tile_colors: bool,
}

/// All color definitions for a theme
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeColors {
    // Base colors
    pub background: Rgb,
    pub foreground: Rgb,
    pub border: Rgb,
    pub border_focused: Rgb,

    // Status colors
    pub success: Rgb,
    pub warning: Rgb,
    pub error: Rgb,

    // UI element colors
    pub title: Rgb,
    pub subtitle: Rgb,
    pub selected_bg: Rgb,
    pub muted: Rgb,

    /// Brand blue, also the hero tile background
    pub primary: Rgb,
    /// Unread dot and badge
    pub unread: Rgb,
}

impl Theme {
    pub fn default_dark() -> Self {
        Self {
            name: "Default".to_string(),
            tile_colors: true,
            colors: ThemeColors {
                background: Rgb::from_hex(0x000000),
                foreground: Rgb::from_hex(0xE5E7EB),
                border: Rgb::from_hex(0x374151),
                border_focused: Rgb::from_hex(0x4A6FC0),

                success: Rgb::from_hex(0x34D399),
                warning: Rgb::from_hex(0xFBBF24),
                error: Rgb::from_hex(0xF87171),

                title: Rgb::from_hex(0xFFFFFF),
                subtitle: Rgb::from_hex(0x9CA3AF),
                selected_bg: Rgb::from_hex(0x1F2937),
                muted: Rgb::from_hex(0x6B7280),

                primary: Rgb::from_hex(0x23468C),
                unread: Rgb::from_hex(0xE63946),
            },
        }
    }

    /// Pure black and white with saturated accents
    pub fn high_contrast() -> Self {
        Self {
            name: "High Contrast".to_string(),
            tile_colors: false,
            colors: ThemeColors {
                background: Rgb::from_hex(0x000000),
                foreground: Rgb::from_hex(0xFFFFFF),
                border: Rgb::from_hex(0xFFFFFF),
                border_focused: Rgb::from_hex(0xFFFF00),

                success: Rgb::from_hex(0x00FF00),
                warning: Rgb::from_hex(0xFFFF00),
                error: Rgb::from_hex(0xFF0000),

                title: Rgb::from_hex(0xFFFFFF),
                subtitle: Rgb::from_hex(0xFFFFFF),
                selected_bg: Rgb::from_hex(0x0000FF),
                muted: Rgb::from_hex(0xC0C0C0),

                primary: Rgb::from_hex(0x00FFFF),
                unread: Rgb::from_hex(0xFF00FF),
            },
        }
    }

    pub fn for_preference(preference: ThemePreference) -> Self {
        match preference {
            ThemePreference::Default => Self::default_dark(),
            ThemePreference::HighContrast => Self::high_contrast(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_dark()
    }
}
