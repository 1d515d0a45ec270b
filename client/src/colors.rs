use std::collections::HashMap;

use arcturus_shared::player_color;

/// Format RGBA as a CSS color string.
pub fn rgba_css(r: u8, g: u8, b: u8, a: f64) -> String {
    format!("rgba({r},{g},{b},{a})")
}

/// Brighten a color by a factor (1.0 = no change, >1.0 = brighter).
pub fn brighten(r: u8, g: u8, b: u8, factor: f64) -> (u8, u8, u8) {
    (
        ((r as f64 * factor).min(255.0)) as u8,
        ((g as f64 * factor).min(255.0)) as u8,
        ((b as f64 * factor).min(255.0)) as u8,
    )
}

/// Pre-formatted CSS strings for one player's map presence, derived once per
/// player instead of `format!`-ing in every draw pass.
#[derive(Debug, Clone)]
pub struct PlayerPalette {
    pub rgb: (u8, u8, u8),
    /// Territory fill (0.12)
    pub territory_fill: String,
    /// Territory border stroke (0.55)
    pub territory_border: String,
    /// System ownership ring (0.9)
    pub system_ring: String,
    /// Fleet glyph / route stroke (0.85)
    pub fleet: String,
}

impl PlayerPalette {
    pub fn for_player(player_id: &str) -> Self {
        let (r, g, b) = player_color(player_id);
        Self {
            rgb: (r, g, b),
            territory_fill: rgba_css(r, g, b, 0.12),
            territory_border: rgba_css(r, g, b, 0.55),
            system_ring: rgba_css(r, g, b, 0.9),
            fleet: rgba_css(r, g, b, 0.85),
        }
    }
}

/// Lazily filled palette cache keyed by player id; entries are tiny and
/// player counts are small, so nothing is ever evicted.
#[derive(Default)]
pub struct PaletteCache {
    entries: HashMap<String, PlayerPalette>,
}

impl PaletteCache {
    pub fn get(&mut self, player_id: &str) -> &PlayerPalette {
        self.entries
            .entry(player_id.to_string())
            .or_insert_with(|| PlayerPalette::for_player(player_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_css_formats_components() {
        assert_eq!(rgba_css(12, 200, 7, 0.5), "rgba(12,200,7,0.5)");
    }

    #[test]
    fn brighten_saturates_at_white() {
        assert_eq!(brighten(200, 100, 50, 2.0), (255, 200, 100));
    }

    #[test]
    fn palette_cache_is_stable_per_player() {
        let mut cache = PaletteCache::default();
        let first = cache.get("empire-1").territory_fill.clone();
        assert_eq!(cache.get("empire-1").territory_fill, first);
        assert_ne!(cache.get("empire-2").territory_fill, first);
    }
}
