/// Deterministic per-player color from a CRC32 hash of the player id,
/// normalized through HSL so no empire ends up invisible on the dark
/// starfield: lightness is clamped to `[0.40, 0.72]` and saturation gets a
/// floor of 0.45.
pub fn player_color(player_id: &str) -> (u8, u8, u8) {
    let hash = crc32fast::hash(player_id.as_bytes());
    let bytes = hash.to_be_bytes();
    let (h, s, l) = rgb_to_hsl(bytes[0], bytes[1], bytes[2]);
    hsl_to_rgb(h, s.max(0.45), l.clamp(0.40, 0.72))
}

/// Convert RGB to HSL. Returns (h: 0..360, s: 0..1, l: 0..1).
pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if (max - min).abs() < f64::EPSILON {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let h = if (max - r).abs() < f64::EPSILON {
        let mut h = (g - b) / d;
        if g < b {
            h += 6.0;
        }
        h
    } else if (max - g).abs() < f64::EPSILON {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    (h * 60.0, s, l)
}

/// Convert HSL back to RGB.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    if s.abs() < f64::EPSILON {
        let v = (l * 255.0).round() as u8;
        return (v, v, v);
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;
    let h = h / 360.0;

    let channel = |t: f64| -> f64 {
        let mut t = t;
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 1.0 / 2.0 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };

    (
        (channel(h + 1.0 / 3.0) * 255.0).round() as u8,
        (channel(h) * 255.0).round() as u8,
        (channel(h - 1.0 / 3.0) * 255.0).round() as u8,
    )
}

/// Blend two HSL colors taking the shortest hue path. Used for the pulsing
/// active-hop stroke on fleet routes.
pub fn mix_hsl(from: (f64, f64, f64), to: (f64, f64, f64), t: f64) -> (f64, f64, f64) {
    let mut dh = to.0 - from.0;
    if dh > 180.0 {
        dh -= 360.0;
    } else if dh < -180.0 {
        dh += 360.0;
    }

    (
        (from.0 + dh * t).rem_euclid(360.0),
        from.1 + (to.1 - from.1) * t,
        from.2 + (to.2 - from.2) * t,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_color_is_deterministic() {
        assert_eq!(player_color("empire-42"), player_color("empire-42"));
        assert_ne!(player_color("empire-42"), player_color("empire-43"));
    }

    #[test]
    fn player_color_never_too_dark_or_washed_out() {
        // A spread of ids, including ones whose raw CRC bytes are near-black.
        for id in ["a", "empire-1", "xyzzy", "00000000-0000", "player_9999"] {
            let (r, g, b) = player_color(id);
            let (_, s, l) = rgb_to_hsl(r, g, b);
            assert!(l >= 0.39 && l <= 0.73, "{id}: lightness {l} out of range");
            assert!(s >= 0.44, "{id}: saturation {s} below floor");
        }
    }

    #[test]
    fn hsl_round_trip_on_saturated_colors() {
        for (r, g, b) in [(255, 0, 0), (0, 255, 0), (0, 0, 255), (37, 91, 201)] {
            let (h, s, l) = rgb_to_hsl(r, g, b);
            assert_eq!(hsl_to_rgb(h, s, l), (r, g, b));
        }
    }

    #[test]
    fn mix_hsl_crosses_the_hue_seam() {
        let mid = mix_hsl((350.0, 0.5, 0.5), (10.0, 0.5, 0.5), 0.5);
        assert!((mid.0 - 0.0).abs() < 1e-9);
    }

    #[test]
    fn mix_hsl_endpoints_are_exact() {
        let from = (42.0, 0.1, 0.2);
        let to = (300.0, 0.9, 0.8);
        assert_eq!(mix_hsl(from, to, 0.0), from);
        assert_eq!(mix_hsl(from, to, 1.0), to);
    }
}
