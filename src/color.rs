use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Light fill palette for the report's deal-triple groups
// ---------------------------------------------------------------------------

/// Number of distinct tints before the cycle repeats.
pub const FILL_TINTS: usize = 4;

/// Generate `n` pale, visually distinct fill tints as `#rrggbb` hex strings.
/// Evenly spaced hues kept near-white so cell text stays readable.
pub fn light_palette(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n.max(1) as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.45, 0.93);
            let rgb: Srgb = hsl.into_color();
            format!(
                "#{:02x}{:02x}{:02x}",
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8
            )
        })
        .collect()
}

/// Tint for a deal-triple slot: slot 0 gets the first tint, slot `FILL_TINTS`
/// wraps back around.
pub fn fill_for_slot(palette: &[String], slot: usize) -> &str {
    &palette[slot % palette.len()]
}
