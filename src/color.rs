use ratatui::style::Color;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CATEGORY_COLOR_PRESETS: &[(&str, &str, &str)] = &[
    ("Teal Glow", "#034e68", "#caf0f8"),
    ("Amber Pop", "#6f1d1b", "#ffe5d9"),
    ("Purple Mist", "#240046", "#f8f9fa"),
    ("Forest Tones", "#283618", "#fefae0"),
    ("Slate Shine", "#2b2d42", "#edf2f4"),
];

pub const MIN_PALETTE_ENTRIES: usize = 4;

const FILLER_BACKGROUND: &str = "#034e68";
const FILLER_TEXT: &str = "#caf0f8";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPair {
    pub background: String,
    pub text: String,
}

impl ColorPair {
    pub fn same_pair(&self, background: &str, text: &str) -> bool {
        self.background.eq_ignore_ascii_case(background) && self.text.eq_ignore_ascii_case(text)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub name: String,
    pub background: String,
    pub text: String,
}

impl PaletteEntry {
    pub fn new(name: impl Into<String>, background: &str, text: &str) -> Self {
        Self {
            name: name.into(),
            background: background.to_string(),
            text: text.to_string(),
        }
    }

    fn key(&self) -> (String, String) {
        (
            self.background.to_ascii_lowercase(),
            self.text.to_ascii_lowercase(),
        )
    }
}

pub fn builtin_palette() -> Vec<PaletteEntry> {
    DEFAULT_CATEGORY_COLOR_PRESETS
        .iter()
        .map(|(name, background, text)| PaletteEntry::new(*name, background, text))
        .collect()
}

/// Normalizes `value` to `#rrggbb`. The leading `#` is optional; anything that
/// is not exactly six hex digits is rejected.
pub fn normalize_hex(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("#{}", digits.to_ascii_lowercase()))
}

pub fn sanitize_color_pair(background: &str, text: &str) -> Option<ColorPair> {
    Some(ColorPair {
        background: normalize_hex(background)?,
        text: normalize_hex(text)?,
    })
}

pub fn build_palette(
    custom: &[PaletteEntry],
    builtin: &[PaletteEntry],
    minimum: usize,
) -> Vec<PaletteEntry> {
    let mut palette: Vec<PaletteEntry> = custom.to_vec();
    let mut seen: Vec<(String, String)> = palette.iter().map(PaletteEntry::key).collect();
    for entry in builtin {
        if palette.len() >= minimum {
            break;
        }
        let key = entry.key();
        if !seen.contains(&key) {
            seen.push(key);
            palette.push(entry.clone());
        }
    }
    while palette.len() < minimum {
        palette.push(PaletteEntry::new(
            format!("Color {}", palette.len() + 1),
            FILLER_BACKGROUND,
            FILLER_TEXT,
        ));
    }
    palette
}

pub fn color_from_hex(value: &str) -> Option<Color> {
    let normalized = normalize_hex(value)?;
    let r = u8::from_str_radix(&normalized[1..3], 16).ok()?;
    let g = u8::from_str_radix(&normalized[3..5], 16).ok()?;
    let b = u8::from_str_radix(&normalized[5..7], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_hex_accepts_bare_and_marked_digits() {
        assert_eq!(normalize_hex("1a2B3C").as_deref(), Some("#1a2b3c"));
        assert_eq!(normalize_hex(" #ABCDEF ").as_deref(), Some("#abcdef"));
    }

    #[test]
    fn normalize_hex_rejects_bad_shapes() {
        assert_eq!(normalize_hex("12345"), None);
        assert_eq!(normalize_hex("#zzzzzz"), None);
        assert_eq!(normalize_hex("##123456"), None);
        assert_eq!(normalize_hex(""), None);
        assert_eq!(normalize_hex("#1234567"), None);
    }

    #[test]
    fn sanitize_requires_both_colors() {
        assert_eq!(
            sanitize_color_pair("FFFFFF", "#000000"),
            Some(ColorPair {
                background: "#ffffff".into(),
                text: "#000000".into(),
            })
        );
        assert_eq!(sanitize_color_pair("#ffffff", ""), None);
        assert_eq!(sanitize_color_pair("nope", "#000000"), None);
    }

    #[test]
    fn palette_skips_builtins_already_in_custom_colors() {
        let custom = vec![PaletteEntry::new("Mine", "#034E68", "#CAF0F8")];
        let palette = build_palette(&custom, &builtin_palette(), MIN_PALETTE_ENTRIES);
        let names: Vec<&str> = palette.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Mine", "Amber Pop", "Purple Mist", "Forest Tones"]);
    }

    #[test]
    fn palette_fills_up_to_minimum() {
        let palette = build_palette(&[], &[], 4);
        assert_eq!(palette.len(), 4);
        assert_eq!(palette[0].name, "Color 1");
        assert_eq!(palette[3].name, "Color 4");
        assert!(palette.iter().all(|e| e.background == "#034e68"));
    }

    #[test]
    fn palette_keeps_every_custom_entry() {
        let custom: Vec<PaletteEntry> = (0..6)
            .map(|i| PaletteEntry::new(format!("C{i}"), &format!("#00000{i}"), "#ffffff"))
            .collect();
        let palette = build_palette(&custom, &builtin_palette(), 4);
        assert_eq!(palette, custom);
    }

    #[test]
    fn color_from_hex_parses_rgb() {
        assert_eq!(color_from_hex("#0a0b0c"), Some(Color::Rgb(10, 11, 12)));
        assert_eq!(color_from_hex("bad"), None);
    }
}
