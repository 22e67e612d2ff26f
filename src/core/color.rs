// Colorful Logger - core/color.rs
//
// Tag display colours. A tag table names its colours with the small
// vocabulary of named colours used by desktop toolkits ("darkMagenta",
// "darkred", ...) or as `#rrggbb`. Parsing validates the table at registry
// construction time so renderers never see an unknown colour.

use serde::Serialize;
use std::fmt;

/// Named colours accepted in tag tables, with their RGB values.
/// Lookup is case-insensitive.
const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("gray", [160, 160, 164]),
    ("grey", [160, 160, 164]),
    ("darkgray", [128, 128, 128]),
    ("darkgrey", [128, 128, 128]),
    ("lightgray", [192, 192, 192]),
    ("lightgrey", [192, 192, 192]),
    ("red", [255, 0, 0]),
    ("darkred", [128, 0, 0]),
    ("green", [0, 255, 0]),
    ("darkgreen", [0, 128, 0]),
    ("blue", [0, 0, 255]),
    ("darkblue", [0, 0, 128]),
    ("cyan", [0, 255, 255]),
    ("darkcyan", [0, 128, 128]),
    ("magenta", [255, 0, 255]),
    ("darkmagenta", [128, 0, 128]),
    ("yellow", [255, 255, 0]),
    ("darkyellow", [128, 128, 0]),
];

/// A validated tag colour: the name as written in the table plus its RGB value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TagColor {
    name: String,
    rgb: [u8; 3],
}

impl TagColor {
    /// Parse a colour name or `#rrggbb` string. Returns `None` when the
    /// value is neither.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        let rgb = match trimmed.strip_prefix('#') {
            Some(hex) => parse_hex(hex)?,
            None => {
                let lower = trimmed.to_ascii_lowercase();
                NAMED_COLORS
                    .iter()
                    .find(|(name, _)| *name == lower)
                    .map(|(_, rgb)| *rgb)?
            }
        };
        Some(Self {
            name: trimmed.to_string(),
            rgb,
        })
    }

    /// The colour as written in the tag table (e.g. "darkMagenta").
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Red, green, blue components.
    pub fn rgb(&self) -> [u8; 3] {
        self.rgb
    }

    /// 24-bit ANSI foreground escape sequence for terminal rendering.
    pub fn ansi_fg(&self) -> String {
        let [r, g, b] = self.rgb;
        format!("\x1b[38;2;{r};{g};{b}m")
    }
}

impl fmt::Display for TagColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}
