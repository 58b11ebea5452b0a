//! Class palettes.
//!
//! A `ClassPalette` maps a class index to the display color for that class.
//! The decoder takes the palette as a value so alternative tables can be
//! substituted from configuration or tests.

use serde::Deserialize;

/// 8-bit RGB triple.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "[u8; 3]")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Fallback color for void and out-of-range labels.
    pub const VOID: Rgb = Rgb(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(r, g, b)
    }

    pub fn channels(self) -> [u8; 3] {
        [self.0, self.1, self.2]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Self(c[0], c[1], c[2])
    }
}

/// Named palette entry, used for decoding and for the legend.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PaletteEntry {
    pub name: String,
    pub rgb: Rgb,
}

/// Category palette of the 8-class urban scene model.
pub const CATEGORY_COLORS: [(&str, Rgb); 8] = [
    ("void", Rgb(0, 0, 0)),
    ("flat", Rgb(128, 64, 128)),
    ("construction", Rgb(102, 102, 156)),
    ("object", Rgb(153, 153, 153)),
    ("nature", Rgb(107, 142, 35)),
    ("sky", Rgb(70, 130, 180)),
    ("human", Rgb(255, 0, 0)),
    ("vehicle", Rgb(0, 0, 142)),
];

/// Immutable class index -> color table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassPalette {
    entries: Vec<PaletteEntry>,
}

impl ClassPalette {
    pub fn new(entries: Vec<PaletteEntry>) -> Self {
        Self { entries }
    }

    /// Builds an unnamed palette; entries are labelled `class_<idx>`.
    pub fn from_colors(colors: impl IntoIterator<Item = Rgb>) -> Self {
        let entries = colors
            .into_iter()
            .enumerate()
            .map(|(idx, rgb)| PaletteEntry {
                name: format!("class_{}", idx),
                rgb,
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Color for `class`, or `None` when the palette has no such entry.
    pub fn color(&self, class: usize) -> Option<Rgb> {
        self.entries.get(class).map(|entry| entry.rgb)
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }
}

impl Default for ClassPalette {
    fn default() -> Self {
        Self::new(
            CATEGORY_COLORS
                .iter()
                .map(|(name, rgb)| PaletteEntry {
                    name: (*name).to_string(),
                    rgb: *rgb,
                })
                .collect(),
        )
    }
}
