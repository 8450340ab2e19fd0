use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Fixed highlight palette. Serialized lowercase.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    #[default]
    Yellow,
    Green,
    Blue,
    Pink,
    Orange,
}

impl HighlightColor {
    /// Palette order.
    pub const ALL: [HighlightColor; 5] = [
        HighlightColor::Yellow,
        HighlightColor::Green,
        HighlightColor::Blue,
        HighlightColor::Pink,
        HighlightColor::Orange,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HighlightColor::Yellow => "yellow",
            HighlightColor::Green => "green",
            HighlightColor::Blue => "blue",
            HighlightColor::Pink => "pink",
            HighlightColor::Orange => "orange",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            HighlightColor::Yellow => "Yellow",
            HighlightColor::Green => "Green",
            HighlightColor::Blue => "Blue",
            HighlightColor::Pink => "Pink",
            HighlightColor::Orange => "Orange",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            HighlightColor::Yellow => "🟡",
            HighlightColor::Green => "🟢",
            HighlightColor::Blue => "🔵",
            HighlightColor::Pink => "🟣",
            HighlightColor::Orange => "🟠",
        }
    }
}

impl fmt::Display for HighlightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a color name outside the palette.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown highlight color {0:?}")]
pub struct UnknownColor(pub String);

impl FromStr for HighlightColor {
    type Err = UnknownColor;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        HighlightColor::ALL
            .into_iter()
            .find(|color| color.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| UnknownColor(raw.to_string()))
    }
}

/// Stored records may carry `null`, a missing field, or a color that has
/// since left the palette; all of those read back as the default color.
pub(crate) fn lenient_color<'de, D>(deserializer: D) -> Result<HighlightColor, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|name| name.parse().ok())
        .unwrap_or_default())
}
