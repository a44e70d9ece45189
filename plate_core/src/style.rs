use serde::{Deserialize, Serialize};

/// Blank fill for an unassigned well.
pub const BLANK_COLOR: &str = "#ffffff";
/// Color pre-selected in the assignment dialog.
pub const DEFAULT_COLOR: &str = "#3b82f6";
/// Fill/border used while a well sits inside the live selection.
pub const HIGHLIGHT_FILL: &str = "#dbeafe";
pub const HIGHLIGHT_BORDER: &str = "#3b82f6";
pub const TEXT_DARK: &str = "#4b5563";
pub const TEXT_LIGHT: &str = "#ffffff";
/// Border for wells still carrying the blank fill.
pub const NEUTRAL_BORDER: &str = "#d1d5db";
/// Dark border drawn around pattern-filled wells.
pub const PATTERN_BORDER: &str = "#374151";

/// Preset swatches offered by the assignment dialog.
pub const PRESET_COLORS: [&str; 10] = [
    "#ef4444", "#f97316", "#f59e0b", "#10b981", "#06b6d4", "#3b82f6", "#8b5cf6", "#d946ef",
    "#64748b", "#000000",
];

/// The 19 built-in black/white texture patterns. These identifiers are part
/// of the persisted format, so renaming one is a breaking change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PatternId {
    StripesHorizontal,
    StripesVertical,
    DiagonalUp,
    DiagonalDown,
    Crosshatch,
    DiagonalCrosshatch,
    DotsSmall,
    DotsLarge,
    Grid,
    Checkerboard,
    Zigzag,
    Waves,
    Bricks,
    Triangles,
    Diamonds,
    Honeycomb,
    Speckle,
    Rings,
    Weave,
}

impl PatternId {
    pub const ALL: [PatternId; 19] = [
        PatternId::StripesHorizontal,
        PatternId::StripesVertical,
        PatternId::DiagonalUp,
        PatternId::DiagonalDown,
        PatternId::Crosshatch,
        PatternId::DiagonalCrosshatch,
        PatternId::DotsSmall,
        PatternId::DotsLarge,
        PatternId::Grid,
        PatternId::Checkerboard,
        PatternId::Zigzag,
        PatternId::Waves,
        PatternId::Bricks,
        PatternId::Triangles,
        PatternId::Diamonds,
        PatternId::Honeycomb,
        PatternId::Speckle,
        PatternId::Rings,
        PatternId::Weave,
    ];

    /// The stored identifier. Persistence round-trips these by string
    /// equality, never by re-resolving.
    pub fn as_str(self) -> &'static str {
        match self {
            PatternId::StripesHorizontal => "stripes-horizontal",
            PatternId::StripesVertical => "stripes-vertical",
            PatternId::DiagonalUp => "diagonal-up",
            PatternId::DiagonalDown => "diagonal-down",
            PatternId::Crosshatch => "crosshatch",
            PatternId::DiagonalCrosshatch => "diagonal-crosshatch",
            PatternId::DotsSmall => "dots-small",
            PatternId::DotsLarge => "dots-large",
            PatternId::Grid => "grid",
            PatternId::Checkerboard => "checkerboard",
            PatternId::Zigzag => "zigzag",
            PatternId::Waves => "waves",
            PatternId::Bricks => "bricks",
            PatternId::Triangles => "triangles",
            PatternId::Diamonds => "diamonds",
            PatternId::Honeycomb => "honeycomb",
            PatternId::Speckle => "speckle",
            PatternId::Rings => "rings",
            PatternId::Weave => "weave",
        }
    }

    pub fn from_str(s: &str) -> Option<PatternId> {
        PatternId::ALL.iter().copied().find(|p| p.as_str() == s)
    }

    /// Human-readable name for pickers and tooltips.
    pub fn display_name(self) -> &'static str {
        match self {
            PatternId::StripesHorizontal => "Horizontal stripes",
            PatternId::StripesVertical => "Vertical stripes",
            PatternId::DiagonalUp => "Diagonal up",
            PatternId::DiagonalDown => "Diagonal down",
            PatternId::Crosshatch => "Crosshatch",
            PatternId::DiagonalCrosshatch => "Diagonal crosshatch",
            PatternId::DotsSmall => "Small dots",
            PatternId::DotsLarge => "Large dots",
            PatternId::Grid => "Grid",
            PatternId::Checkerboard => "Checkerboard",
            PatternId::Zigzag => "Zigzag",
            PatternId::Waves => "Waves",
            PatternId::Bricks => "Bricks",
            PatternId::Triangles => "Triangles",
            PatternId::Diamonds => "Diamonds",
            PatternId::Honeycomb => "Honeycomb",
            PatternId::Speckle => "Speckle",
            PatternId::Rings => "Rings",
            PatternId::Weave => "Weave",
        }
    }
}

/// What a well stores: either a CSS color literal or a reference to one of
/// the built-in patterns. Serialized as the plain string either way, so the
/// persisted blob stays compatible with `{ id, label, color, status }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum StyleKey {
    Color(String),
    Pattern(PatternId),
}

impl StyleKey {
    pub fn blank() -> Self {
        StyleKey::Color(BLANK_COLOR.to_string())
    }

    pub fn default_color() -> Self {
        StyleKey::Color(DEFAULT_COLOR.to_string())
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, StyleKey::Color(c) if c == BLANK_COLOR)
    }

    /// The stored string form: the color literal or the pattern identifier.
    pub fn storage_key(&self) -> String {
        match self {
            StyleKey::Color(c) => c.clone(),
            StyleKey::Pattern(p) => p.as_str().to_string(),
        }
    }

    /// Parses a stored key: a known pattern identifier wins, anything else
    /// is treated as a literal color.
    pub fn parse(s: &str) -> Self {
        match PatternId::from_str(s) {
            Some(p) => StyleKey::Pattern(p),
            None => StyleKey::Color(s.to_string()),
        }
    }
}

impl From<StyleKey> for String {
    fn from(key: StyleKey) -> String {
        key.storage_key()
    }
}

impl From<String> for StyleKey {
    fn from(s: String) -> StyleKey {
        StyleKey::parse(&s)
    }
}

/// Fill half of a resolved style: a flat color or one of the textures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fill {
    Solid(String),
    Pattern(PatternId),
}

/// Concrete render style for one well or one legend swatch. Both render
/// sites go through [`resolve`]; they must never diverge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderStyle {
    pub fill: Fill,
    pub border: String,
    pub text: String,
    /// Light outline behind the label, used over busy pattern fills.
    pub text_outline: Option<String>,
}

/// Maps a stored key (plus the transient "in selection" flag) to what the
/// view actually draws.
pub fn resolve(key: &StyleKey, selected: bool) -> RenderStyle {
    if selected {
        return RenderStyle {
            fill: Fill::Solid(HIGHLIGHT_FILL.to_string()),
            border: HIGHLIGHT_BORDER.to_string(),
            text: TEXT_DARK.to_string(),
            text_outline: None,
        };
    }

    match key {
        StyleKey::Pattern(p) => RenderStyle {
            fill: Fill::Pattern(*p),
            border: PATTERN_BORDER.to_string(),
            text: TEXT_DARK.to_string(),
            text_outline: Some(TEXT_LIGHT.to_string()),
        },
        StyleKey::Color(c) => RenderStyle {
            fill: Fill::Solid(c.clone()),
            border: if c == BLANK_COLOR {
                NEUTRAL_BORDER.to_string()
            } else {
                c.clone()
            },
            text: if c == "#000000" {
                TEXT_LIGHT.to_string()
            } else {
                TEXT_DARK.to_string()
            },
            text_outline: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn there_are_nineteen_patterns_with_unique_keys() {
        let mut keys: Vec<&str> = PatternId::ALL.iter().map(|p| p.as_str()).collect();
        assert_eq!(keys.len(), 19);
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 19);
    }

    #[test]
    fn pattern_keys_round_trip() {
        for p in PatternId::ALL {
            assert_eq!(PatternId::from_str(p.as_str()), Some(p));
        }
        assert_eq!(PatternId::from_str("#3b82f6"), None);
    }

    #[test]
    fn parse_prefers_patterns_over_colors() {
        assert_eq!(
            StyleKey::parse("dots-small"),
            StyleKey::Pattern(PatternId::DotsSmall)
        );
        assert_eq!(
            StyleKey::parse("#10b981"),
            StyleKey::Color("#10b981".into())
        );
    }

    #[test]
    fn selection_highlight_beats_stored_style() {
        let s = resolve(&StyleKey::Pattern(PatternId::Bricks), true);
        assert_eq!(s.fill, Fill::Solid(HIGHLIGHT_FILL.into()));
        assert_eq!(s.border, HIGHLIGHT_BORDER);

        let s = resolve(&StyleKey::Color("#000000".into()), true);
        assert_eq!(s.fill, Fill::Solid(HIGHLIGHT_FILL.into()));
    }

    #[test]
    fn patterns_get_dark_border_and_outlined_text() {
        let s = resolve(&StyleKey::Pattern(PatternId::Waves), false);
        assert_eq!(s.fill, Fill::Pattern(PatternId::Waves));
        assert_eq!(s.border, PATTERN_BORDER);
        assert_eq!(s.text_outline, Some(TEXT_LIGHT.to_string()));
    }

    #[test]
    fn black_fill_flips_text_to_light() {
        let s = resolve(&StyleKey::Color("#000000".into()), false);
        assert_eq!(s.text, TEXT_LIGHT);
        assert_eq!(s.border, "#000000");

        let s = resolve(&StyleKey::Color("#ef4444".into()), false);
        assert_eq!(s.text, TEXT_DARK);
    }

    #[test]
    fn blank_wells_get_the_neutral_border() {
        let s = resolve(&StyleKey::blank(), false);
        assert_eq!(s.fill, Fill::Solid(BLANK_COLOR.into()));
        assert_eq!(s.border, NEUTRAL_BORDER);
        assert_eq!(s.text_outline, None);
    }
}
