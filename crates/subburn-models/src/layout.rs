//! Overlay layout configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest accepted font size in pixels.
pub const MIN_FONT_SIZE: u32 = 8;
/// Largest accepted font size in pixels.
pub const MAX_FONT_SIZE: u32 = 96;
/// Default font size.
pub const DEFAULT_FONT_SIZE: u32 = 24;
/// Default text color.
pub const DEFAULT_FONT_COLOR: &str = "#FFFFFF";
/// Default outline color.
pub const DEFAULT_STROKE_COLOR: &str = "black";
/// Default outline width in pixels.
pub const DEFAULT_STROKE_WIDTH: u32 = 1;
/// Widest accepted outline.
pub const MAX_STROKE_WIDTH: u32 = 10;

/// Color names understood by the renderer.
const NAMED_COLORS: &[&str] = &[
    "white", "black", "red", "green", "blue", "yellow", "cyan", "magenta", "gray", "grey",
    "orange", "purple", "pink", "brown", "navy", "teal", "lime", "silver", "gold", "maroon",
    "olive", "violet",
];

/// Layout validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutSpecError {
    #[error("Font size {0} outside allowed range 8-96")]
    FontSizeOutOfRange(u32),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Stroke width {0} exceeds maximum of 10")]
    StrokeTooWide(u32),

    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    #[error("Invalid stacking mode: {0}")]
    InvalidStacking(String),
}

/// Vertical placement of subtitle text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Top,
    Center,
    #[default]
    Bottom,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Top => "top",
            Position::Center => "center",
            Position::Bottom => "bottom",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Position {
    type Err = LayoutSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "top" => Ok(Position::Top),
            "center" | "centre" | "middle" => Ok(Position::Center),
            "bottom" => Ok(Position::Bottom),
            _ => Err(LayoutSpecError::InvalidPosition(s.to_string())),
        }
    }
}

/// How simultaneous cues at the same position are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum StackingMode {
    /// Overlapping cues get successive lanes, shifted away from the frame edge.
    #[default]
    Stack,
    /// Every cue draws at the base anchor; later cues paint over earlier ones.
    Overlap,
}

impl fmt::Display for StackingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackingMode::Stack => write!(f, "stack"),
            StackingMode::Overlap => write!(f, "overlap"),
        }
    }
}

impl FromStr for StackingMode {
    type Err = LayoutSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stack" => Ok(StackingMode::Stack),
            "overlap" => Ok(StackingMode::Overlap),
            _ => Err(LayoutSpecError::InvalidStacking(s.to_string())),
        }
    }
}

/// A validated color in the renderer's notation.
///
/// Hex input (`#RGB`, `#RRGGBB`, `#RRGGBBAA`, `0xRRGGBB[AA]`) is normalized
/// to `0xRRGGBB[AA]`; names are lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FontColor(String);

impl FontColor {
    pub fn parse(input: &str) -> Result<Self, LayoutSpecError> {
        let trimmed = input.trim();
        let invalid = || LayoutSpecError::InvalidColor(input.to_string());

        let hex = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .or_else(|| trimmed.strip_prefix("0X"));

        if let Some(hex) = hex {
            if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            let expanded = match hex.len() {
                3 => hex.chars().flat_map(|c| [c, c]).collect::<String>(),
                6 | 8 => hex.to_string(),
                _ => return Err(invalid()),
            };
            return Ok(Self(format!("0x{}", expanded.to_uppercase())));
        }

        let name = trimmed.to_lowercase();
        if NAMED_COLORS.contains(&name.as_str()) {
            Ok(Self(name))
        } else {
            Err(invalid())
        }
    }

    /// Color string in renderer notation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl JsonSchema for FontColor {
    fn schema_name() -> String {
        "FontColor".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(gen)
    }
}

impl Default for FontColor {
    fn default() -> Self {
        Self("0xFFFFFF".to_string())
    }
}

impl fmt::Display for FontColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FontColor {
    type Err = LayoutSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FontColor {
    type Error = LayoutSpecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FontColor> for String {
    fn from(color: FontColor) -> Self {
        color.0
    }
}

/// Subtitle appearance for one render job.
///
/// Passed explicitly into every job; nothing is read from ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LayoutSpec {
    /// Font size in pixels (8-96)
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Text color
    #[serde(default)]
    pub font_color: FontColor,

    /// Vertical placement
    #[serde(default)]
    pub position: Position,

    /// Outline color; `None` draws no outline
    #[serde(default = "default_stroke_color")]
    pub stroke_color: Option<FontColor>,

    /// Outline width in pixels
    #[serde(default = "default_stroke_width")]
    pub stroke_width: u32,

    /// Optional TrueType font file; the renderer's default font otherwise
    #[serde(default)]
    pub font_file: Option<PathBuf>,

    /// Placement of simultaneous cues
    #[serde(default)]
    pub stacking: StackingMode,
}

fn default_font_size() -> u32 {
    DEFAULT_FONT_SIZE
}
fn default_stroke_color() -> Option<FontColor> {
    FontColor::parse(DEFAULT_STROKE_COLOR).ok()
}
fn default_stroke_width() -> u32 {
    DEFAULT_STROKE_WIDTH
}

impl Default for LayoutSpec {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            font_color: FontColor::default(),
            position: Position::default(),
            stroke_color: default_stroke_color(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            font_file: None,
            stacking: StackingMode::default(),
        }
    }
}

impl LayoutSpec {
    /// Create a validated layout from user-facing values.
    pub fn new(font_size: u32, font_color: &str, position: Position) -> Result<Self, LayoutSpecError> {
        let spec = Self {
            font_size,
            font_color: FontColor::parse(font_color)?,
            position,
            ..Default::default()
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Set outline color and width.
    pub fn with_stroke(mut self, color: &str, width: u32) -> Result<Self, LayoutSpecError> {
        self.stroke_color = Some(FontColor::parse(color)?);
        self.stroke_width = width;
        self.validate()?;
        Ok(self)
    }

    /// Draw text without an outline.
    pub fn without_stroke(mut self) -> Self {
        self.stroke_color = None;
        self.stroke_width = 0;
        self
    }

    pub fn with_font_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_file = Some(path.into());
        self
    }

    pub fn with_stacking(mut self, stacking: StackingMode) -> Self {
        self.stacking = stacking;
        self
    }

    /// Check value ranges. Fields are public, so this runs again before
    /// every job.
    pub fn validate(&self) -> Result<(), LayoutSpecError> {
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&self.font_size) {
            return Err(LayoutSpecError::FontSizeOutOfRange(self.font_size));
        }
        if self.stroke_width > MAX_STROKE_WIDTH {
            return Err(LayoutSpecError::StrokeTooWide(self.stroke_width));
        }
        Ok(())
    }

    /// Whether an outline is drawn.
    pub fn has_stroke(&self) -> bool {
        self.stroke_color.is_some() && self.stroke_width > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_parse() {
        assert_eq!("top".parse::<Position>().unwrap(), Position::Top);
        assert_eq!("CENTER".parse::<Position>().unwrap(), Position::Center);
        assert_eq!(" bottom ".parse::<Position>().unwrap(), Position::Bottom);
        assert!("left".parse::<Position>().is_err());
        assert_eq!(Position::default(), Position::Bottom);
    }

    #[test]
    fn test_hex_colors_normalize() {
        assert_eq!(FontColor::parse("#FFFFFF").unwrap().as_str(), "0xFFFFFF");
        assert_eq!(FontColor::parse("#fa0").unwrap().as_str(), "0xFFAA00");
        assert_eq!(FontColor::parse("0x11223344").unwrap().as_str(), "0x11223344");
    }

    #[test]
    fn test_named_colors() {
        assert_eq!(FontColor::parse("White").unwrap().as_str(), "white");
        assert!(FontColor::parse("notacolor").is_err());
    }

    #[test]
    fn test_invalid_hex_colors() {
        assert!(FontColor::parse("#GGGGGG").is_err());
        assert!(FontColor::parse("#12345").is_err());
        assert!(FontColor::parse("").is_err());
        // Filter syntax must never sneak in through a color.
        assert!(FontColor::parse("white:x=0").is_err());
    }

    #[test]
    fn test_layout_font_size_bounds() {
        assert!(LayoutSpec::new(8, "#FFF", Position::Top).is_ok());
        assert!(LayoutSpec::new(96, "#FFF", Position::Top).is_ok());
        assert_eq!(
            LayoutSpec::new(7, "#FFF", Position::Top),
            Err(LayoutSpecError::FontSizeOutOfRange(7))
        );
        assert_eq!(
            LayoutSpec::new(97, "#FFF", Position::Top),
            Err(LayoutSpecError::FontSizeOutOfRange(97))
        );
    }

    #[test]
    fn test_layout_defaults() {
        let spec = LayoutSpec::default();
        assert_eq!(spec.font_size, 24);
        assert_eq!(spec.position, Position::Bottom);
        assert!(spec.has_stroke());
        assert_eq!(spec.stacking, StackingMode::Stack);
        assert!(!spec.without_stroke().has_stroke());
    }

    #[test]
    fn test_layout_deserialize_with_defaults() {
        let spec: LayoutSpec =
            serde_json::from_str(r##"{"font_size": 32, "font_color": "#ff0000", "position": "top"}"##)
                .unwrap();
        assert_eq!(spec.font_size, 32);
        assert_eq!(spec.font_color.as_str(), "0xFF0000");
        assert_eq!(spec.position, Position::Top);
        assert_eq!(spec.stroke_width, DEFAULT_STROKE_WIDTH);

        let bad = serde_json::from_str::<LayoutSpec>(r#"{"font_color": "nope"}"#);
        assert!(bad.is_err());
    }
}
