//! Layout resolution: position keyword + frame size -> pixel anchor.

use serde::{Deserialize, Serialize};
use subburn_models::{LayoutSpec, LayoutSpecError, Position, StackingMode};
use thiserror::Error;

/// Distance kept between text and the frame edge, in pixels.
pub const MARGIN: u32 = 20;

/// Vertical gap between stacked lanes, in pixels.
pub const LINE_GAP: u32 = 8;

/// Layout errors: the requested text cannot be placed inside the frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("Font size {font_size}px does not fit a frame {frame_height}px high")]
    FontTooLarge { font_size: u32, frame_height: u32 },

    #[error("Text at y={y} with font size {font_size}px falls outside a frame {frame_height}px high")]
    OutOfFrame {
        y: i64,
        font_size: u32,
        frame_height: u32,
    },

    #[error("{lines} lines at {font_size}px do not fit a frame {frame_height}px high")]
    TextTooTall {
        lines: u32,
        font_size: u32,
        frame_height: u32,
    },

    #[error("Invalid frame dimensions {width}x{height}")]
    InvalidFrame { width: u32, height: u32 },

    #[error(transparent)]
    Spec(#[from] LayoutSpecError),
}

/// Resolved pixel position for a cue's text.
///
/// `x` is the horizontal center line of the frame. Glyph metrics belong to
/// the renderer, so text is centered on `x` by the renderer itself rather
/// than by a precomputed left edge. `y` is the top of the text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: u32,
    pub y: u32,
}

/// Resolve the anchor for a position keyword.
///
/// - `top`: `y = font_size + MARGIN`
/// - `bottom`: `y = frame_height - font_size - MARGIN`
/// - `center`: `y = frame_height / 2`
///
/// Fails when `font_size >= frame_height` or when the resulting text box
/// `[y, y + font_size)` would not lie inside the frame.
pub fn resolve(
    position: Position,
    font_size: u32,
    frame_width: u32,
    frame_height: u32,
) -> Result<Anchor, LayoutError> {
    if frame_width == 0 || frame_height == 0 {
        return Err(LayoutError::InvalidFrame {
            width: frame_width,
            height: frame_height,
        });
    }
    if font_size >= frame_height {
        return Err(LayoutError::FontTooLarge {
            font_size,
            frame_height,
        });
    }

    let height = i64::from(frame_height);
    let size = i64::from(font_size);
    let margin = i64::from(MARGIN);

    let y = match position {
        Position::Top => size + margin,
        Position::Bottom => height - size - margin,
        Position::Center => height / 2,
    };

    if y < 0 || y + size > height {
        return Err(LayoutError::OutOfFrame {
            y,
            font_size,
            frame_height,
        });
    }

    Ok(Anchor {
        x: frame_width / 2,
        y: y as u32,
    })
}

/// Layout resolved once per job against the probed frame size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLayout {
    pub anchor: Anchor,
    pub position: Position,
    pub font_size: u32,
    pub frame_width: u32,
    pub frame_height: u32,
    pub stacking: StackingMode,
}

impl ResolvedLayout {
    /// Validate the spec and resolve its base anchor for a frame.
    pub fn new(spec: &LayoutSpec, frame_width: u32, frame_height: u32) -> Result<Self, LayoutError> {
        spec.validate()?;
        let anchor = resolve(spec.position, spec.font_size, frame_width, frame_height)?;
        Ok(Self {
            anchor,
            position: spec.position,
            font_size: spec.font_size,
            frame_width,
            frame_height,
            stacking: spec.stacking,
        })
    }

    /// Height of a text box of `lines` lines.
    pub fn text_height(&self, lines: u32) -> u32 {
        lines.max(1) * self.font_size
    }

    /// Vertical distance between lanes when the tallest cue has `max_lines`
    /// lines.
    pub fn lane_step(&self, max_lines: u32) -> u32 {
        self.text_height(max_lines) + LINE_GAP
    }

    /// Lane 0 anchor for a cue of `lines` lines.
    ///
    /// Bottom text grows upward from the bottom margin; top and center text
    /// grow downward from their anchor and are pulled up when the box would
    /// cross the bottom edge.
    pub fn base_anchor(&self, lines: u32) -> Result<Anchor, LayoutError> {
        let box_height = self.text_height(lines);
        if box_height > self.frame_height {
            return Err(LayoutError::TextTooTall {
                lines,
                font_size: self.font_size,
                frame_height: self.frame_height,
            });
        }
        if lines <= 1 {
            return Ok(self.anchor);
        }

        let height = i64::from(self.frame_height);
        let box_height = i64::from(box_height);
        let y = match self.position {
            Position::Bottom => height - box_height - i64::from(MARGIN),
            Position::Top | Position::Center => i64::from(self.anchor.y),
        };
        let y = y.clamp(0, height - box_height);

        Ok(Anchor {
            x: self.anchor.x,
            y: y as u32,
        })
    }

    /// Anchor for a cue of `lines` lines in a stacking lane, or `None` when
    /// that lane would push the box past the frame margin.
    ///
    /// Bottom lanes grow upward; top and center lanes grow downward. Lanes
    /// are `lane_step(max_lines)` apart, so boxes in neighbouring lanes
    /// never intersect.
    pub fn anchor_for_lane(&self, lane: u32, lines: u32, max_lines: u32) -> Option<Anchor> {
        if lane == 0 {
            return self.base_anchor(lines).ok();
        }

        let box_height = i64::from(self.text_height(lines));
        let offset = i64::from(lane) * i64::from(self.lane_step(max_lines.max(lines)));
        let height = i64::from(self.frame_height);
        let margin = i64::from(MARGIN);
        let y = match self.position {
            Position::Bottom => height - margin - offset - box_height,
            Position::Top | Position::Center => i64::from(self.anchor.y) + offset,
        };

        if y < margin || y + box_height > height - margin {
            return None;
        }

        Some(Anchor {
            x: self.anchor.x,
            y: y as u32,
        })
    }
}
