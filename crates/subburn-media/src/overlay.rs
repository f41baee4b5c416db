//! Overlay track construction.
//!
//! Turns a sorted cue list plus a resolved layout into one self-contained
//! instruction per cue. Each instruction carries its own absolute window and
//! anchor, so the renderer may apply them in any order.

use serde::Serialize;
use subburn_models::{Cue, CueList, StackingMode};

use crate::layout::{Anchor, LayoutError, ResolvedLayout};

/// One time-windowed text draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlayInstruction {
    /// Cue text as written by the caller
    pub text: String,
    /// Text escaped for the filter graph; every character is literal
    pub escaped_text: String,
    /// Window start, milliseconds from video start
    pub start_ms: u64,
    /// Window length in milliseconds (> 0)
    pub duration_ms: u64,
    /// Where the text is drawn
    pub anchor: Anchor,
    /// Stacking lane; 0 is the base anchor
    pub lane: u32,
}

impl OverlayInstruction {
    /// Exclusive end of the window.
    pub fn end_ms(&self) -> u64 {
        self.start_ms + self.duration_ms
    }

    /// Whether the text is visible at `t_ms` (half-open window).
    pub fn is_active_at(&self, t_ms: u64) -> bool {
        self.start_ms <= t_ms && t_ms < self.end_ms()
    }
}

/// Ordered overlay instructions for one video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverlayTrack {
    instructions: Vec<OverlayInstruction>,
}

impl OverlayTrack {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OverlayInstruction> {
        self.instructions.iter()
    }

    pub fn as_slice(&self) -> &[OverlayInstruction] {
        &self.instructions
    }

    /// Instructions visible at `t_ms`.
    pub fn active_at(&self, t_ms: u64) -> impl Iterator<Item = &OverlayInstruction> {
        self.instructions.iter().filter(move |i| i.is_active_at(t_ms))
    }

    /// Number of lanes in use (0 for an empty track).
    pub fn lane_count(&self) -> u32 {
        self.instructions
            .iter()
            .map(|i| i.lane + 1)
            .max()
            .unwrap_or(0)
    }
}

impl<'a> IntoIterator for &'a OverlayTrack {
    type Item = &'a OverlayInstruction;
    type IntoIter = std::slice::Iter<'a, OverlayInstruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

/// Build the overlay track.
///
/// Cues are visited in ascending start order. Overlapping cues each keep
/// their own instruction; nothing is merged, dropped or truncated.
///
/// With [`StackingMode::Stack`] a cue takes the lowest lane that no
/// still-visible earlier cue occupies. Lanes are spaced for the tallest cue
/// in the list. A lane whose anchor would leave the frame falls back to the
/// base anchor. With [`StackingMode::Overlap`] every cue uses lane 0.
///
/// Fails when a multi-line cue is taller than the frame.
pub fn build_track(
    cues: &CueList,
    layout: &ResolvedLayout,
) -> Result<OverlayTrack, LayoutError> {
    let max_lines = cues.iter().map(Cue::line_count).max().unwrap_or(1);
    // End time of the cue currently holding each lane.
    let mut lane_ends: Vec<u64> = Vec::new();
    let mut instructions = Vec::with_capacity(cues.len());

    for cue in cues {
        let lane = match layout.stacking {
            StackingMode::Overlap => 0,
            StackingMode::Stack => claim_lane(&mut lane_ends, cue),
        };
        let lines = cue.line_count();
        let base = layout.base_anchor(lines)?;
        let anchor = match lane {
            0 => base,
            _ => layout.anchor_for_lane(lane, lines, max_lines).unwrap_or(base),
        };

        instructions.push(OverlayInstruction {
            text: cue.text().to_string(),
            escaped_text: escape_drawtext(cue.text()),
            start_ms: cue.start_ms(),
            duration_ms: cue.duration_ms(),
            anchor,
            lane,
        });
    }

    Ok(OverlayTrack { instructions })
}

fn claim_lane(lane_ends: &mut Vec<u64>, cue: &Cue) -> u32 {
    match lane_ends.iter().position(|&end| end <= cue.start_ms()) {
        Some(free) => {
            lane_ends[free] = cue.end_ms();
            free as u32
        }
        None => {
            lane_ends.push(cue.end_ms());
            (lane_ends.len() - 1) as u32
        }
    }
}

/// Escape text for a `drawtext` `text=` value inside a filter graph.
///
/// Two passes, matching FFmpeg's two parsing levels: first the option value
/// (`\`, `'`, `:`), then the filter graph (`\`, `'`, `[`, `]`, `,`, `;`).
/// The result must be paired with `expansion=none` so `%` stays literal.
pub fn escape_drawtext(text: &str) -> String {
    let value = escape_chars(text, &['\\', '\'', ':']);
    escape_chars(&value, &['\\', '\'', '[', ']', ',', ';'])
}

/// Escape a generic option value (such as a font path) for a filter graph.
pub fn escape_filter_value(value: &str) -> String {
    escape_drawtext(value)
}

fn escape_chars(input: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
