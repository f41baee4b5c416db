//! FFmpeg filter graph construction for the overlay track.
//!
//! All instructions become one `drawtext` chain on the source video stream,
//! so the whole track is rendered in a single decode/encode pass.

use subburn_models::timestamp::format_seconds;
use subburn_models::LayoutSpec;

use crate::overlay::{escape_filter_value, OverlayInstruction, OverlayTrack};

/// Label of the composited video stream.
pub const VIDEO_OUT_LABEL: &str = "vout";

/// Horizontal position expression centering text on the frame.
const CENTER_X: &str = "(w-text_w)/2";

/// Build the full filter graph, or `None` when there is nothing to draw.
pub fn build_filter_graph(track: &OverlayTrack, layout: &LayoutSpec) -> Option<String> {
    if track.is_empty() {
        return None;
    }

    let chain = track
        .iter()
        .map(|inst| drawtext_filter(inst, layout))
        .collect::<Vec<_>>()
        .join(",");

    Some(format!("[0:v]{}[{}]", chain, VIDEO_OUT_LABEL))
}

/// Half-open `[start, end)` enable expression. `between()` would be
/// inclusive at both ends.
pub fn enable_expression(inst: &OverlayInstruction) -> String {
    format!(
        "gte(t,{})*lt(t,{})",
        format_seconds(inst.start_ms),
        format_seconds(inst.end_ms())
    )
}

fn drawtext_filter(inst: &OverlayInstruction, layout: &LayoutSpec) -> String {
    let mut opts = Vec::with_capacity(10);

    if let Some(font_file) = &layout.font_file {
        opts.push(format!(
            "fontfile={}",
            escape_filter_value(&font_file.to_string_lossy())
        ));
    }
    opts.push(format!("text={}", inst.escaped_text));
    opts.push("expansion=none".to_string());
    opts.push(format!("fontsize={}", layout.font_size));
    opts.push(format!("fontcolor={}", layout.font_color.as_str()));

    if let (Some(stroke), true) = (&layout.stroke_color, layout.has_stroke()) {
        opts.push(format!("borderw={}", layout.stroke_width));
        opts.push(format!("bordercolor={}", stroke.as_str()));
    }

    opts.push(format!("x={}", CENTER_X));
    opts.push(format!("y={}", inst.anchor.y));
    opts.push(format!("enable='{}'", enable_expression(inst)));

    format!("drawtext={}", opts.join(":"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ResolvedLayout;
    use crate::overlay::build_track;
    use subburn_models::{CueList, RawCue};

    fn track_for(raw: &[(f64, f64, &str)], layout: &LayoutSpec) -> OverlayTrack {
        let raw: Vec<_> = raw.iter().map(|&(s, e, t)| RawCue::new(s, e, t)).collect();
        let cues = CueList::parse(&raw).unwrap();
        let resolved = ResolvedLayout::new(layout, 1280, 720).unwrap();
        build_track(&cues, &resolved).unwrap()
    }

    #[test]
    fn test_empty_track_has_no_graph() {
        assert!(build_filter_graph(&OverlayTrack::default(), &LayoutSpec::default()).is_none());
    }

    #[test]
    fn test_one_drawtext_per_cue_in_single_chain() {
        let layout = LayoutSpec::default();
        let track = track_for(&[(0.0, 3.0, "A"), (2.0, 5.0, "B"), (6.0, 7.0, "C")], &layout);
        let graph = build_filter_graph(&track, &layout).unwrap();

        assert!(graph.starts_with("[0:v]drawtext="));
        assert!(graph.ends_with("[vout]"));
        assert_eq!(graph.matches("drawtext=").count(), 3);
        assert!(!graph.contains(';'));
    }

    #[test]
    fn test_enable_window_is_half_open() {
        let layout = LayoutSpec::default();
        let track = track_for(&[(1.5, 3.25, "A")], &layout);
        let graph = build_filter_graph(&track, &layout).unwrap();
        assert!(graph.contains("enable='gte(t,1.500)*lt(t,3.250)'"));
        assert!(!graph.contains("between("));
    }

    #[test]
    fn test_style_options() {
        let layout = LayoutSpec::new(32, "#ff0000", subburn_models::Position::Top)
            .unwrap()
            .with_font_file("/fonts/My Font:Bold.ttf");
        let track = track_for(&[(0.0, 1.0, "A")], &layout);
        let graph = build_filter_graph(&track, &layout).unwrap();

        assert!(graph.contains("fontsize=32"));
        assert!(graph.contains("fontcolor=0xFF0000"));
        assert!(graph.contains("borderw=1:bordercolor=black"));
        assert!(graph.contains("x=(w-text_w)/2"));
        assert!(graph.contains(&format!("y={}", 32 + crate::layout::MARGIN)));
        assert!(graph.contains("fontfile=/fonts/My Font\\\\:Bold.ttf"));
        assert!(graph.contains("expansion=none"));
    }

    #[test]
    fn test_no_border_without_stroke() {
        let layout = LayoutSpec::default().without_stroke();
        let track = track_for(&[(0.0, 1.0, "A")], &layout);
        let graph = build_filter_graph(&track, &layout).unwrap();
        assert!(!graph.contains("borderw"));
    }

    #[test]
    fn test_hostile_text_stays_inside_text_option() {
        let layout = LayoutSpec::default();
        let track = track_for(&[(0.0, 1.0, "x':fontsize=400,[evil];")], &layout);
        let graph = build_filter_graph(&track, &layout).unwrap();

        assert!(graph.contains("text=x\\\\\\'\\\\:fontsize=400\\,\\[evil\\]\\;:expansion=none"));
        assert!(graph.contains(":fontsize=24:"));
        assert_eq!(graph.matches("[vout]").count(), 1);
    }
}
