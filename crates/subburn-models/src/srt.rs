//! SubRip (`.srt`) input adapter.
//!
//! Blocks are separated by blank lines and look like:
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:03,500
//! First line
//! second line
//! ```
//!
//! The index line is optional, `.` is accepted in place of `,`, and any
//! coordinates trailing the end timestamp are ignored.

use crate::cue::{Cue, CueError, CueList};
use crate::timestamp::parse_timestamp;

const ARROW: &str = "-->";

/// Parse SRT text into a validated, sorted cue list.
///
/// Every block must carry `end > start` and non-empty text; the first
/// violation aborts parsing. Errors name the 1-based block number.
pub fn parse_srt(input: &str) -> Result<CueList, CueError> {
    let input = input.trim_start_matches('\u{feff}').replace("\r\n", "\n");

    let mut cues = Vec::new();
    for (index, block) in split_blocks(&input).into_iter().enumerate() {
        cues.push(parse_block(index, &block)?);
    }
    Ok(CueList::from_cues(cues))
}

fn split_blocks(input: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in input.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

fn parse_block(index: usize, lines: &[&str]) -> Result<Cue, CueError> {
    let block_no = index + 1;

    let timing_pos = lines
        .iter()
        .position(|l| l.contains(ARROW))
        .ok_or_else(|| CueError::malformed_srt(block_no, "missing '-->' timing line"))?;

    // Anything before the timing line may only be the numeric index.
    if timing_pos > 1 || (timing_pos == 1 && !is_index_line(lines[0])) {
        return Err(CueError::malformed_srt(
            block_no,
            format!("unexpected line before timing: '{}'", lines[0].trim()),
        ));
    }

    let (start_ms, end_ms) = parse_timing(block_no, lines[timing_pos])?;
    let text = lines[timing_pos + 1..].join("\n");

    Cue::validated(block_no, start_ms, end_ms, &text)
}

fn is_index_line(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit())
}

fn parse_timing(block_no: usize, line: &str) -> Result<(u64, u64), CueError> {
    let (start, rest) = line
        .split_once(ARROW)
        .ok_or_else(|| CueError::malformed_srt(block_no, "missing '-->'"))?;

    // Position hints such as `X1:40 X2:600` may follow the end time.
    let end = rest
        .split_whitespace()
        .next()
        .ok_or_else(|| CueError::malformed_srt(block_no, "missing end timestamp"))?;

    let start_ms = parse_timestamp(start)
        .map_err(|e| CueError::malformed_srt(block_no, format!("start: {}", e)))?;
    let end_ms = parse_timestamp(end)
        .map_err(|e| CueError::malformed_srt(block_no, format!("end: {}", e)))?;

    Ok((start_ms, end_ms))
}
