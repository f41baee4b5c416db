//! Demo: parse SubRip text into a validated cue list.
//!
//! Run with: cargo run -p subburn-models --example srt_demo

use subburn_models::{parse_srt, CueError};

fn main() {
    let inputs = [
        "1\n00:00:01,000 --> 00:00:03,000\nHello\n\n2\n00:00:02,500 --> 00:00:04,000\nOverlapping \"quoted\" line\n",
        "1\n00:00:05,000 --> 00:00:05,000\nZero length\n",
        "1\nnot a timing line\ntext\n",
    ];

    for input in inputs {
        println!("\n{}", "=".repeat(60));
        match parse_srt(input) {
            Ok(list) => {
                println!("{} cue(s), {} overlapping", list.len(), list.overlapping_count());
                for cue in &list {
                    println!("  {}", cue);
                }
            }
            Err(e @ CueError::MalformedSrt { .. }) => println!("MALFORMED: {}", e),
            Err(e) => println!("INVALID: {}", e),
        }
    }
}
