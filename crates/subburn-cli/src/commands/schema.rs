//! Print JSON schemas for job settings.

use schemars::schema_for;

use subburn_models::{EncodingConfig, LayoutSpec, RawCue};

pub fn run() -> anyhow::Result<()> {
    let schemas = serde_json::json!({
        "layout": schema_for!(LayoutSpec),
        "encoding": schema_for!(EncodingConfig),
        "cues": schema_for!(Vec<RawCue>),
    });
    println!("{}", serde_json::to_string_pretty(&schemas)?);
    Ok(())
}
