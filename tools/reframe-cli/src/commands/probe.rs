//! Show media information.

use std::path::PathBuf;

use reframe_common::config::AppConfig;
use reframe_render_engine::export::ExportOrchestrator;

pub async fn run(config: &AppConfig, file: PathBuf, json: bool) -> anyhow::Result<()> {
    let orchestrator =
        ExportOrchestrator::from_config(super::engine_config(config));
    let info = orchestrator
        .probe(&file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to probe {}: {e}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Media: {}", file.display());
    println!("  Kind: {}", info.kind.as_str());
    println!("  Dimensions: {}", info.dimensions);
    println!("  Aspect: {:.4}", info.dimensions.aspect());
    if let Some(duration) = info.duration_secs {
        println!("  Duration: {duration:.2}s");
    }
    Ok(())
}
