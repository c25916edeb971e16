//! Export every target frame.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use reframe_common::config::AppConfig;
use reframe_render_engine::export::{
    ExportOrchestrator, ExportProgress, ExportRequest, ExportStage, ProgressCallback,
};
use reframe_render_engine::video::EncodeOptions;

pub async fn run(
    config: &AppConfig,
    file: PathBuf,
    layout: Option<PathBuf>,
    output: Option<PathBuf>,
    targets: Vec<String>,
    background: Option<String>,
) -> anyhow::Result<()> {
    let targets = super::resolve_targets(config, &targets)?;
    let background = super::resolve_background(config, background)?;
    let layout = super::load_layout(layout.as_deref())?;
    let output_dir = super::default_output_dir(config, output);

    println!("Exporting: {}", file.display());
    println!("  Output: {}", output_dir.display());
    println!("  Targets: {}", targets.len());

    let request = ExportRequest::new(&file, &output_dir)
        .with_background(background)
        .with_encode(EncodeOptions::from(&config.encode))
        .with_jpeg_quality(config.encode.jpeg_quality);

    let transforms: BTreeMap<_, _> = targets
        .iter()
        .map(|t| (t.label().to_string(), layout.transform_for(t.label())))
        .collect();

    let progress_cb: ProgressCallback = Arc::new(|p: ExportProgress| {
        if p.stage == ExportStage::Rendering {
            print!("\r  [{}] {:.1}%  ", p.label, p.progress * 100.0);
            std::io::stdout().flush().ok();
        }
    });

    let orchestrator =
        ExportOrchestrator::from_config(super::engine_config(config));
    let outcomes = orchestrator
        .export_all(&request, &targets, &transforms, Some(progress_cb))
        .await
        .map_err(|e| anyhow::anyhow!("Export failed: {e}"))?;

    println!();
    let mut failed = 0usize;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(artifact) => println!(
                "  [OK]   {:<12} {} ({} bytes)",
                outcome.label,
                artifact.path.display(),
                artifact.bytes
            ),
            Err(e) => {
                failed += 1;
                println!("  [FAIL] {:<12} {e}", outcome.label);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} exports failed", outcomes.len());
    }
    println!("Export complete.");
    Ok(())
}
