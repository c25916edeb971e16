//! Replay recorded pointer events through an edit session.

use std::path::PathBuf;

use reframe_common::config::AppConfig;
use reframe_frame_model::event::parse_events;
use reframe_frame_model::layout::Layout;
use reframe_frame_model::rect::Size;
use reframe_processing_core::session::{EditSession, SelectedMedia};
use reframe_render_engine::export::ExportOrchestrator;

pub async fn run(
    config: &AppConfig,
    events: PathBuf,
    media: PathBuf,
    target: String,
    container: (f64, f64),
    layout_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let targets = super::resolve_targets(config, std::slice::from_ref(&target))?;

    let content = std::fs::read_to_string(&events)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", events.display()))?;
    let events = parse_events(&content).map_err(|e| anyhow::anyhow!("Bad event file: {e}"))?;

    let orchestrator =
        ExportOrchestrator::from_config(super::engine_config(config));
    let info = orchestrator
        .probe(&media)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to probe {}: {e}", media.display()))?;

    let mut layout = match &layout_path {
        Some(path) => Layout::load_or_new(path, Some(media.clone()))
            .map_err(|e| anyhow::anyhow!("Failed to load layout: {e}"))?,
        None => Layout::new(Some(media.clone())),
    };

    let mut session = EditSession::new(targets, super::gesture_config(config));
    let generation = session.select_media(SelectedMedia::new(&media, info.dimensions)?);
    session.restore(&layout);
    session.set_container(&target, Size::new(container.0, container.1))?;

    let mut applied = 0usize;
    for event in &events {
        if session.apply(&target, generation, event)?.is_some() {
            applied += 1;
        }
    }

    let transform = session
        .transform(&target)
        .ok_or_else(|| anyhow::anyhow!("Unknown target: {target}"))?;
    tracing::info!(
        label = %target,
        events = events.len(),
        updates = applied,
        scale = transform.scale,
        x = transform.x,
        y = transform.y,
        "Replay finished"
    );
    println!("{}", serde_json::to_string_pretty(&transform)?);

    if let Some(path) = layout_path {
        layout.set(target.clone(), transform);
        layout
            .save(&path)
            .map_err(|e| anyhow::anyhow!("Failed to save layout: {e}"))?;
        println!("Layout updated: {}", path.display());
    }
    Ok(())
}
