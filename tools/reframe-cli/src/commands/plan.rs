//! Print composition plans.

use std::path::PathBuf;

use serde::Serialize;

use reframe_common::config::AppConfig;
use reframe_processing_core::planner::{CompositionPlan, DrawRect};
use reframe_render_engine::export::ExportOrchestrator;

#[derive(Serialize)]
struct PlanReport<'a> {
    plan: &'a CompositionPlan,
    filter_chain: String,
    draw_rect: DrawRect,
}

pub async fn run(
    config: &AppConfig,
    file: PathBuf,
    layout: Option<PathBuf>,
    targets: Vec<String>,
    background: Option<String>,
) -> anyhow::Result<()> {
    let targets = super::resolve_targets(config, &targets)?;
    let background = super::resolve_background(config, background)?;
    let layout = super::load_layout(layout.as_deref())?;

    let orchestrator =
        ExportOrchestrator::from_config(super::engine_config(config));
    let media = orchestrator
        .probe(&file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to probe {}: {e}", file.display()))?;

    let plans: Vec<CompositionPlan> = targets
        .iter()
        .map(|target| {
            orchestrator.plan(&media, target, &layout.transform_for(target.label()), background)
        })
        .collect();
    let reports: Vec<PlanReport<'_>> = plans
        .iter()
        .map(|plan| PlanReport {
            plan,
            filter_chain: plan.filter_chain(),
            draw_rect: plan.draw_rect(),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}
