//! List configured target frames.

use reframe_common::config::AppConfig;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    let targets = super::resolve_targets(config, &[])?;
    println!("Target frames:");
    for target in &targets {
        println!(
            "  {:<12} {:>5}x{:<5} (aspect {:.3})",
            target.label(),
            target.width(),
            target.height(),
            target.aspect()
        );
    }
    Ok(())
}
