//! Check that the video engine can start.

use reframe_common::config::{config_file_path, AppConfig};
use reframe_render_engine::engine::EngineHandle;

pub async fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Reframe System Check");
    println!("{}", "=".repeat(50));
    println!("Config: {}", config_file_path().display());
    println!("Exports: {}", config.exports_dir.display());
    println!();

    let handle = EngineHandle::new(super::engine_config(config));
    match handle.get().await {
        Ok(engine) => {
            println!("[OK] Video engine: ffmpeg {}", engine.version());
            println!("     Scratch: {}", engine.scratch_dir().display());
            println!();
            println!("Images and videos can be exported.");
        }
        Err(e) => {
            println!("[FAIL] {e}");
            println!("       Install ffmpeg and make sure it is in PATH.");
            println!();
            println!("Image exports still work; video exports will fail.");
        }
    }

    Ok(())
}
