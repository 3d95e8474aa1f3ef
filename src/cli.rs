use crate::scene::Scene;
use crate::scripting::SketchHost;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render frames of a scene to disk
    Render {
        /// Scene JSON file ({"src": ..., "edit": ...})
        #[arg(long)]
        scene: PathBuf,

        /// Output directory for frames
        #[arg(long)]
        out: PathBuf,

        /// Number of frames to render
        #[arg(long, default_value_t = 60)]
        frames: u32,

        /// Output width
        #[arg(long, default_value_t = 800)]
        width: u32,

        /// Output height
        #[arg(long, default_value_t = 600)]
        height: u32,
    },
    /// Compile and register a scene's script without rendering
    Check {
        /// Scene JSON file
        #[arg(long)]
        scene: PathBuf,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            scene,
            out,
            frames,
            width,
            height,
        } => render_offline(scene, out, frames, width, height)?,
        Commands::Check { scene } => check(scene)?,
    }
    Ok(())
}

fn render_offline(
    scene_path: PathBuf,
    out_dir: PathBuf,
    frames: u32,
    width: u32,
    height: u32,
) -> Result<()> {
    let scene = Scene::load(&scene_path)?;

    std::fs::create_dir_all(&out_dir)?;

    let mut host = SketchHost::new(width, height);
    host.start(&scene.src, scene.edit)
        .map_err(|d| anyhow::anyhow!("script failed to start: {}", d.message))?;
    host.setup();

    println!("Rendering {} frames to {:?}...", frames, out_dir);

    for i in 0..frames {
        host.draw();

        if let Some(sketch) = host.sketch_mut() {
            for diag in sketch.take_diagnostics() {
                log::warn!("frame {i}: {} ({:?})", diag.message, diag.phase);
            }
        }

        let frame_path = out_dir.join(format!("frame_{:05}.png", i));
        host.canvas().borrow().to_image().save(&frame_path)?;

        if i % 60 == 0 {
            print!(".");
            use std::io::Write;
            std::io::stdout().flush()?;
        }
    }
    println!("\nDone.");

    Ok(())
}

fn check(scene_path: PathBuf) -> Result<()> {
    let scene = Scene::load(&scene_path)?;
    let mut host = SketchHost::new(1, 1);
    match host.start(&scene.src, scene.edit) {
        Ok(()) => {
            let sketch = host.sketch().expect("sketch just started");
            println!("ok: lifecycle callbacks {:?}", sketch_lifecycles(sketch));
            Ok(())
        }
        Err(diag) => {
            let loc = diag
                .location
                .as_ref()
                .map(|l| format!(" at {}:{}", l.line, l.column))
                .unwrap_or_default();
            anyhow::bail!("{:?}{}: {}", diag.phase, loc, diag.message)
        }
    }
}

fn sketch_lifecycles(sketch: &crate::scripting::Sketch) -> Vec<&'static str> {
    crate::scripting::Lifecycle::ALL
        .iter()
        .copied()
        .filter(|l| sketch.has_lifecycle(*l))
        .map(|l| l.name())
        .collect()
}
