/// Rotary Engine Terminal Viewer
///
/// Loads one STL file per engine part from a directory and animates the
/// eccentric shaft and rotors in the terminal.
/// Controls:
///   - Space: Start/stop the animation
///   - +/-: Change engine speed (degrees per step)
///   - X: Explode / assemble
///   - 1-9: Toggle part visibility
///   - WASD / Arrow Keys: Orbit the camera, Z/C: Zoom, P: Projection
///   - Q/ESC: Quit

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use rotary_core::{AnimationClock, ExplodeLayout, KinematicSolver, PartRegistry, ViewerConfig};
use rotary_terminal::ViewerApp;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rotary-terminal", about = "Interactive terminal viewer for a Wankel engine assembly")]
struct Cli {
    /// Directory of STL meshes, one per engine part
    mesh_dir: Option<PathBuf>,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Shaft degrees per animation step (1-180)
    #[arg(short, long)]
    speed: Option<f64>,

    /// Delay between animation steps in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let default_level = match (cli.verbose, cli.log_file.is_some()) {
        (true, _) => "debug",
        (false, true) => "info",
        // stderr shares the screen with the viewer, keep it quiet
        (false, false) => "warn",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match &cli.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<ViewerConfig> {
    let mut config = match &cli.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    if let Some(dir) = &cli.mesh_dir {
        config.mesh_dir = dir.clone();
    }
    if let Some(speed) = cli.speed {
        config.degrees_per_step = speed;
    }
    if let Some(delay) = cli.delay_ms {
        config.delay_ms = delay;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = load_config(&cli)?;

    println!("Rotary Engine Viewer - Loading {}...", config.mesh_dir.display());
    let load_rotation = config.load_rotation()?;
    let registry = PartRegistry::load_dir(&config.mesh_dir, &config.roles, load_rotation.as_ref())
        .context("cannot start viewer without engine parts")?;
    println!("Loaded {} parts", registry.len());

    let clock = AnimationClock::new(
        KinematicSolver::new(config.axis()?),
        config.degrees_per_step,
        Duration::from_millis(config.delay_ms),
    );
    let layout = ExplodeLayout::new(config.explode_axis()?, config.explode_step);

    println!("Starting terminal viewer (SPACE to animate, Q to quit)...");
    std::thread::sleep(Duration::from_secs(1));

    let mut app = ViewerApp::new(registry, clock, layout)?;
    app.run()?;

    println!("Thank you for using the Rotary Engine Viewer!");
    Ok(())
}
