/// stlview terminal demo - rotating mesh
///
/// Renders a binary STL file, or a procedural cube/ellipsoid when no file is
/// given, with the ASCII rasterizer.
/// Controls:
///   - WASD / Arrow Keys: Rotate the mesh
///   - E/R: Roll rotation
///   - Space: Pause the automatic spin
///   - Q/ESC: Quit

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use nalgebra::Vector3;
use std::path::PathBuf;
use stlview_core::{shapes, DecodedModel, ProjectionMode, ViewerConfig};
use stlview_terminal::{load_stl_file, TerminalApp};

/// Spin a mesh in the terminal
#[derive(Parser)]
#[command(name = "stlview-terminal")]
#[command(about = "Render a rotating binary STL mesh as ASCII art")]
struct Cli {
    /// Binary STL file to render
    path: Option<PathBuf>,

    /// Procedural shape rendered when no file is given
    #[arg(long, value_enum, default_value_t = Shape::Cube)]
    shape: Shape,

    /// Spin speed multiplier
    #[arg(long, default_value_t = 1.0)]
    speed: f32,

    /// Target frame rate
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Use an orthographic instead of a perspective projection
    #[arg(long)]
    orthographic: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Shape {
    Cube,
    Ellipsoid,
}

fn load_model(cli: &Cli, config: &ViewerConfig) -> Result<DecodedModel> {
    if let Some(path) = &cli.path {
        return load_stl_file(path, config.fit_extent);
    }

    match cli.shape {
        Shape::Cube => Ok(shapes::cube(2.0)),
        Shape::Ellipsoid => shapes::ellipsoid(
            Vector3::new(1.5, 1.0, 0.75),
            shapes::DEFAULT_STACKS,
            shapes::DEFAULT_SLICES,
        )
        .context("Failed to build ellipsoid"),
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let projection = if cli.orthographic {
        ProjectionMode::Orthographic
    } else {
        ProjectionMode::Perspective
    };
    let config = ViewerConfig::default()
        .with_speed(cli.speed)
        .with_projection(projection);

    let model = load_model(&cli, &config)?;

    tracing::info!(facets = model.facet_count(), "starting terminal renderer (press Q to quit)");
    std::thread::sleep(std::time::Duration::from_secs(1));

    let mut app = TerminalApp::new(model, &config, cli.fps).context("Failed to query terminal size")?;
    app.run().context("Terminal renderer failed")?;

    Ok(())
}
