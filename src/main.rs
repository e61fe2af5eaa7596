use std::io::Read;
use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use erlines::config::Config;
use erlines::diagram::{DiagramFormat, DiagramStyle, load_diagram, parse_diagram, render_at_width};
use erlines::export::{OutputFormat, encode};
use erlines::fonts::CosmicTextMeasure;
use erlines::measure::UnresolvedPolicy;
use erlines::theme::Theme;
use erlines::{Error, svg};
use tracing_subscriber::EnvFilter;

/// Render entity-relationship diagrams with column-anchored connectors
#[derive(Parser, Debug)]
#[command(name = "erlines")]
#[command(version)]
#[command(about = "Render ER diagrams to SVG, PNG or PDF", long_about = None)]
struct Args {
    /// Diagram file: .json, .yaml, .toml or erDiagram text (use "-" for stdin text)
    #[arg(value_name = "INPUT", required_unless_present = "completions")]
    input: Option<PathBuf>,

    /// Output file path (extension determines format: .svg, .png or .pdf)
    #[arg(short, long, value_name = "OUTPUT", required_unless_present = "completions")]
    output: Option<PathBuf>,

    /// Alacritty theme file (YAML or TOML) or built-in theme name
    #[arg(short, long, value_name = "THEME")]
    theme: Option<String>,

    /// TOML file with layout, connector and policy settings
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Container width in pixels
    #[arg(short, long, default_value_t = 800.0)]
    width: f32,

    /// Raster scale multiplier for PNG output
    #[arg(long, default_value_t = 1.0)]
    png_scale: f32,

    /// Padding around the diagram in pixels
    #[arg(long, default_value_t = 20.0)]
    padding: f32,

    /// Log every relationship that cannot be drawn
    #[arg(long)]
    warn_unresolved: bool,

    /// Print a shell completion script and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn main() -> Result<(), Error> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("erlines=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "erlines", &mut std::io::stdout());
        return Ok(());
    }

    let (Some(input), Some(output)) = (args.input.as_ref(), args.output.as_ref()) else {
        return Err(Error::Config("INPUT and --output are required".to_string()));
    };

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if args.warn_unresolved {
        config.policy = UnresolvedPolicy::WarnAndSkip;
    }

    let theme = match &args.theme {
        Some(name) => Theme::load(name)?,
        None => Theme::default(),
    };

    let diagram = if input.to_str() == Some("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|source| Error::Io {
                path: input.clone(),
                source,
            })?;
        parse_diagram(&buffer, DiagramFormat::Text)?
    } else {
        load_diagram(input)?
    };

    // Fail on a bad extension before doing any layout work.
    let format = OutputFormat::from_path(output)?;

    let style = DiagramStyle::from_theme(&theme);
    let mut measure = CosmicTextMeasure::new();
    let rendered = render_at_width(&diagram, args.width, &style, &config, &mut measure);
    tracing::info!(
        entities = diagram.entities.len(),
        connectors = rendered.connectors,
        legend = rendered.legend_entries,
        "diagram rendered"
    );

    let document = svg::document(
        &rendered.svg,
        rendered.width,
        rendered.height,
        args.padding,
        &style.background,
    );
    let bytes = encode(&document, format, args.png_scale)?;
    std::fs::write(output, bytes).map_err(|source| Error::Io {
        path: output.clone(),
        source,
    })?;
    tracing::info!(path = %output.display(), "saved");

    Ok(())
}
