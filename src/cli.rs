use crate::config::{Color, Config, ConfigOverrides, Corner, Dimension, TextMode, load_config_with};
use crate::label::CornerLabel;
use crate::layout_dump::{LabelDump, write_layout_dump};
use crate::render::{render_label_svg, write_output_svg};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cornerlabel", version, about = "Render a diagonal corner ribbon label")]
pub struct Args {
    /// Label text; a newline or a literal `\n` starts a new line
    #[arg(short = 't', long = "text")]
    pub text: Option<String>,

    /// Config file (.json or .json5)
    #[arg(short = 'i', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG and JSON if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Band angle in degrees
    #[arg(short = 'a', long = "angle")]
    pub angle: Option<f32>,

    /// Offset from the corner, e.g. `20`, `20dp` or `24px`
    #[arg(short = 'd', long = "distance", value_parser = Dimension::parse)]
    pub distance: Option<Dimension>,

    /// Band thickness, e.g. `20`, `20dp` or `24px`
    #[arg(long = "thickness", value_parser = Dimension::parse)]
    pub thickness: Option<Dimension>,

    /// Pixels per dp, applied to defaults and dp lengths
    #[arg(long = "density")]
    pub density: Option<f32>,

    #[arg(long = "corner", value_enum)]
    pub corner: Option<CornerArg>,

    #[arg(long = "textColor")]
    pub text_color: Option<String>,

    #[arg(long = "ribbonColor")]
    pub ribbon_color: Option<String>,

    #[arg(long = "textMode", value_enum)]
    pub text_mode: Option<TextModeArg>,

    /// Use the built-in width table instead of system fonts
    #[arg(long = "fastText")]
    pub fast_text: bool,

    /// Zoom factor for PNG output
    #[arg(short = 's', long = "scale")]
    pub scale: Option<f32>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum CornerArg {
    TopLeft,
    TopRight,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum TextModeArg {
    Upright,
    AlongBand,
}

pub fn run() -> Result<()> {
    init_logging();
    let args = Args::parse();
    let config = apply_args(load_config_with(args.config.as_deref(), &overrides(&args))?, &args)?;
    info!(
        angle = config.label.angle,
        distance = config.label.distance,
        thickness = config.label.thickness,
        corner = %config.label.corner,
        "rendering corner label"
    );

    let mut label = CornerLabel::new(config.label, config.theme);
    match args.output_format {
        OutputFormat::Svg => {
            let svg = render_label_svg(&mut label);
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(args.output.as_deref(), "png")?;
            let svg = render_label_svg(&mut label);
            write_png(&svg, output, config.render.scale)?;
        }
        OutputFormat::Json => match args.output.as_deref() {
            Some(path) => write_layout_dump(path, &mut label)?,
            None => write_output_svg(&LabelDump::from_label(&mut label).to_json()?, None)?,
        },
    }
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, scale: f32) -> Result<()> {
    crate::render::write_output_png(svg, output, scale)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _scale: f32) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn ensure_output<'a>(output: Option<&'a Path>, ext: &str) -> Result<&'a Path> {
    output.ok_or_else(|| anyhow::anyhow!("Output path required for {} output", ext))
}

/// Lengths and density are resolved together with the config file.
fn overrides(args: &Args) -> ConfigOverrides {
    ConfigOverrides {
        density: args.density,
        thickness: args.thickness,
        distance: args.distance,
    }
}

/// Command-line flags take precedence over the config file.
fn apply_args(mut config: Config, args: &Args) -> Result<Config> {
    let label = &mut config.label;
    if let Some(text) = &args.text {
        // A literal `\n` starts a new line.
        label.text = Some(text.replace("\\n", "\n")).filter(|t| !t.trim().is_empty());
    }
    if let Some(angle) = args.angle {
        label.angle = crate::geometry::normalize_angle(angle);
    }
    if let Some(corner) = args.corner {
        label.corner = match corner {
            CornerArg::TopLeft => Corner::TopLeft,
            CornerArg::TopRight => Corner::TopRight,
        };
    }
    if let Some(color) = &args.text_color {
        label.text_color = Color::parse(color)?;
    }
    if let Some(mode) = args.text_mode {
        label.text_mode = match mode {
            TextModeArg::Upright => TextMode::Upright,
            TextModeArg::AlongBand => TextMode::AlongBand,
        };
    }
    if let Some(color) = &args.ribbon_color {
        config.theme.ribbon_color = Color::parse(color)?;
    }
    if args.fast_text {
        config.theme.fast_text_metrics = true;
    }
    if let Some(scale) = args.scale.filter(|s| *s > 0.0) {
        config.render.scale = scale;
    }
    Ok(config)
}
