#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod draw;
pub mod geometry;
pub mod label;
pub mod layout_dump;
pub mod render;
pub mod text;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{
    Color, Config, ConfigOverrides, Corner, Dimension, LabelConfig, Padding, TextMode, load_config,
    load_config_with, parse_config, parse_config_with_theme,
};
pub use draw::{Canvas, DrawOp, TextBlockOp};
pub use geometry::{Geometry, MeasuredSize, Rect, SizeConstraint, normalize_angle, solve};
pub use label::CornerLabel;
pub use render::{SvgCanvas, render_svg};
pub use text::{FastMetrics, FontMetrics, TextLayout, TextMeasure, fit_text};
pub use theme::{Theme, ThemeOverrides};

/// Options for one-shot rendering.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Used when there is no config source.
    pub label: LabelConfig,
    /// Base theme; a config source's `theme` and `themeVariables` apply on top.
    pub theme: Theme,
    /// Applied last, over anything the config source sets.
    pub theme_overrides: ThemeOverrides,
}

/// Renders straight to SVG. A non-empty JSON/JSON5 `config_source` replaces
/// `options.label` and is merged into `options.theme`.
pub fn render_with_options(config_source: &str, options: RenderOptions) -> anyhow::Result<String> {
    let (label, mut theme) = if config_source.trim().is_empty() {
        (options.label, options.theme)
    } else {
        let parsed = parse_config_with_theme(config_source, true, options.theme)?;
        (parsed.label, parsed.theme)
    };
    options.theme_overrides.apply(&mut theme);
    Ok(render_svg(&label, &theme))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> ThemeOverrides {
        ThemeOverrides {
            fast_text_metrics: Some(true),
            ..ThemeOverrides::default()
        }
    }

    #[test]
    fn config_theme_variables_reach_the_output() {
        let options = RenderOptions {
            theme_overrides: fast(),
            ..RenderOptions::default()
        };
        let svg = render_with_options("{ text: 'NEW', themeVariables: { ribbonColor: '#00FF00' } }", options)
            .unwrap();
        assert!(svg.contains("fill=\"#00FF00\""));
    }

    #[test]
    fn explicit_overrides_beat_the_config() {
        let options = RenderOptions {
            theme_overrides: ThemeOverrides {
                ribbon_color: Some(Color::rgb(0, 0, 255)),
                ..fast()
            },
            ..RenderOptions::default()
        };
        let svg = render_with_options("{ themeVariables: { ribbonColor: '#00FF00' } }", options).unwrap();
        assert!(svg.contains("fill=\"#0000FF\""));
        assert!(!svg.contains("#00FF00"));
    }

    #[test]
    fn empty_source_uses_option_label_and_theme() {
        let options = RenderOptions {
            theme: Theme::classic(),
            theme_overrides: fast(),
            ..RenderOptions::default()
        };
        let svg = render_with_options("  ", options).unwrap();
        assert!(svg.contains("fill=\"#FF9800\""));
    }
}
