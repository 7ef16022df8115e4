use corner_label_renderer::{RenderOptions, Theme, ThemeOverrides, render_with_options};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CornerLabelRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    line_spacing: Option<f32>,
}

fn build_render_options(options: CornerLabelRenderOptions) -> RenderOptions {
    let theme = if options.theme.as_deref() == Some("classic") {
        Theme::classic()
    } else {
        Theme::modern()
    };

    RenderOptions {
        theme,
        theme_overrides: ThemeOverrides {
            font_family: options.font_family,
            line_spacing: options.line_spacing,
            // No system fonts in the browser; the width table is the only source.
            fast_text_metrics: Some(true),
            ..ThemeOverrides::default()
        },
        ..RenderOptions::default()
    }
}

/// `config` is the same JSON/JSON5 document the CLI reads from `--configFile`.
#[wasm_bindgen]
pub fn render_corner_label_svg(config: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<CornerLabelRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        CornerLabelRenderOptions::default()
    };

    let render_options = build_render_options(options);
    render_with_options(config, render_options).map_err(|error| JsValue::from_str(&error.to_string()))
}
