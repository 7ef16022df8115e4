use crate::config::{Color, LabelConfig};
use crate::draw::{Canvas, TextBlockOp};
use crate::geometry::{MeasuredSize, RectF};
use crate::label::CornerLabel;
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;
use tracing::debug;

struct Layer {
    bounds: RectF,
    content: String,
    erasures: String,
}

/// Canvas that writes SVG. Layers become masked groups; erase rectangles
/// are painted black into the layer's mask.
pub struct SvgCanvas {
    size: MeasuredSize,
    font_family: String,
    ribbon_color: Color,
    background: Option<Color>,
    body: String,
    defs: String,
    layers: Vec<Layer>,
    transform: Option<String>,
    masks: usize,
}

impl SvgCanvas {
    pub fn new(size: MeasuredSize, theme: &Theme) -> Self {
        Self {
            size,
            font_family: theme.font_family.clone(),
            ribbon_color: theme.ribbon_color,
            background: theme.background,
            body: String::new(),
            defs: String::new(),
            layers: Vec::new(),
            transform: None,
            masks: 0,
        }
    }

    fn transform_attr(&self) -> String {
        match &self.transform {
            Some(transform) => format!(" transform=\"{transform}\""),
            None => String::new(),
        }
    }

    fn push(&mut self, element: &str) {
        match self.layers.last_mut() {
            Some(layer) => layer.content.push_str(element),
            None => self.body.push_str(element),
        }
    }

    pub fn finish(mut self) -> String {
        while !self.layers.is_empty() {
            self.restore();
        }
        let width = self.size.width;
        let height = self.size.height;
        let mut svg = String::new();
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
        ));
        if let Some(background) = self.background {
            svg.push_str(&format!(
                "<rect width=\"100%\" height=\"100%\"{}/>",
                fill_attrs(background)
            ));
        }
        if !self.defs.is_empty() {
            svg.push_str("<defs>");
            svg.push_str(&self.defs);
            svg.push_str("</defs>");
        }
        svg.push_str(&self.body);
        svg.push_str("</svg>");
        svg
    }
}

impl Canvas for SvgCanvas {
    fn size(&self) -> MeasuredSize {
        self.size
    }

    fn save_layer(&mut self, bounds: RectF) {
        self.layers.push(Layer {
            bounds,
            content: String::new(),
            erasures: String::new(),
        });
    }

    fn rotate(&mut self, degrees: f32, pivot_x: f32, pivot_y: f32) {
        self.transform = Some(format!("rotate({degrees:.3} {pivot_x:.2} {pivot_y:.2})"));
    }

    fn draw_container(&mut self, width: f32, height: f32) {
        let element = format!(
            "<rect x=\"0\" y=\"0\" width=\"{width:.2}\" height=\"{height:.2}\"{}{}/>",
            fill_attrs(self.ribbon_color),
            self.transform_attr()
        );
        self.push(&element);
    }

    fn erase(&mut self, rect: RectF) {
        let element = format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"black\"{}/>",
            rect.left,
            rect.top,
            rect.width().max(0.0),
            rect.height().max(0.0),
            self.transform_attr()
        );
        match self.layers.last_mut() {
            Some(layer) => layer.erasures.push_str(&element),
            None => debug!(?rect, "erase outside of a layer ignored"),
        }
    }

    fn restore(&mut self) {
        self.transform = None;
        let Some(layer) = self.layers.pop() else {
            return;
        };
        let id = format!("corner-label-layer-{}", self.masks);
        self.masks += 1;
        let b = layer.bounds;
        self.defs.push_str(&format!(
            "<mask id=\"{id}\" maskUnits=\"userSpaceOnUse\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\"><rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"white\"/>{}</mask>",
            b.left,
            b.top,
            b.width(),
            b.height(),
            b.left,
            b.top,
            b.width(),
            b.height(),
            layer.erasures
        ));
        let group = format!("<g mask=\"url(#{id})\">{}</g>", layer.content);
        self.push(&group);
    }

    fn draw_text_block(&mut self, block: &TextBlockOp) {
        let x = block.center_x();
        let mut text = String::new();
        text.push_str(&format!(
            "<text text-anchor=\"middle\" font-family=\"{}\" font-size=\"{:.2}\"{}{}>",
            escape_xml(&self.font_family),
            block.font_size,
            fill_attrs(block.color),
            self.transform_attr()
        ));
        for (idx, line) in block.lines.iter().enumerate() {
            text.push_str(&format!(
                "<tspan x=\"{x:.2}\" y=\"{:.2}\">{}</tspan>",
                block.baseline(idx),
                escape_xml(&line.text)
            ));
        }
        text.push_str("</text>");
        self.push(&text);
    }
}

fn fill_attrs(color: Color) -> String {
    if color.a == 255 {
        format!(" fill=\"{}\"", color.to_hex_rgb())
    } else {
        format!(
            " fill=\"{}\" fill-opacity=\"{:.3}\"",
            color.to_hex_rgb(),
            color.opacity()
        )
    }
}

pub fn render_label_svg(label: &mut CornerLabel) -> String {
    let size = label.measure(Default::default(), Default::default());
    let mut canvas = SvgCanvas::new(size, label.theme());
    label.draw(&mut canvas);
    canvas.finish()
}

pub fn render_svg(config: &LabelConfig, theme: &Theme) -> String {
    let mut label = CornerLabel::new(config.clone(), theme.clone());
    render_label_svg(&mut label)
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, scale: f32) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let scale = if scale > 0.0 { scale } else { 1.0 };
    let width = ((size.width() as f32) * scale).ceil().max(1.0) as u32;
    let height = ((size.height() as f32) * scale).ceil().max(1.0) as u32;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate {width}x{height} pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap_mut,
    );
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
