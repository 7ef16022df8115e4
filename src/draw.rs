//! Ordered drawing primitives for a rendering backend.
//!
//! The label never touches pixels. It describes a layer, a rotation, the
//! container, three erase rectangles and a text block; a [`Canvas`] decides
//! how to rasterize them.

use crate::config::{Color, TextMode};
use crate::geometry::{Geometry, MeasuredSize, RectF};
use crate::text::{TextLayout, TextLine};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlockOp {
    pub lines: Vec<TextLine>,
    pub origin_x: f32,
    pub origin_y: f32,
    pub block_width: i32,
    pub font_size: f32,
    pub line_height: f32,
    pub ascent: f32,
    pub color: Color,
}

impl TextBlockOp {
    fn from_layout(layout: &TextLayout, color: Color) -> Self {
        Self {
            lines: layout.lines.clone(),
            origin_x: layout.origin_x,
            origin_y: layout.origin_y,
            block_width: layout.block_width,
            font_size: layout.font_size,
            line_height: layout.line_height,
            ascent: layout.ascent,
            color,
        }
    }

    pub fn center_x(&self) -> f32 {
        self.origin_x + self.block_width as f32 / 2.0
    }

    pub fn baseline(&self, index: usize) -> f32 {
        self.origin_y + self.ascent + index as f32 * self.line_height
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawOp {
    /// Offscreen layer that erasing clears; closed by `Restore`.
    SaveLayer { bounds: RectF },
    Rotate {
        degrees: f32,
        pivot_x: f32,
        pivot_y: f32,
    },
    DrawContainer { width: f32, height: f32 },
    Erase { rect: RectF },
    /// Undoes the rotation and composites the layer.
    Restore,
    DrawTextBlock(TextBlockOp),
}

/// A rendering backend that can replay [`DrawOp`]s.
pub trait Canvas {
    fn size(&self) -> MeasuredSize;
    fn save_layer(&mut self, bounds: RectF);
    fn rotate(&mut self, degrees: f32, pivot_x: f32, pivot_y: f32);
    fn draw_container(&mut self, width: f32, height: f32);
    fn erase(&mut self, rect: RectF);
    fn restore(&mut self);
    fn draw_text_block(&mut self, block: &TextBlockOp);
}

pub fn replay(ops: &[DrawOp], canvas: &mut dyn Canvas) {
    for op in ops {
        match op {
            DrawOp::SaveLayer { bounds } => canvas.save_layer(*bounds),
            DrawOp::Rotate {
                degrees,
                pivot_x,
                pivot_y,
            } => canvas.rotate(*degrees, *pivot_x, *pivot_y),
            DrawOp::DrawContainer { width, height } => canvas.draw_container(*width, *height),
            DrawOp::Erase { rect } => canvas.erase(*rect),
            DrawOp::Restore => canvas.restore(),
            DrawOp::DrawTextBlock(block) => canvas.draw_text_block(block),
        }
    }
}

/// The three erase rectangles, in the rotated frame. The last two reach past
/// the canvas edges for surfaces that leave stray pixels there. Everything
/// below the band is cleared, including space added for a minimum height.
pub fn erase_rects(geometry: &Geometry, thickness: u32, canvas: MeasuredSize) -> [RectF; 3] {
    let w = geometry.bounding_width as f32;
    let h = geometry.band_height as f32;
    let cw = canvas.width as f32;
    let ch = canvas.height as f32;
    [
        RectF::new(0.0, 0.0, w, h - thickness as f32),
        RectF::new(-cw, h, cw, ch),
        RectF::new(w, 0.0, cw, ch),
    ]
}

pub fn build_ops(
    geometry: &Geometry,
    layout: &TextLayout,
    thickness: u32,
    text_color: Color,
    mode: TextMode,
    canvas: MeasuredSize,
) -> Vec<DrawOp> {
    let w = geometry.bounding_width as f32;
    let h = geometry.bounding_height as f32;
    let text = (!layout.is_empty()).then(|| DrawOp::DrawTextBlock(TextBlockOp::from_layout(layout, text_color)));

    let mut ops = vec![
        DrawOp::SaveLayer {
            bounds: RectF::new(0.0, 0.0, w, h),
        },
        DrawOp::Rotate {
            degrees: geometry.rotation.degrees,
            pivot_x: geometry.rotation.pivot_x,
            pivot_y: geometry.rotation.pivot_y,
        },
        DrawOp::DrawContainer { width: w, height: h },
    ];
    if mode == TextMode::AlongBand {
        ops.extend(text.clone());
    }
    ops.extend(
        erase_rects(geometry, thickness, canvas)
            .into_iter()
            .map(|rect| DrawOp::Erase { rect }),
    );
    ops.push(DrawOp::Restore);
    if mode == TextMode::Upright {
        ops.extend(text);
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Corner;
    use crate::geometry::solve;
    use crate::text::{FastMetrics, fit_text, initial_font_size};

    fn example() -> (Geometry, MeasuredSize) {
        let geometry = solve(45.0, 20, 20, Corner::TopRight, 0, 0);
        let size = MeasuredSize {
            width: 81,
            height: 57,
        };
        (geometry, size)
    }

    fn kinds(ops: &[DrawOp]) -> Vec<&'static str> {
        ops.iter()
            .map(|op| match op {
                DrawOp::SaveLayer { .. } => "save",
                DrawOp::Rotate { .. } => "rotate",
                DrawOp::DrawContainer { .. } => "container",
                DrawOp::Erase { .. } => "erase",
                DrawOp::Restore => "restore",
                DrawOp::DrawTextBlock(_) => "text",
            })
            .collect()
    }

    #[test]
    fn upright_text_is_drawn_after_restore() {
        let (geometry, size) = example();
        let layout = fit_text("NEW", &geometry.interior, initial_font_size(20), &FastMetrics::default());
        let ops = build_ops(&geometry, &layout, 20, Color::WHITE, TextMode::Upright, size);
        assert_eq!(
            kinds(&ops),
            vec!["save", "rotate", "container", "erase", "erase", "erase", "restore", "text"]
        );
    }

    #[test]
    fn band_text_is_drawn_before_erasing() {
        let (geometry, size) = example();
        let layout = fit_text("NEW", &geometry.interior, initial_font_size(20), &FastMetrics::default());
        let ops = build_ops(&geometry, &layout, 20, Color::WHITE, TextMode::AlongBand, size);
        assert_eq!(
            kinds(&ops),
            vec!["save", "rotate", "container", "text", "erase", "erase", "erase", "restore"]
        );
    }

    #[test]
    fn empty_layout_issues_no_text_op() {
        let (geometry, size) = example();
        let ops = build_ops(&geometry, &TextLayout::empty(), 20, Color::WHITE, TextMode::Upright, size);
        assert!(!ops.iter().any(|op| matches!(op, DrawOp::DrawTextBlock(_))));
    }

    #[test]
    fn erase_rects_cover_outside_of_band() {
        let (geometry, size) = example();
        let [above, below, beside] = erase_rects(&geometry, 20, size);
        assert_eq!(above, RectF::new(0.0, 0.0, 81.0, 37.0));
        assert_eq!(below, RectF::new(-81.0, 57.0, 81.0, 57.0));
        assert_eq!(beside, RectF::new(81.0, 0.0, 81.0, 57.0));
    }

    #[test]
    fn rotation_uses_geometry_pivot() {
        let (geometry, size) = example();
        let ops = build_ops(&geometry, &TextLayout::empty(), 20, Color::WHITE, TextMode::Upright, size);
        let DrawOp::Rotate {
            degrees,
            pivot_x,
            pivot_y,
        } = ops[1]
        else {
            panic!("expected rotate, got {:?}", ops[1]);
        };
        assert_eq!(degrees, 45.0);
        assert_eq!(pivot_x, 81.0);
        assert_eq!(pivot_y, geometry.pivot_offset);
    }

    #[test]
    fn minimum_size_moves_pivot_and_erasure_with_the_box() {
        let geometry = solve(45.0, 20, 20, Corner::TopRight, 0, 0).with_minimum(Corner::TopRight, 200, 90);
        let size = MeasuredSize {
            width: 200,
            height: 90,
        };
        let ops = build_ops(&geometry, &TextLayout::empty(), 20, Color::WHITE, TextMode::Upright, size);
        assert!(matches!(ops[1], DrawOp::Rotate { pivot_x, .. } if pivot_x == 200.0));
        let [above, below, beside] = erase_rects(&geometry, 20, size);
        assert_eq!(above, RectF::new(0.0, 0.0, 200.0, 37.0));
        assert_eq!(below.top, 57.0);
        assert_eq!(beside.left, 200.0);
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl Canvas for Recorder {
        fn size(&self) -> MeasuredSize {
            MeasuredSize {
                width: 81,
                height: 57,
            }
        }
        fn save_layer(&mut self, _bounds: RectF) {
            self.calls.push("save".into());
        }
        fn rotate(&mut self, degrees: f32, _pivot_x: f32, _pivot_y: f32) {
            self.calls.push(format!("rotate {degrees}"));
        }
        fn draw_container(&mut self, _width: f32, _height: f32) {
            self.calls.push("container".into());
        }
        fn erase(&mut self, _rect: RectF) {
            self.calls.push("erase".into());
        }
        fn restore(&mut self) {
            self.calls.push("restore".into());
        }
        fn draw_text_block(&mut self, block: &TextBlockOp) {
            self.calls.push(format!("text {}", block.lines.len()));
        }
    }

    #[test]
    fn replay_forwards_every_op() {
        let (geometry, size) = example();
        let layout = fit_text("NEW", &geometry.interior, 12.0, &FastMetrics::default());
        let ops = build_ops(&geometry, &layout, 20, Color::WHITE, TextMode::Upright, size);
        let mut recorder = Recorder::default();
        replay(&ops, &mut recorder);
        assert_eq!(recorder.calls.len(), ops.len());
        assert_eq!(recorder.calls[1], "rotate 45");
        assert_eq!(recorder.calls.last().map(String::as_str), Some("text 1"));
    }
}
