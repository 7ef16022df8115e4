use crate::config::{Corner, TextMode};
use crate::draw::DrawOp;
use crate::geometry::{Geometry, MeasuredSize, Rect, Rotation};
use crate::label::CornerLabel;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelDump {
    pub angle: f32,
    pub distance: u32,
    pub thickness: u32,
    pub corner: Corner,
    pub text_mode: TextMode,
    pub size: MeasuredSize,
    pub geometry: GeometryDump,
    pub text: Option<TextDump>,
    pub ops: Vec<DrawOp>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryDump {
    pub bounding_width: i32,
    pub bounding_height: i32,
    pub band_height: i32,
    pub pivot_offset: f32,
    pub interior: Rect,
    pub interior_width: i32,
    pub interior_height: i32,
    pub rotation: Rotation,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDump {
    pub content: String,
    pub font_size: f32,
    pub block_width: i32,
    pub block_height: i32,
    pub origin_x: f32,
    pub origin_y: f32,
    pub lines: Vec<String>,
    pub overflow: bool,
}

impl GeometryDump {
    fn from_geometry(geometry: &Geometry) -> Self {
        Self {
            bounding_width: geometry.bounding_width,
            bounding_height: geometry.bounding_height,
            band_height: geometry.band_height,
            pivot_offset: geometry.pivot_offset,
            interior: geometry.interior,
            interior_width: geometry.interior.width(),
            interior_height: geometry.interior.height(),
            rotation: geometry.rotation,
        }
    }
}

impl LabelDump {
    pub fn from_label(label: &mut CornerLabel) -> Self {
        let size = label.measure(Default::default(), Default::default());
        let ops = label.draw_ops();
        let geometry = GeometryDump::from_geometry(label.geometry());
        let content = label.text().map(str::to_string);
        let layout = label.text_layout();
        let text = content.filter(|_| !layout.is_empty()).map(|content| TextDump {
            content,
            font_size: layout.font_size,
            block_width: layout.block_width,
            block_height: layout.block_height,
            origin_x: layout.origin_x,
            origin_y: layout.origin_y,
            lines: layout.lines.iter().map(|line| line.text.clone()).collect(),
            overflow: layout.overflow,
        });
        let config = label.config();
        Self {
            angle: config.angle,
            distance: config.distance,
            thickness: config.thickness,
            corner: config.corner,
            text_mode: config.text_mode,
            size,
            geometry,
            text,
            ops,
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn write_layout_dump(path: &Path, label: &mut CornerLabel) -> anyhow::Result<()> {
    let dump = LabelDump::from_label(label);
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
