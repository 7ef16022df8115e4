//! System font metrics via fontdb + ttf-parser.
//!
//! Faces are resolved once per family string and cached for the life of the
//! process. Callers fall back to the built-in width table when no face can be
//! found (headless machines without fonts, wasm).

use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, warn};
use ttf_parser::Face;

static FONT_CACHE: Lazy<Mutex<FontCache>> = Lazy::new(|| Mutex::new(FontCache::new()));

/// Vertical metrics of a face scaled to a font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledVMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
}

impl ScaledVMetrics {
    pub fn line_height(&self) -> f32 {
        self.ascent + self.descent + self.line_gap
    }
}

pub fn measure_text_width(text: &str, font_size: f32, font_family: &str) -> Option<f32> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    let mut guard = FONT_CACHE.lock().ok()?;
    let face = guard.face(font_family)?;
    face.measure_width(text, font_size)
}

pub fn vertical_metrics(font_size: f32, font_family: &str) -> Option<ScaledVMetrics> {
    if font_size <= 0.0 {
        return None;
    }
    let mut guard = FONT_CACHE.lock().ok()?;
    let face = guard.face(font_family)?;
    Some(face.vmetrics(font_size))
}

struct FontCache {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<String, Option<FontFace>>,
}

impl FontCache {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
        }
    }

    fn face(&mut self, font_family: &str) -> Option<&FontFace> {
        let key = font_family.trim().to_string();
        if !self.faces.contains_key(&key) {
            let face = self.load_face(font_family);
            if face.is_none() {
                warn!(font_family, "no usable font face, using fallback widths");
            }
            self.faces.insert(key.clone(), face);
        }
        self.faces.get(&key).and_then(|face| face.as_ref())
    }

    fn load_face(&mut self, font_family: &str) -> Option<FontFace> {
        let names: Vec<String> = font_family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\'').to_string())
            .filter(|name| !name.is_empty())
            .collect();

        let mut families: Vec<Family<'_>> = names
            .iter()
            .map(|name| match name.to_ascii_lowercase().as_str() {
                "serif" => Family::Serif,
                "monospace" | "ui-monospace" => Family::Monospace,
                "cursive" => Family::Cursive,
                "fantasy" => Family::Fantasy,
                "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => {
                    Family::SansSerif
                }
                _ => Family::Name(name.as_str()),
            })
            .collect();
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
            debug!(faces = self.db.len(), "loaded system fonts");
        }

        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| FontFace::parse(data.to_vec(), index))
            .flatten()
    }
}

/// Owned font bytes plus the metrics needed for layout.
struct FontFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: f32,
    ascender: f32,
    descender: f32,
    line_gap: f32,
    ascii_advances: [u16; 128],
}

impl FontFace {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Face::parse(&data, index).ok()?;
        let mut ascii_advances = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph) = face.glyph_index(byte as char) {
                ascii_advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
            }
        }
        let units_per_em = f32::from(face.units_per_em().max(1));
        let ascender = f32::from(face.ascender());
        let descender = f32::from(face.descender()).abs();
        let line_gap = f32::from(face.line_gap()).max(0.0);
        Some(Self {
            data,
            index,
            units_per_em,
            ascender,
            descender,
            line_gap,
            ascii_advances,
        })
    }

    fn vmetrics(&self, font_size: f32) -> ScaledVMetrics {
        let scale = font_size / self.units_per_em;
        ScaledVMetrics {
            ascent: self.ascender * scale,
            descent: self.descender * scale,
            line_gap: self.line_gap * scale,
        }
    }

    fn measure_width(&self, text: &str, font_size: f32) -> Option<f32> {
        let scale = font_size / self.units_per_em;
        let missing = font_size * 0.56;

        if text.is_ascii() {
            let width = text
                .bytes()
                .filter(|byte| *byte != b'\n')
                .map(|byte| match self.ascii_advances[byte as usize] {
                    0 => missing,
                    advance => f32::from(advance) * scale,
                })
                .sum::<f32>();
            return Some(width);
        }

        let face = Face::parse(&self.data, self.index).ok()?;
        let width = text
            .chars()
            .filter(|ch| *ch != '\n')
            .map(|ch| {
                face.glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .map(|advance| f32::from(advance) * scale)
                    .unwrap_or(missing)
            })
            .sum::<f32>();
        Some(width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_zero_width() {
        assert_eq!(measure_text_width("", 12.0, "sans-serif"), Some(0.0));
        assert_eq!(measure_text_width("abc", 0.0, "sans-serif"), Some(0.0));
    }

    #[test]
    fn non_positive_size_has_no_metrics() {
        assert!(vertical_metrics(0.0, "sans-serif").is_none());
    }

    #[test]
    fn scaled_metrics_sum_to_line_height() {
        let metrics = ScaledVMetrics {
            ascent: 9.0,
            descent: 2.5,
            line_gap: 0.5,
        };
        assert_eq!(metrics.line_height(), 12.0);
    }

    #[test]
    fn system_font_widths_scale_when_available() {
        let (Some(small), Some(large)) = (
            measure_text_width("Ribbon", 10.0, "sans-serif"),
            measure_text_width("Ribbon", 20.0, "sans-serif"),
        ) else {
            return;
        };
        assert!((large - small * 2.0).abs() < 0.01);
    }
}
