use crate::config::{Color, Corner, LabelConfig, Padding, TextMode};
use crate::draw::{self, Canvas, DrawOp};
use crate::geometry::{self, Geometry, MeasuredSize, SizeConstraint, normalize_angle};
use crate::text::{self, TextLayout, TextMeasure};
use crate::theme::Theme;
use tracing::debug;

/// A corner ribbon label.
///
/// Setters only record what changed. Derived state is rebuilt lazily by
/// [`CornerLabel::recompute`], geometry first, then the text fit, so reads
/// always see a consistent pair.
pub struct CornerLabel {
    config: LabelConfig,
    theme: Theme,
    measure: Box<dyn TextMeasure>,
    geometry: Geometry,
    layout: TextLayout,
    geometry_dirty: bool,
    layout_dirty: bool,
    geometry_version: u64,
    layout_version: u64,
}

impl CornerLabel {
    pub fn new(config: LabelConfig, theme: Theme) -> Self {
        let measure = text::measure_for_theme(&theme);
        Self::with_measure(config, theme, measure)
    }

    pub fn with_measure(
        mut config: LabelConfig,
        theme: Theme,
        measure: Box<dyn TextMeasure>,
    ) -> Self {
        config.angle = normalize_angle(config.angle);
        Self {
            config,
            theme,
            measure,
            geometry: Geometry::default(),
            layout: TextLayout::empty(),
            geometry_dirty: true,
            layout_dirty: true,
            geometry_version: 0,
            layout_version: 0,
        }
    }

    pub fn config(&self) -> &LabelConfig {
        &self.config
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn text(&self) -> Option<&str> {
        self.config.text.as_deref()
    }

    pub fn corner(&self) -> Corner {
        self.config.corner
    }

    pub fn angle(&self) -> f32 {
        self.config.angle
    }

    pub fn distance(&self) -> u32 {
        self.config.distance
    }

    pub fn thickness(&self) -> u32 {
        self.config.thickness
    }

    pub fn text_color(&self) -> Color {
        self.config.text_color
    }

    /// Number of times the geometry has been solved.
    pub fn geometry_version(&self) -> u64 {
        self.geometry_version
    }

    /// Number of times the text has been fitted.
    pub fn layout_version(&self) -> u64 {
        self.layout_version
    }

    pub fn is_dirty(&self) -> bool {
        self.geometry_dirty || self.layout_dirty
    }

    fn invalidate_geometry(&mut self) {
        self.geometry_dirty = true;
        self.layout_dirty = true;
    }

    pub fn set_text(&mut self, text: Option<&str>) {
        let text = text.filter(|t| !t.trim().is_empty());
        if self.config.text.as_deref() != text {
            self.config.text = text.map(str::to_string);
            self.layout_dirty = true;
        }
    }

    pub fn set_corner(&mut self, corner: Corner) {
        if self.config.corner != corner {
            self.config.corner = corner;
            self.invalidate_geometry();
        }
    }

    /// Non-positive angles are ignored; others are reduced modulo 90.
    pub fn set_angle(&mut self, degrees: f32) {
        if !(degrees > 0.0) {
            debug!(degrees, "ignoring non-positive angle");
            return;
        }
        let angle = normalize_angle(degrees);
        if self.config.angle != angle {
            self.config.angle = angle;
            self.invalidate_geometry();
        }
    }

    pub fn set_distance(&mut self, distance: u32) {
        if self.config.distance != distance {
            self.config.distance = distance;
            self.invalidate_geometry();
        }
    }

    pub fn set_thickness(&mut self, thickness: u32) {
        if self.config.thickness != thickness {
            self.config.thickness = thickness;
            self.invalidate_geometry();
        }
    }

    pub fn set_padding(&mut self, padding: Padding) {
        if self.config.padding != padding {
            self.config.padding = padding;
            self.invalidate_geometry();
        }
    }

    /// Color is applied at draw time and does not affect layout.
    pub fn set_text_color(&mut self, color: Color) {
        self.config.text_color = color;
    }

    pub fn set_text_mode(&mut self, mode: TextMode) {
        self.config.text_mode = mode;
    }

    pub fn set_minimum_size(&mut self, width: u32, height: u32) {
        if (self.config.min_width, self.config.min_height) != (width, height) {
            self.config.min_width = width;
            self.config.min_height = height;
            self.invalidate_geometry();
        }
    }

    pub fn recompute(&mut self) {
        if self.geometry_dirty {
            let c = &self.config;
            self.geometry = geometry::solve(
                c.angle,
                c.distance,
                c.thickness,
                c.corner,
                c.padding.top,
                c.padding.bottom,
            )
            .with_minimum(c.corner, c.min_width, c.min_height);
            self.geometry_dirty = false;
            self.geometry_version += 1;
        }
        if self.layout_dirty {
            self.layout = match self.config.text.as_deref() {
                Some(label) => text::fit_text(
                    label,
                    &self.geometry.interior,
                    text::initial_font_size(self.config.thickness),
                    self.measure.as_ref(),
                ),
                None => TextLayout::empty(),
            };
            self.layout_dirty = false;
            self.layout_version += 1;
        }
    }

    pub fn geometry(&mut self) -> &Geometry {
        self.recompute();
        &self.geometry
    }

    pub fn text_layout(&mut self) -> &TextLayout {
        self.recompute();
        &self.layout
    }

    /// The label's own size. Parent constraints are accepted and ignored.
    pub fn measure(&mut self, width: SizeConstraint, height: SizeConstraint) -> MeasuredSize {
        self.recompute();
        geometry::measure(&self.geometry, width, height)
    }

    /// Ops for a canvas exactly the label's measured size.
    pub fn draw_ops(&mut self) -> Vec<DrawOp> {
        let size = self.measure(SizeConstraint::Unspecified, SizeConstraint::Unspecified);
        self.draw_ops_for(size)
    }

    /// Ops whose overdraw rectangles reach the edges of `canvas`.
    pub fn draw_ops_for(&mut self, canvas: MeasuredSize) -> Vec<DrawOp> {
        self.recompute();
        draw::build_ops(
            &self.geometry,
            &self.layout,
            self.config.thickness,
            self.config.text_color,
            self.config.text_mode,
            canvas,
        )
    }

    pub fn draw(&mut self, canvas: &mut dyn Canvas) {
        let ops = self.draw_ops_for(canvas.size());
        draw::replay(&ops, canvas);
    }
}

impl std::fmt::Debug for CornerLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CornerLabel")
            .field("config", &self.config)
            .field("geometry", &self.geometry)
            .field("layout", &self.layout)
            .field("geometry_dirty", &self.geometry_dirty)
            .field("layout_dirty", &self.layout_dirty)
            .finish_non_exhaustive()
    }
}
