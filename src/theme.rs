use crate::config::Color;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    /// Fill of the container; only the band survives erasing.
    pub ribbon_color: Color,
    /// Page background behind the label, `None` for transparent.
    pub background: Option<Color>,
    /// Use the built-in width table instead of loading system fonts.
    pub fast_text_metrics: bool,
    /// Multiplier applied to the font's natural line height.
    pub line_spacing: f32,
}

impl Theme {
    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            ribbon_color: Color::rgb(0xE5, 0x39, 0x35),
            background: None,
            fast_text_metrics: false,
            line_spacing: 1.0,
        }
    }

    pub fn classic() -> Self {
        Self {
            font_family: "Roboto, \"Droid Sans\", sans-serif".to_string(),
            ribbon_color: Color::rgb(0xFF, 0x98, 0x00),
            background: Some(Color::WHITE),
            fast_text_metrics: false,
            line_spacing: 1.0,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::modern()
    }
}

/// Theme fields a caller forces over whatever a config file chose.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThemeOverrides {
    pub font_family: Option<String>,
    pub ribbon_color: Option<Color>,
    pub fast_text_metrics: Option<bool>,
    pub line_spacing: Option<f32>,
}

impl ThemeOverrides {
    pub fn apply(&self, theme: &mut Theme) {
        if let Some(font_family) = &self.font_family {
            theme.font_family = font_family.clone();
        }
        if let Some(color) = self.ribbon_color {
            theme.ribbon_color = color;
        }
        if let Some(fast) = self.fast_text_metrics {
            theme.fast_text_metrics = fast;
        }
        if let Some(spacing) = self.line_spacing {
            theme.line_spacing = spacing.max(0.1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_set_fields() {
        let mut theme = Theme::classic();
        ThemeOverrides {
            fast_text_metrics: Some(true),
            line_spacing: Some(0.0),
            ..ThemeOverrides::default()
        }
        .apply(&mut theme);
        assert!(theme.fast_text_metrics);
        assert_eq!(theme.line_spacing, 0.1);
        assert_eq!(theme.ribbon_color, Theme::classic().ribbon_color);
        assert_eq!(theme.font_family, Theme::classic().font_family);
    }
}
