use crate::geometry::normalize_angle;
use crate::theme::Theme;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_ANGLE: f32 = 45.0;
pub const DEFAULT_THICKNESS_DP: f32 = 20.0;
pub const DEFAULT_DISTANCE_DP: f32 = 20.0;

static COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap());
static DIMENSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*(dp|dip|px)?\s*$").unwrap());

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid gravity {0:?}: expected 0/1, \"topLeft\" or \"topRight\"")]
    InvalidCorner(String),
    #[error("invalid color {0:?}")]
    InvalidColor(String),
    #[error("invalid dimension {0:?}: expected a non-negative number with optional dp/px suffix")]
    InvalidDimension(String),
    #[error("invalid text mode {0:?}: expected \"upright\" or \"alongBand\"")]
    InvalidTextMode(String),
    #[error("density must be positive, got {0}")]
    InvalidDensity(f32),
}

/// Which corner of the container the band is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Corner {
    TopLeft,
    #[default]
    TopRight,
}

impl Corner {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "topleft" | "lefttop" => Some(Self::TopLeft),
            "topright" | "righttop" => Some(Self::TopRight),
            _ => None,
        }
    }
}

impl TryFrom<i64> for Corner {
    type Error = ConfigError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::TopLeft),
            1 => Ok(Self::TopRight),
            other => Err(ConfigError::InvalidCorner(other.to_string())),
        }
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TopLeft => f.write_str("topLeft"),
            Self::TopRight => f.write_str("topRight"),
        }
    }
}

/// Where the text block is painted relative to the canvas rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TextMode {
    /// Painted after the rotation is restored, axis-aligned.
    #[default]
    Upright,
    /// Painted inside the rotated frame, before erasing, so it follows the band.
    AlongBand,
}

impl TextMode {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "upright" => Some(Self::Upright),
            "alongband" | "band" => Some(Self::AlongBand),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const TRANSPARENT: Self = Self::argb(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#RGB`, `#RRGGBB`, `#AARRGGBB` (alpha first) or a handful of names.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let trimmed = input.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "white" => return Ok(Self::WHITE),
            "black" => return Ok(Self::BLACK),
            "transparent" => return Ok(Self::TRANSPARENT),
            "red" => return Ok(Self::rgb(255, 0, 0)),
            "green" => return Ok(Self::rgb(0, 255, 0)),
            "blue" => return Ok(Self::rgb(0, 0, 255)),
            _ => {}
        }
        let caps = COLOR_RE
            .captures(trimmed)
            .ok_or_else(|| ConfigError::InvalidColor(input.to_string()))?;
        let hex = &caps[1];
        let byte = |s: &str| {
            u8::from_str_radix(s, 16).map_err(|_| ConfigError::InvalidColor(input.to_string()))
        };
        match hex.len() {
            3 => {
                let nibble = |i: usize| byte(&hex[i..i + 1].repeat(2));
                Ok(Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
            }
            6 => Ok(Self::rgb(byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?)),
            _ => Ok(Self::argb(
                byte(&hex[0..2])?,
                byte(&hex[2..4])?,
                byte(&hex[4..6])?,
                byte(&hex[6..8])?,
            )),
        }
    }

    /// `#rrggbb` without alpha, for SVG `fill`.
    pub fn to_hex_rgb(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn opacity(self) -> f32 {
        self.a as f32 / 255.0
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        if color.a == 255 {
            color.to_hex_rgb()
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", color.a, color.r, color.g, color.b)
        }
    }
}

/// A length as written in a config file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Dp(f32),
    Px(f32),
}

impl Dimension {
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let caps = DIMENSION_RE
            .captures(input)
            .ok_or_else(|| ConfigError::InvalidDimension(input.to_string()))?;
        let value: f32 = caps[1]
            .parse()
            .map_err(|_| ConfigError::InvalidDimension(input.to_string()))?;
        match caps.get(2).map(|m| m.as_str()) {
            Some("px") => Ok(Self::Px(value)),
            _ => Ok(Self::Dp(value)),
        }
    }

    /// Rounded pixel size; a non-zero dp value never collapses to 0 px.
    pub fn to_px(self, density: f32) -> u32 {
        match self {
            Self::Px(px) => px.round().max(0.0) as u32,
            Self::Dp(dp) if dp == 0.0 => 0,
            Self::Dp(dp) => (dp * density).round().max(1.0) as u32,
        }
    }
}

/// Built-in defaults convert by truncation.
pub fn default_px(dp: f32, density: f32) -> u32 {
    (dp * density).max(0.0) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Padding {
    pub top: u32,
    pub bottom: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelConfig {
    pub angle: f32,
    pub distance: u32,
    pub thickness: u32,
    pub corner: Corner,
    pub text_color: Color,
    pub text: Option<String>,
    pub padding: Padding,
    pub min_width: u32,
    pub min_height: u32,
    pub text_mode: TextMode,
}

impl LabelConfig {
    /// Defaults with the dp lengths scaled for `density`.
    pub fn with_density(density: f32) -> Self {
        Self {
            angle: DEFAULT_ANGLE,
            distance: default_px(DEFAULT_DISTANCE_DP, density),
            thickness: default_px(DEFAULT_THICKNESS_DP, density),
            corner: Corner::default(),
            text_color: Color::WHITE,
            text: None,
            padding: Padding::default(),
            min_width: 0,
            min_height: 0,
            text_mode: TextMode::default(),
        }
    }
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self::with_density(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderConfig {
    pub density: f32,
    /// Zoom factor applied when rasterizing to PNG.
    pub scale: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            density: 1.0,
            scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub label: LabelConfig,
    pub theme: Theme,
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CornerValue {
    Index(i64),
    Name(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DimensionValue {
    Number(f32),
    Text(String),
}

impl DimensionValue {
    fn to_dimension(&self) -> Result<Dimension, ConfigError> {
        match self {
            Self::Number(value) if *value >= 0.0 => Ok(Dimension::Dp(*value)),
            Self::Number(value) => Err(ConfigError::InvalidDimension(value.to_string())),
            Self::Text(text) => Dimension::parse(text),
        }
    }

    fn to_px(&self, density: f32) -> Result<u32, ConfigError> {
        Ok(self.to_dimension()?.to_px(density))
    }
}

/// Values that take precedence over a config file. They are resolved with
/// the file's rules: lengths scale with density and an unset distance still
/// follows the thickness.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConfigOverrides {
    pub density: Option<f32>,
    pub thickness: Option<Dimension>,
    pub distance: Option<Dimension>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    ribbon_color: Option<String>,
    background: Option<String>,
    fast_text_metrics: Option<bool>,
    line_spacing: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    angle: Option<f32>,
    distance: Option<DimensionValue>,
    thickness: Option<DimensionValue>,
    text_color: Option<String>,
    text: Option<String>,
    gravity: Option<CornerValue>,
    padding_top: Option<DimensionValue>,
    padding_bottom: Option<DimensionValue>,
    min_width: Option<DimensionValue>,
    min_height: Option<DimensionValue>,
    text_mode: Option<String>,
    density: Option<f32>,
    scale: Option<f32>,
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
}

impl ConfigFile {
    /// `base_theme` applies unless the file names a preset; `themeVariables`
    /// always go on top.
    fn resolve(self, overrides: &ConfigOverrides, base_theme: Theme) -> Result<Config, ConfigError> {
        let density = overrides.density.or(self.density).unwrap_or(1.0);
        if !(density > 0.0) {
            return Err(ConfigError::InvalidDensity(density));
        }
        let mut label = LabelConfig::with_density(density);

        if let Some(angle) = self.angle {
            label.angle = normalize_angle(angle);
        }
        let thickness = match overrides.thickness {
            Some(thickness) => Some(thickness),
            None => self.thickness.as_ref().map(DimensionValue::to_dimension).transpose()?,
        };
        if let Some(thickness) = thickness {
            label.thickness = thickness.to_px(density);
        }
        let distance = match overrides.distance {
            Some(distance) => Some(distance),
            None => self.distance.as_ref().map(DimensionValue::to_dimension).transpose()?,
        };
        // An unset distance follows the resolved thickness.
        label.distance = match distance {
            Some(distance) => distance.to_px(density),
            None => label.thickness,
        };
        if let Some(color) = &self.text_color {
            label.text_color = Color::parse(color)?;
        }
        label.text = self.text.filter(|text| !text.trim().is_empty());
        if let Some(gravity) = self.gravity {
            label.corner = match gravity {
                CornerValue::Index(index) => Corner::try_from(index)?,
                CornerValue::Name(name) => {
                    Corner::from_token(&name).ok_or(ConfigError::InvalidCorner(name))?
                }
            };
        }
        if let Some(top) = &self.padding_top {
            label.padding.top = top.to_px(density)?;
        }
        if let Some(bottom) = &self.padding_bottom {
            label.padding.bottom = bottom.to_px(density)?;
        }
        if let Some(width) = &self.min_width {
            label.min_width = width.to_px(density)?;
        }
        if let Some(height) = &self.min_height {
            label.min_height = height.to_px(density)?;
        }
        if let Some(mode) = self.text_mode {
            label.text_mode = TextMode::from_token(&mode).ok_or(ConfigError::InvalidTextMode(mode))?;
        }

        let mut theme = match self.theme.as_deref() {
            Some("classic") => Theme::classic(),
            Some(_) => Theme::default(),
            None => base_theme,
        };
        if let Some(vars) = self.theme_variables {
            if let Some(v) = vars.font_family {
                theme.font_family = v;
            }
            if let Some(v) = vars.ribbon_color {
                theme.ribbon_color = Color::parse(&v)?;
            }
            if let Some(v) = vars.background {
                theme.background = Some(Color::parse(&v)?);
            }
            if let Some(v) = vars.fast_text_metrics {
                theme.fast_text_metrics = v;
            }
            if let Some(v) = vars.line_spacing {
                theme.line_spacing = v.max(0.1);
            }
        }

        Ok(Config {
            label,
            theme,
            render: RenderConfig {
                density,
                scale: self.scale.filter(|s| *s > 0.0).unwrap_or(1.0),
            },
        })
    }
}

fn parse_file(contents: &str, json5: bool) -> anyhow::Result<ConfigFile> {
    Ok(if json5 {
        json5::from_str(contents)?
    } else {
        serde_json::from_str(contents)?
    })
}

/// Parses config text; `.json5` sources go through the json5 parser.
pub fn parse_config(contents: &str, json5: bool) -> anyhow::Result<Config> {
    parse_config_with_theme(contents, json5, Theme::default())
}

/// Like [`parse_config`], starting from `base_theme` instead of the default.
pub fn parse_config_with_theme(contents: &str, json5: bool, base_theme: Theme) -> anyhow::Result<Config> {
    Ok(parse_file(contents, json5)?.resolve(&ConfigOverrides::default(), base_theme)?)
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    load_config_with(path, &ConfigOverrides::default())
}

/// Loads `path` (or the defaults) with `overrides` taking precedence.
pub fn load_config_with(path: Option<&Path>, overrides: &ConfigOverrides) -> anyhow::Result<Config> {
    let file = match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)?;
            let is_json5 = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("json5"))
                .unwrap_or(false);
            parse_file(&contents, is_json5)?
        }
        None => ConfigFile::default(),
    };
    Ok(file.resolve(overrides, Theme::default())?)
}
