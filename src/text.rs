use crate::geometry::Rect;
use crate::text_metrics;
use crate::theme::Theme;
use serde::Serialize;
use tracing::{debug, warn};

/// Font size search starts at this fraction of the band thickness.
pub const THICKNESS_FONT_RATIO: f32 = 0.6;
/// The search never tries sizes below this.
pub const MIN_FONT_SIZE: f32 = 1.0;
pub const FONT_SIZE_STEP: f32 = 1.0;

/// Ascent and line advance at one font size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LineMetrics {
    pub ascent: f32,
    pub height: f32,
}

/// Text measurement primitives the fitter treats as black boxes.
///
/// Line metrics are expected to scale linearly with the font size.
pub trait TextMeasure {
    fn text_width(&self, text: &str, font_size: f32) -> f32;
    fn line_metrics(&self, font_size: f32) -> LineMetrics;
}

/// Deterministic per-character width table. No font files involved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FastMetrics {
    pub line_spacing: f32,
}

impl Default for FastMetrics {
    fn default() -> Self {
        Self { line_spacing: 1.0 }
    }
}

impl TextMeasure for FastMetrics {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        fallback_text_width(text, font_size)
    }

    fn line_metrics(&self, font_size: f32) -> LineMetrics {
        LineMetrics {
            ascent: font_size * 0.93,
            height: font_size * 1.17 * self.line_spacing,
        }
    }
}

/// Metrics from the first installed face matching `font_family`.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    pub font_family: String,
    pub line_spacing: f32,
}

impl TextMeasure for FontMetrics {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text_metrics::measure_text_width(text, font_size, &self.font_family)
            .unwrap_or_else(|| fallback_text_width(text, font_size))
    }

    fn line_metrics(&self, font_size: f32) -> LineMetrics {
        match text_metrics::vertical_metrics(font_size, &self.font_family) {
            Some(v) => LineMetrics {
                ascent: v.ascent,
                height: v.line_height() * self.line_spacing,
            },
            None => FastMetrics {
                line_spacing: self.line_spacing,
            }
            .line_metrics(font_size),
        }
    }
}

/// Picks the measurer a theme asks for.
pub fn measure_for_theme(theme: &Theme) -> Box<dyn TextMeasure> {
    if theme.fast_text_metrics {
        Box::new(FastMetrics {
            line_spacing: theme.line_spacing,
        })
    } else {
        Box::new(FontMetrics {
            font_family: theme.font_family.clone(),
            line_spacing: theme.line_spacing,
        })
    }
}

pub(crate) fn char_width_factor(ch: char) -> f32 {
    match ch {
        ' ' => 0.31,
        'i' | 'j' | 'l' | 'I' | '!' | '|' | '.' | ',' | ':' | ';' | '\'' => 0.26,
        'f' | 'r' | 't' | '(' | ')' | '[' | ']' | '{' | '}' | '-' => 0.35,
        'm' | 'w' => 0.84,
        'M' | 'W' => 0.93,
        '@' | '#' | '%' | '&' => 0.95,
        c if c.is_ascii_uppercase() => 0.66,
        c if c.is_ascii_digit() => 0.60,
        c if c.is_ascii() => 0.56,
        // CJK and other wide scripts.
        c if c as u32 >= 0x2E80 => 1.0,
        _ => 0.6,
    }
}

fn fallback_text_width(text: &str, font_size: f32) -> f32 {
    text.chars()
        .filter(|ch| *ch != '\n')
        .map(char_width_factor)
        .sum::<f32>()
        * font_size
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    pub text: String,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TextLayout {
    pub font_size: f32,
    pub block_width: i32,
    pub block_height: i32,
    pub origin_x: f32,
    pub origin_y: f32,
    pub line_height: f32,
    pub ascent: f32,
    pub lines: Vec<TextLine>,
    /// Set when even the smallest size overflowed the interior.
    pub overflow: bool,
}

impl TextLayout {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Horizontal center of the block, where each line is anchored.
    pub fn center_x(&self) -> f32 {
        self.origin_x + self.block_width as f32 / 2.0
    }

    /// Baseline of line `index` in label coordinates.
    pub fn baseline(&self, index: usize) -> f32 {
        self.origin_y + self.ascent + index as f32 * self.line_height
    }
}

pub fn initial_font_size(thickness: u32) -> f32 {
    thickness as f32 * THICKNESS_FONT_RATIO
}

/// Sizes tried one step at a time before the search switches to bisection.
const LINEAR_FIT_STEPS: u64 = 256;

struct Attempt {
    size: f32,
    lines: Vec<TextLine>,
    metrics: LineMetrics,
    block_height: i32,
}

/// Finds the largest size, stepping down from `start_size`, whose wrapped
/// block fits `interior`, and centers the block in it.
///
/// Candidates are `start_size - k * FONT_SIZE_STEP` down to [`MIN_FONT_SIZE`].
/// Sizes whose paragraphs alone, one line each, are taller than the interior
/// are skipped, and past [`LINEAR_FIT_STEPS`] candidates the remaining range
/// is bisected, so the work is bounded for any start size.
pub fn fit_text(
    text: &str,
    interior: &Rect,
    start_size: f32,
    measure: &dyn TextMeasure,
) -> TextLayout {
    if text.trim().is_empty() {
        return TextLayout::empty();
    }
    if interior.is_degenerate() {
        debug!(?interior, "interior rectangle is degenerate, skipping text");
        return TextLayout::empty();
    }

    let max_width = interior.width() as f32;
    let max_height = interior.height();
    let start = f64::from(start_size.max(MIN_FONT_SIZE));
    let step = f64::from(FONT_SIZE_STEP);
    let last = ((start - f64::from(MIN_FONT_SIZE)) / step).floor() as u64;
    let first = first_step(text, start, step, max_height, measure).min(last);

    let mut attempts = 0u32;
    let mut attempt = |k: u64| {
        attempts += 1;
        let size = (start - k as f64 * step) as f32;
        let lines = wrap_text(text, max_width, size, measure);
        let metrics = measure.line_metrics(size);
        let block_height = (lines.len() as f32 * metrics.height).ceil() as i32;
        Attempt {
            size,
            lines,
            metrics,
            block_height,
        }
    };

    let linear_end = last.min(first.saturating_add(LINEAR_FIT_STEPS));
    let mut chosen = None;
    for k in first..=linear_end {
        let candidate = attempt(k);
        if candidate.block_height <= max_height || k == last {
            chosen = Some(candidate);
            break;
        }
    }
    let chosen = match chosen {
        Some(candidate) => candidate,
        None => {
            // Smallest step index in (linear_end, last] that fits.
            let (mut lo, mut hi) = (linear_end + 1, last);
            let mut best = None;
            while lo <= hi {
                let mid = lo + (hi - lo) / 2;
                let candidate = attempt(mid);
                if candidate.block_height <= max_height {
                    best = Some(candidate);
                    hi = mid - 1;
                } else {
                    lo = mid + 1;
                }
            }
            match best {
                Some(candidate) => candidate,
                None => attempt(last),
            }
        }
    };

    let fits = chosen.block_height <= max_height;
    if !fits {
        warn!(
            size = chosen.size,
            block_height = chosen.block_height,
            max_height,
            "label text overflows the band at minimum size"
        );
    }
    debug!(size = chosen.size, attempts, lines = chosen.lines.len(), "fitted label text");
    place(chosen, interior, !fits)
}

/// Steps that can be skipped because even one line per paragraph is taller
/// than `max_height`. Assumes line height scales linearly with font size.
fn first_step(text: &str, start: f64, step: f64, max_height: i32, measure: &dyn TextMeasure) -> u64 {
    let unit_height = f64::from(measure.line_metrics(1.0).height);
    if !(unit_height > 0.0) {
        return 0;
    }
    let paragraphs = split_paragraphs(text).len().max(1) as f64;
    let largest = f64::from(max_height) / (paragraphs * unit_height);
    ((start - largest) / step).floor().max(0.0) as u64
}

fn place(attempt: Attempt, interior: &Rect, overflow: bool) -> TextLayout {
    let block_width = attempt
        .lines
        .iter()
        .map(|line| line.width)
        .fold(0.0, f32::max)
        .ceil() as i32;
    TextLayout {
        font_size: attempt.size,
        block_width,
        block_height: attempt.block_height,
        origin_x: interior.left as f32 + (interior.width() - block_width) as f32 / 2.0,
        origin_y: interior.top as f32 + (interior.height() - attempt.block_height) as f32 / 2.0,
        line_height: attempt.metrics.height,
        ascent: attempt.metrics.ascent,
        lines: attempt.lines,
        overflow,
    }
}

/// Explicit newlines start new paragraphs.
pub(crate) fn split_paragraphs(text: &str) -> Vec<String> {
    text.split('\n').map(|line| line.trim().to_string()).collect()
}

/// Greedy word wrap. Words wider than `max_width` are broken between characters.
pub fn wrap_text(
    text: &str,
    max_width: f32,
    font_size: f32,
    measure: &dyn TextMeasure,
) -> Vec<TextLine> {
    let width_of = |s: &str| measure.text_width(s, font_size);
    let mut lines = Vec::new();
    for paragraph in split_paragraphs(text) {
        if width_of(&paragraph) <= max_width {
            let width = width_of(&paragraph);
            lines.push(TextLine {
                text: paragraph,
                width,
            });
            continue;
        }

        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if width_of(&candidate) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(TextLine {
                    width: width_of(&current),
                    text: std::mem::take(&mut current),
                });
            }
            if width_of(word) <= max_width {
                current.push_str(word);
                continue;
            }
            for ch in word.chars() {
                let mut next = current.clone();
                next.push(ch);
                if !current.is_empty() && width_of(&next) > max_width {
                    lines.push(TextLine {
                        width: width_of(&current),
                        text: std::mem::take(&mut current),
                    });
                    current.push(ch);
                } else {
                    current = next;
                }
            }
        }
        if !current.is_empty() {
            lines.push(TextLine {
                width: width_of(&current),
                text: current,
            });
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Every character is exactly half an em wide; lines are one em tall.
    struct GridMetrics;

    impl TextMeasure for GridMetrics {
        fn text_width(&self, text: &str, font_size: f32) -> f32 {
            text.chars().count() as f32 * font_size * 0.5
        }

        fn line_metrics(&self, font_size: f32) -> LineMetrics {
            LineMetrics {
                ascent: font_size * 0.8,
                height: font_size,
            }
        }
    }

    #[test]
    fn short_text_fits_at_initial_size() {
        let rect = Rect::new(0, 0, 200, 60);
        let layout = fit_text("OK", &rect, initial_font_size(40), &FastMetrics::default());
        assert!(layout.font_size <= 0.6 * 40.0);
        assert!(layout.block_height <= 60);
        assert!(!layout.overflow);
        assert_eq!(layout.lines.len(), 1);
        assert_relative_eq!(layout.font_size, 24.0, epsilon = 1e-4);
    }

    #[test]
    fn empty_text_yields_empty_layout() {
        let rect = Rect::new(0, 0, 200, 60);
        let layout = fit_text("", &rect, 12.0, &FastMetrics::default());
        assert!(layout.is_empty());
        assert_eq!(layout.block_width, 0);
        assert_eq!(layout.block_height, 0);
    }

    #[test]
    fn degenerate_interior_yields_empty_layout() {
        for rect in [Rect::new(10, 10, 10, 40), Rect::new(0, 20, 50, 20), Rect::new(30, 0, 10, 5)] {
            let layout = fit_text("SALE", &rect, 12.0, &GridMetrics);
            assert!(layout.is_empty(), "{rect:?}");
        }
    }

    #[test]
    fn shrinks_one_step_at_a_time_until_it_fits() {
        // 10 px tall interior: sizes 12, 11 overflow; 10 fits.
        let rect = Rect::new(0, 0, 500, 10);
        let layout = fit_text("HOT", &rect, 12.0, &GridMetrics);
        assert_eq!(layout.font_size, 10.0);
        assert_eq!(layout.block_height, 10);
    }

    #[test]
    fn wraps_before_shrinking_width() {
        // "AB CD" at size 10 is 25 px; 20 px wide forces two lines.
        let rect = Rect::new(0, 0, 20, 100);
        let layout = fit_text("AB CD", &rect, 10.0, &GridMetrics);
        assert_eq!(layout.font_size, 10.0);
        let texts: Vec<_> = layout.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["AB", "CD"]);
        assert_eq!(layout.block_height, 20);
    }

    #[test]
    fn unfittable_text_stops_at_floor() {
        let rect = Rect::new(0, 0, 40, 1);
        let layout = fit_text("never fits\nat all\nthree", &rect, 30.0, &GridMetrics);
        assert!(layout.overflow);
        assert!(layout.font_size >= MIN_FONT_SIZE);
        assert!(layout.font_size < MIN_FONT_SIZE + FONT_SIZE_STEP);
    }

    #[test]
    fn huge_start_size_terminates_and_fits() {
        let rect = Rect::new(0, 0, 1000, 1000);
        let layout = fit_text("A\nB\nC", &rect, 2.0e7, &FastMetrics::default());
        assert!(!layout.overflow);
        assert_eq!(layout.lines.len(), 3);
        assert!(layout.block_height <= 1000);
        assert!(layout.font_size > 200.0);
    }

    #[test]
    fn long_search_matches_single_steps() {
        // Wrapping keeps the paragraph skip from reaching the answer, so
        // the search runs past the linear window and bisects.
        let text = "AAAA AAAA AAAA AAAA";
        let rect = Rect::new(0, 0, 8, 3000);
        let layout = fit_text(text, &rect, 5000.0, &GridMetrics);
        let mut size = 5000.0f32;
        let expected = loop {
            let lines = wrap_text(text, 8.0, size, &GridMetrics).len();
            if lines as f32 * size <= 3000.0 {
                break size;
            }
            size -= 1.0;
        };
        assert_eq!(expected, 187.0);
        assert_eq!(layout.font_size, expected);
        assert!(!layout.overflow);
    }

    #[test]
    fn whitespace_only_text_yields_empty_layout() {
        let rect = Rect::new(0, 0, 200, 60);
        assert!(fit_text("  \n ", &rect, 12.0, &GridMetrics).is_empty());
    }

    #[test]
    fn tiny_start_size_is_raised_to_floor() {
        let rect = Rect::new(0, 0, 100, 100);
        let layout = fit_text("x", &rect, 0.0, &GridMetrics);
        assert_eq!(layout.font_size, MIN_FONT_SIZE);
    }

    #[test]
    fn block_is_centered_in_interior() {
        let rect = Rect::new(20, 37, 61, 57);
        let layout = fit_text("AB", &rect, 10.0, &GridMetrics);
        assert_eq!(layout.block_width, 10);
        assert_eq!(layout.block_height, 10);
        assert_eq!(layout.origin_x, 20.0 + 31.0 / 2.0);
        assert_eq!(layout.origin_y, 37.0 + 5.0);
        assert_eq!(layout.center_x(), layout.origin_x + 5.0);
        assert_eq!(layout.baseline(0), layout.origin_y + 8.0);
    }

    #[test]
    fn long_words_break_between_characters() {
        let lines = wrap_text("ABCDEFGH", 20.0, 10.0, &GridMetrics);
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["ABCD", "EFGH"]);
    }

    #[test]
    fn explicit_newlines_split_paragraphs() {
        assert_eq!(split_paragraphs("a\nb"), vec!["a", "b"]);
        assert_eq!(split_paragraphs(r"a\nb"), vec![r"a\nb"]);
        assert_eq!(split_paragraphs("  hot  \n deal "), vec!["hot", "deal"]);
    }

    #[test]
    fn char_width_factor_returns_positive_values() {
        for ch in ['a', 'Z', ' ', '0', '@', '\u{4e2d}', 'é'] {
            assert!(char_width_factor(ch) > 0.0, "char {:?} has zero width", ch);
        }
    }

    #[test]
    fn fallback_text_width_scales_with_font_size() {
        let w16 = fallback_text_width("Hello", 16.0);
        let w32 = fallback_text_width("Hello", 32.0);
        assert!((w32 - w16 * 2.0).abs() < 0.01);
    }

    #[test]
    fn theme_selects_measurer() {
        let mut theme = Theme::default();
        theme.fast_text_metrics = true;
        let measure = measure_for_theme(&theme);
        assert_eq!(measure.text_width("ab", 10.0), fallback_text_width("ab", 10.0));
    }
}
