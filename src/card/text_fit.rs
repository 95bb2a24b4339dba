use crate::assets::fonts::FontSpec;
use crate::assets::text::TextMeasure;
use crate::foundation::error::{CardError, CardResult};

/// Outcome of fitting one string into a width budget.
#[derive(Clone, Debug, PartialEq)]
pub struct TextFitResult {
    /// Text to draw; only differs from the input when even `min_size_px` overflowed.
    pub text: String,
    pub font_size_px: f32,
    pub measured_width_px: f64,
}

/// Largest size `start_px - k` (integer `k >= 0`, not below `min_size_px`) whose measured width
/// fits `max_width_px`.
///
/// Width is assumed non-decreasing in size, so the search is a binary search over `k`. When the
/// floor size still overflows, the text is shortened with a trailing `...` until it fits.
pub fn fit_text(
    measure: &mut dyn TextMeasure,
    text: &str,
    font: &FontSpec,
    start_px: f32,
    min_size_px: f32,
    max_width_px: f64,
) -> CardResult<TextFitResult> {
    if !start_px.is_finite() || start_px <= 0.0 {
        return Err(CardError::validation(format!(
            "text fit start size must be > 0 (got {start_px})"
        )));
    }
    // Never above the start size, even when that is under 1px.
    let floor = min_size_px.max(1.0).min(start_px);

    let width = measure.measure(text, font, start_px)?;
    if width <= max_width_px {
        return Ok(TextFitResult {
            text: text.to_owned(),
            font_size_px: start_px,
            measured_width_px: width,
        });
    }

    // Invariant: size(lo) overflows; size(hi) fits, or hi is the floor step.
    let max_steps = (start_px - floor).floor() as u32;
    let (mut lo, mut hi) = (0u32, max_steps);
    let mut hi_width = measure.measure(text, font, start_px - hi as f32)?;
    if hi_width <= max_width_px {
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            let w = measure.measure(text, font, start_px - mid as f32)?;
            if w <= max_width_px {
                hi = mid;
                hi_width = w;
            } else {
                lo = mid;
            }
        }
        return Ok(TextFitResult {
            text: text.to_owned(),
            font_size_px: start_px - hi as f32,
            measured_width_px: hi_width,
        });
    }

    let size = start_px - max_steps as f32;
    let (text, measured) = shorten_to_fit(measure, text, font, size, max_width_px)?;
    Ok(TextFitResult {
        text,
        font_size_px: size,
        measured_width_px: measured,
    })
}

fn shorten_to_fit(
    measure: &mut dyn TextMeasure,
    text: &str,
    font: &FontSpec,
    size_px: f32,
    max_width_px: f64,
) -> CardResult<(String, f64)> {
    let chars: Vec<char> = text.chars().collect();
    let mut keep = chars.len();
    while keep > 0 {
        keep -= 1;
        let candidate: String = chars[..keep].iter().collect::<String>() + "...";
        let w = measure.measure(&candidate, font, size_px)?;
        if w <= max_width_px {
            return Ok((candidate, w));
        }
    }
    Ok(("...".to_owned(), measure.measure("...", font, size_px)?))
}
