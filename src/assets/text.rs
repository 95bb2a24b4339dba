use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::fonts::{FaceKey, FontFace, FontRegistry, FontSpec};
use crate::foundation::error::{CardError, CardResult};

/// Measures rendered text width; the only text capability layout code needs.
///
/// Layer compilation depends on this trait rather than on a font stack so that layout decisions
/// (text fitting, right-aligned labels, badge placement) stay testable without font files.
pub trait TextMeasure {
    /// Advance width in pixels of `text` set in `font` at `size_px`.
    fn measure(&mut self, text: &str, font: &FontSpec, size_px: f32) -> CardResult<f64>;
}

/// Shaped single-line text ready to be drawn.
pub(crate) struct ShapedText {
    pub(crate) layout: parley::Layout<()>,
    pub(crate) font: vello_cpu::peniko::FontData,
    /// Distance from the layout top to the first baseline.
    pub(crate) baseline: f64,
    pub(crate) width: f64,
}

/// Parley-backed text engine bound to a [`FontRegistry`].
///
/// Faces are registered into the Parley collection lazily, once per family/weight.
pub struct TextEngine {
    registry: Arc<FontRegistry>,
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    families: HashMap<FaceKey, String>,
    font_data: HashMap<FaceKey, vello_cpu::peniko::FontData>,
}

impl TextEngine {
    pub fn new(registry: Arc<FontRegistry>) -> Self {
        Self {
            registry,
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
            font_data: HashMap::new(),
        }
    }

    fn family_for(&mut self, face: &FontFace) -> CardResult<String> {
        if let Some(name) = self.families.get(&face.key) {
            return Ok(name.clone());
        }
        let families = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(face.bytes.as_ref().clone()),
            None,
        );
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| CardError::font("no font families registered from font bytes"))?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CardError::font("registered font family has no name"))?
            .to_string();
        self.families.insert(face.key.clone(), name.clone());
        Ok(name)
    }

    fn layout(
        &mut self,
        text: &str,
        font: &FontSpec,
        size_px: f32,
    ) -> CardResult<(parley::Layout<()>, FontFace)> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(CardError::validation(format!(
                "font size must be finite and > 0 (got {size_px})"
            )));
        }
        let face = self.registry.resolve(font)?.clone();
        let family_name = self.family_for(&face)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        if font.bold {
            builder.push_default(parley::style::StyleProperty::FontWeight(
                parley::style::FontWeight::BOLD,
            ));
        }

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);
        Ok((layout, face))
    }

    pub(crate) fn shape(
        &mut self,
        text: &str,
        font: &FontSpec,
        size_px: f32,
    ) -> CardResult<ShapedText> {
        let (layout, face) = self.layout(text, font, size_px)?;
        let baseline = layout
            .lines()
            .next()
            .map(|line| f64::from(line.metrics().baseline))
            .unwrap_or(f64::from(size_px));
        let width = f64::from(layout.width());

        let font_data = self
            .font_data
            .entry(face.key.clone())
            .or_insert_with(|| {
                vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(face.bytes.as_ref().clone()),
                    0,
                )
            })
            .clone();

        Ok(ShapedText {
            layout,
            font: font_data,
            baseline,
            width,
        })
    }
}

impl TextMeasure for TextEngine {
    fn measure(&mut self, text: &str, font: &FontSpec, size_px: f32) -> CardResult<f64> {
        let (layout, _) = self.layout(text, font, size_px)?;
        Ok(f64::from(layout.width()))
    }
}

/// Deterministic measurer: every char advances `size_px * advance_em`.
///
/// Handy for layout tests and for estimating without fonts.
#[derive(Clone, Copy, Debug)]
pub struct FixedAdvanceMeasure {
    pub advance_em: f64,
    /// Extra multiplier applied when the font is bold.
    pub bold_factor: f64,
}

impl Default for FixedAdvanceMeasure {
    fn default() -> Self {
        Self {
            advance_em: 0.5,
            bold_factor: 1.1,
        }
    }
}

impl TextMeasure for FixedAdvanceMeasure {
    fn measure(&mut self, text: &str, font: &FontSpec, size_px: f32) -> CardResult<f64> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(CardError::validation(format!(
                "font size must be finite and > 0 (got {size_px})"
            )));
        }
        let factor = if font.bold { self.bold_factor } else { 1.0 };
        Ok(text.chars().count() as f64 * f64::from(size_px) * self.advance_em * factor)
    }
}
