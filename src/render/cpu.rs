use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::decode::PreparedImage;
use crate::assets::fonts::FontRegistry;
use crate::assets::text::{ShapedText, TextEngine};
use crate::foundation::core::{Affine, BezPath, Rgba8};
use crate::foundation::error::{CardError, CardResult};
use crate::render::blur::{BlurEdge, blur_rgba8_premul};
use crate::render::composite::{self, Compose};
use crate::render::plan::{
    CardPlan, DrawOp, DropShadow, ImageFilter, LayerPlan, Paint, Shape, TextAlign, TextOp,
};
use crate::render::surface::{Surface, image_paint_from_premul};

/// CPU rasterizer for layer and card plans, built on `vello_cpu`.
///
/// Consecutive plain ops are drawn in one `vello_cpu` batch. Ops that need whole-surface work
/// (filtered images, shadowed text, groups with a compose mode or clip) get a scratch surface
/// and CPU kernels.
pub struct CpuBackend {
    ctx: Option<vello_cpu::RenderContext>,
    text: TextEngine,
    image_cache: HashMap<usize, vello_cpu::Image>,
}

impl CpuBackend {
    pub fn new(fonts: Arc<FontRegistry>) -> Self {
        Self {
            ctx: None,
            text: TextEngine::new(fonts),
            image_cache: HashMap::new(),
        }
    }

    /// Text engine sharing this backend's fonts, used for measuring during layout.
    pub fn text_engine_mut(&mut self) -> &mut TextEngine {
        &mut self.text
    }

    /// Fold every step of `card` onto a fresh output surface in order.
    ///
    /// Each layer and shadow is masked by the card clip before compositing, matching a clip
    /// that stays active for every draw.
    #[tracing::instrument(skip(self, card), fields(width = card.width, height = card.height))]
    pub fn render_card(&mut self, card: &CardPlan) -> CardResult<Surface> {
        // Cache keys are buffer addresses, only stable while the plan is alive.
        self.image_cache.clear();

        let (w, h) = (card.width, card.height);
        let mut out = Surface::new(w, h)?;
        let clip = card
            .clip
            .as_ref()
            .map(|shape| self.coverage_mask(shape, w, h))
            .transpose()?;

        for step in &card.steps {
            tracing::debug!(layer = step.layer.name, ops = step.layer.ops.len(), "render layer");
            let mut layer = self.render_layer(&step.layer, w, h)?;
            if let Some(shadow) = &step.shadow {
                let mut shadow_surface = drop_shadow(&layer, shadow)?;
                if let Some(mask) = &clip {
                    shadow_surface.mask_in(mask)?;
                }
                out.over(&shadow_surface, 1.0)?;
            }
            if let Some(mask) = &clip {
                layer.mask_in(mask)?;
            }
            out.over(&layer, 1.0)?;
        }

        self.image_cache.clear();
        Ok(out)
    }

    /// Rasterize one layer onto a transparent full-canvas surface.
    pub fn render_layer(&mut self, plan: &LayerPlan, width: u32, height: u32) -> CardResult<Surface> {
        let mut surface = Surface::new(width, height)?;
        self.render_ops(&plan.ops, &mut surface)?;
        Ok(surface)
    }

    fn render_ops(&mut self, ops: &[DrawOp], dst: &mut Surface) -> CardResult<()> {
        let mut batch_start = 0usize;
        for (i, op) in ops.iter().enumerate() {
            if op.is_batchable() {
                continue;
            }
            if batch_start < i {
                self.render_batch(&ops[batch_start..i], dst)?;
            }
            self.render_special(op, dst)?;
            batch_start = i + 1;
        }
        if batch_start < ops.len() {
            self.render_batch(&ops[batch_start..], dst)?;
        }
        Ok(())
    }

    fn render_special(&mut self, op: &DrawOp, dst: &mut Surface) -> CardResult<()> {
        let (w, h) = (dst.width(), dst.height());
        match op {
            DrawOp::Image {
                image,
                dest,
                opacity,
                filter,
            } => {
                let mut tmp = Surface::new(w, h)?;
                let plain = DrawOp::Image {
                    image: image.clone(),
                    dest: *dest,
                    opacity: *opacity,
                    filter: ImageFilter::default(),
                };
                self.render_batch(std::slice::from_ref(&plain), &mut tmp)?;
                apply_filter(&mut tmp, filter)?;
                dst.over(&tmp, 1.0)
            }
            DrawOp::Text(text) => {
                let Some(shadow) = text.shadow else {
                    return self.render_batch(std::slice::from_ref(op), dst);
                };
                let mut tmp = Surface::new(w, h)?;
                let plain = DrawOp::Text(TextOp {
                    shadow: None,
                    ..text.clone()
                });
                self.render_batch(std::slice::from_ref(&plain), &mut tmp)?;

                let mut silhouette = tmp.data().to_vec();
                composite::tint_in_place(&mut silhouette, shadow.color.premul());
                let blurred = blur_rgba8_premul(&silhouette, w, h, shadow.blur_sigma, BlurEdge::Transparent)?;
                let shifted = composite::offset_rgba8(
                    &blurred,
                    w,
                    h,
                    shadow.offset.x.round() as i32,
                    shadow.offset.y.round() as i32,
                );
                let mut shadow_surface = Surface::new(w, h)?;
                shadow_surface.replace_data(&shifted)?;
                dst.over(&shadow_surface, 1.0)?;
                dst.over(&tmp, 1.0)
            }
            DrawOp::Group {
                compose,
                opacity,
                clip,
                ops,
            } => {
                let mut sub = Surface::new(w, h)?;
                self.render_ops(ops, &mut sub)?;
                if let Some(shape) = clip {
                    let mask = self.coverage_mask(shape, w, h)?;
                    sub.mask_in(&mask)?;
                }
                dst.compose(&sub, *compose, *opacity)
            }
            DrawOp::Fill { .. } | DrawOp::Stroke { .. } => {
                self.render_batch(std::slice::from_ref(op), dst)
            }
        }
    }

    /// White coverage of `shape`; its alpha channel is the mask.
    fn coverage_mask(&mut self, shape: &Shape, width: u32, height: u32) -> CardResult<Surface> {
        let mut mask = Surface::new(width, height)?;
        let op = DrawOp::fill(shape.clone(), Rgba8::rgb(255, 255, 255));
        self.render_batch(std::slice::from_ref(&op), &mut mask)?;
        Ok(mask)
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> CardResult<R>,
    ) -> CardResult<R> {
        let mut ctx = match self.ctx.take() {
            None => vello_cpu::RenderContext::new(width, height),
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            Some(_) => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(self, &mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }

    /// `vello_cpu` renders into a fresh buffer, so the batch goes to a temp surface and is then
    /// premul-over'd onto the destination.
    fn render_batch(&mut self, ops: &[DrawOp], dst: &mut Surface) -> CardResult<()> {
        let (w, h) = (dst.width(), dst.height());
        let mut tmp = Surface::new(w, h)?;
        self.with_ctx_mut(w as u16, h as u16, |this, ctx| {
            for op in ops {
                this.draw_leaf(op, w, h, ctx)?;
            }
            ctx.flush();
            ctx.render_to_pixmap(tmp.pixmap_mut());
            Ok(())
        })?;
        dst.over(&tmp, 1.0)
    }

    fn image_paint_for(&mut self, image: &Arc<PreparedImage>) -> CardResult<vello_cpu::Image> {
        let key = Arc::as_ptr(&image.rgba8_premul) as usize;
        if let Some(p) = self.image_cache.get(&key) {
            return Ok(p.clone());
        }
        let paint = image_paint_from_premul(&image.rgba8_premul, image.width, image.height)?;
        self.image_cache.insert(key, paint.clone());
        Ok(paint)
    }

    fn draw_leaf(
        &mut self,
        op: &DrawOp,
        width: u32,
        height: u32,
        ctx: &mut vello_cpu::RenderContext,
    ) -> CardResult<()> {
        ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);

        match op {
            DrawOp::Fill {
                shape,
                paint,
                opacity,
            } => {
                match paint {
                    Paint::Solid(c) => ctx.set_paint(c.to_cpu()),
                    Paint::Linear(g) => {
                        let bytes = g.rasterize(width, height);
                        ctx.set_paint(image_paint_from_premul(&bytes, width, height)?);
                    }
                }
                with_opacity(ctx, *opacity, |ctx| {
                    ctx.fill_path(&bezpath_to_cpu(&shape.to_path()));
                });
                Ok(())
            }
            DrawOp::Stroke {
                shape,
                color,
                width,
            } => {
                if *width <= 0.0 {
                    return Ok(());
                }
                ctx.set_paint(color.to_cpu());
                ctx.set_stroke(vello_cpu::kurbo::Stroke::new(*width));
                ctx.stroke_path(&bezpath_to_cpu(&shape.to_path()));
                Ok(())
            }
            DrawOp::Image {
                image,
                dest,
                opacity,
                ..
            } => {
                if dest.width() <= 0.0 || dest.height() <= 0.0 {
                    return Ok(());
                }
                let paint = self.image_paint_for(image)?;
                let (iw, ih) = (f64::from(image.width), f64::from(image.height));
                let tr = Affine::translate((dest.x0, dest.y0))
                    * Affine::scale_non_uniform(dest.width() / iw, dest.height() / ih);
                ctx.set_transform(affine_to_cpu(tr));
                ctx.set_paint(paint);
                with_opacity(ctx, *opacity, |ctx| {
                    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
                });
                Ok(())
            }
            DrawOp::Text(t) => self.draw_text(t, ctx),
            DrawOp::Group { .. } => Err(CardError::render("group ops cannot be batched")),
        }
    }

    fn draw_text(&mut self, t: &TextOp, ctx: &mut vello_cpu::RenderContext) -> CardResult<()> {
        if t.text.is_empty() {
            return Ok(());
        }
        let shaped = self.text.shape(&t.text, &t.font, t.size_px)?;
        let x = match t.align {
            TextAlign::Left => t.origin.x,
            TextAlign::Center => t.origin.x - shaped.width / 2.0,
            TextAlign::Right => t.origin.x - shaped.width,
        };
        let y = t.origin.y - shaped.baseline;
        ctx.set_transform(affine_to_cpu(Affine::translate((x, y))));

        if let Some(stroke) = t.stroke.filter(|s| s.width > 0.0) {
            ctx.set_stroke(
                vello_cpu::kurbo::Stroke::new(stroke.width)
                    .with_join(vello_cpu::kurbo::Join::Round),
            );
            ctx.set_paint(stroke.color.to_cpu());
            for (font_size, glyphs) in glyph_runs(&shaped) {
                ctx.glyph_run(&shaped.font)
                    .font_size(font_size)
                    .stroke_glyphs(glyphs.into_iter());
            }
        }

        ctx.set_paint(t.color.to_cpu());
        for (font_size, glyphs) in glyph_runs(&shaped) {
            ctx.glyph_run(&shaped.font)
                .font_size(font_size)
                .fill_glyphs(glyphs.into_iter());
        }
        Ok(())
    }
}

fn glyph_runs(shaped: &ShapedText) -> Vec<(f32, Vec<vello_cpu::Glyph>)> {
    let mut runs = Vec::new();
    for line in shaped.layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let glyphs = run
                .positioned_glyphs()
                .map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                })
                .collect();
            runs.push((run.run().font_size(), glyphs));
        }
    }
    runs
}

fn with_opacity(
    ctx: &mut vello_cpu::RenderContext,
    opacity: f32,
    draw: impl FnOnce(&mut vello_cpu::RenderContext),
) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity);
    }
    draw(ctx);
    if opacity < 1.0 {
        ctx.pop_layer();
    }
}

fn apply_filter(surface: &mut Surface, filter: &ImageFilter) -> CardResult<()> {
    let (w, h) = (surface.width(), surface.height());
    if filter.blur_sigma > 0.0 {
        let blurred = blur_rgba8_premul(surface.data(), w, h, filter.blur_sigma, BlurEdge::Clamp)?;
        surface.replace_data(&blurred)?;
    }
    composite::brightness_in_place(surface.data_mut(), filter.brightness);
    Ok(())
}

/// Shadow pass for a rendered layer: blurred silhouette, offset, with the layer on top, dimmed.
pub fn drop_shadow(layer: &Surface, shadow: &DropShadow) -> CardResult<Surface> {
    let (w, h) = (layer.width(), layer.height());
    let mut silhouette = layer.data().to_vec();
    composite::tint_in_place(&mut silhouette, shadow.color.premul());
    let blurred = blur_rgba8_premul(&silhouette, w, h, shadow.blur_sigma, BlurEdge::Transparent)?;
    let shifted = composite::offset_rgba8(
        &blurred,
        w,
        h,
        shadow.offset.x.round() as i32,
        shadow.offset.y.round() as i32,
    );

    let mut out = Surface::new(w, h)?;
    out.replace_data(&shifted)?;
    out.compose(layer, Compose::SourceOver, 1.0)?;
    composite::scale_alpha_in_place(out.data_mut(), shadow.opacity);
    Ok(out)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
