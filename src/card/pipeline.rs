use std::sync::Arc;

use rayon::prelude::*;

use crate::assets::decode::PreparedImage;
use crate::assets::fonts::FontRegistry;
use crate::assets::loader::{ImageLoader, ImageRef};
use crate::assets::text::{TextEngine, TextMeasure};
use crate::card::effective::EffectiveStyle;
use crate::card::format::truncate_text;
use crate::card::layers::background::BackgroundChoice;
use crate::card::layers::badges::{self, BadgeEntry};
use crate::card::layers::{
    avatar_frame, background, border, bot_badge, frame, layer_shadow, text_avatar, xp_bar,
};
use crate::card::model::CardSpec;
use crate::card::options::{StyleOptions, WelcomeOptions};
use crate::card::provider::ProfileProvider;
use crate::card::welcome::{self, WelcomeAssets};
use crate::foundation::error::{CardError, CardResult};
use crate::render::cpu::CpuBackend;
use crate::render::encode::encode_png;
use crate::render::plan::{CardPlan, CardStep, LayerPlan, Shape};
use crate::render::surface::Surface;

/// Every image a profile card needs, loaded up front.
#[derive(Clone, Debug)]
pub struct LoadedAssets {
    pub avatar: Arc<PreparedImage>,
    pub background: BackgroundChoice,
    /// Display order, already reversed/merged.
    pub badges: Vec<BadgeEntry>,
    pub avatar_frame: Option<Arc<PreparedImage>>,
}

/// Load all images for one card concurrently.
///
/// Avatar, badge and avatar-frame failures abort with [`CardError::AssetLoad`]; background
/// failures fall back along the custom -> banner -> avatar chain. When several badges fail, the
/// first one in display order is reported.
#[tracing::instrument(skip_all, fields(user = %card.identity.username))]
pub fn prefetch_assets<L: ImageLoader + ?Sized>(
    loader: &L,
    card: &CardSpec,
    options: &StyleOptions,
) -> CardResult<LoadedAssets> {
    let load = |r: &ImageRef| loader.load(r).map(Arc::new);

    let (avatar, (background, (badges, avatar_frame))) = rayon::join(
        || load(&card.assets.avatar),
        || {
            rayon::join(
                || {
                    let custom = options.custom_background.as_ref().map(load);
                    let banner = card.assets.banner.as_ref().map(load);
                    BackgroundChoice::resolve(custom, banner)
                },
                || {
                    rayon::join(
                        || load_badges(&load, card, options),
                        || {
                            if options.remove_avatar_frame {
                                return Ok(None);
                            }
                            card.decoration
                                .avatar_frame
                                .as_ref()
                                .map(|r| {
                                    load(r).map_err(|e| {
                                        CardError::asset_load(format!(
                                            "Could not load avatar frame: ({}): {e}",
                                            truncate_text(r.as_str(), 30)
                                        ))
                                    })
                                })
                                .transpose()
                        },
                    )
                },
            )
        },
    );

    let avatar = avatar.map_err(|e| CardError::asset_load(format!("Could not load avatar: {e}")))?;
    Ok(LoadedAssets {
        avatar,
        background,
        badges: badges?,
        avatar_frame: avatar_frame?,
    })
}

fn load_badges<F>(load: &F, card: &CardSpec, options: &StyleOptions) -> CardResult<Vec<BadgeEntry>>
where
    F: Fn(&ImageRef) -> CardResult<Arc<PreparedImage>> + Sync,
{
    if options.remove_badges {
        return Ok(Vec::new());
    }
    let account = card
        .assets
        .badges
        .par_iter()
        .map(|b| load(&b.icon))
        .collect::<Vec<_>>();
    let custom_refs = options.custom_badges.as_deref().unwrap_or_default();
    let custom = custom_refs.par_iter().map(load).collect::<Vec<_>>();

    // Report in display order: account badges newest first, then custom ones.
    let mut account_ok = Vec::with_capacity(account.len());
    let replaced = options.overwrite_badges && !custom_refs.is_empty();
    for (badge, item) in card.assets.badges.iter().zip(account).rev() {
        match item {
            Ok(img) => account_ok.push(img),
            Err(_) if replaced => {}
            Err(e) => {
                return Err(CardError::asset_load(format!(
                    "Could not load badge: ({}): {e}",
                    badge.name
                )));
            }
        }
    }
    account_ok.reverse();

    let mut custom_ok = Vec::with_capacity(custom.len());
    for (r, item) in custom_refs.iter().zip(custom) {
        custom_ok.push(item.map_err(|e| {
            CardError::asset_load(format!(
                "Could not load custom badge: ({}), make sure that the image exists: {e}",
                truncate_text(r.as_str(), 30)
            ))
        })?);
    }
    Ok(badges::arrange(account_ok, custom_ok, options.overwrite_badges))
}

/// Compile a card into its ordered layer steps.
///
/// Order: background, frame, text/avatar (shadowed), border, bot badge (shadowed), badges
/// (shadowed), xp bar, avatar frame. Conditional layers are left out rather than emitted empty.
pub fn compile_card(
    style: &EffectiveStyle,
    assets: &LoadedAssets,
    measure: &mut dyn TextMeasure,
) -> CardResult<CardPlan> {
    let scale = &style.scale;
    let opts = &style.options;
    let shadow = layer_shadow(scale);

    let clip = if opts.remove_border {
        Shape::rounded(scale.rect(9.0, 9.0, 867.0, 285.0), scale.radius(26.0))
    } else {
        Shape::rounded(scale.canvas(), scale.radius(34.0))
    };

    let mut steps = Vec::with_capacity(8);
    let mut push = |layer: LayerPlan, shadowed: bool| {
        steps.push(CardStep {
            layer,
            shadow: shadowed.then_some(shadow),
        });
    };

    let badge_count = if opts.remove_badges { 0 } else { assets.badges.len() };
    let username = text_avatar::fit_username(style, measure)?;

    push(background::build(style, &assets.background, &assets.avatar)?, false);
    push(frame::build(style, badge_count), false);
    push(text_avatar::build(style, &assets.avatar, &username)?, true);

    match &style.border {
        Some(resolved) => push(border::build(scale, resolved)?, false),
        None => tracing::debug!("border layer skipped"),
    }
    if style.is_bot {
        push(bot_badge::build(style, &username), true);
    }
    if opts.remove_badges {
        tracing::debug!("badge layer skipped");
    } else {
        push(badges::build(scale, &style.badges, &assets.badges), true);
    }
    if let Some(rank) = &opts.rank_data {
        push(xp_bar::build(scale, rank, &style.font_family, measure)?, false);
    }
    match &assets.avatar_frame {
        Some(img) if !opts.remove_avatar_frame => push(avatar_frame::build(style, img)?, false),
        _ => tracing::debug!("avatar frame layer skipped"),
    }

    Ok(CardPlan {
        width: scale.width,
        height: scale.height,
        clip: Some(clip),
        steps,
    })
}

/// Entry point bundling an image loader with the shared font registry.
///
/// Each call builds its own backend and surfaces, so one renderer can serve concurrent renders.
#[derive(Clone, Debug)]
pub struct CardRenderer<L> {
    loader: L,
    fonts: Arc<FontRegistry>,
}

impl<L: ImageLoader> CardRenderer<L> {
    pub fn new(loader: L, fonts: Arc<FontRegistry>) -> Self {
        Self { loader, fonts }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Layer plan for a card, without rasterizing.
    pub fn plan_profile(&self, card: &CardSpec, options: &StyleOptions) -> CardResult<CardPlan> {
        let mut engine = TextEngine::new(Arc::clone(&self.fonts));
        let style = EffectiveStyle::resolve(card, options);
        let assets = prefetch_assets(&self.loader, card, options)?;
        compile_card(&style, &assets, &mut engine)
    }

    /// Rendered card surface (premultiplied RGBA8).
    #[tracing::instrument(skip_all, fields(user = %card.identity.username))]
    pub fn render_profile_surface(
        &self,
        card: &CardSpec,
        options: &StyleOptions,
    ) -> CardResult<Surface> {
        let mut backend = CpuBackend::new(Arc::clone(&self.fonts));
        let style = EffectiveStyle::resolve(card, options);
        let assets = prefetch_assets(&self.loader, card, options)?;
        let plan = compile_card(&style, &assets, backend.text_engine_mut())?;
        tracing::debug!(layers = ?plan.layer_names(), "compiled card");
        backend.render_card(&plan)
    }

    /// Rendered card as PNG bytes.
    pub fn render_profile(&self, card: &CardSpec, options: &StyleOptions) -> CardResult<Vec<u8>> {
        let surface = self.render_profile_surface(card, options)?;
        encode_png(&surface)
    }

    /// Look the user up through `provider`, then render.
    pub fn render_profile_for(
        &self,
        provider: &dyn ProfileProvider,
        user: &str,
        options: &StyleOptions,
    ) -> CardResult<Vec<u8>> {
        let card = provider.fetch(user)?;
        self.render_profile(&card, options)
    }

    /// Welcome or goodbye banner as PNG bytes.
    #[tracing::instrument(skip_all, fields(user = %card.identity.username))]
    pub fn render_welcome(&self, card: &CardSpec, options: &WelcomeOptions) -> CardResult<Vec<u8>> {
        let assets = WelcomeAssets::load(&self.loader, card, options)?;
        let plan = welcome::compile_welcome(card, options, &assets)?;
        let mut backend = CpuBackend::new(Arc::clone(&self.fonts));
        let surface = backend.render_card(&plan)?;
        encode_png(&surface)
    }

    pub fn render_welcome_for(
        &self,
        provider: &dyn ProfileProvider,
        user: &str,
        options: &WelcomeOptions,
    ) -> CardResult<Vec<u8>> {
        let card = provider.fetch(user)?;
        self.render_welcome(&card, options)
    }
}
