use cardsmith::assets::text::FixedAdvanceMeasure;
use cardsmith::card::effective::EffectiveStyle;
use cardsmith::card::model::BadgeAsset;
use cardsmith::card::pipeline::{compile_card, prefetch_assets};
use cardsmith::card::welcome::{WelcomeAssets, compile_welcome};
use cardsmith::render::plan::{CardPlan, DrawOp, Shape};
use cardsmith::{
    CardSpec, MemoryImageLoader, PreparedImage, RankOptions, Rect, StyleOptions, WelcomeOptions,
};

fn loader() -> MemoryImageLoader {
    let solid = |c: [u8; 4]| PreparedImage::solid(4, 4, c).unwrap();
    MemoryImageLoader::new()
        .with_image("avatar.png", solid([0, 0, 255, 255]))
        .with_image("banner.png", solid([0, 255, 0, 255]))
        .with_image("hype.png", solid([255, 0, 255, 255]))
        .with_image("nitro.png", solid([255, 255, 0, 255]))
        .with_image("frame.png", solid([9, 9, 9, 255]))
}

fn full_card() -> CardSpec {
    let mut card: CardSpec = serde_json::from_str(
        r##"{
            "identity": {"id": "42", "username": "neo", "globalName": "The One", "bot": true,
                         "verified": true, "createdTimestamp": 1583366400000},
            "assets": {"avatar": "avatar.png", "banner": "banner.png"},
            "decoration": {"profileColors": ["#112233", "#445566"], "avatarFrame": "frame.png"}
        }"##,
    )
    .unwrap();
    card.assets.badges = vec![
        BadgeAsset {
            name: "hype".into(),
            icon: "hype.png".into(),
        },
        BadgeAsset {
            name: "nitro".into(),
            icon: "nitro.png".into(),
        },
    ];
    card
}

fn compile(card: &CardSpec, options: &StyleOptions) -> cardsmith::CardResult<CardPlan> {
    let style = EffectiveStyle::resolve(card, options);
    let assets = prefetch_assets(&loader(), card, options)?;
    compile_card(&style, &assets, &mut FixedAdvanceMeasure::default())
}

fn avatar_bounds(plan: &CardPlan) -> Rect {
    plan.layer("text_avatar")
        .unwrap()
        .ops
        .iter()
        .find_map(|op| match op {
            DrawOp::Group {
                clip: Some(shape), ..
            } => Some(shape.bounds()),
            _ => None,
        })
        .unwrap()
}

#[test]
fn every_layer_present_in_stacking_order() {
    let options = StyleOptions {
        rank_data: Some(RankOptions::new(300.0, 1000.0, 7.0)),
        ..StyleOptions::default()
    };
    let plan = compile(&full_card(), &options).unwrap();
    assert_eq!(
        plan.layer_names(),
        vec![
            "background",
            "frame",
            "text_avatar",
            "border",
            "bot_badge",
            "badges",
            "xp_bar",
            "avatar_frame"
        ]
    );
    let shadowed: Vec<&str> = plan
        .steps
        .iter()
        .filter(|s| s.shadow.is_some())
        .map(|s| s.layer.name)
        .collect();
    assert_eq!(shadowed, vec!["text_avatar", "bot_badge", "badges"]);
}

#[test]
fn minimal_card_keeps_only_unconditional_layers() {
    let card = CardSpec::new("neo", "avatar.png");
    let options = StyleOptions {
        remove_badges: true,
        ..StyleOptions::default()
    };
    let plan = compile(&card, &options).unwrap();
    assert_eq!(plan.layer_names(), vec!["background", "frame", "text_avatar"]);
}

#[test]
fn doubling_the_output_doubles_the_geometry() {
    let card = CardSpec::new("neo", "avatar.png");
    let base = compile(&card, &StyleOptions::default()).unwrap();
    let big = compile(
        &card,
        &StyleOptions {
            custom_width: Some(1770),
            custom_height: Some(606),
            ..StyleOptions::default()
        },
    )
    .unwrap();

    assert_eq!((base.width, base.height), (885, 303));
    assert_eq!((big.width, big.height), (1770, 606));
    let (a, b) = (avatar_bounds(&base), avatar_bounds(&big));
    assert_eq!(a, Rect::new(47.0, 39.0, 272.0, 264.0));
    assert_eq!((b.x0, b.y0, b.width()), (2.0 * a.x0, 2.0 * a.y0, 2.0 * a.width()));
}

#[test]
fn long_usernames_shrink_to_the_budget() {
    let card = CardSpec::new("x".repeat(24), "avatar.png");
    let plan = compile(&card, &StyleOptions::default()).unwrap();
    let username = plan.layer("text_avatar").unwrap().texts().next().unwrap();
    let width = username.text.chars().count() as f64 * f64::from(username.size_px) * 0.5 * 1.1;
    assert!(username.size_px < 80.0);
    assert!(username.size_px >= 30.0);
    assert!(width <= 555.0);
}

#[test]
fn theme_colors_become_a_vertical_border() {
    let plan = compile(&full_card(), &StyleOptions::default()).unwrap();
    let border = plan.layer("border").unwrap();
    let DrawOp::Fill {
        paint: cardsmith::render::plan::Paint::Linear(g),
        ..
    } = &border.ops[0]
    else {
        panic!("expected gradient ring");
    };
    assert_eq!(g.start.x, g.end.x);

    let themed_off = compile(
        &full_card(),
        &StyleOptions {
            disable_profile_theme: true,
            ..StyleOptions::default()
        },
    )
    .unwrap();
    assert!(themed_off.layer("border").is_none());
}

#[test]
fn remove_border_shrinks_the_clip() {
    let card = CardSpec::new("neo", "avatar.png");
    let plan = compile(
        &card,
        &StyleOptions {
            remove_border: true,
            ..StyleOptions::default()
        },
    )
    .unwrap();
    let Some(Shape::RoundedRect { rect, radius }) = plan.clip else {
        panic!("expected rounded clip");
    };
    assert_eq!(rect, Rect::new(9.0, 9.0, 876.0, 294.0));
    assert_eq!(radius, 26.0);
}

#[test]
fn option_errors_surface_as_validation() {
    let card = CardSpec::new("neo", "avatar.png");
    let options: StyleOptions =
        serde_json::from_str(r#"{"presenceStatus": "asleep"}"#).unwrap();
    assert!(compile(&card, &options).unwrap_err().is_validation());

    let options: StyleOptions =
        serde_json::from_str(r#"{"rankData": {"currentXp": 10, "level": 2}}"#).unwrap();
    let err = compile(&card, &options).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("requiredXp"));
}

#[test]
fn missing_badge_names_the_badge() {
    let mut card = full_card();
    card.assets.badges.push(BadgeAsset {
        name: "ghost".into(),
        icon: "ghost.png".into(),
    });
    let err = compile(&card, &StyleOptions::default()).unwrap_err();
    assert!(err.is_asset_load());
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn welcome_banner_follows_custom_dimensions() {
    let card = full_card();
    let options: WelcomeOptions = serde_json::from_str(
        r#"{"customWidth": 800, "customHeight": 400, "avatarY": 40, "type": "goodbye"}"#,
    )
    .unwrap();
    let assets = WelcomeAssets::load(&loader(), &card, &options).unwrap();
    let plan = compile_welcome(&card, &options, &assets).unwrap();
    assert_eq!((plan.width, plan.height), (800, 400));

    let texts: Vec<_> = plan.layer("text").unwrap().texts().collect();
    assert_eq!(texts[0].text, "GOODBYE");
    assert_eq!(texts[0].origin.x, 400.0);
    assert_eq!(texts[0].origin.y, 40.0 + 200.0 + 90.0);
    assert_eq!(texts[1].text, "The One");
}

#[test]
fn tiny_outputs_compile_without_panicking() {
    let card = CardSpec::new("a_rather_long_username", "avatar.png");
    let options: StyleOptions =
        serde_json::from_str(r#"{"customWidth": 885, "customHeight": 3}"#).unwrap();
    let plan = compile(&card, &options).unwrap();
    assert_eq!((plan.width, plan.height), (885, 3));
    let username = plan.layer("text_avatar").unwrap().texts().next().unwrap();
    assert!(username.size_px < 1.0);
}

#[test]
fn blank_border_color_means_no_border() {
    for json in [r#"{"borderColor": ""}"#, r#"{"borderColor": []}"#] {
        let options: StyleOptions = serde_json::from_str(json).unwrap();
        let plan = compile(&full_card(), &options).unwrap();
        assert!(plan.layer("border").is_none(), "{json}");
    }
}
