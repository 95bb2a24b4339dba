use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use cardsmith::{
    CardRenderer, CardSpec, FontRegistry, FsImageLoader, JsonProfileProvider, ProfileProvider,
    StyleOptions, WelcomeOptions,
};

const FONTS_ENV: &str = "CARDSMITH_FONTS_DIR";
const ASSETS_ENV: &str = "CARDSMITH_ASSETS_DIR";

#[derive(Parser, Debug)]
#[command(name = "cardsmith", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a profile card as a PNG.
    Profile(RenderArgs),
    /// Render a welcome or goodbye banner as a PNG.
    Welcome(RenderArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Card JSON: one card object, or an array of cards used with `--user`.
    #[arg(long)]
    card: PathBuf,

    /// Id or username to pick from a card array.
    #[arg(long)]
    user: Option<String>,

    /// Style options JSON.
    #[arg(long)]
    style: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Directory holding `Helvetica.ttf` / `HelveticaBold.ttf` (falls back to $CARDSMITH_FONTS_DIR).
    #[arg(long)]
    fonts: Option<PathBuf>,

    /// Root for relative image references (falls back to $CARDSMITH_ASSETS_DIR, then the card's
    /// directory).
    #[arg(long)]
    assets: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Profile(args) => {
            let options: StyleOptions = read_options(args.style.as_deref())?;
            let (renderer, card) = prepare(&args)?;
            let png = renderer.render_profile(&card, &options)?;
            write_png(&args.out, &png)
        }
        Command::Welcome(args) => {
            let options: WelcomeOptions = read_options(args.style.as_deref())?;
            let (renderer, card) = prepare(&args)?;
            let png = renderer.render_welcome(&card, &options)?;
            write_png(&args.out, &png)
        }
    }
}

fn prepare(args: &RenderArgs) -> anyhow::Result<(CardRenderer<FsImageLoader>, CardSpec)> {
    let provider = JsonProfileProvider::from_path(&args.card)?;
    let card = match (&args.user, provider.cards()) {
        (Some(user), _) => provider.fetch(user)?,
        (None, [only]) => only.clone(),
        (None, cards) => anyhow::bail!(
            "'{}' holds {} cards; pick one with --user",
            args.card.display(),
            cards.len()
        ),
    };

    let fonts_dir = dir_arg(args.fonts.as_deref(), FONTS_ENV)
        .with_context(|| format!("no fonts directory: pass --fonts or set {FONTS_ENV}"))?;
    let fonts = FontRegistry::from_dir(&fonts_dir)
        .with_context(|| format!("load fonts from '{}'", fonts_dir.display()))?;

    let assets_root = dir_arg(args.assets.as_deref(), ASSETS_ENV).unwrap_or_else(|| {
        args.card
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf()
    });

    let renderer = CardRenderer::new(FsImageLoader::new(assets_root), Arc::new(fonts));
    Ok((renderer, card))
}

fn dir_arg(arg: Option<&Path>, env: &str) -> Option<PathBuf> {
    arg.map(Path::to_path_buf)
        .or_else(|| std::env::var_os(env).map(PathBuf::from))
}

fn read_options<T: serde::de::DeserializeOwned + Default>(
    path: Option<&Path>,
) -> anyhow::Result<T> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read style '{}'", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse style '{}'", path.display()))
}

fn write_png(out: &Path, png: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(out, png).with_context(|| format!("write png '{}'", out.display()))?;
    eprintln!("wrote {}", out.display());
    Ok(())
}
