use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use rand::SeedableRng;

use eraframe::{
    AlbumConfig, AlbumSession, CompositionInput, Compositor, FontBook, GenerationEvent,
    GenerationState, HttpImageService, ImageSource, Label, PromptedGenerator, SourcePhoto,
};

#[derive(Parser, Debug)]
#[command(name = "eraframe", version)]
struct Cli {
    /// Log crate internals at debug level (on top of `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate decade variants of a photo, then compose the album page.
    Generate(GenerateArgs),
    /// Compose an album page from existing images.
    Compose(ComposeArgs),
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Source portrait.
    #[arg(long)]
    photo: PathBuf,

    /// Directory receiving one image per decade plus `album.jpg`.
    #[arg(long)]
    out_dir: PathBuf,

    /// Configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Decade to generate; repeat for several. Defaults to the configured set.
    #[arg(long = "decade")]
    decades: Vec<String>,

    /// Seed for print rotations on the album page.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// `label=path` (or `label=https://...`) pair; repeat for every cell, in album order.
    #[arg(long = "image", value_parser = parse_image_arg, required = true)]
    images: Vec<(Label, ImageSource)>,

    /// Output JPEG path.
    #[arg(long)]
    out: PathBuf,

    /// Configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for print rotations.
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    eraframe::logging::init_logging(cli.verbose)?;
    match cli.cmd {
        Command::Generate(args) => cmd_generate(args).await,
        Command::Compose(args) => cmd_compose(args).await,
    }
}

fn parse_image_arg(raw: &str) -> Result<(Label, ImageSource), String> {
    let (label, target) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected LABEL=PATH, got '{raw}'"))?;
    let label = label.trim();
    let target = target.trim();
    if label.is_empty() || target.is_empty() {
        return Err(format!("expected LABEL=PATH, got '{raw}'"));
    }
    let source = if target.starts_with("http://") || target.starts_with("https://") {
        ImageSource::Url(target.to_string())
    } else {
        ImageSource::Path(PathBuf::from(target))
    };
    Ok((Label::from(label), source))
}

fn make_rng(seed: Option<u64>) -> rand::rngs::StdRng {
    match seed {
        Some(seed) => rand::rngs::StdRng::seed_from_u64(seed),
        None => rand::rngs::StdRng::from_os_rng(),
    }
}

async fn make_compositor(cfg: &AlbumConfig) -> anyhow::Result<Compositor> {
    let fonts = FontBook::load(&cfg.fonts.display, &cfg.fonts.caption)
        .await
        .context("resolve album fonts")?;
    Ok(Compositor::new(cfg.page.clone(), fonts)?)
}

async fn write_album(
    compositor: &Compositor,
    images: &CompositionInput,
    out: &Path,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let page = compositor
        .compose_page(images, &mut make_rng(seed))
        .await
        .context("compose album page")?;
    page.write_to(out).await?;
    eprintln!(
        "wrote {} ({}x{}, {} cells)",
        out.display(),
        page.width,
        page.height,
        images.len()
    );
    Ok(())
}

async fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let cfg = AlbumConfig::load(args.config.as_deref())?;
    let endpoint = cfg.generation.endpoint.clone().with_context(|| {
        format!(
            "no generation endpoint: set generation.endpoint or {}",
            eraframe::config::ENV_ENDPOINT
        )
    })?;
    let mut labels: Vec<Label> = Vec::new();
    for decade in &args.decades {
        let label = Label::from(decade.trim());
        if labels.contains(&label) {
            anyhow::bail!("decade '{label}' given more than once");
        }
        labels.push(label);
    }
    if labels.is_empty() {
        labels = cfg.generation.decades.clone();
    }

    // Fonts resolve before the first generation call.
    let compositor = make_compositor(&cfg).await?;

    let source = SourcePhoto::read(&args.photo).await?;
    let service = HttpImageService::new(
        endpoint,
        cfg.generation.api_key(),
        cfg.generation.timeout(),
    )?;
    let generator = PromptedGenerator::new(service, source);
    let scheduler = cfg.generation.scheduler()?;

    let mut session = AlbumSession::new();
    let summary = session
        .generate_all(&scheduler, &generator, &labels, report_progress)
        .await?;
    eprintln!(
        "generation finished: {} done, {} failed",
        summary.done, summary.failed
    );

    tokio::fs::create_dir_all(&args.out_dir)
        .await
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let http = reqwest::Client::new();
    let completed = session.composition_input();
    for (label, source) in completed.iter() {
        let bytes = eraframe::read_source_bytes(source, &http).await?;
        let ext = image::guess_format(&bytes)
            .ok()
            .and_then(|f| f.extensions_str().first().copied())
            .unwrap_or("img");
        let path = args.out_dir.join(format!("{label}.{ext}"));
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("write '{}'", path.display()))?;
        eprintln!("wrote {}", path.display());
    }

    if completed.is_empty() {
        anyhow::bail!("every decade failed; no album page to compose");
    }
    write_album(
        &compositor,
        &completed,
        &args.out_dir.join("album.jpg"),
        args.seed,
    )
    .await
}

fn report_progress(event: &GenerationEvent, session: &AlbumSession) {
    let progress = session.progress();
    let total = progress.pending + progress.done + progress.failed;
    match &event.state {
        GenerationState::Pending => {}
        GenerationState::Done { .. } => {
            eprintln!(
                "[{}/{}] {} done",
                progress.done + progress.failed,
                total,
                event.label
            );
        }
        GenerationState::Error { message } => {
            eprintln!(
                "[{}/{}] {} failed: {message}",
                progress.done + progress.failed,
                total,
                event.label
            );
        }
    }
}

async fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let cfg = AlbumConfig::load(args.config.as_deref())?;

    let mut images = CompositionInput::new();
    for (label, source) in args.images {
        if images.contains_key(&label) {
            anyhow::bail!("label '{label}' given more than once");
        }
        images.insert(label, source);
    }

    let compositor = make_compositor(&cfg).await?;
    write_album(&compositor, &images, &args.out, args.seed).await
}
