use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "storyreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a still of one scene as a PNG.
    Frame(FrameArgs),
    /// Record the whole project to a video file (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Optional player configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scene index in playback order (0-based).
    #[arg(long, default_value_t = 0)]
    scene: usize,

    /// Time since the scene became visible, in milliseconds.
    #[arg(long, default_value_t = 0)]
    at_ms: u64,

    /// Dialogue index whose subtitle is drawn.
    #[arg(long)]
    line: Option<usize>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Optional player configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory the recording is written to (overrides the configuration).
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Stop recording after this many milliseconds of playback.
    #[arg(long)]
    max_ms: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("storyreel=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<storyreel::PlayerConfig> {
    let cfg = match path {
        Some(p) => storyreel::PlayerConfig::from_json_file(p)?,
        None => {
            let cfg = storyreel::PlayerConfig::default().with_env_overrides();
            cfg.validate()?;
            cfg
        }
    };
    Ok(cfg)
}

fn load_player(
    in_path: &Path,
    config: storyreel::PlayerConfig,
) -> anyhow::Result<storyreel::Player> {
    let project = storyreel::Project::from_json_file(in_path)?;
    let assets_root = in_path.parent().unwrap_or_else(|| Path::new("."));
    let assets = storyreel::AssetStore::prepare(&project, assets_root, config.sample_rate);
    Ok(storyreel::Player::new(project, assets, config)?)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let bg = config.clear_rgba;
    let mut player = load_player(&args.in_path, config)?;
    let frame = player.render_still(args.scene, args.at_ms as f64, args.line)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.opaque_rgba8(bg),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    if !storyreel::is_ffmpeg_on_path() {
        anyhow::bail!("ffmpeg not found on PATH");
    }

    let mut config = load_config(args.config.as_deref())?;
    if let Some(dir) = args.out_dir {
        config.output_dir = dir;
    }
    let sink_opts = storyreel::FfmpegSinkOpts {
        bg_rgba: config.clear_rgba,
        ..storyreel::FfmpegSinkOpts::default()
    };
    let mut player = load_player(&args.in_path, config)?;

    let artifact = storyreel::export(
        &mut player,
        Box::new(storyreel::FfmpegSink::new(sink_opts)),
        storyreel::ExportOptions {
            max_duration_ms: args.max_ms,
        },
    )?;
    tracing::info!(
        frames = artifact.frames,
        duration_ms = artifact.duration_ms,
        "recording finalized"
    );

    eprintln!("wrote {}", artifact.path.display());
    Ok(())
}
