//! CLI for imagestudio - AI image generation and editing.

use anyhow::Context;
use base64::Engine;
use clap::{Args, Parser, Subcommand, ValueEnum};
use imagestudio::{
    split_data_uri, AppState, AspectRatio, GeminiService, ImageFormat, ImageService, Mode,
};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser)]
#[command(name = "imagestudio")]
#[command(about = "Generate and edit images via the Gemini image APIs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an image from a text prompt
    Generate(GenerateArgs),

    /// Apply a text-described edit to an image
    Edit(EditArgs),

    /// Check that the service is reachable and authenticated
    Check,
}

#[derive(Args)]
struct GenerateArgs {
    /// The text prompt describing the image
    prompt: String,

    /// Aspect ratio of the generated image
    #[arg(short, long, value_enum, default_value = "1:1")]
    aspect_ratio: AspectRatioArg,

    /// Output file path (default: ai-generated-image-<timestamp>.jpg)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct EditArgs {
    /// Source image (PNG, JPEG, or WebP)
    image: PathBuf,

    /// The text prompt describing the edit
    prompt: String,

    /// Output file path (default: ai-generated-image-<timestamp>.<ext>)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AspectRatioArg {
    #[value(name = "1:1")]
    Square,
    #[value(name = "16:9")]
    Landscape,
    #[value(name = "9:16")]
    Portrait,
    #[value(name = "4:3")]
    Standard,
    #[value(name = "3:4")]
    StandardPortrait,
}

impl From<AspectRatioArg> for AspectRatio {
    fn from(arg: AspectRatioArg) -> Self {
        match arg {
            AspectRatioArg::Square => AspectRatio::Square,
            AspectRatioArg::Landscape => AspectRatio::Landscape,
            AspectRatioArg::Portrait => AspectRatio::Portrait,
            AspectRatioArg::Standard => AspectRatio::Standard,
            AspectRatioArg::StandardPortrait => AspectRatio::StandardPortrait,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => generate(args, cli.json).await,
        Commands::Edit(args) => edit(args, cli.json).await,
        Commands::Check => check(cli.json).await,
    }
}

async fn generate(args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    let service = GeminiService::builder().build()?;

    let mut state = AppState::new();
    state.set_prompt(&args.prompt);
    state.set_aspect_ratio(args.aspect_ratio.into());
    state.submit(&service).await;

    save_result(&state, args.output, json_output)
}

async fn edit(args: EditArgs, json_output: bool) -> anyhow::Result<()> {
    let service = GeminiService::builder().build()?;

    let mut state = AppState::new();
    state.set_mode(Mode::Edit);
    attach_source(&mut state, &args.image)?;
    state.set_prompt(&args.prompt);
    state.submit(&service).await;

    save_result(&state, args.output, json_output)
}

/// Attaches the source image, reporting a read failure directly.
///
/// Submitting with no source would replace the read error with the generic
/// missing-inputs validation message, which is misleading here.
fn attach_source(state: &mut AppState, path: &std::path::Path) -> anyhow::Result<()> {
    state.attach_file(path);
    if let Some(message) = state.error() {
        anyhow::bail!("{message}");
    }
    Ok(())
}

async fn check(json_output: bool) -> anyhow::Result<()> {
    let service = GeminiService::builder().build()?;
    service.health_check().await?;

    if json_output {
        println!("{}", serde_json::json!({ "healthy": true }));
    } else {
        println!("Service is reachable and authenticated.");
    }
    Ok(())
}

/// Writes the controller's result to disk, or reports its error.
fn save_result(
    state: &AppState,
    output: Option<PathBuf>,
    json_output: bool,
) -> anyhow::Result<()> {
    if let Some(message) = state.error() {
        anyhow::bail!("{message}");
    }

    let uri = state
        .generated_image()
        .context("no image was produced")?;
    let (mime, payload) = split_data_uri(uri).context("malformed image data URI")?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .context("image payload is not valid base64")?;

    let path = output.unwrap_or_else(|| default_download_name(mime));
    std::fs::write(&path, &bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;

    if json_output {
        let result = serde_json::json!({
            "success": true,
            "output": path.display().to_string(),
            "size_bytes": bytes.len(),
            "mime_type": mime,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Saved image: {} ({} bytes, {mime})",
            path.display(),
            bytes.len()
        );
    }

    Ok(())
}

/// Default download name, `ai-generated-image-<timestamp>.<ext>`.
fn default_download_name(mime: &str) -> PathBuf {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let ext = ImageFormat::from_mime(mime)
        .map(|f| f.extension())
        .unwrap_or("jpg");
    PathBuf::from(format!("ai-generated-image-{millis}.{ext}"))
}
