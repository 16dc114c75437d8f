//! CLI for Sadaam - natural-language image editing.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use sadaam::session::find_suggestion;
use sadaam::{
    encoder, export, GeminiEditor, GeminiModel, ImageEditor, ImageFormat, QuickAction,
    ResultImage, SelectedFile, Session, SessionPhase, SUGGESTIONS,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sadaam")]
#[command(about = "Edit images with a text instruction via Gemini image models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit an image with a prompt or a suggestion
    Edit(EditArgs),

    /// Remove the background from an image
    RemoveBackground(OutputArgs),

    /// List the built-in prompt suggestions
    Suggestions,
}

#[derive(Args)]
struct EditArgs {
    #[command(flatten)]
    output: OutputArgs,

    /// Instruction describing the edit
    #[arg(short, long, conflicts_with = "suggestion")]
    prompt: Option<String>,

    /// Use a built-in suggestion instead of a prompt (see `sadaam suggestions`)
    #[arg(short, long)]
    suggestion: Option<String>,
}

#[derive(Args)]
struct OutputArgs {
    /// Input image
    input: PathBuf,

    /// Directory the edited image is written to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Download format
    #[arg(short, long, value_enum, default_value = "png")]
    format: FormatArg,

    /// Gemini model
    #[arg(short, long, value_enum, default_value = "flash")]
    model: ModelArg,

    /// API key (defaults to GEMINI_API_KEY, GOOGLE_API_KEY or API_KEY)
    #[arg(long)]
    api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Png,
    #[value(alias = "jpeg")]
    Jpg,
    Webp,
}

impl From<FormatArg> for ImageFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => ImageFormat::Png,
            FormatArg::Jpg => ImageFormat::Jpeg,
            FormatArg::Webp => ImageFormat::WebP,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    /// gemini-2.5-flash-image
    Flash,
    /// nano-banana-pro-preview
    Pro,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Flash => GeminiModel::NanoBanana,
            ModelArg::Pro => GeminiModel::NanoBananaPro,
        }
    }
}

/// What to send: the user's own prompt or a fixed quick action.
enum Instruction {
    Prompt(String),
    Quick(QuickAction),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Edit(args) => {
            let prompt = resolve_prompt(&args)?;
            run_edit(&args.output, Instruction::Prompt(prompt), cli.json).await?;
        }
        Commands::RemoveBackground(args) => {
            run_edit(
                &args,
                Instruction::Quick(QuickAction::RemoveBackground),
                cli.json,
            )
            .await?;
        }
        Commands::Suggestions => {
            list_suggestions(cli.json)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_prompt(args: &EditArgs) -> anyhow::Result<String> {
    if let Some(name) = &args.suggestion {
        let suggestion = find_suggestion(name).ok_or_else(|| {
            anyhow::anyhow!("unknown suggestion '{name}' (see `sadaam suggestions`)")
        })?;
        return Ok(suggestion.prompt.to_string());
    }
    match &args.prompt {
        Some(prompt) => Ok(prompt.clone()),
        None => anyhow::bail!("either --prompt or --suggestion is required"),
    }
}

/// Builds a selection, sniffing the content type when the extension says nothing.
fn select_file(path: &Path) -> SelectedFile {
    let mut selected = SelectedFile::from_path(path);
    if !selected.content_type.starts_with("image/") {
        if let Some(format) = std::fs::read(path)
            .ok()
            .and_then(|bytes| ImageFormat::from_magic_bytes(&bytes))
        {
            selected.content_type = format.mime_type().to_string();
        }
    }
    selected
}

async fn run_edit(
    args: &OutputArgs,
    instruction: Instruction,
    json_output: bool,
) -> anyhow::Result<()> {
    let mut builder = GeminiEditor::builder().model(args.model.into());
    if let Some(key) = &args.api_key {
        builder = builder.api_key(key);
    }
    let editor = builder.build()?;

    let input = encoder::encode(&select_file(&args.input)).await?;

    let mut session = Session::new();
    session.set_input_image(input)?;
    let phase = match instruction {
        Instruction::Prompt(prompt) => {
            session.set_prompt(prompt)?;
            session.edit(&editor).await?
        }
        Instruction::Quick(action) => session.edit_quick(&editor, action).await?,
    };

    if phase != SessionPhase::Success {
        let message = session.error().unwrap_or("edit failed");
        if json_output {
            let result = serde_json::json!({
                "success": false,
                "phase": phase,
                "error": message,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        anyhow::bail!("{message}");
    }

    let Some(result) = session.result() else {
        anyhow::bail!("edit succeeded without a result");
    };

    let format = ImageFormat::from(args.format);
    let mut saved = None;
    if let Some(url) = &result.image_url {
        let image = ResultImage::from_data_url(url)?;
        let exported = export(&image, format)?;
        std::fs::create_dir_all(&args.out_dir)?;
        saved = Some((exported.save_to_dir(&args.out_dir)?, exported));
    }

    if json_output {
        let result = serde_json::json!({
            "success": true,
            "model": editor.model_name(),
            "prompt": session.prompt(),
            "output": saved.as_ref().map(|(path, _)| path.display().to_string()),
            "size_bytes": saved.as_ref().map(|(_, e)| e.data.len()),
            "format": saved.as_ref().map(|(_, e)| e.format.extension()),
            "text": result.text,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        match &saved {
            Some((path, exported)) => println!(
                "Edited image: {} ({}x{}, {} bytes) via {}",
                path.display(),
                exported.width,
                exported.height,
                exported.data.len(),
                editor.model_name()
            ),
            None => println!("The model returned no image."),
        }
        if let Some(text) = &result.text {
            println!("\nAI response:\n{}", text);
        }
    }

    Ok(())
}

fn list_suggestions(json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(&SUGGESTIONS)?);
    } else {
        println!("Suggestions (use with `sadaam edit --suggestion <name>`):\n");
        for s in SUGGESTIONS.iter() {
            println!("  {:<12} {}", s.name, s.label);
            println!("    {}", s.prompt);
        }
    }
    Ok(())
}
