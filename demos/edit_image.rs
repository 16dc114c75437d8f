//! Image editing example - runs one edit and saves the result as JPEG.
//!
//! Run with: `cargo run --example edit_image -- <input_image.png> "<prompt>"`
//!
//! Requires `GEMINI_API_KEY` (or `GOOGLE_API_KEY`) environment variable.

use sadaam::{encoder, export, GeminiEditor, ImageFormat, ResultImage, SelectedFile, Session};

#[tokio::main]
async fn main() -> sadaam::Result<()> {
    let mut args = std::env::args().skip(1);
    let input_path = args
        .next()
        .expect("Usage: edit_image <input_image.png> [prompt]");
    let prompt = args
        .next()
        .unwrap_or_else(|| "Make the colors more vibrant and add a warm sunset glow".into());

    let editor = GeminiEditor::builder().build()?;
    let input = encoder::encode(&SelectedFile::from_path(&input_path)).await?;

    let mut session = Session::new();
    session.set_input_image(input)?;
    session.set_prompt(prompt)?;
    let phase = session.edit(&editor).await?;
    println!("Edit finished: {phase}");

    if let Some(message) = session.error() {
        eprintln!("Error: {message}");
        return Ok(());
    }

    if let Some(url) = session.result().and_then(|r| r.image_url.as_deref()) {
        let image = ResultImage::from_data_url(url)?;
        let path = export(&image, ImageFormat::Jpeg)?.save_to_dir(".")?;
        println!("Edited image saved to {}", path.display());
    }
    if let Some(text) = session.result().and_then(|r| r.text.as_deref()) {
        println!("Model said: {text}");
    }

    Ok(())
}
