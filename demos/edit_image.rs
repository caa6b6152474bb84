//! Image editing example - modifies an existing image with a text prompt.
//!
//! Run with: `cargo run --example edit_image -- <input_image.png>`
//!
//! Requires `GEMINI_API_KEY` environment variable.

use imagestudio::{AppState, GeminiService, Mode};

#[tokio::main]
async fn main() -> imagestudio::Result<()> {
    let input_path = std::env::args()
        .nth(1)
        .expect("Usage: edit_image <input_image.png>");

    let service = GeminiService::builder().build()?;

    let mut state = AppState::new();
    state.set_mode(Mode::Edit);
    state.attach_file(&input_path);
    state.set_prompt("Make the colors more vibrant and add a warm sunset glow");
    state.submit(&service).await;

    match (state.generated_image(), state.error()) {
        (Some(uri), _) => println!("Edited image data URI ({} chars)", uri.len()),
        (None, Some(message)) => println!("Failed: {message}"),
        (None, None) => unreachable!("submission always yields a result or an error"),
    }

    Ok(())
}
