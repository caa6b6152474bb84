//! Basic image generation example.
//!
//! Run with: `cargo run --example generate_image`
//!
//! Requires `GEMINI_API_KEY` environment variable.

use imagestudio::{AppState, AspectRatio, GeminiService};

#[tokio::main]
async fn main() -> imagestudio::Result<()> {
    let service = GeminiService::builder().build()?;

    let mut state = AppState::new();
    state.set_prompt("A golden retriever puppy playing in snow");
    state.set_aspect_ratio(AspectRatio::Landscape);
    state.submit(&service).await;

    match (state.generated_image(), state.error()) {
        (Some(uri), _) => println!("Generated image data URI ({} chars)", uri.len()),
        (None, Some(message)) => println!("Failed: {message}"),
        (None, None) => unreachable!("submission always yields a result or an error"),
    }

    Ok(())
}
