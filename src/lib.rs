#![warn(missing_docs)]
//! imagestudio - generate and edit images with the Gemini image APIs.
//!
//! Two workflows: generate a new image from a text prompt and aspect ratio,
//! or apply a text-described edit to an existing image. All mutable state
//! lives in an [`AppState`] controller that sequences input validation,
//! encoding, the remote call, and result or error display; the remote side
//! is behind the [`ImageService`] trait.
//!
//! # Quick Start
//!
//! ```no_run
//! use imagestudio::{AppState, AspectRatio, GeminiService};
//!
//! #[tokio::main]
//! async fn main() -> imagestudio::Result<()> {
//!     let service = GeminiService::builder().build()?;
//!
//!     let mut state = AppState::new();
//!     state.set_prompt("A red circle on a white background");
//!     state.set_aspect_ratio(AspectRatio::Square);
//!     state.submit(&service).await;
//!
//!     if let Some(uri) = state.generated_image() {
//!         println!("{uri}");
//!     }
//!     Ok(())
//! }
//! ```

mod app;
mod encode;
mod error;
pub mod service;
mod types;

pub use app::{
    AppState, SubmissionTicket, EDIT_INPUTS_REQUIRED, FILE_READ_FAILED, PROMPT_REQUIRED,
};
pub use encode::encode_image_file;
pub use error::{Result, StudioError, GENERIC_ERROR_MESSAGE};
pub use service::{GeminiService, GeminiServiceBuilder, ImageService};
pub use types::{data_uri, split_data_uri, AspectRatio, ImageFormat, Mode, SourceImage};
