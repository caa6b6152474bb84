//! Remote image service client.

mod gemini;

pub use gemini::{GeminiService, GeminiServiceBuilder};

use crate::error::Result;
use crate::types::{AspectRatio, ImageFormat};
use async_trait::async_trait;

/// A remote service that synthesizes images.
///
/// Implementations perform network I/O only; they never touch application
/// state. Failure messages are surfaced verbatim to the user by the caller.
#[async_trait]
pub trait ImageService: Send + Sync {
    /// Generates an image from a text prompt at the requested aspect ratio.
    ///
    /// Returns the base64-encoded image payload. The output is JPEG.
    async fn generate(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<String>;

    /// Applies a text-described edit to a source image.
    ///
    /// `source_base64` is the bare base64 payload of the source file and
    /// `format` its declared format, which the result preserves. Returns the
    /// base64-encoded edited image payload.
    async fn edit(&self, prompt: &str, source_base64: &str, format: ImageFormat) -> Result<String>;

    /// Checks that the service is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}
