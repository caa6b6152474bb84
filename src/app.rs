//! Application state controller.
//!
//! Owns all mutable UI state and sequences user input through encoding, the
//! remote call, and result or error display. The presentation layer reads
//! state through the accessors and mutates it only through the entry points
//! defined here; it redraws after every mutation.

use crate::encode::encode_image_file;
use crate::error::{Result, StudioError};
use crate::service::ImageService;
use crate::types::{data_uri, AspectRatio, ImageFormat, Mode, SourceImage};
use std::path::Path;

/// Shown when submitting in generate mode without a prompt.
pub const PROMPT_REQUIRED: &str = "Please enter a prompt.";

/// Shown when submitting in edit mode without a prompt or source image.
pub const EDIT_INPUTS_REQUIRED: &str = "Please upload an image and enter a prompt.";

/// Shown when a selected file cannot be read or decoded.
pub const FILE_READ_FAILED: &str = "Failed to read the image file.";

/// Proof that a submission was accepted, handed back to
/// [`AppState::finish_submission`] together with the remote call's outcome.
///
/// Captures the state generation at acceptance time; a ticket whose
/// generation no longer matches is stale and its outcome is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionTicket {
    generation: u64,
    mode: Mode,
    result_format: ImageFormat,
}

impl SubmissionTicket {
    /// The mode this submission was accepted under.
    pub fn mode(&self) -> Mode {
        self.mode
    }
}

/// All mutable UI state, with the submission state machine.
#[derive(Debug, Default)]
pub struct AppState {
    mode: Mode,
    prompt: String,
    aspect_ratio: AspectRatio,
    source_image: Option<SourceImage>,
    generated_image: Option<String>,
    loading: bool,
    error: Option<String>,
    /// Bumped on every accepted submission and every mode change. Outcomes
    /// carrying an older generation are discarded instead of overwriting
    /// newer state.
    generation: u64,
}

impl AppState {
    /// Creates a fresh controller in generate mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current workflow mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current prompt text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Aspect ratio for generate mode.
    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    /// Source image selected for edit mode, if any.
    pub fn source_image(&self) -> Option<&SourceImage> {
        self.source_image.as_ref()
    }

    /// Data URI of the last successful result, if any.
    pub fn generated_image(&self) -> Option<&str> {
        self.generated_image.as_deref()
    }

    /// True while a remote call is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Current user-visible error message, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Switches workflow mode, resetting all dependent state.
    pub fn set_mode(&mut self, mode: Mode) {
        tracing::debug!(%mode, "mode change, resetting state");
        self.mode = mode;
        self.prompt.clear();
        self.source_image = None;
        self.generated_image = None;
        self.error = None;
        self.loading = false;
        // Anything still in flight resolves against a dead generation
        self.generation += 1;
    }

    /// Replaces the prompt text.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Selects the aspect ratio for generate mode.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: AspectRatio) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Handles file selection: encodes the file and stores it as the source
    /// image. On failure sets the error message without touching the loading
    /// flag or the generated image.
    pub fn attach_file(&mut self, path: impl AsRef<Path>) {
        match encode_image_file(path) {
            Ok(source) => {
                tracing::debug!(file = %source.file_name, "source image attached");
                self.source_image = Some(source);
            }
            Err(e) => {
                tracing::warn!("file read failed: {e}");
                self.error = Some(FILE_READ_FAILED.to_string());
            }
        }
    }

    /// Attempts to start a submission.
    ///
    /// On validation failure the state machine stays Idle: the error message
    /// is set and `None` is returned, leaving any previous result on screen.
    /// On acceptance the previous result and error are cleared, the loading
    /// flag is set, and the returned ticket must be handed back to
    /// [`finish_submission`](Self::finish_submission) with the remote call's
    /// outcome.
    pub fn begin_submission(&mut self) -> Option<SubmissionTicket> {
        let result_format = match self.mode {
            Mode::Generate => {
                if self.prompt.is_empty() {
                    self.error = Some(PROMPT_REQUIRED.to_string());
                    return None;
                }
                // Generation output is always JPEG
                ImageFormat::Jpeg
            }
            Mode::Edit => match self.source_image.as_ref() {
                Some(source) if !self.prompt.is_empty() => source.format,
                _ => {
                    self.error = Some(EDIT_INPUTS_REQUIRED.to_string());
                    return None;
                }
            },
        };

        self.loading = true;
        self.error = None;
        self.generated_image = None;
        self.generation += 1;

        Some(SubmissionTicket {
            generation: self.generation,
            mode: self.mode,
            result_format,
        })
    }

    /// Applies the outcome of a remote call.
    ///
    /// Stale tickets are discarded outright so a late response never
    /// overwrites state from a newer generation. Otherwise the loading flag
    /// is cleared and exactly one of the generated image or the error
    /// message is set.
    pub fn finish_submission(&mut self, ticket: SubmissionTicket, outcome: Result<String>) {
        if ticket.generation != self.generation {
            tracing::warn!(
                stale = ticket.generation,
                current = self.generation,
                "discarding stale submission outcome"
            );
            return;
        }

        self.loading = false;
        match outcome {
            Ok(payload) => {
                self.generated_image =
                    Some(data_uri(ticket.result_format.mime_type(), &payload));
            }
            Err(e) => {
                tracing::warn!(mode = %ticket.mode, "submission failed: {e}");
                self.error = Some(e.user_message());
            }
        }
    }

    /// Runs a full submission against the given service.
    ///
    /// Convenience for presentation layers that do not interleave other
    /// events with the call; validation, the remote call, and outcome
    /// application all happen here.
    pub async fn submit(&mut self, service: &dyn ImageService) {
        let Some(ticket) = self.begin_submission() else {
            return;
        };

        let outcome = match ticket.mode {
            Mode::Generate => service.generate(&self.prompt, self.aspect_ratio).await,
            Mode::Edit => match self.source_image.clone() {
                Some(source) => {
                    service.edit(&self.prompt, &source.base64, source.format).await
                }
                // Unreachable: presence was validated by begin_submission
                None => Err(StudioError::InvalidRequest("source image missing".into())),
            },
        };

        self.finish_submission(ticket, outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StudioError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    /// Service stub that returns a queued outcome and counts calls.
    #[derive(Default)]
    struct StubService {
        outcome: Mutex<Option<Result<String>>>,
        calls: AtomicUsize,
    }

    impl StubService {
        fn ok(payload: &str) -> Self {
            Self {
                outcome: Mutex::new(Some(Ok(payload.to_string()))),
                calls: AtomicUsize::new(0),
            }
        }

        fn err(error: StudioError) -> Self {
            Self {
                outcome: Mutex::new(Some(Err(error))),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn take_outcome(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome
                .lock()
                .unwrap()
                .take()
                .expect("no outcome queued")
        }
    }

    #[async_trait]
    impl ImageService for StubService {
        async fn generate(&self, _prompt: &str, _aspect_ratio: AspectRatio) -> Result<String> {
            self.take_outcome()
        }

        async fn edit(
            &self,
            _prompt: &str,
            _source_base64: &str,
            _format: ImageFormat,
        ) -> Result<String> {
            self.take_outcome()
        }

        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    fn state_with_png_source() -> AppState {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.png");
        std::fs::write(&path, PNG_MAGIC).unwrap();

        let mut state = AppState::new();
        state.set_mode(Mode::Edit);
        state.attach_file(&path);
        assert!(state.error().is_none(), "fixture file should encode");
        state
    }

    #[tokio::test]
    async fn test_empty_prompt_never_calls_service() {
        let service = StubService::ok("P");
        let mut state = AppState::new();

        state.submit(&service).await;

        assert_eq!(service.call_count(), 0);
        assert_eq!(state.error(), Some(PROMPT_REQUIRED));
        assert!(!state.is_loading());
        assert!(state.generated_image().is_none());
    }

    #[tokio::test]
    async fn test_edit_without_source_never_calls_service() {
        let service = StubService::ok("P");
        let mut state = AppState::new();
        state.set_mode(Mode::Edit);
        state.set_prompt("add a hat");

        state.submit(&service).await;

        assert_eq!(service.call_count(), 0);
        assert_eq!(state.error(), Some(EDIT_INPUTS_REQUIRED));
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn test_edit_empty_prompt_uses_combined_message() {
        let service = StubService::ok("P");
        let mut state = state_with_png_source();

        state.submit(&service).await;

        assert_eq!(service.call_count(), 0);
        assert_eq!(state.error(), Some(EDIT_INPUTS_REQUIRED));
    }

    #[tokio::test]
    async fn test_generate_success_builds_jpeg_data_uri() {
        let service = StubService::ok("P");
        let mut state = AppState::new();
        state.set_prompt("A red circle");
        state.set_aspect_ratio(AspectRatio::Square);

        state.submit(&service).await;

        assert_eq!(service.call_count(), 1);
        assert_eq!(state.generated_image(), Some("data:image/jpeg;base64,P"));
        assert!(state.error().is_none());
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn test_edit_success_preserves_source_mime() {
        let service = StubService::ok("P");
        let mut state = state_with_png_source();
        state.set_prompt("add a hat");

        state.submit(&service).await;

        assert_eq!(service.call_count(), 1);
        assert_eq!(state.generated_image(), Some("data:image/png;base64,P"));
        assert!(state.error().is_none());
    }

    #[tokio::test]
    async fn test_service_error_message_passes_through_verbatim() {
        let service = StubService::err(StudioError::Api {
            status: 429,
            message: "quota exceeded".into(),
        });
        let mut state = AppState::new();
        state.set_prompt("A red circle");

        state.submit(&service).await;

        assert_eq!(state.error(), Some("quota exceeded"));
        assert!(state.generated_image().is_none());
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn test_service_error_without_message_uses_fallback() {
        let service = StubService::err(StudioError::Api {
            status: 500,
            message: String::new(),
        });
        let mut state = AppState::new();
        state.set_prompt("A red circle");

        state.submit(&service).await;

        assert_eq!(state.error(), Some(crate::error::GENERIC_ERROR_MESSAGE));
    }

    #[test]
    fn test_mode_change_resets_everything() {
        let mut state = state_with_png_source();
        state.set_prompt("add a hat");
        state.error = Some("old error".into());
        state.generated_image = Some("data:image/png;base64,P".into());
        state.loading = true;

        state.set_mode(Mode::Generate);

        assert_eq!(state.mode(), Mode::Generate);
        assert!(state.prompt().is_empty());
        assert!(state.source_image().is_none());
        assert!(state.generated_image().is_none());
        assert!(state.error().is_none());
        assert!(!state.is_loading());
    }

    #[test]
    fn test_loading_spans_submission() {
        let mut state = AppState::new();
        state.set_prompt("A red circle");

        let ticket = state.begin_submission().expect("submission accepted");
        assert!(state.is_loading());
        assert!(state.generated_image().is_none());
        assert!(state.error().is_none());

        state.finish_submission(ticket, Ok("P".into()));
        assert!(!state.is_loading());
        assert!(state.generated_image().is_some());
    }

    #[test]
    fn test_submission_clears_previous_result_and_error() {
        let mut state = AppState::new();
        state.set_prompt("A red circle");
        state.error = Some("old error".into());
        state.generated_image = Some("data:image/jpeg;base64,old".into());

        let ticket = state.begin_submission().expect("submission accepted");
        assert!(state.error().is_none());
        assert!(state.generated_image().is_none());

        state.finish_submission(ticket, Ok("new".into()));
        assert_eq!(state.generated_image(), Some("data:image/jpeg;base64,new"));
    }

    #[test]
    fn test_validation_failure_leaves_previous_result() {
        let mut state = AppState::new();
        state.generated_image = Some("data:image/jpeg;base64,old".into());
        state.set_prompt("");

        assert!(state.begin_submission().is_none());

        // Inline error, previous result stays on screen
        assert_eq!(state.error(), Some(PROMPT_REQUIRED));
        assert_eq!(state.generated_image(), Some("data:image/jpeg;base64,old"));
    }

    #[test]
    fn test_stale_outcome_is_discarded_after_mode_change() {
        let mut state = AppState::new();
        state.set_prompt("A red circle");
        let ticket = state.begin_submission().expect("submission accepted");

        state.set_mode(Mode::Edit);
        state.finish_submission(ticket, Ok("P".into()));

        assert!(state.generated_image().is_none());
        assert!(state.error().is_none());
        assert!(!state.is_loading());
    }

    #[test]
    fn test_stale_outcome_is_discarded_after_resubmission() {
        let mut state = AppState::new();
        state.set_prompt("A red circle");
        let first = state.begin_submission().expect("submission accepted");
        let second = state.begin_submission().expect("submission accepted");

        // First call resolves late; the second submission owns the state now
        state.finish_submission(first, Ok("old".into()));
        assert!(state.generated_image().is_none());
        assert!(state.is_loading());

        state.finish_submission(second, Ok("new".into()));
        assert_eq!(state.generated_image(), Some("data:image/jpeg;base64,new"));
        assert!(!state.is_loading());
    }

    #[test]
    fn test_attach_file_failure_sets_inline_error_only() {
        let mut state = AppState::new();
        state.set_mode(Mode::Edit);
        state.generated_image = Some("data:image/png;base64,P".into());

        state.attach_file("/nonexistent/missing.png");

        assert_eq!(state.error(), Some(FILE_READ_FAILED));
        assert!(state.source_image().is_none());
        assert!(!state.is_loading());
        assert_eq!(state.generated_image(), Some("data:image/png;base64,P"));
    }
}
