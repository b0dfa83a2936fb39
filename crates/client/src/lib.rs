//! Core engine for a polling chat client. Keeps a rendered transcript in
//! sync with a server-held conversation log and handles optimistic text and
//! image submission behind a single-flight guard.
//!
//! The embedding host owns the actual surface (a webview or a console). It
//! reads node snapshots and markup from the engine and applies the scroll
//! requests the engine queues; input and image-load failures are reported
//! back in through the engine's setters.

mod logging;
mod render;
mod state;

pub mod api;
pub mod config;
pub mod message;
pub mod sync;
pub mod transcript;

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError, Backend, ChatReply, ChatRequest, FileSelection};
use crate::config::Config;
use crate::logging::ExchangeLog;
use crate::message::DisplayClass;
use crate::state::EngineState;
use crate::sync::PollHandle;
use crate::transcript::{NodeId, ScrollMode, TranscriptNode};

pub use crate::render::{escape_html, node_html, transcript_html, PLACEHOLDER_IMAGE_SRC};

/// Outcome of a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Round trip completed and the forced resync ran.
    Sent,
    /// Nothing was sent: empty input, no file selected, or another
    /// submission still in flight.
    Rejected,
    /// The backend reported failure; a notice was rendered and the input
    /// restored.
    Failed,
}

/// Set up file logging. Call once from the host before constructing engines;
/// the directory must already exist.
pub fn init_tracing(directory: &Path) {
    let file_appender = tracing_appender::rolling::never(directory, "client.log");
    let subscriber = tracing_subscriber::fmt()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_max_level(tracing::Level::INFO)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

pub struct ChatEngine {
    config: Config,
    backend: Arc<dyn Backend>,
    state: Mutex<EngineState>,
    exchange_log: Option<ExchangeLog>,
}

impl ChatEngine {
    /// Engine talking to the configured HTTP server.
    pub fn new(config: Config) -> Self {
        let backend = Arc::new(ApiClient::new(&config.server));
        Self::with_backend(config, backend)
    }

    /// Engine over any transport. Used by tests and custom embedders.
    pub fn with_backend(config: Config, backend: Arc<dyn Backend>) -> Self {
        let exchange_log = ExchangeLog::create(&config.logging);
        Self {
            config,
            backend,
            state: Mutex::new(EngineState::default()),
            exchange_log,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current contents of the input box.
    pub fn input(&self) -> String {
        self.state.lock().input_buffer.clone()
    }

    pub fn set_input(&self, text: impl Into<String>) {
        self.state.lock().input_buffer = text.into();
    }

    /// Stage a file for the next [`ChatEngine::upload_image`] call,
    /// replacing any earlier selection.
    pub fn select_file(&self, file: FileSelection) {
        self.state.lock().pending_file = Some(file);
    }

    pub fn selected_file(&self) -> Option<String> {
        self.state
            .lock()
            .pending_file
            .as_ref()
            .map(|file| file.name.clone())
    }

    pub fn submission_in_flight(&self) -> bool {
        self.state.lock().submission_in_flight
    }

    /// Snapshot of the rendered transcript, oldest node first.
    pub fn nodes(&self) -> Vec<TranscriptNode> {
        self.state.lock().transcript.nodes().to_vec()
    }

    /// Markup serialization of the whole transcript.
    pub fn to_html(&self) -> String {
        render::transcript_html(&self.state.lock().transcript)
    }

    /// Consume the pending scroll request for the host to apply.
    pub fn take_pending_scroll(&self) -> Option<ScrollMode> {
        self.state.lock().transcript.take_pending_scroll()
    }

    /// Report that the host failed to load an image node. Its markup swaps
    /// to the placeholder source.
    pub fn image_load_failed(&self, id: NodeId) {
        self.state.lock().transcript.mark_image_failed(id);
    }

    /// One poll of the authoritative history. Repaints only when the content
    /// differs from the last committed snapshot; transport failures are
    /// logged and swallowed so the next tick retries. Returns whether a
    /// repaint happened.
    pub async fn poll_once(&self) -> bool {
        let history = match self.backend.fetch_history().await {
            Ok(history) => history,
            Err(err) => {
                warn!("history poll failed: {err}");
                return false;
            }
        };

        let mut state = self.state.lock();
        if !state.store.has_changed(&history) {
            return false;
        }
        render::repaint(&mut state.transcript, &history);
        state.store.mark_committed(history);
        info!("transcript repainted: {} entries", state.transcript.len());
        true
    }

    /// Start the background poll task. It fires immediately, then on the
    /// configured interval.
    pub fn spawn_polling(self: Arc<Self>) -> PollHandle {
        sync::spawn(self)
    }

    /// Submit the current input box contents as a text message.
    ///
    /// Accepted submissions echo the text optimistically, show a thinking
    /// indicator and clear the input. On success the authoritative history
    /// is re-fetched so the server's rendition supersedes the echo; on
    /// failure a notice is rendered and the input restored for editing.
    pub async fn send_text(&self) -> SubmitOutcome {
        let (message, indicator, window) = {
            let mut state = self.state.lock();
            let message = state.input_buffer.trim().to_string();
            if message.is_empty() || state.submission_in_flight {
                return SubmitOutcome::Rejected;
            }
            state.submission_in_flight = true;
            state.input_buffer.clear();
            render::append_local(&mut state.transcript, DisplayClass::User, message.clone());
            let indicator = render::append_indicator(
                &mut state.transcript,
                self.config.submission.thinking_indicator.clone(),
            );
            state.indicator = Some(indicator);
            let window = state
                .store
                .trailing_window(self.config.submission.history_window);
            (message, indicator, window)
        };

        let request = ChatRequest {
            message: message.clone(),
            history: window,
        };
        let result = self.backend.send_chat(request).await;
        self.settle_submission(indicator, &message, &message, result)
            .await
    }

    /// Upload the selected image with the input box contents as its caption.
    /// The file selection is reset once the attempt settles, success or not.
    pub async fn upload_image(&self) -> SubmitOutcome {
        let (file, caption, echo, indicator) = {
            let mut state = self.state.lock();
            if state.submission_in_flight {
                return SubmitOutcome::Rejected;
            }
            let Some(file) = state.pending_file.clone() else {
                return SubmitOutcome::Rejected;
            };
            let caption = state.input_buffer.trim().to_string();
            state.submission_in_flight = true;
            state.input_buffer.clear();
            let subject = if caption.is_empty() {
                file.name.clone()
            } else {
                caption.clone()
            };
            let echo = format!("[image sent] {subject}");
            render::append_local(&mut state.transcript, DisplayClass::User, echo.clone());
            let indicator = render::append_indicator(
                &mut state.transcript,
                self.config.submission.upload_indicator.clone(),
            );
            state.indicator = Some(indicator);
            (file, caption, echo, indicator)
        };

        let result = self.backend.upload_image(file, caption.clone()).await;
        let outcome = self
            .settle_submission(indicator, &caption, &echo, result)
            .await;

        // Reset the picker so the same file can be chosen again.
        self.state.lock().pending_file = None;
        outcome
    }

    /// Common tail of both submission paths. Removes the indicator, then on
    /// success runs the forced resync and records the exchange; on failure
    /// renders a notice and restores the input. The single-flight guard is
    /// released here and nowhere else.
    async fn settle_submission(
        &self,
        indicator: NodeId,
        restore_input: &str,
        user_line: &str,
        result: Result<ChatReply, ApiError>,
    ) -> SubmitOutcome {
        let outcome = match result {
            Ok(reply) => {
                {
                    let mut state = self.state.lock();
                    state.transcript.remove(indicator);
                    state.indicator = None;
                }
                // The authoritative history supersedes the optimistic echo.
                self.poll_once().await;
                if let Some(log) = &self.exchange_log {
                    log.log_exchange(user_line, &reply.content);
                }
                SubmitOutcome::Sent
            }
            Err(err) => {
                warn!("submission failed: {err}");
                let mut state = self.state.lock();
                state.transcript.remove(indicator);
                state.indicator = None;
                render::append_local(
                    &mut state.transcript,
                    DisplayClass::Bot,
                    format!("Error: {err}"),
                );
                state.input_buffer = restore_input.to_string();
                SubmitOutcome::Failed
            }
        };

        self.state.lock().submission_in_flight = false;
        outcome
    }
}
