//! Effect layer: turns user actions into backend exchanges and applies their outcomes.
//!
//! Each submit validates and installs its placeholder synchronously under the state lock, then
//! performs the HTTP exchange on a spawned task so the caller stays responsive. Outcomes are
//! applied through the request-id check in [`ViewState`], so the most recently sent request of
//! a section is the one that sticks.

use crate::backend::{BackendApi, BackendError, DocumentFile, LearningLevel};
use crate::render;
use crate::state::{RequestId, Section, ViewState};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;

/// Errors raised while selecting a file from disk.
#[derive(Debug, Error)]
pub enum SelectFileError {
    /// The path has no final component usable as an upload name.
    #[error("Path has no file name: {0}")]
    NoFileName(PathBuf),
    /// Reading the file failed.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Notification sent when a backend exchange settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Section the exchange belonged to.
    pub section: Section,
    /// Request the outcome was for.
    pub request: RequestId,
    /// `false` when a newer request superseded this one and the outcome was dropped.
    pub applied: bool,
}

type Apply<T> = fn(&mut ViewState, RequestId, Result<T, BackendError>) -> bool;

/// Shared view state plus the backend it talks to.
#[derive(Clone)]
pub struct Panel {
    backend: Arc<dyn BackendApi>,
    state: Arc<RwLock<ViewState>>,
    top_k: u32,
    completions: Option<mpsc::UnboundedSender<Completion>>,
}

impl Panel {
    /// Build a panel over `backend`, asking questions with retrieval depth `top_k`.
    pub fn new(backend: Arc<dyn BackendApi>, top_k: u32) -> Self {
        Self {
            backend,
            state: Arc::new(RwLock::new(ViewState::new())),
            top_k,
            completions: None,
        }
    }

    /// Report every settled exchange on `sender`.
    pub fn with_completions(mut self, sender: mpsc::UnboundedSender<Completion>) -> Self {
        self.completions = Some(sender);
        self
    }

    /// Retrieval depth used for questions.
    pub fn top_k(&self) -> u32 {
        self.top_k
    }

    /// Copy of the current view state.
    pub async fn snapshot(&self) -> ViewState {
        self.state.read().await.clone()
    }

    /// Render the whole panel.
    pub async fn render(&self) -> String {
        render::render(&*self.state.read().await)
    }

    /// Render a section's result block.
    pub async fn render_result(&self, section: Section) -> String {
        render::render_result(&*self.state.read().await, section)
    }

    /// Render the result a settled exchange left behind.
    ///
    /// Returns `None` when the outcome was dropped or a newer request in the same section has
    /// since replaced it with its placeholder.
    pub async fn render_completion(&self, completion: Completion) -> Option<String> {
        if !completion.applied {
            return None;
        }
        let state = self.state.read().await;
        match state.in_flight(completion.section) {
            Some(newer) if newer != completion.request => None,
            _ => Some(render::render_result(&state, completion.section)),
        }
    }

    /// Read `path` and make it the selected file. A failed read keeps the previous selection.
    pub async fn select_file(&self, path: impl AsRef<Path>) -> Result<(), SelectFileError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| SelectFileError::NoFileName(path.to_path_buf()))?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| SelectFileError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(file = %file_name, bytes = bytes.len(), "Selected file");
        self.state
            .write()
            .await
            .select_file(DocumentFile { file_name, bytes });
        Ok(())
    }

    /// Replace the question text.
    pub async fn set_question(&self, question: impl Into<String>) {
        self.state.write().await.set_question(question);
    }

    /// Replace the text to summarize.
    pub async fn set_summary_text(&self, text: impl Into<String>) {
        self.state.write().await.set_summary_text(text);
    }

    /// Replace the learning-path topic and level.
    pub async fn set_learning_path(&self, topic: impl Into<String>, level: LearningLevel) {
        let mut state = self.state.write().await;
        state.set_learning_topic(topic);
        state.set_learning_level(level);
    }

    /// Upload the selected file.
    ///
    /// Returns `None` when local validation failed (the status says why) and no request was
    /// sent. Otherwise the handle resolves once the outcome has been applied or dropped.
    pub async fn upload(&self) -> Option<JoinHandle<bool>> {
        let ticket = self.state.write().await.begin_upload();
        let Some(ticket) = ticket else {
            tracing::debug!("Upload rejected locally");
            return None;
        };
        let backend = Arc::clone(&self.backend);
        let document = ticket.payload;
        Some(self.dispatch(
            Section::Upload,
            ticket.id,
            async move { backend.upload_document(document).await },
            ViewState::finish_upload,
        ))
    }

    /// Ask the current question. Returns `None` for an empty question.
    pub async fn ask(&self) -> Option<JoinHandle<bool>> {
        let ticket = self.state.write().await.begin_ask(self.top_k)?;
        let backend = Arc::clone(&self.backend);
        let request = ticket.payload;
        Some(self.dispatch(
            Section::Qa,
            ticket.id,
            async move { backend.ask(request).await },
            ViewState::finish_ask,
        ))
    }

    /// Summarize the current text. Returns `None` for empty text.
    pub async fn summarize(&self) -> Option<JoinHandle<bool>> {
        let ticket = self.state.write().await.begin_summarize()?;
        let backend = Arc::clone(&self.backend);
        let request = ticket.payload;
        Some(self.dispatch(
            Section::Summary,
            ticket.id,
            async move { backend.summarize(request).await },
            ViewState::finish_summarize,
        ))
    }

    /// Request a learning path for the current topic. Returns `None` for an empty topic.
    pub async fn learning_path(&self) -> Option<JoinHandle<bool>> {
        let ticket = self.state.write().await.begin_learning_path()?;
        let backend = Arc::clone(&self.backend);
        let request = ticket.payload;
        Some(self.dispatch(
            Section::LearningPath,
            ticket.id,
            async move { backend.learning_path(request).await },
            ViewState::finish_learning_path,
        ))
    }

    fn dispatch<T, F>(
        &self,
        section: Section,
        request: RequestId,
        exchange: F,
        apply: Apply<T>,
    ) -> JoinHandle<bool>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, BackendError>> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        let completions = self.completions.clone();
        tracing::debug!(%section, %request, "Request dispatched");
        tokio::spawn(async move {
            let outcome = exchange.await;
            if let Err(error) = &outcome {
                tracing::error!(%section, %request, %error, "Backend request failed");
            }
            let applied = apply(&mut *state.write().await, request, outcome);
            if !applied {
                tracing::debug!(%section, %request, "Discarded response for superseded request");
            }
            if let Some(sender) = completions {
                let _ = sender.send(Completion {
                    section,
                    request,
                    applied,
                });
            }
            applied
        })
    }
}
