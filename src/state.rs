//! View state for the panel.
//!
//! Every section follows the same two-step shape: a `begin_*` call validates input, installs the
//! placeholder, and hands back a [`Ticket`] carrying the request payload; the matching `finish_*`
//! call applies the backend outcome. Each ticket is tagged with a fresh [`RequestId`] and only
//! the section's most recently issued ticket may write its result, so a slow response can never
//! overwrite a newer one.

use crate::backend::{
    BackendError, DocumentFile, DocumentKind, LearningLevel, LearningPathRequest, QaAnswer,
    QaRequest, SummarizeRequest, UploadReceipt,
};
use std::fmt;

/// Placeholder answer shown while a question is outstanding.
pub const THINKING: &str = "Thinking...";
/// Answer text shown when a question fails.
pub const ANSWER_ERROR: &str = "Error fetching answer.";
/// Placeholder summary shown while a summary is outstanding.
pub const SUMMARIZING: &str = "Summarizing...";
/// Summary text shown when summarization fails.
pub const SUMMARY_ERROR: &str = "Error fetching summary.";
/// Placeholder shown while a learning path is outstanding.
pub const GENERATING_PATH: &str = "Generating learning path...";
/// Text shown when learning-path generation fails.
pub const LEARNING_PATH_ERROR: &str = "Error fetching learning path.";

/// Monotonic identifier attached to every request the view issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A started request: its identifier plus the payload to send.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket<T> {
    /// Identifier the outcome must be applied with.
    pub id: RequestId,
    /// Request payload for the backend.
    pub payload: T,
}

/// Panel sections; each owns an independent result slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Document upload.
    Upload,
    /// Question answering.
    Qa,
    /// Text summarization.
    Summary,
    /// Learning-path generation.
    LearningPath,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Upload => "upload",
            Self::Qa => "qa",
            Self::Summary => "summary",
            Self::LearningPath => "learning-path",
        })
    }
}

/// Lifecycle of a section's most recent request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing submitted yet, or the last submission was a no-op.
    #[default]
    Idle,
    /// A request is outstanding.
    Pending,
    /// The last request succeeded.
    Ready,
    /// The last submission failed, locally or remotely.
    Failed,
}

/// Upload status line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadStatus {
    /// No upload attempted.
    #[default]
    Idle,
    /// Upload submitted without a file.
    NoFileSelected,
    /// Selected file has an extension the backend cannot index.
    UnsupportedType(String),
    /// Upload in flight.
    Uploading,
    /// Backend indexed the document.
    Uploaded {
        /// Chunk count reported by the backend.
        chunks_indexed: u64,
    },
    /// Transport, status, or decode failure.
    Failed,
}

impl UploadStatus {
    fn phase(&self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::Uploading => Phase::Pending,
            Self::Uploaded { .. } => Phase::Ready,
            Self::NoFileSelected | Self::UnsupportedType(_) | Self::Failed => Phase::Failed,
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => Ok(()),
            Self::NoFileSelected => f.write_str("Please select a file first."),
            Self::UnsupportedType(_) => f.write_str("Only PDF or TXT files are supported."),
            Self::Uploading => f.write_str("Uploading..."),
            Self::Uploaded { chunks_indexed } => write!(
                f,
                "File uploaded successfully! Chunks indexed: {chunks_indexed}"
            ),
            Self::Failed => f.write_str("Error uploading file."),
        }
    }
}

/// Result slot of the learning-path section.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LearningPathView {
    /// Nothing requested yet.
    #[default]
    Empty,
    /// Request outstanding.
    Generating,
    /// Ordered steps returned by the backend.
    Steps(Vec<String>),
    /// Request failed.
    Failed,
}

#[derive(Debug, Clone, Default)]
struct UploadSection {
    selected: Option<DocumentFile>,
    status: UploadStatus,
    latest: Option<RequestId>,
}

#[derive(Debug, Clone, Default)]
struct QaSection {
    question: String,
    answer: Option<QaAnswer>,
    phase: Phase,
    latest: Option<RequestId>,
}

#[derive(Debug, Clone, Default)]
struct SummarySection {
    text: String,
    summary: String,
    phase: Phase,
    latest: Option<RequestId>,
}

#[derive(Debug, Clone, Default)]
struct LearningPathSection {
    topic: String,
    level: LearningLevel,
    view: LearningPathView,
    latest: Option<RequestId>,
}

/// All interaction state of the panel. Nothing here outlives the process.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    next_request: u64,
    upload: UploadSection,
    qa: QaSection,
    summary: SummarySection,
    learning: LearningPathSection,
}

/// Claim `id` as the slot's result if it is still the latest request.
fn settle(latest: &mut Option<RequestId>, id: RequestId) -> bool {
    if *latest == Some(id) {
        *latest = None;
        true
    } else {
        false
    }
}

impl ViewState {
    /// Create an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    fn issue(&mut self) -> RequestId {
        self.next_request += 1;
        RequestId(self.next_request)
    }

    /// Phase of the given section's latest submission.
    pub fn phase(&self, section: Section) -> Phase {
        match section {
            Section::Upload => self.upload.status.phase(),
            Section::Qa => self.qa.phase,
            Section::Summary => self.summary.phase,
            Section::LearningPath => match self.learning.view {
                LearningPathView::Empty => Phase::Idle,
                LearningPathView::Generating => Phase::Pending,
                LearningPathView::Steps(_) => Phase::Ready,
                LearningPathView::Failed => Phase::Failed,
            },
        }
    }

    /// Request currently in flight for `section`, if any.
    pub fn in_flight(&self, section: Section) -> Option<RequestId> {
        match section {
            Section::Upload => self.upload.latest,
            Section::Qa => self.qa.latest,
            Section::Summary => self.summary.latest,
            Section::LearningPath => self.learning.latest,
        }
    }

    /// Number of sections with a request in flight.
    pub fn pending_requests(&self) -> usize {
        [
            self.upload.latest,
            self.qa.latest,
            self.summary.latest,
            self.learning.latest,
        ]
        .iter()
        .filter(|latest| latest.is_some())
        .count()
    }

    // Upload

    /// Replace the selected file.
    pub fn select_file(&mut self, document: DocumentFile) {
        self.upload.selected = Some(document);
    }

    /// Currently selected file, if any.
    pub fn selected_file(&self) -> Option<&DocumentFile> {
        self.upload.selected.as_ref()
    }

    /// Current upload status line.
    pub fn upload_status(&self) -> &UploadStatus {
        &self.upload.status
    }

    /// Validate the selection and start an upload.
    ///
    /// Returns `None` when validation fails; the status then carries the reason and any upload
    /// still in flight will no longer be applied.
    pub fn begin_upload(&mut self) -> Option<Ticket<DocumentFile>> {
        let Some(document) = self.upload.selected.clone() else {
            self.upload.status = UploadStatus::NoFileSelected;
            self.upload.latest = None;
            return None;
        };
        if DocumentKind::from_file_name(&document.file_name).is_none() {
            self.upload.status = UploadStatus::UnsupportedType(document.file_name);
            self.upload.latest = None;
            return None;
        }
        let id = self.issue();
        self.upload.status = UploadStatus::Uploading;
        self.upload.latest = Some(id);
        Some(Ticket {
            id,
            payload: document,
        })
    }

    /// Apply an upload outcome. Returns `false` when the response was stale and dropped.
    pub fn finish_upload(
        &mut self,
        id: RequestId,
        outcome: Result<UploadReceipt, BackendError>,
    ) -> bool {
        if !settle(&mut self.upload.latest, id) {
            return false;
        }
        self.upload.status = match outcome {
            Ok(receipt) => UploadStatus::Uploaded {
                chunks_indexed: receipt.chunks_indexed,
            },
            Err(_) => UploadStatus::Failed,
        };
        true
    }

    // Question answering

    /// Replace the question text.
    pub fn set_question(&mut self, question: impl Into<String>) {
        self.qa.question = question.into();
    }

    /// Current question text.
    pub fn question(&self) -> &str {
        &self.qa.question
    }

    /// Last answer record, including the pending placeholder.
    pub fn qa_answer(&self) -> Option<&QaAnswer> {
        self.qa.answer.as_ref()
    }

    /// Start a question with retrieval depth `top_k`.
    ///
    /// An empty question is a no-op: nothing changes and `None` is returned. Any other text,
    /// whitespace included, is sent as typed.
    pub fn begin_ask(&mut self, top_k: u32) -> Option<Ticket<QaRequest>> {
        if self.qa.question.is_empty() {
            return None;
        }
        let payload = QaRequest {
            question: self.qa.question.clone(),
            top_k,
        };
        let id = self.issue();
        self.qa.answer = Some(QaAnswer {
            answer: THINKING.to_string(),
            sources: Vec::new(),
        });
        self.qa.phase = Phase::Pending;
        self.qa.latest = Some(id);
        Some(Ticket { id, payload })
    }

    /// Apply a question outcome. Returns `false` when the response was stale and dropped.
    pub fn finish_ask(&mut self, id: RequestId, outcome: Result<QaAnswer, BackendError>) -> bool {
        if !settle(&mut self.qa.latest, id) {
            return false;
        }
        let (answer, phase) = match outcome {
            Ok(answer) => (answer, Phase::Ready),
            Err(_) => (
                QaAnswer {
                    answer: ANSWER_ERROR.to_string(),
                    sources: Vec::new(),
                },
                Phase::Failed,
            ),
        };
        self.qa.answer = Some(answer);
        self.qa.phase = phase;
        true
    }

    // Summarization

    /// Replace the text to summarize.
    pub fn set_summary_text(&mut self, text: impl Into<String>) {
        self.summary.text = text.into();
    }

    /// Current text to summarize.
    pub fn summary_text(&self) -> &str {
        &self.summary.text
    }

    /// Summary line: placeholder, backend summary, or error text. Empty when nothing to show.
    pub fn summary(&self) -> &str {
        &self.summary.summary
    }

    /// Start a summary. Empty text is a no-op.
    pub fn begin_summarize(&mut self) -> Option<Ticket<SummarizeRequest>> {
        if self.summary.text.is_empty() {
            return None;
        }
        let payload = SummarizeRequest {
            text: self.summary.text.clone(),
        };
        let id = self.issue();
        self.summary.summary = SUMMARIZING.to_string();
        self.summary.phase = Phase::Pending;
        self.summary.latest = Some(id);
        Some(Ticket { id, payload })
    }

    /// Apply a summary outcome. Returns `false` when the response was stale and dropped.
    pub fn finish_summarize(&mut self, id: RequestId, outcome: Result<String, BackendError>) -> bool {
        if !settle(&mut self.summary.latest, id) {
            return false;
        }
        match outcome {
            Ok(summary) => {
                self.summary.summary = summary;
                self.summary.phase = Phase::Ready;
            }
            Err(_) => {
                self.summary.summary = SUMMARY_ERROR.to_string();
                self.summary.phase = Phase::Failed;
            }
        }
        true
    }

    // Learning path

    /// Replace the learning-path topic.
    pub fn set_learning_topic(&mut self, topic: impl Into<String>) {
        self.learning.topic = topic.into();
    }

    /// Replace the learning-path level.
    pub fn set_learning_level(&mut self, level: LearningLevel) {
        self.learning.level = level;
    }

    /// Current learning-path topic.
    pub fn learning_topic(&self) -> &str {
        &self.learning.topic
    }

    /// Current learning-path level.
    pub fn learning_level(&self) -> LearningLevel {
        self.learning.level
    }

    /// Learning-path result slot.
    pub fn learning_path(&self) -> &LearningPathView {
        &self.learning.view
    }

    /// Start a learning-path request. An empty topic is a no-op.
    pub fn begin_learning_path(&mut self) -> Option<Ticket<LearningPathRequest>> {
        if self.learning.topic.is_empty() {
            return None;
        }
        let payload = LearningPathRequest {
            topic: self.learning.topic.clone(),
            level: self.learning.level,
        };
        let id = self.issue();
        self.learning.view = LearningPathView::Generating;
        self.learning.latest = Some(id);
        Some(Ticket { id, payload })
    }

    /// Apply a learning-path outcome. Returns `false` when the response was stale and dropped.
    pub fn finish_learning_path(
        &mut self,
        id: RequestId,
        outcome: Result<Vec<String>, BackendError>,
    ) -> bool {
        if !settle(&mut self.learning.latest, id) {
            return false;
        }
        self.learning.view = match outcome {
            Ok(steps) => LearningPathView::Steps(steps),
            Err(_) => LearningPathView::Failed,
        };
        true
    }
}
