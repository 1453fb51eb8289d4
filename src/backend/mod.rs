//! AI microservices backend integration.

pub mod client;
pub mod types;

pub use client::{BackendApi, BackendClient};
pub use types::{
    BackendError, DocumentFile, DocumentKind, HealthStatus, LearningLevel, LearningPathRequest,
    QaAnswer, QaRequest, SummarizeRequest, UploadReceipt,
};
