//! NeoCare Common Library
//!
//! I/O-free pieces shared by the CLI and any other front end:
//! data model, analysis-text extraction, prescription parsing,
//! delivery validation, history pruning and the assistant conversation.

pub mod types;
pub mod error;
pub mod extractor;
pub mod prescription;
pub mod validation;
pub mod history;
pub mod prompts;
pub mod chat;

pub use types::{
    AnalysisResult, Coordinates, DeliveryRequest, Detection, ExtractedFields, HistoryEntry,
    Language, LineItem, MedicineEntry, Recipient, RequestStatus, StoreCandidate,
    SubmissionResult, UploadStatus,
};
pub use error::{Error, Result};
pub use extractor::{extract, Extractor, ExtractionRules, Field, Rule, Strategy};
pub use prescription::{estimate_total, parse_medications};
pub use validation::{validate, FieldError, ValidationReport, ValidationWarning};
pub use history::{merge_entries, prune, DEFAULT_HISTORY_CAP};
pub use chat::{ChatMessage, Conversation, Sender, WELCOME_MESSAGE};
