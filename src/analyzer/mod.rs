//! Analysis flows that tie the session, gateway and extractor together

pub mod report;

pub use report::{Report, Translation};

use crate::error::{NeoCareError, Result};
use crate::gateway::AnalysisGateway;
use crate::scanner::FileRef;
use crate::session::{Outcome, UploadId, UploadSession};
use neocare_common::{estimate_total, parse_medications, prompts, AnalysisResult, MedicineEntry};
use serde::{Deserialize, Serialize};

/// How an analysis call ended
#[derive(Debug)]
pub enum AnalysisOutcome {
    /// service answered with a usable analysis
    Completed(AnalysisResult),
    /// service answered `success: false`
    Rejected(AnalysisResult),
    /// no usable answer (network or service error)
    Failed(NeoCareError),
    /// every item was removed while the call was in flight
    Discarded,
}

impl AnalysisOutcome {
    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            AnalysisOutcome::Completed(result) => Some(result),
            _ => None,
        }
    }

    /// Message to show when the call did not complete
    pub fn failure_message(&self) -> Option<String> {
        match self {
            AnalysisOutcome::Completed(_) => None,
            AnalysisOutcome::Rejected(result) => result.error_message.clone(),
            AnalysisOutcome::Failed(e) => Some(e.to_string()),
            AnalysisOutcome::Discarded => Some("uploads were removed before the analysis finished".into()),
        }
    }
}

/// Analyze queued items while their progress ticks.
///
/// One id goes to the single-image endpoint, several to the combined one.
/// Transport and service errors end up in [`AnalysisOutcome::Failed`];
/// an expired session is returned as an error.
pub async fn analyze_queued(
    session: &UploadSession,
    gateway: &AnalysisGateway,
    ids: &[UploadId],
    instruction: Option<&str>,
) -> Result<AnalysisOutcome> {
    let files = session.files(ids);
    if files.is_empty() {
        return Err(NeoCareError::NoImagesFound("no queued uploads match".into()));
    }

    let instruction = instruction.unwrap_or_else(|| prompts::default_instruction(files.len()));
    let requeued = session.retry(ids);
    if requeued > 0 {
        tracing::info!(count = requeued, "retrying failed uploads");
    }
    session.begin_progress(ids);
    tracing::info!(count = files.len(), "analysis started");

    let response = match files.as_slice() {
        [file] => gateway.analyze_one(file, Some(instruction)).await,
        _ => gateway.analyze_many(&files, Some(instruction)).await,
    };

    settle(session, ids, response)
}

/// Settle the items with the gateway's answer
fn settle(session: &UploadSession, ids: &[UploadId], response: Result<AnalysisResult>) -> Result<AnalysisOutcome> {
    if !ids.iter().any(|&id| session.get(id).is_some()) {
        session.complete_progress(ids, Outcome::Failure);
        tracing::info!("analysis finished after its uploads were removed");
        return match response {
            Err(NeoCareError::SessionExpired) => Err(NeoCareError::SessionExpired),
            _ => Ok(AnalysisOutcome::Discarded),
        };
    }

    match response {
        Ok(result) if result.is_success() => {
            session.complete_progress(ids, Outcome::Success);
            tracing::info!(file = %result.file_name, "analysis completed");
            Ok(AnalysisOutcome::Completed(result))
        }
        Ok(result) => {
            session.complete_progress(ids, Outcome::Failure);
            tracing::warn!(error = ?result.error_message, "analysis rejected by service");
            Ok(AnalysisOutcome::Rejected(result))
        }
        Err(NeoCareError::SessionExpired) => {
            session.complete_progress(ids, Outcome::Failure);
            Err(NeoCareError::SessionExpired)
        }
        Err(e) => {
            session.complete_progress(ids, Outcome::Failure);
            tracing::warn!(error = %e, retryable = e.is_retryable(), "analysis failed");
            Ok(AnalysisOutcome::Failed(e))
        }
    }
}

/// Result of a prescription scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionScan {
    pub result: AnalysisResult,
    pub medicines: Vec<MedicineEntry>,
    /// one unit of each medicine; unknown prices count as zero
    pub estimated_total: f64,
}

impl PrescriptionScan {
    pub fn from_result(result: AnalysisResult) -> Self {
        let medicines = if result.is_success() {
            parse_medications(&result.analysis_text)
        } else {
            Vec::new()
        };
        let estimated_total = estimate_total(&medicines);
        Self {
            result,
            medicines,
            estimated_total,
        }
    }
}

/// Send a prescription image and parse the medicines out of the answer
pub async fn scan_prescription(gateway: &AnalysisGateway, file: &FileRef) -> Result<PrescriptionScan> {
    let result = gateway.analyze_prescription(file).await?;
    let scan = PrescriptionScan::from_result(result);
    tracing::info!(medicines = scan.medicines.len(), total = scan.estimated_total, "prescription scanned");
    Ok(scan)
}
