//! Shared data model
//!
//! Types exchanged between the upload queue, the analysis service,
//! the extractor and the delivery flow:
//! - AnalysisResult: normalized answer of an analysis call
//! - ExtractedFields: labeled fields projected from the analysis text
//! - HistoryEntry: one snapshot in the per-user upload history
//! - DeliveryRequest / LineItem / Recipient: the medicine delivery request
//! - StoreCandidate / SubmissionResult: what the store-matching service returns

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of one queued upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    #[default]
    Pending,
    Analyzing,
    Done,
    Error,
}

impl UploadStatus {
    /// Done and Error are never left once reached
    pub fn is_terminal(self) -> bool {
        matches!(self, UploadStatus::Done | UploadStatus::Error)
    }
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadStatus::Pending => write!(f, "pending"),
            UploadStatus::Analyzing => write!(f, "analyzing"),
            UploadStatus::Done => write!(f, "done"),
            UploadStatus::Error => write!(f, "error"),
        }
    }
}

/// One entry of the upload history log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub name: String,

    #[serde(rename = "size")]
    pub size_bytes: u64,

    #[serde(rename = "type")]
    pub mime_type: String,

    pub added_at: DateTime<Utc>,

    /// data URL snapshot (`data:<mime>;base64,...`)
    #[serde(default)]
    pub preview: String,
}

/// Normalized response of the analysis service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default)]
    pub success: bool,

    #[serde(rename = "analysis", alias = "raw_analysis", default)]
    pub analysis_text: String,

    #[serde(default)]
    pub file_name: String,

    #[serde(rename = "fileSize", default)]
    pub file_size_bytes: u64,

    #[serde(default)]
    pub timestamp: String,

    /// Only present when `success` is false
    #[serde(rename = "error", default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AnalysisResult {
    /// Logical failure reported by the service itself
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.success && self.error_message.is_none()
    }
}

/// Target language for translated reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Mr,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
            Language::Mr => "mr",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Hi => "Hindi",
            Language::Mr => "Marathi",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "hi" | "hindi" => Ok(Language::Hi),
            "mr" | "marathi" => Ok(Language::Mr),
            _ => Err(format!("Unknown language: {}. Use en, hi, or mr", s)),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Outcome of one extracted field.
///
/// `Detected` always carries at least one item; an empty extraction is
/// `NotDetected`, which keeps "absent" distinguishable from "not applicable".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "items", rename_all = "snake_case")]
pub enum Detection<T> {
    Detected(Vec<T>),
    NotDetected,
}

impl<T> Default for Detection<T> {
    fn default() -> Self {
        Detection::NotDetected
    }
}

impl<T> Detection<T> {
    pub fn from_vec(items: Vec<T>) -> Self {
        if items.is_empty() {
            Detection::NotDetected
        } else {
            Detection::Detected(items)
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, Detection::Detected(_))
    }

    /// Empty slice when not detected
    pub fn items(&self) -> &[T] {
        match self {
            Detection::Detected(items) => items,
            Detection::NotDetected => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            Detection::Detected(items) => items,
            Detection::NotDetected => Vec::new(),
        }
    }
}

/// A medicine mentioned in an analysis or read off a prescription
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineEntry {
    pub name: String,

    #[serde(default)]
    pub dosage_form: Option<String>,

    #[serde(default)]
    pub unit_price: Option<f64>,

    #[serde(default)]
    pub details: Option<String>,

    #[serde(default)]
    pub tag: Option<String>,
}

impl MedicineEntry {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Unknown prices are costed at zero
    pub fn price_or_zero(&self) -> f64 {
        self.unit_price.unwrap_or(0.0)
    }

    pub fn is_highlighted(&self) -> bool {
        self.tag.is_some()
    }
}

/// Labeled fields derived from one analysis text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFields {
    pub diseases: Detection<String>,
    pub medicines: Detection<MedicineEntry>,
    pub symptoms: Detection<String>,
    pub precautions: Detection<String>,
    pub explanation_summary: String,
}

impl ExtractedFields {
    pub fn medicine_names(&self) -> Vec<&str> {
        self.medicines.items().iter().map(|m| m.name.as_str()).collect()
    }
}

/// Geolocation of the delivery address
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Delivery contact data entered by the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default)]
    pub landmark: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Recipient {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates { latitude, longitude }),
            _ => None,
        }
    }

    pub fn set_coordinates(&mut self, coordinates: Option<Coordinates>) {
        self.latitude = coordinates.map(|c| c.latitude);
        self.longitude = coordinates.map(|c| c.longitude);
    }
}

/// Acceptance state owned by the store-matching service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestStatus::Pending => write!(f, "pending"),
            RequestStatus::Accepted => write!(f, "accepted"),
            RequestStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// One medicine line of a delivery request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub form: String,
    /// Unit price
    #[serde(default)]
    pub price: f64,
    pub quantity: u32,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

impl LineItem {
    pub fn from_medicine(id: u32, medicine: &MedicineEntry) -> Self {
        Self {
            id,
            name: medicine.name.clone(),
            form: medicine.dosage_form.clone().unwrap_or_default(),
            price: medicine.price_or_zero(),
            quantity: 1,
            details: medicine.details.clone(),
            tag: medicine.tag.clone(),
        }
    }

    pub fn subtotal(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// Request sent to the delivery service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRequest {
    pub items: Vec<LineItem>,
    pub total: f64,
    pub delivery: Recipient,
    #[serde(default)]
    pub prescription_image: Option<String>,
    #[serde(default)]
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
}

impl DeliveryRequest {
    pub fn new(items: Vec<LineItem>, delivery: Recipient, prescription_image: Option<String>) -> Self {
        let total = items.iter().map(LineItem::subtotal).sum();
        Self {
            items,
            total,
            delivery,
            prescription_image,
            status: RequestStatus::Pending,
            requested_at: Utc::now(),
        }
    }
}

/// Nearby vendor returned by the store-matching service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreCandidate {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// km
    pub distance: f64,
    pub rating: Option<f64>,
    pub status: RequestStatus,
    pub estimated_time: Option<String>,
    pub responded_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: Option<String>,
}

/// Answer of the delivery service to a submitted request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmissionResult {
    pub success: bool,
    pub stores: Vec<StoreCandidate>,
    pub map_url: Option<String>,
    pub request_id: Option<String>,
    pub user_location: Option<UserLocation>,
    pub timestamp: Option<String>,
}

impl SubmissionResult {
    pub fn accepted_stores(&self) -> impl Iterator<Item = &StoreCandidate> {
        self.stores.iter().filter(|s| s.status == RequestStatus::Accepted)
    }
}
