//! Order/request composer
//!
//! Builds a [`DeliveryRequest`] from scanned medicines plus the recipient
//! form, validates it and hands it to a [`DeliveryBackend`].
//!
//! ```text
//! Draft -> Validated -> Submitting -> Submitted
//!                                  -> SubmitFailed -> Validated (retry)
//! ```
//!
//! Any edit of a Validated or SubmitFailed request returns it to Draft.
//! Submitted is final. A composer saved while Submitting loads as
//! SubmitFailed, since its send never reported back.

use crate::error::{NeoCareError, Result};
use crate::gateway::DeliveryBackend;
use chrono::Utc;
use neocare_common::{
    validate, Coordinates, DeliveryRequest, LineItem, MedicineEntry, Recipient, SubmissionResult,
    ValidationReport, ValidationWarning,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposerState {
    Draft,
    Validated,
    Submitting,
    Submitted,
    SubmitFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredComposer")]
pub struct OrderComposer {
    request: DeliveryRequest,
    state: ComposerState,
    #[serde(default)]
    location_confirmed: bool,
    #[serde(default)]
    last_report: Option<ValidationReport>,
    #[serde(default)]
    response: Option<SubmissionResult>,
    #[serde(default)]
    transitions: Vec<ComposerState>,
}

/// Saved form of [`OrderComposer`]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredComposer {
    request: DeliveryRequest,
    state: ComposerState,
    #[serde(default)]
    location_confirmed: bool,
    #[serde(default)]
    last_report: Option<ValidationReport>,
    #[serde(default)]
    response: Option<SubmissionResult>,
    #[serde(default)]
    transitions: Vec<ComposerState>,
}

impl From<StoredComposer> for OrderComposer {
    fn from(stored: StoredComposer) -> Self {
        let mut composer = Self {
            request: stored.request,
            state: stored.state,
            location_confirmed: stored.location_confirmed,
            last_report: stored.last_report,
            response: stored.response,
            transitions: stored.transitions,
        };
        if composer.state == ComposerState::Submitting {
            tracing::warn!("composer was saved mid-send; marking the send as failed");
            composer.transition(ComposerState::SubmitFailed);
        }
        composer
    }
}

impl OrderComposer {
    pub fn new(items: Vec<LineItem>, prescription_image: Option<String>) -> Self {
        Self {
            request: DeliveryRequest::new(items, Recipient::default(), prescription_image),
            state: ComposerState::Draft,
            location_confirmed: false,
            last_report: None,
            response: None,
            transitions: vec![ComposerState::Draft],
        }
    }

    /// One line per scanned medicine, quantity 1, ids from 1
    pub fn from_medicines(medicines: &[MedicineEntry], prescription_image: Option<String>) -> Self {
        let items = medicines
            .iter()
            .enumerate()
            .map(|(i, m)| LineItem::from_medicine(i as u32 + 1, m))
            .collect();
        Self::new(items, prescription_image)
    }

    pub fn state(&self) -> ComposerState {
        self.state
    }

    /// Every state visited, oldest first
    pub fn transitions(&self) -> &[ComposerState] {
        &self.transitions
    }

    pub fn request(&self) -> &DeliveryRequest {
        &self.request
    }

    pub fn items(&self) -> &[LineItem] {
        &self.request.items
    }

    pub fn recipient(&self) -> &Recipient {
        &self.request.delivery
    }

    pub fn total(&self) -> f64 {
        self.request.total
    }

    pub fn response(&self) -> Option<&SubmissionResult> {
        self.response.as_ref()
    }

    pub fn last_report(&self) -> Option<&ValidationReport> {
        self.last_report.as_ref()
    }

    /// Add `delta` to a line's quantity; the result never drops below 1
    pub fn set_quantity(&mut self, id: u32, delta: i64) -> Result<u32> {
        self.ensure_editable()?;
        let item = self
            .request
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(NeoCareError::UnknownLineItem(id))?;

        let next = (i64::from(item.quantity)).saturating_add(delta).clamp(1, i64::from(u32::MAX));
        item.quantity = next as u32;
        let quantity = item.quantity;

        self.edited();
        Ok(quantity)
    }

    pub fn remove_line_item(&mut self, id: u32) -> Result<LineItem> {
        self.ensure_editable()?;
        let index = self
            .request
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(NeoCareError::UnknownLineItem(id))?;

        let removed = self.request.items.remove(index);
        self.edited();
        Ok(removed)
    }

    /// Replace the recipient form
    pub fn set_recipient(&mut self, recipient: Recipient) -> Result<()> {
        self.ensure_editable()?;
        let moved = recipient.coordinates() != self.request.delivery.coordinates();
        self.request.delivery = recipient;
        if moved {
            self.location_confirmed = false;
        }
        self.edited();
        Ok(())
    }

    pub fn set_coordinates(&mut self, coordinates: Option<Coordinates>) -> Result<()> {
        self.ensure_editable()?;
        self.request.delivery.set_coordinates(coordinates);
        self.location_confirmed = false;
        self.edited();
        Ok(())
    }

    /// Accept sending the request without a geolocation
    pub fn confirm_missing_location(&mut self) {
        self.location_confirmed = true;
    }

    /// Validate the current request.
    ///
    /// Field errors come back as `Err(Validation)` and leave the state at
    /// Draft; warnings are returned inside the report.
    pub fn validate(&mut self) -> Result<ValidationReport> {
        self.ensure_editable()?;
        let report = validate(&self.request);
        self.last_report = Some(report.clone());

        if report.is_blocking() {
            if self.state != ComposerState::Draft {
                self.transition(ComposerState::Draft);
            }
            return Err(NeoCareError::Validation(report));
        }

        if self.state != ComposerState::Validated {
            self.transition(ComposerState::Validated);
        }
        Ok(report)
    }

    /// Validate if needed, then send.
    ///
    /// On failure the request is kept and the state is SubmitFailed, from
    /// which `submit` can be called again.
    pub async fn submit(&mut self, backend: &dyn DeliveryBackend) -> Result<&SubmissionResult> {
        let report = match self.state {
            ComposerState::Submitted | ComposerState::Submitting => {
                return Err(NeoCareError::AlreadySubmitted)
            }
            _ => self.validate()?,
        };

        if report.has_warning(ValidationWarning::MissingCoordinates) && !self.location_confirmed {
            return Err(NeoCareError::ConfirmationRequired);
        }

        self.request.requested_at = Utc::now();
        self.transition(ComposerState::Submitting);
        tracing::info!(items = self.request.items.len(), total = self.request.total, "submitting delivery request");

        match backend.submit_request(&self.request).await {
            Ok(result) => {
                tracing::info!(stores = result.stores.len(), request_id = ?result.request_id, "delivery request accepted");
                self.transition(ComposerState::Submitted);
                Ok(self.response.insert(result))
            }
            Err(e) => {
                tracing::warn!(error = %e, "delivery request failed");
                self.transition(ComposerState::SubmitFailed);
                Err(e)
            }
        }
    }

    fn ensure_editable(&self) -> Result<()> {
        match self.state {
            ComposerState::Submitted | ComposerState::Submitting => Err(NeoCareError::AlreadySubmitted),
            _ => Ok(()),
        }
    }

    fn edited(&mut self) {
        self.request.total = self.request.items.iter().map(LineItem::subtotal).sum();
        if self.state != ComposerState::Draft {
            self.transition(ComposerState::Draft);
        }
    }

    fn transition(&mut self, next: ComposerState) {
        tracing::debug!(from = ?self.state, to = ?next, "composer transition");
        self.state = next;
        self.transitions.push(next);
    }
}
