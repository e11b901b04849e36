//! Prescription scan parser
//!
//! The prescription endpoint answers with loosely labeled blocks:
//!
//! ```text
//! MEDICATION 1:
//! - Name: Amoxicillin
//! - Dosage: 500mg
//! - Form: Capsule
//! - Price: ₹120
//! ```
//!
//! Each block becomes one [`MedicineEntry`]. Without block markers the text
//! is scanned line by line and every `Name` line starts a new entry.

use crate::types::MedicineEntry;
use lazy_static::lazy_static;
use regex::Regex;

/// Dosage form assumed when the scan does not state one
pub const DEFAULT_FORM: &str = "Tablet";

lazy_static! {
    static ref BLOCK_MARKER: Regex = Regex::new(r"(?i)MEDICATION\s+\d+\s*:").unwrap();
    static ref LABELED_LINE: Regex = Regex::new(
        r"(?i)^-?\s*(?:\*\*)?(name|dosage|form|price|details|tag)(?:\*\*)?(?:\s*[:|\-]\s*|\s+)(?:\*\*)?\s*(.+)$"
    )
    .unwrap();
    static ref NUMBER: Regex = Regex::new(r"(\d+(?:\.\d+)?)").unwrap();
}

#[derive(Debug, Default)]
struct Draft {
    name: String,
    dosage: String,
    form: String,
    price: Option<f64>,
    details: String,
    tag: String,
}

impl Draft {
    fn apply(&mut self, label: &str, value: &str) {
        let value = value.trim().trim_end_matches('*').trim();
        match label {
            "name" => self.name = value.to_string(),
            "dosage" => self.dosage = value.to_string(),
            "form" => self.form = value.to_string(),
            "price" => {
                if let Some(cap) = NUMBER.captures(value) {
                    self.price = cap[1].parse::<f64>().ok();
                }
            }
            "details" => self.details = value.to_string(),
            "tag" => self.tag = value.to_string(),
            _ => {}
        }
    }

    fn finish(self) -> Option<MedicineEntry> {
        if self.name.is_empty() {
            return None;
        }

        let name = if self.dosage.is_empty() {
            self.name
        } else {
            format!("{} {}", self.name, self.dosage)
        };
        let form = if self.form.is_empty() { DEFAULT_FORM.to_string() } else { self.form };

        Some(MedicineEntry {
            name,
            dosage_form: Some(form),
            unit_price: self.price,
            details: non_empty(self.details),
            tag: non_empty(self.tag),
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn labeled(line: &str) -> Option<(String, String)> {
    LABELED_LINE
        .captures(line.trim())
        .map(|cap| (cap[1].to_lowercase(), cap[2].to_string()))
}

/// Parse medicines from a prescription analysis.
///
/// Never fails; text without any recognizable `Name` line yields an empty vec.
pub fn parse_medications(text: &str) -> Vec<MedicineEntry> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let markers: Vec<_> = BLOCK_MARKER.find_iter(text).collect();
    if markers.is_empty() {
        return parse_unmarked(text);
    }

    // text before the first marker is preamble (patient, doctor ...)
    let mut medicines = Vec::new();
    for (i, marker) in markers.iter().enumerate() {
        let end = markers.get(i + 1).map(|m| m.start()).unwrap_or(text.len());
        let block = &text[marker.end()..end];

        let mut draft = Draft::default();
        for line in block.lines() {
            if let Some((label, value)) = labeled(line) {
                draft.apply(&label, &value);
            }
        }
        if let Some(entry) = draft.finish() {
            medicines.push(entry);
        }
    }

    if medicines.is_empty() {
        parse_unmarked(text)
    } else {
        medicines
    }
}

fn parse_unmarked(text: &str) -> Vec<MedicineEntry> {
    let mut medicines = Vec::new();
    let mut current = Draft::default();

    for line in text.lines() {
        let Some((label, value)) = labeled(line) else {
            continue;
        };
        if label == "name" && !current.name.is_empty() {
            if let Some(entry) = std::mem::take(&mut current).finish() {
                medicines.push(entry);
            }
        }
        current.apply(&label, &value);
    }

    if let Some(entry) = current.finish() {
        medicines.push(entry);
    }
    medicines
}

/// Estimated cost of one unit of each medicine; unknown prices count as zero
pub fn estimate_total(medicines: &[MedicineEntry]) -> f64 {
    medicines.iter().map(MedicineEntry::price_or_zero).sum()
}
