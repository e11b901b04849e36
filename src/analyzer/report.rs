//! Report over one analysis: extracted fields, optionally translated

use crate::gateway::Translator;
use chrono::{DateTime, Utc};
use neocare_common::{AnalysisResult, Detection, ExtractedFields, Extractor, Language};
use serde::{Deserialize, Serialize};

/// Translated copy of the report text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub analysis_text: String,
    pub explanation_summary: String,
    pub diseases: Vec<String>,
    pub medicines: Vec<String>,
    pub symptoms: Vec<String>,
    pub precautions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub source: AnalysisResult,
    pub language: Language,
    /// always extracted from the untranslated text
    pub fields: ExtractedFields,
    #[serde(default)]
    pub translation: Option<Translation>,
    pub generated_at: DateTime<Utc>,
}

impl Report {
    /// Extract fields and, for a non-English language, translate them.
    ///
    /// Translation failures leave the English text in place.
    pub async fn build(
        result: &AnalysisResult,
        extractor: &Extractor,
        language: Language,
        translator: &dyn Translator,
    ) -> Self {
        let fields = extractor.extract(&result.analysis_text);
        let translation = match language {
            Language::En => None,
            lang => Some(translate_fields(result, &fields, lang, translator).await),
        };

        Self {
            source: result.clone(),
            language,
            fields,
            translation,
            generated_at: Utc::now(),
        }
    }

    /// Same analysis, another language
    pub async fn relabel(&self, extractor: &Extractor, language: Language, translator: &dyn Translator) -> Self {
        Self::build(&self.source, extractor, language, translator).await
    }

    pub fn analysis_text(&self) -> &str {
        match &self.translation {
            Some(t) => &t.analysis_text,
            None => &self.source.analysis_text,
        }
    }

    pub fn summary(&self) -> &str {
        match &self.translation {
            Some(t) => &t.explanation_summary,
            None => &self.fields.explanation_summary,
        }
    }

    pub fn diseases(&self) -> Vec<String> {
        self.pick(|t| &t.diseases, &self.fields.diseases)
    }

    pub fn symptoms(&self) -> Vec<String> {
        self.pick(|t| &t.symptoms, &self.fields.symptoms)
    }

    pub fn precautions(&self) -> Vec<String> {
        self.pick(|t| &t.precautions, &self.fields.precautions)
    }

    pub fn medicines(&self) -> Vec<String> {
        match &self.translation {
            Some(t) if !t.medicines.is_empty() => t.medicines.clone(),
            _ => self.fields.medicine_names().into_iter().map(String::from).collect(),
        }
    }

    fn pick(&self, translated: impl Fn(&Translation) -> &Vec<String>, original: &Detection<String>) -> Vec<String> {
        match &self.translation {
            Some(t) if !translated(t).is_empty() => translated(t).clone(),
            _ => original.items().to_vec(),
        }
    }
}

async fn translate_fields(
    result: &AnalysisResult,
    fields: &ExtractedFields,
    lang: Language,
    translator: &dyn Translator,
) -> Translation {
    let diseases = fields.diseases.items().join("\n");
    let medicines = fields.medicine_names().join("\n");
    let symptoms = fields.symptoms.items().join("\n");
    let precautions = fields.precautions.items().join("\n");

    let (analysis_text, explanation_summary, diseases, medicines, symptoms, precautions) = tokio::join!(
        translate_text(translator, &result.analysis_text, lang),
        translate_text(translator, &fields.explanation_summary, lang),
        translate_text(translator, &diseases, lang),
        translate_text(translator, &medicines, lang),
        translate_text(translator, &symptoms, lang),
        translate_text(translator, &precautions, lang),
    );

    Translation {
        analysis_text,
        explanation_summary,
        diseases: split_lines(&diseases),
        medicines: split_lines(&medicines),
        symptoms: split_lines(&symptoms),
        precautions: split_lines(&precautions),
    }
}

async fn translate_text(translator: &dyn Translator, text: &str, lang: Language) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    translator.translate(text, lang).await
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
