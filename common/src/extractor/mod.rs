//! Structured text extractor
//!
//! Derives [`ExtractedFields`] from the free-form text returned by the
//! analysis service. The rule set is plain data ([`ExtractionRules`]): an
//! ordered list of `field -> strategy` pairs. For each field the first rule
//! that yields at least one item wins and later rules for that field are
//! skipped, so the precedence lives in the order of the list.
//!
//! Default precedence:
//! 1. diseases: bullet lines, then "such as" lists
//! 2. medicines: `Recommended Medicines:` style header, then `MEDICATION n:` blocks
//! 3. symptoms: `Common Symptoms:` style header, then the first sentence mentioning "symptom"
//! 4. precautions: `Precautions:` header, then up to 5 advice lines
//!
//! The explanation summary is the first paragraph cut to two sentences.
//! Extraction itself never fails.

pub mod normalize;
pub mod strategies;

use crate::error::{Error, Result};
use crate::prescription::parse_medications;
use crate::types::{Detection, ExtractedFields, MedicineEntry};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Field a rule fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Diseases,
    Medicines,
    Symptoms,
    Precautions,
}

fn default_block_separators() -> String {
    r"\n|,".to_string()
}

fn default_sentence_separators() -> String {
    r",|;|\band\s+".to_string()
}

fn default_true() -> bool {
    true
}

/// How a rule finds items in the text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// `- item` / `* item` / `• item` lines
    BulletLines,
    /// comma list after a phrase, up to the end of the sentence
    PhraseList { phrase: String },
    /// block after a header regex (a trailing `:` is part of the pattern)
    HeaderBlock {
        pattern: String,
        #[serde(default = "default_block_separators")]
        separators: String,
        #[serde(default = "default_true")]
        stop_at_labels: bool,
    },
    /// first sentence containing `needle`
    SentenceContaining {
        needle: String,
        #[serde(default = "default_sentence_separators")]
        separators: String,
        #[serde(default)]
        lead_in: Option<String>,
    },
    /// lines containing any keyword
    KeywordLines { keywords: Vec<String>, limit: usize },
    /// `MEDICATION n:` prescription blocks
    MedicationBlocks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub field: Field,
    #[serde(flatten)]
    pub strategy: Strategy,
}

impl Rule {
    pub fn new(field: Field, strategy: Strategy) -> Self {
        Self { field, strategy }
    }
}

/// Tunable rule set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRules {
    pub rules: Vec<Rule>,
    /// items equal to one of these (ignoring case and a trailing colon) are dropped
    #[serde(default = "default_heading_synonyms")]
    pub heading_synonyms: Vec<String>,
    #[serde(default = "default_summary_sentences")]
    pub summary_sentences: usize,
}

fn default_heading_synonyms() -> Vec<String> {
    vec!["summary".into(), "report details".into()]
}

fn default_summary_sentences() -> usize {
    2
}

impl Default for ExtractionRules {
    fn default() -> Self {
        let rules = vec![
            Rule::new(Field::Diseases, Strategy::BulletLines),
            Rule::new(Field::Diseases, Strategy::PhraseList { phrase: "such as".into() }),
            Rule::new(
                Field::Medicines,
                Strategy::HeaderBlock {
                    pattern: r"\b(?:recommended\s+medicines?|treatments?|medications?)\s*:".into(),
                    separators: default_block_separators(),
                    stop_at_labels: true,
                },
            ),
            Rule::new(Field::Medicines, Strategy::MedicationBlocks),
            Rule::new(
                Field::Symptoms,
                Strategy::HeaderBlock {
                    pattern: r"\b(?:common\s+symptoms?|symptoms?\s+include)\s*:".into(),
                    separators: default_block_separators(),
                    stop_at_labels: true,
                },
            ),
            Rule::new(
                Field::Symptoms,
                Strategy::SentenceContaining {
                    needle: "symptom".into(),
                    separators: default_sentence_separators(),
                    lead_in: Some(r"^.*?\bsymptoms?\s+(?:include|are)\b\s*:?\s*".into()),
                },
            ),
            Rule::new(
                Field::Precautions,
                Strategy::HeaderBlock {
                    pattern: r"\bprecautions?\s*:".into(),
                    separators: r"\n|,|;|\.".into(),
                    stop_at_labels: true,
                },
            ),
            Rule::new(
                Field::Precautions,
                Strategy::KeywordLines {
                    keywords: ["avoid", "should", "do not", "don't", "don’t", "advise", "recommend"]
                        .iter()
                        .map(|k| k.to_string())
                        .collect(),
                    limit: 5,
                },
            ),
        ];

        Self {
            rules,
            heading_synonyms: default_heading_synonyms(),
            summary_sentences: default_summary_sentences(),
        }
    }
}

impl ExtractionRules {
    /// Load from a JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let rules: Self = serde_json::from_str(json)?;
        Ok(rules)
    }
}

/// Strategy with its regexes compiled
#[derive(Debug, Clone)]
enum Matcher {
    BulletLines,
    PhraseList(Regex),
    HeaderBlock { header: Regex, separators: Regex, stop_at_labels: bool },
    SentenceContaining { sentence: Regex, separators: Regex, lead_in: Option<Regex> },
    KeywordLines { keywords: Regex, limit: usize },
    MedicationBlocks,
}

enum Found {
    Text(Vec<String>),
    Medicines(Vec<MedicineEntry>),
}

impl Found {
    fn is_empty(&self) -> bool {
        match self {
            Found::Text(items) => items.is_empty(),
            Found::Medicines(items) => items.is_empty(),
        }
    }

    fn into_text(self) -> Vec<String> {
        match self {
            Found::Text(items) => items,
            Found::Medicines(items) => items.into_iter().map(|m| m.name).collect(),
        }
    }

    fn into_medicines(self) -> Vec<MedicineEntry> {
        match self {
            Found::Text(items) => items.into_iter().map(MedicineEntry::named).collect(),
            Found::Medicines(items) => items,
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("(?i){}", pattern))
        .map_err(|source| Error::Pattern {
            pattern: pattern.to_string(),
            source,
        })
}

impl Matcher {
    fn compile(strategy: &Strategy) -> Result<Self> {
        Ok(match strategy {
            Strategy::BulletLines => Matcher::BulletLines,
            Strategy::PhraseList { phrase } => Matcher::PhraseList(compile(&regex::escape(phrase))?),
            Strategy::HeaderBlock { pattern, separators, stop_at_labels } => Matcher::HeaderBlock {
                header: compile(pattern)?,
                separators: compile(separators)?,
                stop_at_labels: *stop_at_labels,
            },
            Strategy::SentenceContaining { needle, separators, lead_in } => {
                let sentence = format!(r"[^.!?\n]*{}[^.!?\n]*", regex::escape(needle));
                Matcher::SentenceContaining {
                    sentence: compile(&sentence)?,
                    separators: compile(separators)?,
                    lead_in: lead_in.as_deref().map(|p| compile(&format!("(?s){}", p))).transpose()?,
                }
            }
            Strategy::KeywordLines { keywords, limit } => {
                let alternatives = keywords.iter().map(|k| regex::escape(k)).collect::<Vec<_>>().join("|");
                Matcher::KeywordLines {
                    keywords: compile(&format!(r"\b(?:{})\b", alternatives))?,
                    limit: *limit,
                }
            }
            Strategy::MedicationBlocks => Matcher::MedicationBlocks,
        })
    }

    fn apply(&self, text: &str, synonyms: &[String]) -> Found {
        match self {
            Matcher::BulletLines => Found::Text(strategies::bullet_lines(text, synonyms)),
            Matcher::PhraseList(phrase) => Found::Text(strategies::phrase_list(text, phrase, synonyms)),
            Matcher::HeaderBlock { header, separators, stop_at_labels } => Found::Text(
                strategies::header_block(text, header, separators, *stop_at_labels, synonyms),
            ),
            Matcher::SentenceContaining { sentence, separators, lead_in } => Found::Text(
                strategies::sentence_containing(text, sentence, separators, lead_in.as_ref(), synonyms),
            ),
            Matcher::KeywordLines { keywords, limit } => {
                Found::Text(strategies::keyword_lines(text, keywords, *limit, synonyms))
            }
            Matcher::MedicationBlocks => Found::Medicines(parse_medications(text)),
        }
    }
}

/// Compiled rule set
#[derive(Debug, Clone)]
pub struct Extractor {
    rules: Vec<(Field, Matcher)>,
    heading_synonyms: Vec<String>,
    summary_sentences: usize,
}

impl Extractor {
    /// Compile a rule set. Fails only on an invalid pattern.
    pub fn new(rules: &ExtractionRules) -> Result<Self> {
        let compiled = rules
            .rules
            .iter()
            .map(|rule| Ok((rule.field, Matcher::compile(&rule.strategy)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            rules: compiled,
            heading_synonyms: rules.heading_synonyms.clone(),
            summary_sentences: rules.summary_sentences,
        })
    }

    pub fn extract(&self, text: &str) -> ExtractedFields {
        let mut diseases: Option<Vec<String>> = None;
        let mut medicines: Option<Vec<MedicineEntry>> = None;
        let mut symptoms: Option<Vec<String>> = None;
        let mut precautions: Option<Vec<String>> = None;

        for (field, matcher) in &self.rules {
            let settled = match field {
                Field::Diseases => diseases.is_some(),
                Field::Medicines => medicines.is_some(),
                Field::Symptoms => symptoms.is_some(),
                Field::Precautions => precautions.is_some(),
            };
            if settled {
                continue;
            }

            let found = matcher.apply(text, &self.heading_synonyms);
            if found.is_empty() {
                continue;
            }

            match field {
                Field::Diseases => diseases = Some(found.into_text()),
                Field::Medicines => medicines = Some(found.into_medicines()),
                Field::Symptoms => symptoms = Some(found.into_text()),
                Field::Precautions => precautions = Some(found.into_text()),
            }
        }

        ExtractedFields {
            diseases: Detection::from_vec(diseases.unwrap_or_default()),
            medicines: Detection::from_vec(medicines.unwrap_or_default()),
            symptoms: Detection::from_vec(symptoms.unwrap_or_default()),
            precautions: Detection::from_vec(precautions.unwrap_or_default()),
            explanation_summary: normalize::summarize(text, self.summary_sentences),
        }
    }
}

lazy_static! {
    static ref DEFAULT_EXTRACTOR: Extractor =
        Extractor::new(&ExtractionRules::default()).expect("default extraction rules compile");
}

impl Default for Extractor {
    fn default() -> Self {
        DEFAULT_EXTRACTOR.clone()
    }
}

/// Extract with the default rule set
pub fn extract(text: &str) -> ExtractedFields {
    DEFAULT_EXTRACTOR.extract(text)
}
