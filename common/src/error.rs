//! Errors of the shared library
//!
//! Only loading extraction rules can fail; every parser here is total.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot read rules file: {0}")]
    RulesFile(#[from] std::io::Error),

    #[error("malformed extraction rules: {0}")]
    RulesFormat(#[from] serde_json::Error),

    #[error("invalid extraction pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
