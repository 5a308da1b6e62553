//! Error types for the basket core

use thiserror::Error;

/// Errors raised while turning raw transaction rows into a corpus.
#[derive(Error, Debug)]
pub enum DataError {
    /// No rows at all
    #[error("transaction input is empty")]
    Empty,

    /// A required field was absent or blank
    #[error("row {row}: missing required field `{field}`")]
    MissingField { row: usize, field: &'static str },

    /// The tabular source could not be parsed
    #[error("row {row}: malformed input: {reason}")]
    Malformed { row: usize, reason: String },

    /// The same item id appears twice where ids must be unique
    #[error("duplicate item id `{0}`")]
    DuplicateItem(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the mining and rule generation pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrainingError {
    #[error("invalid threshold {name}={value}: {reason}")]
    InvalidThreshold {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("cannot mine an empty transaction corpus")]
    EmptyCorpus,

    #[error(
        "no frequent itemsets at min_support={min_support} over {transactions} transactions"
    )]
    NoFrequentItemsets { min_support: f64, transactions: usize },

    #[error(
        "no rules survived min_confidence={min_confidence}, min_lift={min_lift} \
         ({itemsets} frequent itemsets, {multi_item} with two or more items)"
    )]
    NoRules {
        min_confidence: f64,
        min_lift: f64,
        itemsets: usize,
        multi_item: usize,
    },

    /// Itemset too wide to enumerate its antecedents
    #[error("itemset of {0} items is too large for rule enumeration")]
    ItemsetTooLarge(usize),

    /// A subset of a frequent itemset was not itself frequent
    #[error("support missing for subset {0:?} of a frequent itemset")]
    MissingSubset(Vec<String>),

    #[error("mining cancelled after {completed_levels} level(s)")]
    Cancelled { completed_levels: usize },
}

/// Errors raised when a persisted model cannot be trusted.
#[derive(Error, Debug)]
pub enum CorruptModelError {
    #[error("model blob is not valid JSON: {0}")]
    Malformed(String),

    #[error("unexpected model format `{0}`")]
    UnknownFormat(String),

    #[error("unsupported model version {found} (supported: {supported})")]
    UnsupportedVersion { found: u64, supported: u32 },

    #[error("model checksum mismatch: expected {expected}, computed {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("invalid model content: {0}")]
    Invalid(String),

    #[error("failed to encode model: {0}")]
    Encode(String),
}

/// Lookup of an item id that is not in the catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("item `{0}` not found")]
pub struct NotFoundError(pub String);

/// Umbrella error for callers that drive several stages.
#[derive(Error, Debug)]
pub enum BasketError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Training(#[from] TrainingError),

    #[error(transparent)]
    CorruptModel(#[from] CorruptModelError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for basket core operations
pub type Result<T> = std::result::Result<T, BasketError>;
