//! Basket Core - association-rule mining and cart recommendations
//!
//! Learns "customers who bought X also bought Y" rules from historical
//! baskets and answers recommendation queries for a live cart.
//!
//! Modules:
//! - `store`: Transaction corpus and product catalog built from raw rows
//! - `miner`: Level-wise (Apriori) frequent itemset mining
//! - `rules`: Rule generation with support/confidence/lift scoring
//! - `matcher`: Cart-to-rule matching and ranking
//! - `snapshot`: Versioned, checksummed model persistence
//! - `state`: Installed model and swappable handle

pub mod errors;
pub mod matcher;
pub mod miner;
pub mod rules;
pub mod serde_canon;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod types;

pub use errors::{BasketError, CorruptModelError, DataError, NotFoundError, Result, TrainingError};
pub use matcher::{recommend, Recommendation};
pub use miner::{mine, FrequentItemsets, Itemset, Miner};
pub use rules::{generate_rules, rule_order, Rule};
pub use snapshot::{ModelSnapshot, SNAPSHOT_FORMAT, SNAPSHOT_VERSION};
pub use state::{HealthReport, HealthStatus, Model, ModelHandle};
pub use store::{load, Catalog, RawRow, TransactionSet};
pub use types::{Item, ItemId, TrainingParams};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
