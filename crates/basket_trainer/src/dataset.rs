//! CSV transaction source
//!
//! Reads `TransactionID,SKU,ProductName` files (one row per purchased item)
//! into raw rows for the transaction store.

use basket_core::{DataError, RawRow};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Column layout of the transaction file
pub const TRANSACTION_COLUMNS: [&str; 3] = ["TransactionID", "SKU", "ProductName"];

/// Rows read from a transaction file, in file order
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    rows: Vec<RawRow>,
}

impl Dataset {
    /// Load a dataset from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let file = std::fs::File::open(path.as_ref())?;
        let dataset = Self::from_reader(file)?;
        info!(
            "Read {} rows from {}",
            dataset.len(),
            path.as_ref().display()
        );
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(false)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (idx, record) in reader.deserialize::<RawRow>().enumerate() {
            let row = record.map_err(|err| csv_error(idx + 1, err))?;
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(DataError::Empty);
        }
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<RawRow> {
        self.rows
    }

    /// Distinct transaction ids and item ids seen in the file
    pub fn distinct_counts(&self) -> (usize, usize) {
        let transactions: BTreeSet<&str> = self
            .rows
            .iter()
            .filter_map(|r| r.transaction_id.as_deref())
            .collect();
        let items: BTreeSet<&str> = self.rows.iter().filter_map(|r| r.item_id.as_deref()).collect();
        (transactions.len(), items.len())
    }
}

fn csv_error(row: usize, err: csv::Error) -> DataError {
    if !err.is_io_error() {
        return DataError::Malformed {
            row,
            reason: err.to_string(),
        };
    }
    match err.into_kind() {
        csv::ErrorKind::Io(io) => DataError::Io(io),
        other => DataError::Malformed {
            row,
            reason: format!("{:?}", other),
        },
    }
}
