use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use crate::models::{CsvRecord, OrderRecord};

/// Number of rejected rows logged individually before going quiet
const MAX_LOGGED_REJECTS: usize = 5;

/// Outcome of reading the order CSV
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub loaded: usize,
    pub rejected: usize,
}

/// The full order table, loaded once and read-only afterwards.
///
/// Records are kept sorted by purchase timestamp so that every filtered
/// table inherits a deterministic, chronological row order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<OrderRecord>,
}

impl Dataset {
    pub fn new(mut records: Vec<OrderRecord>) -> Self {
        records.sort_by_key(|r| r.order_purchase_timestamp);
        Self { records }
    }

    /// Load the dataset from a CSV file on disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<(Self, LoadStats)> {
        let path = path.as_ref();
        info!("Reading orders from {:?}", path);
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open dataset {}", path.display()))?;
        Self::from_reader(file)
    }

    /// Load the dataset from any CSV source with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<(Self, LoadStats)> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        let mut stats = LoadStats::default();

        for (i, row) in reader.deserialize::<CsvRecord>().enumerate() {
            let parsed = row
                .map_err(anyhow::Error::from)
                .and_then(|raw| raw.to_order());
            match parsed {
                Ok(order) => {
                    records.push(order);
                    stats.loaded += 1;
                }
                Err(e) => {
                    if stats.rejected < MAX_LOGGED_REJECTS {
                        warn!("Skipping row {}: {}", i + 1, e);
                    }
                    stats.rejected += 1;
                }
            }
        }

        info!(
            "Loaded {} order rows ({} rejected)",
            stats.loaded, stats.rejected
        );

        Ok((Self::new(records), stats))
    }

    pub fn records(&self) -> &[OrderRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First and last purchase date, or `None` for an empty dataset
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.first()?;
        let last = self.records.last()?;
        Some((first.purchase_date(), last.purchase_date()))
    }
}
