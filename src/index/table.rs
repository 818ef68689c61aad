//! Persisted date to index mapping
//!
//! The table is a JSON object keyed by `YYYYMMDD`:
//!
//! ```json
//! {
//!   "20231006": 5523,
//!   "20231009": 5524
//! }
//! ```
//!
//! It is loaded whole, modified in memory and written back whole through an
//! atomic rename. Sentinel outcomes ([`ResolvedDate::Empty`],
//! [`ResolvedDate::Unresolved`]) are never stored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{DateIndexResolver, IndexError, IndexResult};
use crate::config::{Anchor, DownloaderConfig};
use crate::store::{write_atomic, StoreError};
use crate::{Index, ResolvedDate, TradeDate};

/// File name of the literal-syntax table written by earlier installations
pub const LEGACY_TABLE_FILE: &str = "index_table.txt";

/// Date to index mapping backed by a file
#[derive(Debug, Clone)]
pub struct IndexTable {
    path: PathBuf,
    entries: BTreeMap<TradeDate, Index>,
}

impl IndexTable {
    /// Load the table, falling back to a legacy table or the anchor pair
    pub fn load(config: &DownloaderConfig) -> IndexResult<Self> {
        let path = config.index_table_path();

        let entries = if path.exists() {
            let contents =
                std::fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
            let entries: BTreeMap<TradeDate, Index> =
                serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            debug!(path = %path.display(), entries = entries.len(), "Index table loaded");
            entries
        } else {
            let legacy_path = config.index_dir.join(LEGACY_TABLE_FILE);
            if legacy_path.exists() {
                let entries = load_legacy(&legacy_path)?;
                info!(
                    path = %legacy_path.display(),
                    entries = entries.len(),
                    "Imported legacy index table"
                );
                entries
            } else {
                debug!(path = %path.display(), "No index table yet, starting from anchor");
                bootstrap(config.anchor)
            }
        };

        Ok(Self { path, entries })
    }

    /// Index recorded for `date`
    pub fn get(&self, date: TradeDate) -> Option<Index> {
        self.entries.get(&date).copied()
    }

    /// Record `date -> index`, returning the previous index for that date
    pub fn insert(&mut self, date: TradeDate, index: Index) -> Option<Index> {
        self.entries.insert(date, index)
    }

    /// All entries ordered by date
    pub fn entries(&self) -> &BTreeMap<TradeDate, Index> {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the whole table back to disk
    pub fn save(&self) -> IndexResult<()> {
        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        write_atomic(&self.path, json.as_bytes())?;
        debug!(path = %self.path.display(), entries = self.entries.len(), "Index table saved");
        Ok(())
    }

    /// Resolve `index`, record the pair and persist the table
    ///
    /// A sentinel outcome leaves the table untouched.
    pub async fn add(
        &mut self,
        resolver: &DateIndexResolver,
        index: Index,
    ) -> IndexResult<ResolvedDate> {
        let resolved = resolver.resolve(index).await;
        match resolved {
            ResolvedDate::Date(date) => {
                if let Some(previous) = self.insert(date, index) {
                    if previous != index {
                        warn!(%date, previous, index, "Replacing index recorded for date");
                    }
                }
                self.save()?;
                info!(index, %date, "Index {} is added", index);
            }
            ResolvedDate::Empty | ResolvedDate::Unresolved => {
                warn!(index, outcome = %resolved, "Index {} not added to table", index);
            }
        }
        Ok(resolved)
    }
}

fn bootstrap(anchor: Anchor) -> BTreeMap<TradeDate, Index> {
    BTreeMap::from([(anchor.date, anchor.index)])
}

/// Parse a literal-syntax table such as `{'20231006': 5523, '0': 5525}`
///
/// Only quoted `YYYYMMDD` keys with integer values are accepted; sentinel keys
/// written for empty or failed indices are dropped.
fn load_legacy(path: &Path) -> IndexResult<BTreeMap<TradeDate, Index>> {
    let contents = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    parse_legacy(&contents).map_err(|reason| {
        IndexError::from(StoreError::Corrupt {
            path: path.to_path_buf(),
            reason,
        })
    })
}

fn parse_legacy(contents: &str) -> Result<BTreeMap<TradeDate, Index>, String> {
    let body = contents
        .trim()
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .ok_or_else(|| "expected a {...} literal".to_string())?;

    let mut entries = BTreeMap::new();
    for pair in body.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
        let (key, value) = pair
            .split_once(':')
            .ok_or_else(|| format!("expected 'key': value, got {pair}"))?;
        let key = key.trim();
        let key = key
            .strip_prefix('\'')
            .and_then(|k| k.strip_suffix('\''))
            .or_else(|| key.strip_prefix('"').and_then(|k| k.strip_suffix('"')))
            .ok_or_else(|| format!("unquoted key {key}"))?;
        let index: Index = value
            .trim()
            .parse()
            .map_err(|e| format!("invalid index for {key}: {e}"))?;

        match key.parse::<TradeDate>() {
            Ok(date) => {
                entries.insert(date, index);
            }
            Err(_) => debug!(key, index, "Dropping sentinel key from legacy table"),
        }
    }
    Ok(entries)
}
