//! Latest (date, index) cursor
//!
//! The cursor file holds a single line, `"<YYYYMMDD> <index>"`. Advancing it
//! resolves `index + 1` repeatedly and stops at the first outcome that is not
//! a real date: an empty or failed index is the authoritative end of what has
//! been published, so nothing past it is probed.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::{DateIndexResolver, IndexResult};
use crate::config::{Anchor, DownloaderConfig};
use crate::store::{write_atomic, StoreError};
use crate::{Index, ResolvedDate, TradeDate};

/// Newest confirmed (date, index) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Cursor {
    /// Date carried by `index`
    pub date: TradeDate,
    /// Publication index
    pub index: Index,
}

impl Cursor {
    /// Create a cursor
    pub fn new(date: TradeDate, index: Index) -> Self {
        Self { date, index }
    }
}

impl From<Anchor> for Cursor {
    fn from(anchor: Anchor) -> Self {
        Self::new(anchor.date, anchor.index)
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.date, self.index)
    }
}

impl FromStr for Cursor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.len() != 2 {
            return Err(format!("Invalid cursor: {s:?} (expected \"<date> <index>\")"));
        }
        let date = parts[0].parse::<TradeDate>()?;
        let index = parts[1]
            .parse::<Index>()
            .map_err(|e| format!("Invalid cursor index {:?}: {e}", parts[1]))?;
        Ok(Self { date, index })
    }
}

/// Maintains the persisted latest cursor
pub struct LatestIndexTracker {
    resolver: DateIndexResolver,
    path: PathBuf,
    anchor: Anchor,
}

impl LatestIndexTracker {
    /// Create a tracker for the configured cursor file
    pub fn new(resolver: DateIndexResolver, config: &DownloaderConfig) -> Self {
        Self {
            resolver,
            path: config.latest_index_path(),
            anchor: config.anchor,
        }
    }

    /// Cursor file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted cursor without probing
    ///
    /// Returns `None` when no cursor file exists. Unreadable content falls
    /// back to the anchor.
    pub fn load(&self) -> IndexResult<Option<Cursor>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&self.path, e).into()),
        };

        match contents.trim().parse::<Cursor>() {
            Ok(cursor) => Ok(Some(cursor)),
            Err(reason) => {
                warn!(
                    path = %self.path.display(),
                    %reason,
                    "Unreadable cursor, falling back to anchor"
                );
                Ok(Some(Cursor::from(self.anchor)))
            }
        }
    }

    /// Advance the cursor as far as the upstream has published and persist it
    ///
    /// Without a cursor file the anchor is written and returned without probing.
    pub async fn get_latest(&self) -> IndexResult<Cursor> {
        let Some(mut cursor) = self.load()? else {
            let cursor = Cursor::from(self.anchor);
            self.save(cursor)?;
            info!(%cursor, "Initialised latest index cursor");
            return Ok(cursor);
        };

        let start = cursor;
        loop {
            let next = cursor.index + 1;
            match self.resolver.resolve(next).await {
                ResolvedDate::Date(date) => {
                    cursor = Cursor::new(date, next);
                    debug!(%cursor, "Cursor advanced");
                }
                outcome @ (ResolvedDate::Empty | ResolvedDate::Unresolved) => {
                    debug!(index = next, %outcome, "Stopped probing");
                    break;
                }
            }
        }

        self.save(cursor)?;
        if cursor != start {
            info!(from = %start, to = %cursor, "Latest index advanced");
        } else {
            info!(%cursor, "Latest index unchanged");
        }
        Ok(cursor)
    }

    fn save(&self, cursor: Cursor) -> IndexResult<()> {
        write_atomic(&self.path, cursor.to_string().as_bytes())?;
        Ok(())
    }
}
