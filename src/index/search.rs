//! Date to index search
//!
//! Dates are not a linear function of the index (weekends and holidays leave
//! gaps), so the index of a date is found by expanding outward from the
//! anchor. For `d` in `1..=|anchor.date - target|`, `anchor.index + d` is
//! probed before `anchor.index - d`; the first index resolving to the target
//! wins.
//!
//! Probe outcomes other than failures are cached for the lifetime of the
//! search, so a backfill over many dates does not re-probe the same indices.

use std::collections::HashMap;
use tracing::{debug, info};

use super::{DateIndexResolver, IndexError, IndexResult};
use crate::config::{Anchor, DownloaderConfig};
use crate::{Index, ResolvedDate, TradeDate};

/// Bidirectional search around the anchor
pub struct DateToIndexSearch {
    resolver: DateIndexResolver,
    anchor: Anchor,
    cache: HashMap<Index, ResolvedDate>,
    probes: u64,
}

impl DateToIndexSearch {
    /// Create a search anchored at the configured reference pair
    pub fn new(resolver: DateIndexResolver, config: &DownloaderConfig) -> Self {
        Self {
            resolver,
            anchor: config.anchor,
            cache: HashMap::new(),
            probes: 0,
        }
    }

    /// Number of network probes issued so far
    pub fn probes(&self) -> u64 {
        self.probes
    }

    /// Width of the search window for `target`, in index steps per direction
    pub fn window(&self, target: TradeDate) -> u64 {
        self.anchor.date.days_since(target).unsigned_abs()
    }

    /// Indices probed for `target`, in probe order
    pub fn candidates(&self, target: TradeDate) -> impl Iterator<Item = Index> {
        let origin = self.anchor.index;
        (1..=self.window(target)).flat_map(move |d| {
            [origin.checked_add(d), origin.checked_sub(d)]
                .into_iter()
                .flatten()
        })
    }

    /// Find the index whose publication date is `target`
    ///
    /// The anchor date returns the anchor index without probing.
    pub async fn find_index(&mut self, target: TradeDate) -> IndexResult<Index> {
        if target == self.anchor.date {
            return Ok(self.anchor.index);
        }

        debug!(
            %target,
            anchor = %self.anchor.date,
            window = self.window(target),
            "Searching index for date"
        );

        let candidates: Vec<Index> = self.candidates(target).collect();
        for index in candidates {
            if self.probe(index).await == ResolvedDate::Date(target) {
                info!(%target, index, "Found index for date");
                return Ok(index);
            }
        }

        Err(IndexError::NotFound(target))
    }

    async fn probe(&mut self, index: Index) -> ResolvedDate {
        if let Some(cached) = self.cache.get(&index) {
            return *cached;
        }

        self.probes += 1;
        let resolved = self.resolver.resolve(index).await;
        if resolved != ResolvedDate::Unresolved {
            self.cache.insert(index, resolved);
        }
        resolved
    }
}
