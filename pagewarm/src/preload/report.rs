//! Summary of a preload run.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::loader::ImageLoadResult;
use super::tier::{Priority, TieredUrls};

/// Images a strategy would load, before any image work starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreloadPlan {
    pub strategy: String,
    pub documents: usize,
    pub tiers: TieredUrls,
}

/// Per-tier outcome counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierReport {
    pub priority: Priority,
    pub loaded: usize,
    pub failed: usize,
}

/// What one strategy execution did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreloadReport {
    pub strategy: String,
    /// Content documents fetched (or served from cache).
    pub documents: usize,
    pub tiers: Vec<TierReport>,
    /// Image URLs beyond every tier budget.
    pub dropped: usize,
    pub elapsed_ms: u64,
}

impl PreloadReport {
    pub fn new(
        strategy: &str,
        documents: usize,
        results: &[ImageLoadResult],
        dropped: usize,
        elapsed: Duration,
    ) -> Self {
        let tiers = Priority::ALL
            .into_iter()
            .map(|priority| {
                let (loaded, failed) = results
                    .iter()
                    .filter(|r| r.priority == priority)
                    .fold((0, 0), |(ok, bad), r| {
                        if r.loaded {
                            (ok + 1, bad)
                        } else {
                            (ok, bad + 1)
                        }
                    });
                TierReport {
                    priority,
                    loaded,
                    failed,
                }
            })
            .collect();

        Self {
            strategy: strategy.to_string(),
            documents,
            tiers,
            dropped,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn loaded(&self) -> usize {
        self.tiers.iter().map(|t| t.loaded).sum()
    }

    pub fn failed(&self) -> usize {
        self.tiers.iter().map(|t| t.failed).sum()
    }

    /// Number of image loads attempted.
    pub fn attempted(&self) -> usize {
        self.loaded() + self.failed()
    }

    pub fn tier(&self, priority: Priority) -> Option<&TierReport> {
        self.tiers.iter().find(|t| t.priority == priority)
    }
}

impl fmt::Display for PreloadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} documents, {}/{} images loaded",
            self.strategy,
            self.documents,
            self.loaded(),
            self.attempted()
        )?;
        for tier in &self.tiers {
            write!(f, ", {} {}/{}", tier.priority, tier.loaded, tier.loaded + tier.failed)?;
        }
        if self.dropped > 0 {
            write!(f, ", {} dropped", self.dropped)?;
        }
        write!(f, " in {}ms", self.elapsed_ms)
    }
}
