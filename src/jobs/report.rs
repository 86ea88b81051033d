//! End-of-run reporting.

use std::fmt::Write as _;

use serde::Serialize;
use tracing::{info, warn};

use crate::reconcile::Unresolved;

/// Counts for one mutating job, plus the records it could not resolve
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub mode: String,
    pub processed: usize,
    pub added: usize,
    pub updated: usize,
    /// Records skipped because they were already resolved or present
    pub skipped: usize,
    pub unresolved: Vec<Unresolved>,
}

impl RunReport {
    pub fn new(mode: &str) -> Self {
        Self {
            mode: mode.to_string(),
            ..Self::default()
        }
    }

    pub fn unresolved_count(&self) -> usize {
        self.unresolved.len()
    }

    /// One-line count summary
    pub fn summary(&self) -> String {
        format!(
            "{}: processed {}, added {}, updated {}, skipped {}, unresolved {}",
            self.mode,
            self.processed,
            self.added,
            self.updated,
            self.skipped,
            self.unresolved_count()
        )
    }

    /// Summary plus the unresolved names, truncated after `limit` entries
    pub fn details(&self, limit: usize) -> String {
        let mut out = self.summary();
        for entry in self.unresolved.iter().take(limit) {
            let _ = write!(out, "\n- {} ({})", entry.name, entry.reason);
        }
        if self.unresolved.len() > limit {
            let _ = write!(out, "\n... and {} more", self.unresolved.len() - limit);
        }
        out
    }

    pub fn log(&self, list_unresolved: bool) {
        info!("{}", self.summary());
        if list_unresolved {
            for entry in &self.unresolved {
                warn!("Unresolved: {} ({})", entry.name, entry.reason);
            }
        }
    }
}

/// A curated name with at least one record outside the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub name: String,
    /// Distinct off-target districts; `UNKNOWN` when missing
    pub districts: Vec<String>,
}

/// Read-only comparison of a curated list against the dataset
#[derive(Debug, Default, Serialize)]
pub struct AuditReport {
    pub target: String,
    pub total: usize,
    pub found: Vec<String>,
    pub missing: Vec<String>,
    pub mismatched: Vec<Mismatch>,
}

impl AuditReport {
    pub fn summary(&self) -> String {
        format!(
            "audit ({}): {} curated, {} found, {} missing, {} also outside the target",
            self.target,
            self.total,
            self.found.len(),
            self.missing.len(),
            self.mismatched.len()
        )
    }

    pub fn log(&self) {
        info!("{}", self.summary());
        for name in &self.missing {
            info!("Missing: {}", name);
        }
        for m in &self.mismatched {
            info!("Mismatched: {} -> {}", m.name, m.districts.join(", "));
        }
    }
}
