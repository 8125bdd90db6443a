//! Core data model: fetch targets, raw pages, and the run summary.

use std::path::{Path, PathBuf};

/// Width of the zero-padded target id in output file names (`page_001.html`).
const FILE_NAME_PAD: usize = 3;

/// One unit of work: a single role-identifier-driven search page request.
///
/// The id together with the fixed area and page size fully determines the
/// request's query parameters. Ids are 1-based; hh pagination is 0-based, so
/// the page index is `id - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTarget {
    pub id: u32,
    pub area: u32,
    pub per_page: u32,
}

impl FetchTarget {
    /// Query parameters for the search URL: area, the role filter itself,
    /// zero-based page index, source tag, and page size.
    pub fn query_pairs(&self) -> [(&'static str, String); 5] {
        [
            ("area", self.area.to_string()),
            ("professional_role", self.id.to_string()),
            ("page", self.id.saturating_sub(1).to_string()),
            ("hhtmFrom", "vacancy_search_list".to_string()),
            ("items_on_page", self.per_page.to_string()),
        ]
    }

    /// Deterministic output file name for this target, e.g. `page_007.html`.
    /// Re-running overwrites the same slot rather than accumulating duplicates.
    pub fn file_name(&self) -> String {
        format!("page_{:0pad$}.html", self.id, pad = FILE_NAME_PAD)
    }

    /// Output path under the given directory.
    pub fn file_path(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

/// A fetched response body together with the target id it came from.
/// The only durable artifact of a run once written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub target_id: u32,
    pub body: String,
}

/// Per-run outcome counts. One target lands in exactly one bucket.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchSummary {
    /// 200 with content marker, body written to disk.
    pub saved: usize,
    /// Non-200 status, or 200 without the content marker (block page).
    pub rejected: usize,
    /// Transport or I/O failure after retries were exhausted.
    pub errored: usize,
}

impl FetchSummary {
    pub fn total(&self) -> usize {
        self.saved + self.rejected + self.errored
    }

    /// Fraction of targets that did not produce a file. 0.0 for an empty run.
    pub fn failure_ratio(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.rejected + self.errored) as f64 / total as f64
    }
}
