//! Deferred extraction capability. Fetch orchestration only knows the
//! [`Parser`] trait; the concrete serp parser is a stub until the offline
//! parsing stage lands.

use crate::model::RawPage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Malformed page for target {target_id}: {reason}")]
    Malformed { target_id: u32, reason: String },
}

/// One structured vacancy row lifted from a search page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub title: String,
    pub employer: String,
    pub url: String,
}

/// Capability interface for turning a saved raw page into records. Kept
/// separate from the fetch loop so both sides stay independently testable.
pub trait Parser {
    fn parse(&self, page: &RawPage) -> Result<Vec<Record>, ParseError>;
}

/// Serp parser stub.
#[derive(Debug, Default)]
pub struct SerpParser;

impl Parser for SerpParser {
    fn parse(&self, _page: &RawPage) -> Result<Vec<Record>, ParseError> {
        // TODO: select the vacancy-serp__vacancy cards and lift
        // title/employer/link once the offline parsing stage is built.
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_returns_no_records() {
        let page = RawPage {
            target_id: 1,
            body: r#"<div data-qa="vacancy-serp__vacancy">…</div>"#.to_string(),
        };
        let records = SerpParser.parse(&page).unwrap();
        assert!(records.is_empty());
    }
}
