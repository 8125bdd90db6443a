//! Sequential fetch pass over a range of role identifiers. One in-flight
//! request at a time; a mandatory randomized delay elapses between targets;
//! no single target's failure ever aborts the run.

pub mod client;
mod error;
pub mod retry;

pub use client::{PageClient, PageClientBuilder, BASE_URL};
pub use error::FetchError;
pub use retry::RetryPolicy;

use std::time::Duration;

use crate::model::{FetchSummary, FetchTarget, RawPage};
use crate::parse::Parser;
use crate::store::PageStore;
use rand::Rng;

/// Marker substring a genuine listing page contains. A 200 without it is a
/// block or interstitial page and is not saved.
pub const DEFAULT_CONTENT_MARKER: &str = r#"data-qa="vacancy-serp__vacancy""#;

/// Final state of one HTTP exchange: status plus whole body. Internal
/// retries have already run by the time the loop sees this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResponse {
    pub status: u16,
    pub body: String,
}

/// Source of pages. [`PageClient`] is the real one; tests substitute a
/// scripted fake to drive the loop without a network.
pub trait PageSource {
    fn fetch(&mut self, target: &FetchTarget) -> Result<FetchedResponse, FetchError>;
}

/// Options for one fetch run. All values come from the caller; the loop
/// itself has no compiled-in defaults.
pub struct FetchOptions<'a> {
    /// Closed role-id range, ascending.
    pub start: u32,
    pub end: u32,
    pub area: u32,
    pub per_page: u32,
    /// Inclusive delay bounds in seconds, sampled uniformly per target.
    pub delay_range: (f64, f64),
    pub marker: &'a str,
    /// Invoked per saved page when set. Failures are logged, never fatal.
    pub parser: Option<&'a dyn Parser>,
    pub progress: Option<&'a dyn Fn(u32, u32)>,
}

/// Fetch every target in the range, in order. Per target: issue the request
/// (retries internal to the source), classify the response, persist on
/// success, log and count otherwise, then sleep the sampled delay. Returns
/// the outcome counts; the caller decides what a given failure ratio means.
pub fn run_fetch(
    source: &mut dyn PageSource,
    store: &PageStore,
    options: &FetchOptions<'_>,
) -> FetchSummary {
    let mut summary = FetchSummary::default();
    if options.start > options.end {
        return summary;
    }
    let total = options.end - options.start + 1;
    let mut rng = rand::thread_rng();
    for (idx, id) in (options.start..=options.end).enumerate() {
        if let Some(progress) = options.progress {
            progress(idx as u32 + 1, total);
        }
        let target = FetchTarget {
            id,
            area: options.area,
            per_page: options.per_page,
        };
        match source.fetch(&target) {
            Ok(response) if response.status == 200 && response.body.contains(options.marker) => {
                match store.save(&target, &response.body) {
                    Ok(path) => {
                        log::info!(
                            "target {id}: saved {} ({} bytes)",
                            path.display(),
                            response.body.len()
                        );
                        summary.saved += 1;
                        if let Some(parser) = options.parser {
                            let page = RawPage {
                                target_id: id,
                                body: response.body,
                            };
                            match parser.parse(&page) {
                                Ok(records) => {
                                    log::debug!("target {id}: parsed {} records", records.len())
                                }
                                Err(e) => log::warn!("target {id}: parse failed: {e}"),
                            }
                        }
                    }
                    Err(e) => {
                        log::error!("target {id}: {e}");
                        summary.errored += 1;
                    }
                }
            }
            Ok(response) => {
                log::warn!(
                    "target {id}: rejected (status {}, body {} bytes)",
                    response.status,
                    response.body.len()
                );
                summary.rejected += 1;
            }
            Err(e) => {
                log::error!("target {id}: {e}");
                summary.errored += 1;
            }
        }
        // Human-like pacing. Applies after failures too.
        let wait = sample_delay(&mut rng, options.delay_range);
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
    }
    summary
}

/// Uniform sample from the inclusive `[min, max]` delay range.
fn sample_delay(rng: &mut impl Rng, range: (f64, f64)) -> Duration {
    let (min, max) = range;
    let min = min.max(0.0);
    let secs = if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    };
    Duration::from_secs_f64(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{ParseError, Record};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::Cell;
    use std::collections::HashMap;

    /// Scripted source: one canned result per target id. Missing ids fail
    /// the test loudly.
    enum Script {
        Response(FetchedResponse),
        NetworkError,
        Exhausted(u16),
    }

    struct FakeSource {
        responses: HashMap<u32, Script>,
        calls: Vec<u32>,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                responses: HashMap::new(),
                calls: Vec::new(),
            }
        }

        fn ok(mut self, id: u32, status: u16, body: &str) -> Self {
            self.responses.insert(
                id,
                Script::Response(FetchedResponse {
                    status,
                    body: body.to_string(),
                }),
            );
            self
        }

        fn err(mut self, id: u32) -> Self {
            self.responses.insert(id, Script::NetworkError);
            self
        }

        /// Retryable status the client could not shake within its attempt
        /// ceiling, surfaced the way [`PageClient`] surfaces it.
        fn exhausted(mut self, id: u32, status: u16) -> Self {
            self.responses.insert(id, Script::Exhausted(status));
            self
        }
    }

    impl PageSource for FakeSource {
        fn fetch(&mut self, target: &FetchTarget) -> Result<FetchedResponse, FetchError> {
            self.calls.push(target.id);
            match self.responses.get(&target.id) {
                Some(Script::Response(response)) => Ok(response.clone()),
                Some(Script::NetworkError) => Err(FetchError::Save {
                    path: "injected".into(),
                    source: std::io::Error::new(std::io::ErrorKind::TimedOut, "injected timeout"),
                }),
                Some(Script::Exhausted(status)) => Err(FetchError::RetriesExhausted {
                    status: *status,
                    url: BASE_URL.to_string(),
                }),
                None => panic!("unscripted target {}", target.id),
            }
        }
    }

    fn options(start: u32, end: u32, marker: &str) -> FetchOptions<'_> {
        FetchOptions {
            start,
            end,
            area: 1,
            per_page: 50,
            delay_range: (0.0, 0.0),
            marker,
            parser: None,
            progress: None,
        }
    }

    fn marked(extra: &str) -> String {
        format!(r#"<div data-qa="vacancy-serp__vacancy">{extra}</div>"#)
    }

    #[test]
    fn clean_run_writes_one_file_per_target() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PageStore::open(tmp.path()).unwrap();
        let mut source = FakeSource::new()
            .ok(1, 200, &marked("a"))
            .ok(2, 200, &marked("b"))
            .ok(3, 200, &marked("c"));
        let summary = run_fetch(&mut source, &store, &options(1, 3, DEFAULT_CONTENT_MARKER));
        assert_eq!(
            summary,
            FetchSummary {
                saved: 3,
                rejected: 0,
                errored: 0
            }
        );
        for (id, body) in [(1, marked("a")), (2, marked("b")), (3, marked("c"))] {
            let path = tmp.path().join(format!("page_00{id}.html"));
            assert_eq!(std::fs::read_to_string(path).unwrap(), body);
        }
    }

    #[test]
    fn non_200_is_rejected_without_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PageStore::open(tmp.path()).unwrap();
        let mut source = FakeSource::new().ok(1, 404, &marked("gone"));
        let summary = run_fetch(&mut source, &store, &options(1, 1, DEFAULT_CONTENT_MARKER));
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.saved, 0);
        assert!(!tmp.path().join("page_001.html").exists());
    }

    #[test]
    fn ok_status_without_marker_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PageStore::open(tmp.path()).unwrap();
        let mut source = FakeSource::new().ok(1, 200, "<html>Доступ ограничен</html>");
        let summary = run_fetch(&mut source, &store, &options(1, 1, DEFAULT_CONTENT_MARKER));
        assert_eq!(summary.rejected, 1);
        assert!(!tmp.path().join("page_001.html").exists());
    }

    #[test]
    fn error_on_one_target_does_not_stop_the_next() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PageStore::open(tmp.path()).unwrap();
        let mut source = FakeSource::new().err(1).ok(2, 200, &marked("x"));
        let summary = run_fetch(&mut source, &store, &options(1, 2, DEFAULT_CONTENT_MARKER));
        assert_eq!(summary.errored, 1);
        assert_eq!(summary.saved, 1);
        assert_eq!(source.calls, vec![1, 2]);
        assert!(!tmp.path().join("page_001.html").exists());
        assert!(tmp.path().join("page_002.html").exists());
    }

    #[test]
    fn mixed_scenario_only_success_leaves_a_file() {
        // Range [1,3]: marker hit, retries exhausted, block page.
        let tmp = tempfile::tempdir().unwrap();
        let store = PageStore::open(tmp.path()).unwrap();
        let body = marked("vacancy list");
        let mut source = FakeSource::new()
            .ok(1, 200, &body)
            .exhausted(2, 503)
            .ok(3, 200, "<html>challenge</html>");
        let summary = run_fetch(&mut source, &store, &options(1, 3, DEFAULT_CONTENT_MARKER));
        assert_eq!(
            summary,
            FetchSummary {
                saved: 1,
                rejected: 1,
                errored: 1
            }
        );
        let files: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(files, vec!["page_001.html".to_string()]);
        assert_eq!(std::fs::read_to_string(tmp.path().join("page_001.html")).unwrap(), body);
    }

    #[test]
    fn status_surviving_retries_is_errored_not_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PageStore::open(tmp.path()).unwrap();
        let mut source = FakeSource::new().exhausted(1, 503).ok(2, 200, &marked("x"));
        let summary = run_fetch(&mut source, &store, &options(1, 2, DEFAULT_CONTENT_MARKER));
        assert_eq!(
            summary,
            FetchSummary {
                saved: 1,
                rejected: 0,
                errored: 1
            }
        );
        assert!(!tmp.path().join("page_001.html").exists());
        assert_eq!(source.calls, vec![1, 2]);
    }

    #[test]
    fn rerun_overwrites_successful_slots_only() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PageStore::open(tmp.path()).unwrap();
        let unrelated = tmp.path().join("notes.txt");
        std::fs::write(&unrelated, "keep me").unwrap();

        let mut first = FakeSource::new().ok(1, 200, &marked("old"));
        run_fetch(&mut first, &store, &options(1, 1, DEFAULT_CONTENT_MARKER));
        let mut second = FakeSource::new().ok(1, 200, &marked("new"));
        run_fetch(&mut second, &store, &options(1, 1, DEFAULT_CONTENT_MARKER));

        assert_eq!(
            std::fs::read_to_string(tmp.path().join("page_001.html")).unwrap(),
            marked("new")
        );
        assert_eq!(std::fs::read_to_string(&unrelated).unwrap(), "keep me");
    }

    #[test]
    fn empty_range_fetches_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PageStore::open(tmp.path()).unwrap();
        let mut source = FakeSource::new();
        let summary = run_fetch(&mut source, &store, &options(5, 4, DEFAULT_CONTENT_MARKER));
        assert_eq!(summary.total(), 0);
        assert!(source.calls.is_empty());
    }

    #[test]
    fn progress_reports_position_and_total() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PageStore::open(tmp.path()).unwrap();
        let mut source = FakeSource::new().ok(3, 200, &marked("a")).ok(4, 404, "");
        let seen = Cell::new((0u32, 0u32));
        let progress = |n: u32, total: u32| seen.set((n, total));
        let opts = FetchOptions {
            progress: Some(&progress),
            ..options(3, 4, DEFAULT_CONTENT_MARKER)
        };
        run_fetch(&mut source, &store, &opts);
        assert_eq!(seen.get(), (2, 2));
    }

    #[test]
    fn parser_hook_runs_on_saved_pages() {
        struct CountingParser(Cell<u32>);
        impl Parser for CountingParser {
            fn parse(&self, page: &RawPage) -> Result<Vec<Record>, ParseError> {
                self.0.set(self.0.get() + 1);
                assert_eq!(page.target_id, 1);
                Ok(Vec::new())
            }
        }
        let tmp = tempfile::tempdir().unwrap();
        let store = PageStore::open(tmp.path()).unwrap();
        let mut source = FakeSource::new().ok(1, 200, &marked("a")).ok(2, 403, "");
        let parser = CountingParser(Cell::new(0));
        let opts = FetchOptions {
            parser: Some(&parser),
            ..options(1, 2, DEFAULT_CONTENT_MARKER)
        };
        run_fetch(&mut source, &store, &opts);
        // Only the saved page is parsed, never the rejected one.
        assert_eq!(parser.0.get(), 1);
    }

    #[test]
    fn sampled_delays_stay_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let d = sample_delay(&mut rng, (1.5, 3.5));
            assert!(d >= Duration::from_secs_f64(1.5), "{d:?} below min");
            assert!(d <= Duration::from_secs_f64(3.5), "{d:?} above max");
        }
    }

    #[test]
    fn degenerate_delay_range_returns_min() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(sample_delay(&mut rng, (2.0, 2.0)), Duration::from_secs(2));
        assert_eq!(sample_delay(&mut rng, (0.0, 0.0)), Duration::ZERO);
        // Inverted range collapses to min rather than panicking.
        assert_eq!(sample_delay(&mut rng, (3.0, 1.0)), Duration::from_secs(3));
    }
}
