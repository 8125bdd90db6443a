//! Blocking HTTP client for the vacancy search endpoint, with bounded retry
//! on transient failures.

use std::time::Duration;

use crate::fetcher::retry::RetryPolicy;
use crate::fetcher::{FetchError, FetchedResponse, PageSource};
use crate::model::FetchTarget;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, COOKIE, RETRY_AFTER};

/// Search endpoint all targets are fetched from.
pub const BASE_URL: &str = "https://hh.ru/search/vacancy";

/// Browser-like User-Agent; scripted UAs get served interstitials.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const ACCEPT_LANGUAGE_VALUE: &str = "ru-RU,ru;q=0.9,en;q=0.8";
const ACCEPT_VALUE: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const SESSION_COOKIE: &str = "hhuid=anonymous;";

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_READ_TIMEOUT_SECS: u64 = 20;
const MAX_REDIRECTS: usize = 10;

/// Blocking client with a reused connection pool. Retries are internal to
/// [`PageSource::fetch`]: the run loop only ever sees the final outcome.
#[derive(Debug)]
pub struct PageClient {
    inner: reqwest::blocking::Client,
    policy: RetryPolicy,
}

impl PageClient {
    /// Build a client with default headers, timeouts, and retry policy.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::builder().build()
    }

    pub fn builder() -> PageClientBuilder {
        PageClientBuilder::default()
    }

    /// Issue one GET for the target, retrying per the policy on retryable
    /// statuses and on timeout/connect errors, honoring Retry-After hints.
    /// Non-retryable statuses are returned as-is for the caller to classify;
    /// a retryable status that outlives the attempt ceiling is an error, not
    /// a response.
    fn get_with_retry(&self, target: &FetchTarget) -> Result<FetchedResponse, FetchError> {
        let pairs = target.query_pairs();
        let max_attempts = self.policy.max_attempts.max(1);
        for attempt in 0..max_attempts {
            let last = attempt + 1 == max_attempts;
            match self.inner.get(BASE_URL).query(&pairs).send() {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if self.policy.is_retryable_status(status) {
                        if last {
                            return Err(FetchError::RetriesExhausted {
                                status,
                                url: response.url().to_string(),
                            });
                        }
                        let hint = retry_after_hint(response.headers());
                        let wait = self.policy.backoff_for(attempt, hint);
                        log::debug!(
                            "target {}: transient status {status}, retrying in {:.1}s",
                            target.id,
                            wait.as_secs_f64()
                        );
                        std::thread::sleep(wait);
                        continue;
                    }
                    let url = response.url().to_string();
                    let body = response
                        .text()
                        .map_err(|source| FetchError::BodyRead { url, source })?;
                    return Ok(FetchedResponse { status, body });
                }
                Err(source) => {
                    if (source.is_timeout() || source.is_connect()) && !last {
                        let wait = self.policy.backoff_for(attempt, None);
                        log::debug!(
                            "target {}: {source}, retrying in {:.1}s",
                            target.id,
                            wait.as_secs_f64()
                        );
                        std::thread::sleep(wait);
                        continue;
                    }
                    return Err(FetchError::Network {
                        url: BASE_URL.to_string(),
                        source,
                    });
                }
            }
        }
        unreachable!("final attempt always returns")
    }
}

impl PageSource for PageClient {
    fn fetch(&mut self, target: &FetchTarget) -> Result<FetchedResponse, FetchError> {
        self.get_with_retry(target)
    }
}

/// Retry-After in either delta-seconds or HTTP-date form. A date in the past
/// yields no hint. The policy caps whatever comes back at its max backoff.
fn retry_after_hint(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let when = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    when.signed_duration_since(chrono::Utc::now()).to_std().ok()
}

/// Builder for [`PageClient`] with optional User-Agent, timeouts, and policy.
#[derive(Debug)]
pub struct PageClientBuilder {
    user_agent: Option<String>,
    connect_timeout_secs: u64,
    read_timeout_secs: u64,
    policy: RetryPolicy,
}

impl Default for PageClientBuilder {
    fn default() -> Self {
        Self {
            user_agent: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            policy: RetryPolicy::default(),
        }
    }
}

impl PageClientBuilder {
    /// Override the browser-like default User-Agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Connect-phase timeout in seconds. Default 5.
    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Read-phase timeout in seconds. Default 20.
    pub fn read_timeout_secs(mut self, secs: u64) -> Self {
        self.read_timeout_secs = secs;
        self
    }

    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Result<PageClient, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(COOKIE, HeaderValue::from_static(SESSION_COOKIE));
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let inner = reqwest::blocking::Client::builder()
            .cookie_store(true)
            .user_agent(user_agent)
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .timeout(Duration::from_secs(self.read_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(PageClient {
            inner,
            policy: self.policy,
        })
    }
}
