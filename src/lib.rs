//! wikicheck
//!
//! Parity checks between the Wikipedia API as seen through a client library
//! and the raw API response as a real browser receives it.
//!
//! # Features
//!
//! - **CDP Backend** (default): drives Chrome or Edge over the Chrome DevTools Protocol
//! - **Reference client**: a blocking Wikipedia API client used as the source of truth
//! - **Tolerant comparison**: exact match for titles/URLs, overlap threshold for lists
//!
//! # Example
//!
//! ```no_run
//! use wikicheck::{HarnessConfig, Scenario};
//! use wikicheck::reference::WikiClient;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarnessConfig::default();
//! let client = WikiClient::new(&config)?;
//!
//! let mut session = wikicheck::session::provision("chrome", &config)?;
//! let report = wikicheck::scenario::run_scenario(
//!     &mut session,
//!     &client,
//!     &Scenario::Suggest { query: "Python".into() },
//!     &config,
//! )?;
//! println!("{}", report);
//! session.close()?;
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

pub mod error;
pub use error::{Error, Result};

pub mod browser;
pub use browser::{BrowserKind, Capabilities};

#[cfg(feature = "cdp")]
pub mod cdp;

pub mod compare;
pub mod endpoints;
pub mod extract;
pub mod reference;
pub mod scenario;
pub mod session;

pub use compare::{ComparisonOutcome, OverlapPolicy};
pub use endpoints::ApiValue;
pub use scenario::{Scenario, ScenarioReport};
pub use session::Session;

/// Default Wikipedia API endpoint
pub const WIKIPEDIA_API_URL: &str = "https://en.wikipedia.org/w/api.php";

/// Configuration for a harness run
///
/// The defaults match the stock parity checks: a 10 second
/// element wait, a 30% overlap floor for list comparisons, and screenshots
/// written to the working directory.
///
/// # Examples
///
/// ```
/// let cfg = wikicheck::HarnessConfig::default();
/// assert_eq!(cfg.wait_timeout_ms, 10_000);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Base URL of the MediaWiki API (`.../w/api.php`)
    pub api_url: String,
    /// User agent sent by both the reference client and the browser
    pub user_agent: String,
    /// Browser window size
    pub viewport: Viewport,
    /// Launch the browser without a visible window
    pub headless: bool,
    /// Explicit browser executable; located automatically when `None`
    pub browser_path: Option<PathBuf>,
    /// Upper bound for waiting on the response fragment, in milliseconds
    pub wait_timeout_ms: u64,
    /// Delay between selector probes, in milliseconds
    pub poll_interval_ms: u64,
    /// Timeout applied to every reference/HTTP request, in milliseconds
    pub request_timeout_ms: u64,
    /// Minimum fraction of shared entries for list comparisons
    pub overlap_threshold: f64,
    /// Directory receiving `<test name>.png` on scrape failure
    pub screenshot_dir: PathBuf,
    /// Number of results requested from search
    pub search_results: u32,
    /// Radius for geosearch, in meters
    pub geosearch_radius_m: u32,
    /// Replace the requested title with the API's search suggestion before lookup
    pub auto_suggest: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            api_url: WIKIPEDIA_API_URL.to_string(),
            user_agent: format!(
                "wikicheck/{} (browser parity checks; rust reqwest)",
                env!("CARGO_PKG_VERSION")
            ),
            viewport: Viewport::default(),
            headless: true,
            browser_path: None,
            wait_timeout_ms: 10_000,
            poll_interval_ms: 500,
            request_timeout_ms: 30_000,
            overlap_threshold: 0.3,
            screenshot_dir: PathBuf::from("."),
            search_results: 10,
            geosearch_radius_m: 1000,
            auto_suggest: false,
        }
    }
}

impl HarnessConfig {
    /// Reject values the harness cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.overlap_threshold) {
            return Err(Error::Config(format!(
                "overlap threshold must be within [0, 1], got {}",
                self.overlap_threshold
            )));
        }
        if self.wait_timeout_ms == 0 {
            return Err(Error::Config("wait timeout must be positive".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll interval must be positive".into()));
        }
        if !(1..=500).contains(&self.search_results) {
            return Err(Error::Config(format!(
                "search results must be within 1..=500, got {}",
                self.search_results
            )));
        }
        if !(10..=10_000).contains(&self.geosearch_radius_m) {
            return Err(Error::Config(format!(
                "geosearch radius must be within 10..=10000 m, got {}",
                self.geosearch_radius_m
            )));
        }
        url::Url::parse(&self.api_url)
            .map_err(|e| Error::Config(format!("invalid api url '{}': {}", self.api_url, e)))?;
        Ok(())
    }

    /// Overlap policy derived from `overlap_threshold`
    pub fn overlap_policy(&self) -> Result<OverlapPolicy> {
        OverlapPolicy::new(self.overlap_threshold)
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Browser automation surface used by the harness
///
/// Backends only need to navigate, answer a single non-blocking XPath probe
/// and capture the viewport; waiting and parsing live in [`extract`].
pub trait Driver {
    /// Navigate the current tab to `url` and wait for the navigation to settle
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Text of the first element matching `xpath`, or `None` if nothing matches yet
    fn probe_text(&mut self, xpath: &str) -> Result<Option<String>>;

    /// Capture the current viewport as PNG bytes
    fn screenshot_png(&mut self) -> Result<Vec<u8>>;

    /// Capability descriptor reported by the running browser
    fn capabilities(&self) -> &Capabilities;

    /// Shut the browser down. Called at most once by [`Session`].
    fn quit(&mut self) -> Result<()>;
}
