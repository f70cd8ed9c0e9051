//! Scenario catalogue and sequencing
//!
//! A scenario fetches the reference value, obtains the scraped value, compares
//! them and logs the outcome. Scenarios never share state beyond the session
//! handle they are given.

use crate::compare::{self, ComparisonOutcome};
use crate::endpoints::{self, ApiValue};
use crate::extract;
use crate::reference::{JsonFetcher, ReferenceSource};
use crate::{BrowserKind, Driver, Error, HarnessConfig, Result, Session};
use log::{error, info, warn};
use serde_json::Value;
use std::fmt;
use url::Url;

/// One parity check
#[derive(Debug, Clone, PartialEq)]
pub enum Scenario {
    /// Search suggestions vs. `action=opensearch`, through the browser
    Suggest { query: String },
    /// Canonical title vs. `action=query&titles=`, through the browser
    PageTitle { title: String },
    /// Nearby places vs. `list=geosearch`, through a plain HTTP GET
    Geosearch { latitude: f64, longitude: f64 },
    /// Canonical URL vs. `prop=info&inprop=url`, through the browser
    PageUrl { title: String },
}

impl Scenario {
    /// The fixed input set every run covers
    pub fn defaults() -> Vec<Scenario> {
        vec![
            Scenario::Suggest {
                query: "Python".into(),
            },
            Scenario::PageTitle {
                title: "Python (programming language)".into(),
            },
            Scenario::Geosearch {
                latitude: 37.7749,
                longitude: -122.4194,
            },
            Scenario::PageUrl {
                title: "Python (programming language)".into(),
            },
        ]
    }

    /// Name used in logs and for the failure screenshot
    pub fn test_name(&self) -> &'static str {
        match self {
            Scenario::Suggest { .. } => "test_suggest",
            Scenario::PageTitle { .. } => "test_page_title",
            Scenario::Geosearch { .. } => "test_geosearch",
            Scenario::PageUrl { .. } => "test_page_url",
        }
    }

    /// Whether the scraped side goes through the browser
    pub fn uses_browser(&self) -> bool {
        !matches!(self, Scenario::Geosearch { .. })
    }

    /// Raw API URL the scraped side is read from
    pub fn raw_url(&self, api_url: &str) -> Result<Url> {
        match self {
            Scenario::Suggest { query } => endpoints::opensearch_url(api_url, query),
            Scenario::PageTitle { title } => endpoints::page_query_url(api_url, title),
            Scenario::Geosearch {
                latitude,
                longitude,
            } => endpoints::geosearch_url(api_url, *latitude, *longitude),
            Scenario::PageUrl { title } => endpoints::page_info_url(api_url, title),
        }
    }

    fn reference_value<R: ReferenceSource + ?Sized>(&self, reference: &R) -> Result<ApiValue> {
        Ok(match self {
            Scenario::Suggest { query } => ApiValue::Suggestions(reference.suggest(query)?),
            Scenario::PageTitle { title } => ApiValue::Title(reference.canonical_title(title)?),
            Scenario::Geosearch {
                latitude,
                longitude,
            } => ApiValue::Places(reference.geosearch(*latitude, *longitude)?),
            Scenario::PageUrl { title } => ApiValue::Url(reference.canonical_url(title)?),
        })
    }

    fn decode(&self, body: &Value) -> std::result::Result<ApiValue, String> {
        match self {
            Scenario::Suggest { .. } => endpoints::decode_opensearch(body),
            Scenario::PageTitle { .. } => endpoints::decode_page_title(body),
            Scenario::Geosearch { .. } => endpoints::decode_geosearch(body),
            Scenario::PageUrl { .. } => endpoints::decode_page_url(body),
        }
    }

    fn compare(&self, config: &HarnessConfig, reference: &ApiValue, scraped: &ApiValue) -> Result<ComparisonOutcome> {
        match (reference, scraped) {
            (ApiValue::Title(r), ApiValue::Title(s)) => compare::exact("Titles", r, s),
            (ApiValue::Url(r), ApiValue::Url(s)) => compare::exact("URLs", r, s),
            (ApiValue::Suggestions(r), ApiValue::Suggestions(s))
            | (ApiValue::Places(r), ApiValue::Places(s)) => compare::overlap(config.overlap_policy()?, r, s),
            _ => Err(Error::Other(format!(
                "{}: reference {:?} and scraped {:?} are different kinds",
                self.test_name(),
                reference,
                scraped
            ))),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::Suggest { query } => write!(f, "{}[{}]", self.test_name(), query),
            Scenario::PageTitle { title } | Scenario::PageUrl { title } => {
                write!(f, "{}[{}]", self.test_name(), title)
            }
            Scenario::Geosearch {
                latitude,
                longitude,
            } => write!(f, "{}[{}-{}]", self.test_name(), latitude, longitude),
        }
    }
}

/// A passing scenario with everything that was compared
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub browser: BrowserKind,
    pub reference: ApiValue,
    pub scraped: ApiValue,
    pub outcome: ComparisonOutcome,
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PASSED {} on {}: library {} / browser {} ({})",
            self.scenario, self.browser, self.reference, self.scraped, self.outcome
        )
    }
}

/// Run one scenario against an already provisioned session
pub fn run_scenario<D, R>(
    session: &mut Session<D>,
    reference: &R,
    scenario: &Scenario,
    config: &HarnessConfig,
) -> Result<ScenarioReport>
where
    D: Driver,
    R: ReferenceSource + JsonFetcher + ?Sized,
{
    run_scenario_with(session, reference, reference, scenario, config)
}

/// [`run_scenario`] with a separate raw-URL fetcher.
///
/// `fetcher` serves the scenarios that read the raw URL without the browser.
pub fn run_scenario_with<D, R, F>(
    session: &mut Session<D>,
    reference: &R,
    fetcher: &F,
    scenario: &Scenario,
    config: &HarnessConfig,
) -> Result<ScenarioReport>
where
    D: Driver,
    R: ReferenceSource + ?Sized,
    F: JsonFetcher + ?Sized,
{
    let name = scenario.test_name();
    let reference_value = scenario.reference_value(reference)?;
    let url = scenario.raw_url(&config.api_url)?;

    let scraped_value = if scenario.uses_browser() {
        let body = extract::scrape(session, url.as_str(), name, config)?;
        match scenario.decode(&body) {
            Ok(value) => value,
            Err(e) => {
                if let Err(shot_err) = extract::save_screenshot(session.driver(), &config.screenshot_dir, name) {
                    warn!("{}: screenshot failed: {}", name, shot_err);
                }
                return Err(Error::ElementNotFound(format!(
                    "{}: scraped fragment has unexpected shape: {}",
                    name, e
                )));
            }
        }
    } else {
        let body = fetcher.fetch_json(url.as_str())?;
        scenario
            .decode(&body)
            .map_err(|e| Error::Network(format!("{}: response has unexpected shape: {}", name, e)))?
    };

    info!("Library value: {}", reference_value);
    info!("Browser value: {}", scraped_value);

    let outcome = scenario.compare(config, &reference_value, &scraped_value)?;
    info!("{}", outcome);

    let report = ScenarioReport {
        scenario: scenario.clone(),
        browser: session.kind(),
        reference: reference_value,
        scraped: scraped_value,
        outcome,
    };
    info!("{}", report);
    Ok(report)
}

/// Results of every scenario run against one browser
#[derive(Debug)]
pub struct BrowserRun {
    pub browser: BrowserKind,
    pub results: Vec<(Scenario, Result<ScenarioReport>)>,
}

impl BrowserRun {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_err()).count()
    }

    pub fn passed(&self) -> bool {
        self.failures() == 0
    }
}

/// Run `scenarios` in order on one session; a failing scenario does not stop the rest
pub fn run_all<D, R, F>(
    session: &mut Session<D>,
    reference: &R,
    fetcher: &F,
    scenarios: &[Scenario],
    config: &HarnessConfig,
) -> BrowserRun
where
    D: Driver,
    R: ReferenceSource + ?Sized,
    F: JsonFetcher + ?Sized,
{
    let mut results = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        let result = run_scenario_with(session, reference, fetcher, scenario, config);
        if let Err(e) = &result {
            error!("FAILED {} on {}: {}", scenario, session.kind(), e);
        }
        results.push((scenario.clone(), result));
    }

    BrowserRun {
        browser: session.kind(),
        results,
    }
}

/// Outcome of one browser in a matrix run: its scenario results, or why it never started
pub type MatrixEntry = (BrowserKind, Result<BrowserRun>);

/// Acquire a session for `kind` through `acquire`, run every scenario on it and release it.
///
/// Provisioning failure aborts this browser's run; scenario failures are collected.
pub fn run_browser_with<D, R, F, A>(
    kind: BrowserKind,
    acquire: &mut A,
    reference: &R,
    fetcher: &F,
    scenarios: &[Scenario],
    config: &HarnessConfig,
) -> Result<BrowserRun>
where
    D: Driver,
    R: ReferenceSource + ?Sized,
    F: JsonFetcher + ?Sized,
    A: FnMut(BrowserKind, &HarnessConfig) -> Result<Session<D>>,
{
    let mut session = acquire(kind, config)?;
    info!(
        "{} session ready ({} {})",
        kind,
        session.capabilities().browser_name,
        session.capabilities().version
    );
    let run = run_all(&mut session, reference, fetcher, scenarios, config);
    if let Err(e) = session.close() {
        warn!("closing {} session failed: {}", kind, e);
    }
    Ok(run)
}

/// Every scenario against every browser in `kinds`, one session per browser.
///
/// A browser that fails to start is reported in its entry and the next
/// browser is still tried.
pub fn run_matrix_with<D, R, F, A>(
    kinds: &[BrowserKind],
    mut acquire: A,
    reference: &R,
    fetcher: &F,
    scenarios: &[Scenario],
    config: &HarnessConfig,
) -> Vec<MatrixEntry>
where
    D: Driver,
    R: ReferenceSource + ?Sized,
    F: JsonFetcher + ?Sized,
    A: FnMut(BrowserKind, &HarnessConfig) -> Result<Session<D>>,
{
    let mut entries = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        let run = run_browser_with(kind, &mut acquire, reference, fetcher, scenarios, config);
        if let Err(e) = &run {
            error!("{} could not be provisioned: {}", kind, e);
        }
        entries.push((kind, run));
    }
    entries
}

/// [`run_browser_with`] on a CDP-launched browser
#[cfg(feature = "cdp")]
pub fn run_browser<R>(
    kind: BrowserKind,
    reference: &R,
    scenarios: &[Scenario],
    config: &HarnessConfig,
) -> Result<BrowserRun>
where
    R: ReferenceSource + JsonFetcher + ?Sized,
{
    run_browser_with(kind, &mut crate::session::acquire, reference, reference, scenarios, config)
}

/// [`run_matrix_with`] on CDP-launched browsers
#[cfg(feature = "cdp")]
pub fn run_matrix<R>(
    kinds: &[BrowserKind],
    reference: &R,
    scenarios: &[Scenario],
    config: &HarnessConfig,
) -> Vec<MatrixEntry>
where
    R: ReferenceSource + JsonFetcher + ?Sized,
{
    run_matrix_with(kinds, crate::session::acquire, reference, reference, scenarios, config)
}
