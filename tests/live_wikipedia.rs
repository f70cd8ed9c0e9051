//! Parity checks against live Wikipedia through a real browser
//!
//! These require network access plus Chrome and/or Edge installed, so they are
//! ignored by default: `cargo test --test live_wikipedia -- --ignored`.
#![cfg(feature = "cdp")]

use wikicheck::reference::WikiClient;
use wikicheck::scenario::{run_browser, run_scenario};
use wikicheck::{BrowserKind, HarnessConfig, Scenario};

fn init_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .is_test(true)
        .try_init();
}

fn check(kind: BrowserKind, scenario: Scenario) {
    init_logger();
    let config = HarnessConfig::default();
    let client = WikiClient::new(&config).expect("Failed to create client");
    let mut session = wikicheck::session::acquire(kind, &config).expect("Failed to provision browser");
    let report = run_scenario(&mut session, &client, &scenario, &config);
    session.close().unwrap();
    let report = report.unwrap_or_else(|e| panic!("{} failed on {}: {}", scenario, kind, e));
    println!("{}", report);
}

#[test]
#[ignore] // Requires Chrome and network access
fn test_suggest_chrome() {
    check(BrowserKind::Chrome, Scenario::Suggest { query: "Python".into() });
}

#[test]
#[ignore] // Requires Edge and network access
fn test_suggest_edge() {
    check(BrowserKind::Edge, Scenario::Suggest { query: "Python".into() });
}

#[test]
#[ignore]
fn test_page_title_chrome() {
    check(
        BrowserKind::Chrome,
        Scenario::PageTitle { title: "Python (programming language)".into() },
    );
}

#[test]
#[ignore]
fn test_page_title_edge() {
    check(
        BrowserKind::Edge,
        Scenario::PageTitle { title: "Python (programming language)".into() },
    );
}

#[test]
#[ignore]
fn test_geosearch() {
    check(
        BrowserKind::Chrome,
        Scenario::Geosearch { latitude: 37.7749, longitude: -122.4194 },
    );
}

#[test]
#[ignore]
fn test_page_url_chrome() {
    check(
        BrowserKind::Chrome,
        Scenario::PageUrl { title: "Python (programming language)".into() },
    );
}

#[test]
#[ignore]
fn test_page_url_edge() {
    check(
        BrowserKind::Edge,
        Scenario::PageUrl { title: "Python (programming language)".into() },
    );
}

#[test]
#[ignore] // Selected with WIKICHECK_BROWSER (chrome or edge), like the --browser flag
fn test_all_scenarios_selected_browser() {
    init_logger();
    let browser = std::env::var("WIKICHECK_BROWSER").unwrap_or_else(|_| "chrome".into());
    let kind: BrowserKind = browser.parse().expect("unsupported browser");
    let config = HarnessConfig::default();
    let client = WikiClient::new(&config).unwrap();

    let run = run_browser(kind, &client, &Scenario::defaults(), &config).expect("Failed to provision browser");
    for (scenario, result) in &run.results {
        assert!(result.is_ok(), "{} failed: {:?}", scenario, result);
    }
}
