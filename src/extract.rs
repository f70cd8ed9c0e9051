//! Scrape a raw API response out of the browser's rendering of it
//!
//! The browser is navigated straight to a JSON endpoint. What ends up in the
//! DOM is the browser's own raw-JSON viewer, so the text is located through
//! the per-browser selector table, polled for with a bounded wait and then
//! parsed strictly as JSON.

use crate::{Driver, Error, HarnessConfig, Result, Session};
use log::{debug, info, warn};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Bounded polling policy for the response fragment
#[derive(Debug, Clone, Copy)]
pub struct Wait {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Wait {
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.wait_timeout_ms),
            interval: Duration::from_millis(config.poll_interval_ms),
        }
    }
}

impl Default for Wait {
    fn default() -> Self {
        Self::from_config(&HarnessConfig::default())
    }
}

/// Probe `xpath` until it yields non-empty text or `wait.timeout` elapses.
///
/// The driver is always probed at least once, even with a zero timeout.
pub fn wait_for_text<D: Driver + ?Sized>(driver: &mut D, xpath: &str, wait: Wait) -> Result<String> {
    let started = Instant::now();
    let mut probes = 0u32;
    loop {
        probes += 1;
        if let Some(text) = driver.probe_text(xpath)? {
            if !text.trim().is_empty() {
                debug!("{} matched after {} probe(s)", xpath, probes);
                return Ok(text);
            }
        }
        let elapsed = started.elapsed();
        if elapsed >= wait.timeout {
            return Err(Error::ElementNotFound(format!(
                "{} did not appear within {}ms ({} probes)",
                xpath,
                wait.timeout.as_millis(),
                probes
            )));
        }
        std::thread::sleep(wait.interval.min(wait.timeout - elapsed));
    }
}

/// Strict JSON parse of a scraped fragment
pub fn parse_fragment(text: &str) -> Result<Value> {
    serde_json::from_str(text.trim()).map_err(|e| {
        let preview: String = text.chars().take(80).collect();
        Error::ElementNotFound(format!("fragment is not valid JSON ({}): {:?}", e, preview))
    })
}

/// File the failure screenshot for `test_name` is written to
pub fn screenshot_path(dir: &Path, test_name: &str) -> PathBuf {
    let file: String = test_name
        .chars()
        .map(|c| if c == '/' || c == '\\' || c == ':' { '_' } else { c })
        .collect();
    dir.join(format!("{}.png", file))
}

/// Capture the driver's viewport into `<dir>/<test_name>.png`
pub fn save_screenshot<D: Driver + ?Sized>(driver: &mut D, dir: &Path, test_name: &str) -> Result<PathBuf> {
    let png = driver.screenshot_png()?;
    std::fs::create_dir_all(dir)?;
    let path = screenshot_path(dir, test_name);
    std::fs::write(&path, png)?;
    Ok(path)
}

fn fetch_fragment<D: Driver>(driver: &mut D, url: &str, xpath: &str, wait: Wait) -> Result<Value> {
    driver.navigate(url)?;
    let text = wait_for_text(driver, xpath, wait)?;
    parse_fragment(&text)
}

/// Navigate to `raw_api_url` and return the rendered response as JSON.
///
/// Any failure leaves `<screenshot_dir>/<test_name>.png` behind before the
/// error is returned.
pub fn scrape<D: Driver>(
    session: &mut Session<D>,
    raw_api_url: &str,
    test_name: &str,
    config: &HarnessConfig,
) -> Result<Value> {
    let xpath = session.kind().response_xpath();
    let wait = Wait::from_config(config);
    debug!("scraping {} via {} on {}", raw_api_url, xpath, session.kind());

    let driver = session.driver();
    let result = fetch_fragment(driver, raw_api_url, xpath, wait);

    if let Err(err) = &result {
        match save_screenshot(driver, &config.screenshot_dir, test_name) {
            Ok(path) => info!("{} failed ({}); screenshot saved to {}", test_name, err, path.display()),
            Err(shot_err) => warn!("{} failed ({}); screenshot failed too: {}", test_name, err, shot_err),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BrowserKind, Capabilities};

    struct ScriptedDriver {
        caps: Capabilities,
        ready_after: u32,
        probes: u32,
        text: String,
    }

    impl ScriptedDriver {
        fn new(ready_after: u32, text: &str) -> Self {
            Self {
                caps: Capabilities::from_product("HeadlessChrome/1.0", ""),
                ready_after,
                probes: 0,
                text: text.to_string(),
            }
        }
    }

    impl Driver for ScriptedDriver {
        fn navigate(&mut self, _url: &str) -> Result<()> {
            Ok(())
        }
        fn probe_text(&mut self, _xpath: &str) -> Result<Option<String>> {
            self.probes += 1;
            Ok((self.probes >= self.ready_after).then(|| self.text.clone()))
        }
        fn screenshot_png(&mut self) -> Result<Vec<u8>> {
            Ok(b"\x89PNG\r\n\x1a\n".to_vec())
        }
        fn capabilities(&self) -> &Capabilities {
            &self.caps
        }
        fn quit(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn fast_wait(timeout_ms: u64) -> Wait {
        Wait {
            timeout: Duration::from_millis(timeout_ms),
            interval: Duration::from_millis(1),
        }
    }

    #[test]
    fn waits_until_fragment_appears() {
        let mut driver = ScriptedDriver::new(3, "[1]");
        let text = wait_for_text(&mut driver, "/html/body/pre", fast_wait(2_000)).unwrap();
        assert_eq!(text, "[1]");
        assert_eq!(driver.probes, 3);
    }

    #[test]
    fn times_out_with_element_not_found() {
        let mut driver = ScriptedDriver::new(u32::MAX, "[]");
        let err = wait_for_text(&mut driver, "/html/body/pre", fast_wait(20)).unwrap_err();
        assert!(matches!(err, Error::ElementNotFound(_)));
        assert!(driver.probes >= 1);
    }

    #[test]
    fn zero_timeout_still_probes_once() {
        let mut driver = ScriptedDriver::new(1, "{}");
        assert!(wait_for_text(&mut driver, "/x", fast_wait(0)).is_ok());
    }

    #[test]
    fn parse_failure_is_element_not_found() {
        let err = parse_fragment("['Python', ['a']]").unwrap_err();
        assert!(matches!(err, Error::ElementNotFound(_)));
        assert!(parse_fragment(" {\"a\": 1}\n").is_ok());
    }

    #[test]
    fn screenshot_name_is_flattened() {
        let p = screenshot_path(Path::new("out"), "edge/test_suggest");
        assert_eq!(p, Path::new("out").join("edge_test_suggest.png"));
    }

    #[test]
    fn scrape_uses_session_selector() {
        let mut session = Session::from_driver(BrowserKind::Chrome, ScriptedDriver::new(1, "[\"q\", []]"));
        let value = scrape(&mut session, "http://localhost/api", "t", &HarnessConfig::default()).unwrap();
        assert_eq!(value[0], "q");
    }
}
