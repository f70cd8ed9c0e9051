//! Supported browsers, their capability descriptor and the response selector table

use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Browsers the harness knows how to provision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowserKind {
    Chrome,
    Edge,
}

/// Where each browser's default raw-JSON viewer puts the response text.
///
/// Both paths depend on the browser version's viewer markup and break when
/// that markup changes.
const RESPONSE_SELECTORS: [(BrowserKind, &str); 2] = [
    (BrowserKind::Chrome, "/html/body/pre"),
    (BrowserKind::Edge, "/html/body/div[3]/div[2]/div[2]"),
];

impl BrowserKind {
    pub const ALL: [BrowserKind; 2] = [BrowserKind::Chrome, BrowserKind::Edge];

    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chrome => "chrome",
            BrowserKind::Edge => "edge",
        }
    }

    /// XPath of the element holding the raw JSON text for this browser
    pub fn response_xpath(&self) -> &'static str {
        RESPONSE_SELECTORS
            .iter()
            .find(|(kind, _)| kind == self)
            .map(|(_, xpath)| *xpath)
            .unwrap_or("/html/body/pre")
    }

    /// Environment variable consulted for an explicit executable path
    pub fn path_env_var(&self) -> &'static str {
        match self {
            BrowserKind::Chrome => "WIKICHECK_CHROME_PATH",
            BrowserKind::Edge => "WIKICHECK_EDGE_PATH",
        }
    }

    fn executable_names(&self) -> &'static [&'static str] {
        match self {
            BrowserKind::Chrome => &[
                "google-chrome",
                "google-chrome-stable",
                "chromium",
                "chromium-browser",
                "chrome",
                "chrome.exe",
            ],
            BrowserKind::Edge => &[
                "microsoft-edge",
                "microsoft-edge-stable",
                "msedge",
                "msedge.exe",
            ],
        }
    }

    fn well_known_paths(&self) -> &'static [&'static str] {
        match self {
            BrowserKind::Chrome => &[
                "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                r"C:\Program Files\Google\Chrome\Application\chrome.exe",
                r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            ],
            BrowserKind::Edge => &[
                "/opt/microsoft/msedge/msedge",
                "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
                r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
                r"C:\Program Files\Microsoft\Edge\Application\msedge.exe",
            ],
        }
    }

    /// Find the browser executable.
    ///
    /// Order: `explicit`, the kind's environment variable, well known install
    /// locations, then every `PATH` entry.
    pub fn locate_executable(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.is_file() {
                return Ok(path.to_path_buf());
            }
            return Err(Error::Provisioning(format!(
                "configured {} executable does not exist: {}",
                self,
                path.display()
            )));
        }

        if let Some(path) = std::env::var_os(self.path_env_var()).map(PathBuf::from) {
            if path.is_file() {
                return Ok(path);
            }
            log::warn!(
                "{} points at a missing file: {}",
                self.path_env_var(),
                path.display()
            );
        }

        if let Some(path) = self
            .well_known_paths()
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file())
        {
            return Ok(path);
        }

        if let Some(paths) = std::env::var_os("PATH") {
            for dir in std::env::split_paths(&paths) {
                for name in self.executable_names() {
                    let candidate = dir.join(name);
                    if candidate.is_file() {
                        return Ok(candidate);
                    }
                }
            }
        }

        Err(Error::Provisioning(format!(
            "no {} executable found; set {} or pass --browser-path",
            self,
            self.path_env_var()
        )))
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowserKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chrome" => Ok(BrowserKind::Chrome),
            "edge" => Ok(BrowserKind::Edge),
            _ => Err(Error::UnsupportedBrowser(s.to_string())),
        }
    }
}

/// What the running browser reports about itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    /// WebDriver-style browser name: `chrome` or `MicrosoftEdge`
    pub browser_name: String,
    /// Version part of the product string
    pub version: String,
    pub user_agent: String,
}

impl Capabilities {
    /// Build from a DevTools product string such as `HeadlessChrome/120.0.6099.109`
    pub fn from_product(product: &str, user_agent: &str) -> Self {
        let (name, version) = product.split_once('/').unwrap_or((product, ""));
        let browser_name = if name.contains("Edg") || user_agent.contains("Edg/") {
            "MicrosoftEdge"
        } else {
            "chrome"
        };
        Self {
            browser_name: browser_name.to_string(),
            version: version.to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    /// Browser kind implied by the reported name
    pub fn kind(&self) -> BrowserKind {
        if self.browser_name == "MicrosoftEdge" {
            BrowserKind::Edge
        } else {
            BrowserKind::Chrome
        }
    }
}
