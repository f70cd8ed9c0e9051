//! Error types for the parity harness

use thiserror::Error;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while provisioning, scraping or comparing
#[derive(Error, Debug)]
pub enum Error {
    /// Browser name outside the supported set
    #[error("Unsupported browser: {0}")]
    UnsupportedBrowser(String),

    /// Browser binary could not be located or launched
    #[error("Driver provisioning failed: {0}")]
    Provisioning(String),

    /// The API reported no matching page or result
    #[error("Lookup failed: {0}")]
    Lookup(String),

    /// The title resolved to a disambiguation page
    #[error("\"{title}\" may refer to: {}", .options.join(", "))]
    Disambiguation { title: String, options: Vec<String> },

    /// HTTP request failed or the API timed out
    #[error("Network error: {0}")]
    Network(String),

    /// The browser failed to navigate
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// The response fragment never appeared, or did not parse as expected
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Reference and scraped values disagree
    #[error("{0}")]
    Mismatch(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    Cdp(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the error means "the API has no such page/location".
    pub fn is_lookup(&self) -> bool {
        matches!(self, Error::Lookup(_) | Error::Disambiguation { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_class_covers_disambiguation() {
        assert!(Error::Lookup("x".into()).is_lookup());
        let e = Error::Disambiguation {
            title: "Mercury".into(),
            options: vec!["Mercury (planet)".into(), "Mercury (element)".into()],
        };
        assert!(e.is_lookup());
        assert_eq!(
            e.to_string(),
            "\"Mercury\" may refer to: Mercury (planet), Mercury (element)"
        );
        assert!(!Error::Network("down".into()).is_lookup());
    }
}
