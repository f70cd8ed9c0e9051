//! Driver provisioning with guaranteed release
//!
//! A [`Session`] owns exactly one driver for the duration of a run. It is
//! handed to each scenario by `&mut` and releases the browser exactly once,
//! either through [`Session::close`] or, on early exits and panics, on drop.

use crate::{BrowserKind, Capabilities, Driver, Result};
use log::{debug, info, warn};

/// One live browser handle plus the kind it was provisioned as
pub struct Session<D: Driver> {
    kind: BrowserKind,
    driver: D,
    released: bool,
}

impl<D: Driver> Session<D> {
    /// Wrap an already running driver
    pub fn from_driver(kind: BrowserKind, driver: D) -> Self {
        debug!(
            "session acquired: {} ({} {})",
            kind,
            driver.capabilities().browser_name,
            driver.capabilities().version
        );
        Self {
            kind,
            driver,
            released: false,
        }
    }

    pub fn kind(&self) -> BrowserKind {
        self.kind
    }

    pub fn capabilities(&self) -> &Capabilities {
        self.driver.capabilities()
    }

    pub fn driver(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Release the browser and report the quit result
    pub fn close(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        info!("releasing {} session", self.kind);
        self.driver.quit()
    }
}

impl<D: Driver> Drop for Session<D> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("failed to release {} session: {}", self.kind, e);
        }
    }
}

/// Launch the named browser over CDP.
///
/// The name is validated before anything is launched, so an unsupported
/// browser fails without touching the network.
#[cfg(feature = "cdp")]
pub fn provision(browser: &str, config: &crate::HarnessConfig) -> Result<Session<crate::cdp::CdpDriver>> {
    let kind: BrowserKind = browser.parse()?;
    acquire(kind, config)
}

/// Launch `kind` over CDP and wrap it in a session
#[cfg(feature = "cdp")]
pub fn acquire(kind: BrowserKind, config: &crate::HarnessConfig) -> Result<Session<crate::cdp::CdpDriver>> {
    config.validate()?;
    let driver = crate::cdp::CdpDriver::launch(kind, config)?;
    Ok(Session::from_driver(kind, driver))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingDriver {
        caps: Capabilities,
        quits: Rc<Cell<u32>>,
    }

    impl Driver for CountingDriver {
        fn navigate(&mut self, _url: &str) -> Result<()> {
            Ok(())
        }
        fn probe_text(&mut self, _xpath: &str) -> Result<Option<String>> {
            Ok(None)
        }
        fn screenshot_png(&mut self) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
        fn capabilities(&self) -> &Capabilities {
            &self.caps
        }
        fn quit(&mut self) -> Result<()> {
            self.quits.set(self.quits.get() + 1);
            Ok(())
        }
    }

    fn counting() -> (CountingDriver, Rc<Cell<u32>>) {
        let quits = Rc::new(Cell::new(0));
        let driver = CountingDriver {
            caps: Capabilities::from_product("HeadlessChrome/1.0", ""),
            quits: quits.clone(),
        };
        (driver, quits)
    }

    #[test]
    fn close_releases_once() {
        let (driver, quits) = counting();
        let session = Session::from_driver(BrowserKind::Chrome, driver);
        session.close().unwrap();
        assert_eq!(quits.get(), 1);
    }

    #[test]
    fn drop_releases_once() {
        let (driver, quits) = counting();
        {
            let _session = Session::from_driver(BrowserKind::Chrome, driver);
        }
        assert_eq!(quits.get(), 1);
    }

    #[test]
    fn panic_still_releases() {
        let (driver, quits) = counting();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _session = Session::from_driver(BrowserKind::Edge, driver);
            panic!("scenario blew up");
        }));
        assert!(result.is_err());
        assert_eq!(quits.get(), 1);
    }
}
