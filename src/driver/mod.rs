//! Browser automation drivers.
//!
//! The scrapers only need four operations from a browser: load a URL, read
//! the text of the first element carrying a CSS class, read one attribute of
//! every element carrying a CSS class, and shut down. [`Driver`] captures
//! exactly that so the crawl logic can run against:
//!
//! | Driver | Module | Notes |
//! |--------|--------|-------|
//! | [`HttpDriver`] | [`http`] | `reqwest` + `scraper`; static HTML only |
//! | `ChromeDriver` | `chrome` | headless Chromium via CDP; `chrome` feature |
//!
//! A driver owns a single "current page"; queries always run against the
//! page loaded by the last successful [`Driver::navigate`].

use crate::error::Result;

#[cfg(feature = "chrome")]
pub mod chrome;
pub mod http;

#[cfg(feature = "chrome")]
pub use chrome::ChromeDriver;
pub use http::HttpDriver;

pub trait Driver {
    /// Load `url` and make it the current page.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Text of the first element with `class` on the current page, or `None`
    /// if no such element exists.
    async fn text_by_class(&mut self, class: &str) -> Result<Option<String>>;

    /// Value of `attr` on every element with `class`, in document order.
    /// Elements lacking the attribute are skipped.
    async fn attrs_by_class(&mut self, class: &str, attr: &str) -> Result<Vec<String>>;

    /// Release the underlying session.
    async fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// CSS selector matching elements that carry `class`.
pub(crate) fn class_selector(class: &str) -> String {
    format!(".{}", class.trim())
}
