//! Error type shared by the driver, scraper and output layers.
//!
//! Only failures that abort work end up here. A missing journal citation on
//! an article page is an expected condition and is modelled as
//! [`Journal::Unpublished`](crate::models::Journal::Unpublished) instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("file error: {0}")]
    File(#[from] std::io::Error),

    #[error("invalid url {url:?}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid selector {0:?}")]
    Selector(String),

    #[error("no page loaded; navigate before querying elements")]
    NoPage,

    #[error("element with class {0:?} not found")]
    MissingElement(String),

    #[error("page count {text:?} is not an integer")]
    PageCount {
        text: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("config error: {0}")]
    Config(String),

    #[cfg(any(feature = "chrome", test))]
    #[error("browser error: {0}")]
    Browser(String),
}

#[cfg(feature = "chrome")]
impl From<chromiumoxide::error::CdpError> for CrawlError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        CrawlError::Browser(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CrawlError>;
