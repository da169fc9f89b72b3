//! Plain HTTP driver.
//!
//! Fetches pages with `reqwest` and queries them with `scraper`. Nothing is
//! rendered, so content that the site injects with JavaScript is invisible to
//! this driver; the listing pages and most article pages are served as static
//! HTML, which is enough for the crawl.

use super::{Driver, class_selector};
use crate::error::{CrawlError, Result};
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

#[derive(Debug)]
struct LoadedPage {
    url: Url,
    body: String,
}

#[derive(Debug)]
pub struct HttpDriver {
    client: reqwest::Client,
    current: Option<LoadedPage>,
}

impl HttpDriver {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            current: None,
        })
    }

    fn page(&self) -> Result<&LoadedPage> {
        self.current.as_ref().ok_or(CrawlError::NoPage)
    }

    fn selector(class: &str) -> Result<Selector> {
        let css = class_selector(class);
        Selector::parse(&css).map_err(|_| CrawlError::Selector(css.clone()))
    }
}

impl Driver for HttpDriver {
    #[instrument(level = "debug", skip(self))]
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let target = Url::parse(url).map_err(|source| CrawlError::Url {
            url: url.to_string(),
            source,
        })?;
        self.current = None;

        let response = self.client.get(target).send().await?.error_for_status()?;
        let final_url = response.url().clone();
        let body = response.text().await?;
        debug!(url = %final_url, bytes = body.len(), "Loaded page");

        self.current = Some(LoadedPage {
            url: final_url,
            body,
        });
        Ok(())
    }

    async fn text_by_class(&mut self, class: &str) -> Result<Option<String>> {
        let selector = Self::selector(class)?;
        let page = self.page()?;
        let document = Html::parse_document(&page.body);

        Ok(document.select(&selector).next().map(|element| {
            element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        }))
    }

    async fn attrs_by_class(&mut self, class: &str, attr: &str) -> Result<Vec<String>> {
        let selector = Self::selector(class)?;
        let page = self.page()?;
        let document = Html::parse_document(&page.body);

        let mut values = Vec::new();
        for element in document.select(&selector) {
            let Some(raw) = element.value().attr(attr) else {
                debug!(class, attr, "Element without attribute; skipping");
                continue;
            };
            match page.url.join(raw) {
                Ok(resolved) => values.push(resolved.to_string()),
                Err(e) => warn!(value = raw, error = %e, "Unresolvable attribute value; skipping"),
            }
        }
        Ok(values)
    }

    async fn close(self) -> Result<()> {
        Ok(())
    }
}
