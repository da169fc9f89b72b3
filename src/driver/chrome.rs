//! Headless Chromium driver over the Chrome DevTools Protocol.
//!
//! Article pages fill in the "Now published in" citation with JavaScript, so
//! this driver is the one to use when [`HttpDriver`](super::HttpDriver)
//! reports everything as unpublished. Requires the `chrome` feature and a
//! Chrome/Chromium binary on the machine.

use super::{Driver, class_selector};
use crate::error::{CrawlError, Result};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub struct ChromeDriver {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl ChromeDriver {
    /// Launch a headless browser with a single blank tab.
    #[instrument(level = "info")]
    pub async fn launch(user_agent: &str) -> Result<Self> {
        let config = BrowserConfig::builder()
            .arg(format!("--user-agent={user_agent}"))
            .build()
            .map_err(CrawlError::Browser)?;
        let (browser, mut handler) = Browser::launch(config).await?;

        // The handler must be polled for any CDP command to complete.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler event error (continuing)");
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        info!("Launched headless browser");
        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    async fn current_url(&self) -> Result<Option<Url>> {
        let url = self.page.url().await?;
        Ok(url.and_then(|u| Url::parse(&u).ok()))
    }
}

impl Driver for ChromeDriver {
    #[instrument(level = "debug", skip(self))]
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.page.goto(url).await?;
        self.page.wait_for_navigation().await?;
        Ok(())
    }

    async fn text_by_class(&mut self, class: &str) -> Result<Option<String>> {
        let elements = self.page.find_elements(class_selector(class)).await?;
        match elements.first() {
            Some(element) => Ok(Some(element.inner_text().await?.unwrap_or_default())),
            None => Ok(None),
        }
    }

    async fn attrs_by_class(&mut self, class: &str, attr: &str) -> Result<Vec<String>> {
        let base = self.current_url().await?;
        let elements = self.page.find_elements(class_selector(class)).await?;

        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            let Some(raw) = element.attribute(attr).await? else {
                continue;
            };
            let resolved = match &base {
                Some(base) => base.join(&raw).map(|u| u.to_string()),
                None => Url::parse(&raw).map(|u| u.to_string()),
            };
            match resolved {
                Ok(value) => values.push(value),
                Err(e) => warn!(value = %raw, error = %e, "Unresolvable attribute value; skipping"),
            }
        }
        Ok(values)
    }

    async fn close(mut self) -> Result<()> {
        self.browser.close().await?;
        if let Err(e) = self.browser.wait().await {
            warn!(error = %e, "Browser process did not exit cleanly");
        }
        self.handler_task.abort();
        info!("Closed headless browser");
        Ok(())
    }
}
