//! WebDriver implementation of the site capabilities.
//!
//! Maps each capability onto a handful of WebDriver commands against the
//! selectors in [`super::selectors`]. Waits here are bounded by
//! `BrowserConfig::page_timeout`; the polling loop layers its own waits on
//! top through the capability traits.

use std::time::Duration;

use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, Locator};
use secrecy::ExposeSecret;
use tracing::{debug, warn};

use crate::domain::StationName;
use crate::session::Credentials;

use super::driver::BrowserConfig;
use super::error::SiteError;
use super::selectors as sel;
use super::{ClaimSurface, FormSelect, LoginSurface, ResultsTable, SearchForm, StationField};

/// Reservation site driven through a WebDriver session.
#[derive(Clone)]
pub struct WebDriverSite {
    client: Client,
    page_timeout: Duration,
    input_pause: Duration,
}

impl WebDriverSite {
    /// Wrap an open WebDriver session.
    pub fn new(client: Client, config: &BrowserConfig) -> Self {
        Self {
            client,
            page_timeout: config.page_timeout(),
            input_pause: config.input_pause(),
        }
    }

    /// End the WebDriver session, closing the browser.
    pub async fn close(self) -> Result<(), SiteError> {
        self.client
            .close()
            .await
            .map_err(|e| classify(e, "browser session"))
    }

    async fn pause(&self) {
        if !self.input_pause.is_zero() {
            tokio::time::sleep(self.input_pause).await;
        }
    }

    async fn find(&self, locator: Locator<'_>, what: &'static str) -> Result<Element, SiteError> {
        self.client
            .find(locator)
            .await
            .map_err(|e| classify(e, what))
    }

    async fn wait_for(&self, locator: Locator<'_>, what: &'static str) -> Result<Element, SiteError> {
        self.client
            .wait()
            .at_most(self.page_timeout)
            .for_element(locator)
            .await
            .map_err(|e| match e {
                CmdError::WaitTimeout => SiteError::Timeout {
                    what,
                    after: self.page_timeout,
                },
                other => classify(other, what),
            })
    }

    /// Navigate through the ticket menu like a visitor would.
    async fn open_search_via_menu(&self) -> Result<(), SiteError> {
        self.wait_for(Locator::Id(sel::TICKET_MENU), "ticket menu")
            .await?
            .click()
            .await
            .map_err(|e| classify(e, "ticket menu"))?;
        self.pause().await;

        self.wait_for(Locator::XPath(sel::GENERAL_TICKET_LINK), "general ticket menu")
            .await?
            .click()
            .await
            .map_err(|e| classify(e, "general ticket menu"))?;
        self.pause().await;

        Ok(())
    }

    async fn claim_anchors(&self, row: &Element) -> Result<Vec<Element>, SiteError> {
        let cell = row
            .find(Locator::Css(sel::GENERAL_SEAT_CELL))
            .await
            .map_err(|e| classify(e, "general seat cell"))?;
        cell.find_all(Locator::Css(sel::CLAIM_ANCHORS))
            .await
            .map_err(|e| classify(e, "claim affordance"))
    }
}

impl LoginSurface for WebDriverSite {
    async fn open_login(&self) -> Result<(), SiteError> {
        self.client
            .goto(sel::LOGIN_URL)
            .await
            .map_err(|e| classify(e, "login page"))?;
        self.wait_for(Locator::Id(sel::LOGIN_ID_INPUT), "login id field")
            .await?;
        Ok(())
    }

    async fn submit_credentials(&self, credentials: &Credentials) -> Result<(), SiteError> {
        let id_field = self
            .find(Locator::Id(sel::LOGIN_ID_INPUT), "login id field")
            .await?;
        id_field
            .send_keys(credentials.identity())
            .await
            .map_err(|e| classify(e, "login id field"))?;
        self.pause().await;

        let password_field = self
            .find(Locator::Id(sel::LOGIN_PASSWORD_INPUT), "login password field")
            .await?;
        password_field
            .send_keys(credentials.secret().expose_secret())
            .await
            .map_err(|e| classify(e, "login password field"))?;
        self.pause().await;

        self.find(Locator::Css(sel::LOGIN_SUBMIT), "login submit")
            .await?
            .click()
            .await
            .map_err(|e| classify(e, "login submit"))
    }

    async fn on_login_page(&self) -> Result<bool, SiteError> {
        let url = self
            .client
            .current_url()
            .await
            .map_err(|e| classify(e, "current url"))?;
        Ok(url.as_str().contains(sel::LOGIN_PATH))
    }
}

impl SearchForm for WebDriverSite {
    async fn open_search(&self) -> Result<(), SiteError> {
        if let Err(e) = self.open_search_via_menu().await {
            warn!(error = %e, "menu navigation failed, loading search page directly");
            self.client
                .goto(sel::SEARCH_URL)
                .await
                .map_err(|e| classify(e, "search page"))?;
        }
        self.wait_for(Locator::Id(sel::ORIGIN_INPUT), "origin station field")
            .await?;
        Ok(())
    }

    async fn type_station(
        &self,
        field: StationField,
        name: &StationName,
    ) -> Result<(), SiteError> {
        let (id, what) = match field {
            StationField::Origin => (sel::ORIGIN_INPUT, "origin station field"),
            StationField::Destination => (sel::DESTINATION_INPUT, "destination station field"),
        };
        let input = self.find(Locator::Id(id), what).await?;
        input.clear().await.map_err(|e| classify(e, what))?;
        input
            .send_keys(name.as_str())
            .await
            .map_err(|e| classify(e, what))?;
        self.pause().await;
        Ok(())
    }

    async fn select(&self, control: FormSelect, value: &str) -> Result<(), SiteError> {
        let (id, what) = match control {
            FormSelect::Date => (sel::DATE_SELECT, "date control"),
            FormSelect::Time => (sel::TIME_SELECT, "time control"),
            FormSelect::Passengers => (sel::ADULT_SELECT, "passenger control"),
        };
        self.find(Locator::Id(id), what)
            .await?
            .select_by_value(value)
            .await
            .map_err(|e| classify(e, what))?;
        self.pause().await;
        Ok(())
    }
}

impl ResultsTable for WebDriverSite {
    type Row = Element;

    async fn first_row(&self) -> Result<Option<Element>, SiteError> {
        Ok(self.rows().await?.into_iter().next())
    }

    async fn trigger_search(&self) -> Result<(), SiteError> {
        let button = self
            .find(Locator::Css(sel::SEARCH_BUTTON), "search button")
            .await?;
        let arg = serde_json::to_value(&button).map_err(|e| SiteError::driver(e.to_string()))?;
        // The site swallows synthetic native clicks on this button
        self.client
            .execute("arguments[0].click();", vec![arg])
            .await
            .map_err(|e| classify(e, "search button"))?;
        Ok(())
    }

    async fn is_detached(&self, row: &Element) -> Result<bool, SiteError> {
        match row.tag_name().await {
            Ok(_) => Ok(false),
            Err(e) => match classify(e, "result row") {
                SiteError::StaleElement => Ok(true),
                other => Err(other),
            },
        }
    }

    async fn rows(&self) -> Result<Vec<Element>, SiteError> {
        self.client
            .find_all(Locator::Css(sel::RESULT_ROWS))
            .await
            .map_err(|e| classify(e, "result rows"))
    }

    async fn departure_text(&self, row: &Element) -> Result<String, SiteError> {
        let cell = row
            .find(Locator::Css(sel::DEPARTURE_CELL))
            .await
            .map_err(|e| classify(e, "departure cell"))?;
        let text = cell.text().await.map_err(|e| classify(e, "departure cell"))?;
        Ok(text.trim().to_string())
    }
}

impl ClaimSurface for WebDriverSite {
    async fn claim_labels(&self, row: &Element) -> Result<Vec<String>, SiteError> {
        let mut labels = Vec::new();
        for anchor in self.claim_anchors(row).await? {
            let text = anchor
                .text()
                .await
                .map_err(|e| classify(e, "claim affordance"))?;
            labels.push(text.trim().to_string());
        }
        Ok(labels)
    }

    async fn activate_claim(&self, row: &Element, index: usize) -> Result<(), SiteError> {
        let anchor = self
            .claim_anchors(row)
            .await?
            .into_iter()
            .nth(index)
            .ok_or(SiteError::ElementNotFound {
                what: "claim affordance",
            })?;
        anchor
            .click()
            .await
            .map_err(|e| classify(e, "claim affordance"))
    }

    async fn dialog_text(&self) -> Result<Option<String>, SiteError> {
        match self.client.get_alert_text().await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.is_no_such_alert() => Ok(None),
            Err(e) => Err(classify(e, "confirmation dialog")),
        }
    }

    async fn accept_dialog(&self) -> Result<(), SiteError> {
        self.client
            .accept_alert()
            .await
            .map_err(|e| classify(e, "confirmation dialog"))
    }
}

/// Map a WebDriver command error onto the site taxonomy.
fn classify(err: CmdError, what: &'static str) -> SiteError {
    match err {
        ref e if e.is_no_such_element() => SiteError::ElementNotFound { what },
        ref e if e.is_stale_element_reference() => SiteError::StaleElement,
        CmdError::WaitTimeout => SiteError::Timeout {
            what,
            after: Duration::ZERO,
        },
        other => {
            debug!(what, error = %other, "webdriver command failed");
            SiteError::driver(format!("{what}: {other}"))
        }
    }
}
