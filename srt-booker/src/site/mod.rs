//! Browser capabilities the booking components depend on.
//!
//! Each component is generic over the narrow trait it needs.
//! [`WebDriverSite`] implements all of them against a live Chrome session;
//! tests implement them with scripted fakes that need no browser.
//!
//! Key characteristics of the site:
//! - The results table is replaced in place on every search, so row
//!   handles from an earlier search point at detached elements
//! - A claim may raise a native confirmation dialog

mod driver;
mod error;
pub mod selectors;
mod webdriver;

pub use driver::{BrowserConfig, DriverError, connect};
pub use error::SiteError;
pub use webdriver::WebDriverSite;

use crate::domain::StationName;
use crate::session::Credentials;

/// Station text inputs on the search form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationField {
    Origin,
    Destination,
}

/// Dropdown controls on the search form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormSelect {
    Date,
    Time,
    Passengers,
}

/// The login page.
#[allow(async_fn_in_trait)]
pub trait LoginSurface {
    /// Navigate to the login form and wait for its fields.
    async fn open_login(&self) -> Result<(), SiteError>;

    /// Type both credentials and submit the form.
    async fn submit_credentials(&self, credentials: &Credentials) -> Result<(), SiteError>;

    /// Returns true while the browser still shows the login form.
    async fn on_login_page(&self) -> Result<bool, SiteError>;
}

/// The search form.
#[allow(async_fn_in_trait)]
pub trait SearchForm {
    /// Navigate to the search page and wait for the form.
    async fn open_search(&self) -> Result<(), SiteError>;

    /// Clear a station input and type a name into it.
    async fn type_station(&self, field: StationField, name: &StationName)
    -> Result<(), SiteError>;

    /// Choose the option with `value` in a dropdown.
    async fn select(&self, control: FormSelect, value: &str) -> Result<(), SiteError>;
}

/// The live results table.
///
/// `Row` handles point into the current document and become detached when
/// the next search replaces the table.
#[allow(async_fn_in_trait)]
pub trait ResultsTable {
    /// Handle to one live row.
    type Row: Clone;

    /// The first displayed row, if any.
    async fn first_row(&self) -> Result<Option<Self::Row>, SiteError>;

    /// Press the search button.
    async fn trigger_search(&self) -> Result<(), SiteError>;

    /// Returns true once `row` is no longer attached to the document.
    async fn is_detached(&self, row: &Self::Row) -> Result<bool, SiteError>;

    /// All currently displayed rows, top to bottom.
    async fn rows(&self) -> Result<Vec<Self::Row>, SiteError>;

    /// Raw text of a row's departure cell.
    async fn departure_text(&self, row: &Self::Row) -> Result<String, SiteError>;
}

/// Claim affordances and the confirmation dialog.
#[allow(async_fn_in_trait)]
pub trait ClaimSurface: ResultsTable {
    /// Visible labels of the row's claim affordances, in document order.
    async fn claim_labels(&self, row: &Self::Row) -> Result<Vec<String>, SiteError>;

    /// Click the affordance at `index` of [`ClaimSurface::claim_labels`].
    async fn activate_claim(&self, row: &Self::Row, index: usize) -> Result<(), SiteError>;

    /// Text of a pending native dialog, or `None` if there is none.
    async fn dialog_text(&self) -> Result<Option<String>, SiteError>;

    /// Accept the pending native dialog.
    async fn accept_dialog(&self) -> Result<(), SiteError>;
}
