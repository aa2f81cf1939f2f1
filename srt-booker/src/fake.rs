//! Scripted in-memory site for tests.
//!
//! Each search trigger consumes one [`Step`] and replaces the table with a
//! new generation of rows, so handles from earlier searches go stale just
//! like on the real site. Once the script runs out the table stays empty.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::domain::StationName;
use crate::session::Credentials;
use crate::site::selectors::RESERVE_LABEL;
use crate::site::{
    ClaimSurface, FormSelect, LoginSurface, ResultsTable, SearchForm, SiteError, StationField,
};

/// One row as the fake site renders it.
#[derive(Debug, Clone)]
pub struct RowSpec {
    pub text: String,
    pub labels: Vec<String>,
    pub dialog: Option<String>,
}

impl RowSpec {
    /// A row with no claim affordances.
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            labels: Vec::new(),
            dialog: None,
        }
    }

    /// Offer the reservation affordance.
    pub fn reservable(mut self) -> Self {
        self.labels.push(RESERVE_LABEL.to_string());
        self
    }

    /// Offer an affordance with any label.
    pub fn labelled(mut self, label: &str) -> Self {
        self.labels.push(label.to_string());
        self
    }

    /// Raise a confirmation dialog when claimed.
    pub fn with_dialog(mut self, text: &str) -> Self {
        self.dialog = Some(text.to_string());
        self
    }
}

/// What the next search does.
#[derive(Debug, Clone)]
pub enum Step {
    /// Replace the table with these rows.
    Rows(Vec<RowSpec>),
    /// Replace the table, but every read of it reports a stale element.
    StaleRows(Vec<RowSpec>),
    /// Leave the previous table in place.
    NoRefresh,
    /// The search button itself fails.
    TriggerFails,
}

/// Handle to a fake row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeRow {
    generation: u64,
    index: usize,
}

#[derive(Default)]
struct BoardState {
    generation: u64,
    rows: Vec<RowSpec>,
    stale_reads: bool,
    script: VecDeque<Step>,
    pending_dialog: Option<String>,
    triggers: usize,
    departure_reads: usize,
    activations: Vec<(String, String)>,
    accepted: Vec<String>,
    form: Vec<String>,
    broken_control: Option<FormSelect>,
    selects_left: Option<usize>,
}

/// Scripted fake site implementing every capability trait.
#[derive(Default)]
pub struct ScriptedBoard {
    state: RefCell<BoardState>,
}

impl ScriptedBoard {
    /// A board that plays `steps` in order, one per search.
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        let board = Self::default();
        board.state.borrow_mut().script = steps.into_iter().collect();
        board
    }

    /// Show `rows` before any search has happened.
    pub fn with_initial_rows(self, rows: Vec<RowSpec>) -> Self {
        {
            let mut state = self.state.borrow_mut();
            state.generation = 1;
            state.rows = rows;
        }
        self
    }

    /// Make one dropdown refuse every value.
    pub fn with_broken_control(self, control: FormSelect) -> Self {
        self.state.borrow_mut().broken_control = Some(control);
        self
    }

    /// Let `count` dropdown selections succeed, then refuse every later one.
    pub fn with_selects_failing_after(self, count: usize) -> Self {
        self.state.borrow_mut().selects_left = Some(count);
        self
    }

    /// Number of search triggers so far.
    pub fn triggers(&self) -> usize {
        self.state.borrow().triggers
    }

    /// Number of departure cell reads so far.
    pub fn departure_reads(&self) -> usize {
        self.state.borrow().departure_reads
    }

    /// (row text, label) of every activated claim affordance.
    pub fn activations(&self) -> Vec<(String, String)> {
        self.state.borrow().activations.clone()
    }

    /// Text of every accepted dialog.
    pub fn accepted(&self) -> Vec<String> {
        self.state.borrow().accepted.clone()
    }

    /// Every form interaction, as "kind:value".
    pub fn form_actions(&self) -> Vec<String> {
        self.state.borrow().form.clone()
    }

    /// The current handle of row `index`.
    pub fn handle(&self, index: usize) -> FakeRow {
        FakeRow {
            generation: self.state.borrow().generation,
            index,
        }
    }

    fn live_row(&self, row: &FakeRow) -> Result<RowSpec, SiteError> {
        let state = self.state.borrow();
        if row.generation != state.generation || state.stale_reads {
            return Err(SiteError::StaleElement);
        }
        state
            .rows
            .get(row.index)
            .cloned()
            .ok_or(SiteError::StaleElement)
    }
}

impl LoginSurface for ScriptedBoard {
    async fn open_login(&self) -> Result<(), SiteError> {
        Ok(())
    }

    async fn submit_credentials(&self, credentials: &Credentials) -> Result<(), SiteError> {
        self.state
            .borrow_mut()
            .form
            .push(format!("login:{}", credentials.identity()));
        Ok(())
    }

    async fn on_login_page(&self) -> Result<bool, SiteError> {
        Ok(false)
    }
}

impl SearchForm for ScriptedBoard {
    async fn open_search(&self) -> Result<(), SiteError> {
        self.state.borrow_mut().form.push("open".to_string());
        Ok(())
    }

    async fn type_station(
        &self,
        field: StationField,
        name: &StationName,
    ) -> Result<(), SiteError> {
        let kind = match field {
            StationField::Origin => "origin",
            StationField::Destination => "destination",
        };
        self.state.borrow_mut().form.push(format!("{kind}:{name}"));
        Ok(())
    }

    async fn select(&self, control: FormSelect, value: &str) -> Result<(), SiteError> {
        let mut state = self.state.borrow_mut();
        let exhausted = state.selects_left == Some(0);
        if exhausted || state.broken_control == Some(control) {
            return Err(SiteError::ElementNotFound {
                what: "dropdown option",
            });
        }
        if let Some(left) = state.selects_left.as_mut() {
            *left -= 1;
        }
        let kind = match control {
            FormSelect::Date => "date",
            FormSelect::Time => "time",
            FormSelect::Passengers => "passengers",
        };
        state.form.push(format!("{kind}:{value}"));
        Ok(())
    }
}

impl ResultsTable for ScriptedBoard {
    type Row = FakeRow;

    async fn first_row(&self) -> Result<Option<FakeRow>, SiteError> {
        let state = self.state.borrow();
        Ok((!state.rows.is_empty()).then(|| FakeRow {
            generation: state.generation,
            index: 0,
        }))
    }

    async fn trigger_search(&self) -> Result<(), SiteError> {
        let mut state = self.state.borrow_mut();
        state.triggers += 1;
        let step = state.script.pop_front().unwrap_or(Step::Rows(Vec::new()));
        match step {
            Step::Rows(rows) => {
                state.generation += 1;
                state.rows = rows;
                state.stale_reads = false;
            }
            Step::StaleRows(rows) => {
                state.generation += 1;
                state.rows = rows;
                state.stale_reads = true;
            }
            Step::NoRefresh => {}
            Step::TriggerFails => return Err(SiteError::driver("search button not clickable")),
        }
        Ok(())
    }

    async fn is_detached(&self, row: &FakeRow) -> Result<bool, SiteError> {
        Ok(row.generation != self.state.borrow().generation)
    }

    async fn rows(&self) -> Result<Vec<FakeRow>, SiteError> {
        let state = self.state.borrow();
        Ok((0..state.rows.len())
            .map(|index| FakeRow {
                generation: state.generation,
                index,
            })
            .collect())
    }

    async fn departure_text(&self, row: &FakeRow) -> Result<String, SiteError> {
        self.state.borrow_mut().departure_reads += 1;
        Ok(self.live_row(row)?.text)
    }
}

impl ClaimSurface for ScriptedBoard {
    async fn claim_labels(&self, row: &FakeRow) -> Result<Vec<String>, SiteError> {
        Ok(self.live_row(row)?.labels)
    }

    async fn activate_claim(&self, row: &FakeRow, index: usize) -> Result<(), SiteError> {
        let shown = self.live_row(row)?;
        let label = shown.labels.get(index).cloned().ok_or(SiteError::ElementNotFound {
            what: "claim affordance",
        })?;
        let mut state = self.state.borrow_mut();
        state.activations.push((shown.text, label));
        state.pending_dialog = shown.dialog;
        Ok(())
    }

    async fn dialog_text(&self) -> Result<Option<String>, SiteError> {
        Ok(self.state.borrow().pending_dialog.clone())
    }

    async fn accept_dialog(&self) -> Result<(), SiteError> {
        let mut state = self.state.borrow_mut();
        let text = state.pending_dialog.take().ok_or(SiteError::driver("no such alert"))?;
        state.accepted.push(text);
        Ok(())
    }
}
