use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::auth::Session;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{FilterState, Record, Verdict};
use crate::review::view::{self, page_count};
use crate::review::{PageView, RecordCache, ReviewOrchestrator, ReviewOutcome, ReviewStats};
use crate::sheets::{mapper, ReviewStore, SheetTarget, SheetsClient};
use crate::tui::{AppAction, InputMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    SignIn,
    Ready,
    /// Configuration problem the reviewer has to fix outside the app
    Fatal(String),
}

pub struct App {
    // Data
    pub cache: RecordCache,

    // UI State
    pub screen: Screen,
    pub filter: FilterState,
    /// 1-based page of the filtered list
    pub page: usize,
    /// Highlighted item within the current page
    pub cursor: usize,
    /// Row open in the detail view
    pub selected: Option<u32>,
    pub show_help: bool,
    pub search_input_active: bool,
    pub status_message: Option<String>,

    // Async state
    pub is_loading: bool,
    fetch_rx: mpsc::Receiver<Result<Vec<Vec<String>>>>,
    fetch_tx: mpsc::Sender<Result<Vec<Vec<String>>>>,
    review_rx: mpsc::Receiver<ReviewOutcome>,
    review_tx: mpsc::Sender<ReviewOutcome>,
    auth_rx: watch::Receiver<bool>,

    // Services
    session: Session,
    orchestrator: ReviewOrchestrator,
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let session = Session::from_config(config)?;
        let target = SheetTarget::from_config(config)?;
        let client = SheetsClient::new(target, session.clone(), config.request_timeout())?;

        Ok(Self::with_store(
            session,
            Arc::new(client),
            config.write_timeout(),
        ))
    }

    pub fn with_store(
        session: Session,
        store: Arc<dyn ReviewStore>,
        write_timeout: Duration,
    ) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::channel(1);
        let (review_tx, review_rx) = mpsc::channel(32);
        let auth_rx = session.subscribe();

        let screen = if session.is_signed_in() {
            Screen::Ready
        } else {
            Screen::SignIn
        };

        Self {
            cache: RecordCache::new(),
            screen,
            filter: FilterState::default(),
            page: 1,
            cursor: 0,
            selected: None,
            show_help: false,
            search_input_active: false,
            status_message: None,
            is_loading: false,
            fetch_rx,
            fetch_tx,
            review_rx,
            review_tx,
            auth_rx,
            session,
            orchestrator: ReviewOrchestrator::new(store, write_timeout),
        }
    }

    pub fn input_mode(&self) -> InputMode {
        if let Screen::Fatal(_) = self.screen {
            return InputMode::Fatal;
        }
        if self.screen == Screen::SignIn {
            return InputMode::SignIn;
        }
        if self.show_help {
            return InputMode::Help;
        }
        if self.search_input_active {
            return InputMode::Search;
        }
        match self.selected {
            Some(row) => InputMode::Detail(row),
            None => InputMode::List,
        }
    }

    pub fn current_view(&self) -> PageView<'_> {
        view::view(self.cache.records(), &self.filter, self.page)
    }

    pub fn cursor_record(&self) -> Option<&Record> {
        self.current_view().items.get(self.cursor).copied()
    }

    pub fn selected_record(&self) -> Option<&Record> {
        self.selected.and_then(|row| self.cache.get(row))
    }

    pub fn stats(&self) -> ReviewStats {
        ReviewStats::from_records(self.cache.records())
    }

    pub async fn handle_action(&mut self, action: AppAction) -> Result<bool> {
        match action {
            AppAction::Quit => return Ok(true),

            AppAction::MoveUp => {
                self.cursor = self.cursor.saturating_sub(1);
            }

            AppAction::MoveDown => {
                let len = self.current_view().items.len();
                if len > 0 && self.cursor < len - 1 {
                    self.cursor += 1;
                }
            }

            AppAction::NextPage => {
                if self.current_view().has_next() {
                    self.page += 1;
                    self.cursor = 0;
                }
            }

            AppAction::PrevPage => {
                if self.page > 1 {
                    self.page -= 1;
                    self.cursor = 0;
                }
            }

            AppAction::FirstPage => {
                self.page = 1;
                self.cursor = 0;
            }

            AppAction::LastPage => {
                self.page = self.current_view().page_count;
                self.cursor = 0;
            }

            AppAction::Select => {
                self.selected = self.cursor_record().map(|r| r.row);
            }

            AppAction::Deselect => {
                self.selected = None;
            }

            AppAction::Approve(row) => self.start_review(row, Verdict::Approve),

            AppAction::Reject(row) => self.start_review(row, Verdict::Reject),

            AppAction::ApproveHighlighted => self.review_highlighted(Verdict::Approve),

            AppAction::RejectHighlighted => self.review_highlighted(Verdict::Reject),

            AppAction::OpenInBrowser => {
                if let Some(record) = self.selected_record() {
                    if let Err(e) = open::that(&record.url) {
                        tracing::warn!("Failed to open {}: {}", record.url, e);
                    }
                }
            }

            AppAction::CycleStatusFilter => {
                self.filter.status = self.filter.status.cycle();
                self.on_filter_changed();
            }

            AppAction::CycleCategoryFilter => {
                let categories = self.cache.categories().to_vec();
                self.filter.cycle_category(&categories);
                self.on_filter_changed();
            }

            AppAction::Refresh => self.refresh(),

            AppAction::SignIn => {
                if let Err(e) = self.session.sign_in().await {
                    self.status_message = Some(e.to_string());
                }
                self.poll_auth_change();
            }

            AppAction::SignOut => {
                self.session.sign_out();
                self.poll_auth_change();
            }

            AppAction::ShowHelp => {
                self.show_help = true;
            }

            AppAction::HideHelp => {
                self.show_help = false;
            }

            AppAction::SearchStart => {
                self.search_input_active = true;
            }

            AppAction::SearchChar(c) => {
                self.filter.search.push(c);
                self.on_filter_changed();
            }

            AppAction::SearchBackspace => {
                if self.filter.search.pop().is_some() {
                    self.on_filter_changed();
                }
            }

            AppAction::SearchConfirm => {
                self.search_input_active = false;
            }

            AppAction::SearchCancel => {
                self.search_input_active = false;
                if !self.filter.search.is_empty() {
                    self.filter.search.clear();
                    self.on_filter_changed();
                }
            }
        }

        Ok(false)
    }

    fn on_filter_changed(&mut self) {
        self.page = 1;
        self.cursor = 0;
    }

    /// Keeps page and cursor inside the list after it shrank.
    fn clamp_position(&mut self) {
        let filtered = view::filter_records(self.cache.records(), &self.filter).len();
        self.page = self.page.clamp(1, page_count(filtered));
        let len = self.current_view().items.len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    fn review_highlighted(&mut self, verdict: Verdict) {
        if let Some(row) = self.cursor_record().map(|r| r.row) {
            self.start_review(row, verdict);
        }
    }

    fn start_review(&mut self, row: u32, verdict: Verdict) {
        let pending = match self.orchestrator.begin(&mut self.cache, row, verdict) {
            Ok(pending) => pending,
            Err(e) => {
                self.status_message = Some(e.to_string());
                return;
            }
        };
        // The patch may have moved the record out of the current page
        self.clamp_position();

        let write = self.orchestrator.dispatch(pending);
        let tx = self.review_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(write.await).await;
        });
    }

    /// Poll for completed review writes (non-blocking)
    pub fn poll_review_results(&mut self) {
        while let Ok(outcome) = self.review_rx.try_recv() {
            self.apply_review_outcome(outcome);
        }
    }

    fn apply_review_outcome(&mut self, outcome: ReviewOutcome) {
        let row = outcome.review.row;
        let verdict = outcome.review.verdict;

        match self.orchestrator.settle(&mut self.cache, outcome) {
            Ok(()) => {
                let label = verdict.decision().label().to_lowercase();
                self.status_message = Some(format!("Row {row} marked {label}"));
            }
            Err(e) => {
                self.status_message = Some(format!("Row {row} not saved, reverted: {e}"));
                if e.is_auth() {
                    self.session.sign_out();
                }
            }
        }
        self.clamp_position();
    }

    fn refresh(&mut self) {
        if self.is_loading {
            return;
        }
        if self.cache.has_pending() {
            self.status_message = Some("Waiting for saves to finish before refreshing".into());
            return;
        }

        self.is_loading = true;
        let store = self.orchestrator.store();
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(store.read_all().await).await;
        });
    }

    /// Poll for a completed fetch (non-blocking)
    pub fn poll_fetch_result(&mut self) {
        if let Ok(result) = self.fetch_rx.try_recv() {
            self.is_loading = false;
            self.apply_fetch_result(result);
        }
    }

    fn apply_fetch_result(&mut self, result: Result<Vec<Vec<String>>>) {
        match result {
            Ok(rows) => {
                self.cache.replace(mapper::rows_to_records(&rows));
                if self.selected.is_some_and(|row| self.cache.get(row).is_none()) {
                    self.selected = None;
                }
                self.clamp_position();
                self.status_message = Some(format!("Loaded {} entries", rows.len()));
            }
            Err(AppError::Config(msg)) => {
                tracing::error!("Configuration error: {}", msg);
                self.screen = Screen::Fatal(msg);
            }
            Err(e) => {
                tracing::error!("Failed to load sheet: {}", e);
                self.status_message = Some(format!("Load failed: {e} (u to retry)"));
                if e.is_auth() {
                    self.session.sign_out();
                }
            }
        }
    }

    /// Follow sign-in/sign-out notifications from the session.
    pub fn poll_auth_change(&mut self) {
        if !self.auth_rx.has_changed().unwrap_or(false) {
            return;
        }
        let signed_in = *self.auth_rx.borrow_and_update();

        if let Screen::Fatal(_) = self.screen {
            return;
        }

        if signed_in {
            self.screen = Screen::Ready;
            if self.cache.is_empty() {
                self.refresh();
            }
        } else {
            self.screen = Screen::SignIn;
            self.selected = None;
            self.search_input_active = false;
        }
    }

    // Headless operations, awaited in place

    pub async fn sign_in(&mut self) -> Result<()> {
        self.session.sign_in().await?;
        self.screen = Screen::Ready;
        // Consumed here so the event loop does not trigger a second fetch
        self.auth_rx.mark_unchanged();
        Ok(())
    }

    pub async fn refresh_blocking(&mut self) -> Result<()> {
        let rows = self.orchestrator.store().read_all().await?;
        self.cache.replace(mapper::rows_to_records(&rows));
        self.clamp_position();
        Ok(())
    }

    pub async fn review_blocking(&mut self, row: u32, verdict: Verdict) -> Result<()> {
        self.orchestrator.review(&mut self.cache, row, verdict).await
    }
}
