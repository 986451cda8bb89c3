use super::{Decision, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    /// Entries nobody has reviewed yet
    Pending,
    Approved,
    Rejected,
}

impl StatusFilter {
    pub fn cycle(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Pending,
            StatusFilter::Pending => StatusFilter::Approved,
            StatusFilter::Approved => StatusFilter::Rejected,
            StatusFilter::Rejected => StatusFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Pending => "Pending",
            StatusFilter::Approved => "Approved",
            StatusFilter::Rejected => "Rejected",
        }
    }

    pub fn accepts(self, decision: Decision) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => decision == Decision::Unreviewed,
            StatusFilter::Approved => decision == Decision::Approved,
            StatusFilter::Rejected => decision == Decision::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    /// `None` matches any category
    pub category: Option<String>,
    pub status: StatusFilter,
    pub search: String,
}

impl FilterState {
    pub fn accepts_category(&self, record: &Record) -> bool {
        self.category
            .as_deref()
            .map_or(true, |category| record.category == category)
    }

    pub fn accepts_search(&self, record: &Record) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let query = self.search.to_lowercase();
        [&record.title, &record.body, &record.reply]
            .iter()
            .any(|field| field.to_lowercase().contains(&query))
    }

    /// Steps through any -> first category -> ... -> last category -> any.
    pub fn cycle_category(&mut self, categories: &[String]) {
        self.category = match &self.category {
            None => categories.first().cloned(),
            Some(current) => categories
                .iter()
                .position(|c| c == current)
                .and_then(|i| categories.get(i + 1))
                .cloned(),
        };
    }
}
