use chrono::{DateTime, NaiveDateTime, Utc};

/// Review state of a single entry. Only this field is ever written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decision {
    #[default]
    Unreviewed,
    Approved,
    Rejected,
}

impl Decision {
    pub fn is_reviewed(self) -> bool {
        self != Decision::Unreviewed
    }

    /// Sheet text for this decision. Unreviewed has no written form.
    pub fn as_cell(self) -> Option<&'static str> {
        match self {
            Decision::Unreviewed => None,
            Decision::Approved => Some(Verdict::Approve.as_cell()),
            Decision::Rejected => Some(Verdict::Reject.as_cell()),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Decision::Unreviewed => "Pending",
            Decision::Approved => "Approved",
            Decision::Rejected => "Rejected",
        }
    }
}

/// A reviewer action. Unreviewed cannot be issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Approve,
    Reject,
}

impl Verdict {
    pub fn decision(self) -> Decision {
        match self {
            Verdict::Approve => Decision::Approved,
            Verdict::Reject => Decision::Rejected,
        }
    }

    pub fn as_cell(self) -> &'static str {
        match self {
            Verdict::Approve => "TRUE",
            Verdict::Reject => "FALSE",
        }
    }
}

impl From<Verdict> for Decision {
    fn from(verdict: Verdict) -> Self {
        verdict.decision()
    }
}

/// One knowledge-base entry, as loaded from a sheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: i64,
    /// 1-based sheet row; the only key used for writes
    pub row: u32,
    pub title: String,
    pub category: String,
    pub body: String,
    pub reply: String,
    pub url: String,
    pub created_at: String,
    pub views: u64,
    pub reply_count: u64,
    pub decision: Decision,
}

impl Record {
    /// Creation date for display, falling back to the raw cell text.
    pub fn created_date(&self) -> String {
        parse_datetime(&self.created_at)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| self.created_at.clone())
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    // RFC3339 (e.g., "2024-03-01T09:30:00Z")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Sheet export format (e.g., "2024-03-01 09:30:00")
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}
