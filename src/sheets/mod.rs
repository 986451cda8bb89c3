//! Access to the backing spreadsheet.
//!
//! `ReviewStore` is the seam between the review logic and the remote sheet:
//! the orchestrator and the app only ever talk to the trait, `SheetsClient`
//! implements it over the Google Sheets REST API.

mod client;
pub mod mapper;
#[cfg(test)]
pub mod memory;

pub use client::{SheetTarget, SheetsClient};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Verdict;

/// First column of the data range (entry id).
pub const FIRST_COLUMN: char = 'A';
/// Column holding the review flag; the only column ever written.
pub const REVIEW_COLUMN: char = 'J';
/// Data starts below the one-row header.
pub const FIRST_DATA_ROW: u32 = 2;

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Every data row below the header, columns A through J.
    async fn read_all(&self) -> Result<Vec<Vec<String>>>;

    /// Overwrite the review flag cell of a single row.
    async fn write_review_flag(&self, row: u32, verdict: Verdict) -> Result<()>;
}
