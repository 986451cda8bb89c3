//! Conversion between raw sheet rows and `Record`s.

use crate::models::{Decision, Record};

use super::FIRST_DATA_ROW;

const COL_ID: usize = 0;
const COL_TITLE: usize = 1;
const COL_CATEGORY: usize = 2;
const COL_BODY: usize = 3;
const COL_REPLY: usize = 4;
const COL_URL: usize = 5;
const COL_CREATED_AT: usize = 6;
const COL_VIEWS: usize = 7;
const COL_REPLY_COUNT: usize = 8;
/// Number of columns in the data range (A..J).
pub const COLUMN_COUNT: usize = 10;
const COL_REVIEW_FLAG: usize = COLUMN_COUNT - 1;

pub fn rows_to_records(rows: &[Vec<String>]) -> Vec<Record> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| row_to_record(row, FIRST_DATA_ROW + index as u32))
        .collect()
}

pub fn row_to_record(row: &[String], sheet_row: u32) -> Record {
    let text = |col: usize| row.get(col).cloned().unwrap_or_default();

    Record {
        id: parse_int(row.get(COL_ID)),
        row: sheet_row,
        title: text(COL_TITLE),
        category: text(COL_CATEGORY),
        body: text(COL_BODY),
        reply: text(COL_REPLY),
        url: text(COL_URL),
        created_at: text(COL_CREATED_AT),
        views: parse_count(row.get(COL_VIEWS)),
        reply_count: parse_count(row.get(COL_REPLY_COUNT)),
        decision: parse_review_flag(row.get(COL_REVIEW_FLAG).map(String::as_str)),
    }
}

/// Unknown flag text is treated as unreviewed rather than rejected as input.
pub fn parse_review_flag(cell: Option<&str>) -> Decision {
    let Some(cell) = cell else {
        return Decision::Unreviewed;
    };
    let cell = cell.trim();
    if cell.eq_ignore_ascii_case("TRUE") || cell == "1" {
        Decision::Approved
    } else if cell.eq_ignore_ascii_case("FALSE") || cell == "0" {
        Decision::Rejected
    } else {
        Decision::Unreviewed
    }
}

/// Integer prefix of the cell (`"12 views"` is 12); anything else is 0.
fn parse_int(cell: Option<&String>) -> i64 {
    let Some(cell) = cell else {
        return 0;
    };
    let cell = cell.trim();
    let digits_start = usize::from(cell.starts_with(|c| c == '-' || c == '+'));
    let digits_end = cell[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(cell.len(), |i| i + digits_start);

    cell[..digits_end].parse().unwrap_or(0)
}

fn parse_count(cell: Option<&String>) -> u64 {
    u64::try_from(parse_int(cell)).unwrap_or(0)
}
