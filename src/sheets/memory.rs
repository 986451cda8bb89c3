//! In-memory `ReviewStore` for tests, with switchable failures.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::Verdict;

use super::mapper::COLUMN_COUNT;
use super::{ReviewStore, FIRST_DATA_ROW};

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Vec<String>>>,
    writes: Mutex<Vec<(u32, Verdict)>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn writes(&self) -> Vec<(u32, Verdict)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn cell(&self, row: u32, col: usize) -> Option<String> {
        let rows = self.rows.lock().unwrap();
        rows.get((row - FIRST_DATA_ROW) as usize)
            .and_then(|r| r.get(col).cloned())
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn read_all(&self) -> Result<Vec<Vec<String>>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Remote("read failed".into()));
        }
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn write_review_flag(&self, row: u32, verdict: Verdict) -> Result<()> {
        self.writes.lock().unwrap().push((row, verdict));
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Remote(format!("write to row {row} failed")));
        }

        let mut rows = self.rows.lock().unwrap();
        let index = row
            .checked_sub(FIRST_DATA_ROW)
            .ok_or_else(|| AppError::Remote(format!("row {row} is the header")))?
            as usize;
        if rows.len() <= index {
            rows.resize(index + 1, Vec::new());
        }
        let cells = &mut rows[index];
        if cells.len() < COLUMN_COUNT {
            cells.resize(COLUMN_COUNT, String::new());
        }
        cells[COLUMN_COUNT - 1] = verdict.as_cell().to_string();
        Ok(())
    }
}
