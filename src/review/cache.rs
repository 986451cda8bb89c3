use std::collections::HashMap;

use crate::error::ReviewError;
use crate::models::{Decision, Record};

use super::view;

/// Identifies one optimistic write so a late result cannot settle a newer one.
pub type Ticket = u64;

struct PendingWrite {
    ticket: Ticket,
    /// Full record list as it was before this write's patch
    snapshot: Vec<Record>,
}

struct Patch {
    ticket: Ticket,
    row: u32,
    decision: Decision,
}

/// The last fetched record list plus the optimistic writes applied to it.
///
/// Every write takes a snapshot of the whole list before patching its row.
/// Rolling back restores that snapshot and then replays the patches of
/// writes issued after it, so overlapping writes on different rows survive
/// each other's failures. A row with a write in flight refuses new writes.
#[derive(Default)]
pub struct RecordCache {
    records: Vec<Record>,
    categories: Vec<String>,
    pending: HashMap<u32, PendingWrite>,
    journal: Vec<Patch>,
    next_ticket: Ticket,
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut cache = Self::new();
        cache.replace(records);
        cache
    }

    /// Swap in a freshly fetched list. Outstanding snapshots are dropped.
    pub fn replace(&mut self, records: Vec<Record>) {
        if !self.pending.is_empty() {
            tracing::warn!(
                pending = self.pending.len(),
                "Replacing records with writes in flight"
            );
        }
        self.categories = view::categories(&records);
        self.records = records;
        self.pending.clear();
        self.journal.clear();
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Distinct non-empty categories, sorted; refreshed on every `replace`.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn get(&self, row: u32) -> Option<&Record> {
        self.records.iter().find(|r| r.row == row)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_pending(&self, row: u32) -> bool {
        self.pending.contains_key(&row)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Snapshot the list and patch `row` to `decision` ahead of the remote write.
    pub fn begin(&mut self, row: u32, decision: Decision) -> Result<Ticket, ReviewError> {
        if self.pending.contains_key(&row) {
            return Err(ReviewError::AlreadyPending(row));
        }
        if self.get(row).is_none() {
            return Err(ReviewError::UnknownRow(row));
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let snapshot = self.records.clone();
        apply(&mut self.records, row, decision);
        self.journal.push(Patch {
            ticket,
            row,
            decision,
        });
        self.pending.insert(row, PendingWrite { ticket, snapshot });

        Ok(ticket)
    }

    /// The write landed; the patched state stays. Returns false for a stale ticket.
    pub fn commit(&mut self, row: u32, ticket: Ticket) -> bool {
        if self.take_pending(row, ticket).is_none() {
            return false;
        }
        self.prune_journal();
        true
    }

    /// The write failed; put the list back as it was before `begin`.
    /// Returns false for a stale ticket.
    pub fn rollback(&mut self, row: u32, ticket: Ticket) -> bool {
        let Some(write) = self.take_pending(row, ticket) else {
            return false;
        };

        let original = write
            .snapshot
            .iter()
            .find(|r| r.row == row)
            .map(|r| r.decision)
            .unwrap_or_default();

        self.records = write.snapshot;
        self.journal.retain(|p| p.ticket != ticket);
        for patch in self.journal.iter().filter(|p| p.ticket > ticket) {
            apply(&mut self.records, patch.row, patch.decision);
        }
        // Later snapshots still carry this write's patch
        for other in self.pending.values_mut().filter(|w| w.ticket > ticket) {
            apply(&mut other.snapshot, row, original);
        }

        self.prune_journal();
        true
    }

    fn take_pending(&mut self, row: u32, ticket: Ticket) -> Option<PendingWrite> {
        match self.pending.remove(&row) {
            Some(write) if write.ticket == ticket => Some(write),
            Some(write) => {
                self.pending.insert(row, write);
                None
            }
            None => None,
        }
    }

    // Patches older than every outstanding snapshot are already inside them.
    fn prune_journal(&mut self) {
        match self.pending.values().map(|w| w.ticket).min() {
            Some(oldest) => self.journal.retain(|p| p.ticket > oldest),
            None => self.journal.clear(),
        }
    }
}

fn apply(records: &mut [Record], row: u32, decision: Decision) {
    if let Some(record) = records.iter_mut().find(|r| r.row == row) {
        record.decision = decision;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_record as record;

    fn cache(rows: &[u32]) -> RecordCache {
        RecordCache::from_records(rows.iter().map(|&r| record(r, Decision::Unreviewed)).collect())
    }

    fn decision(cache: &RecordCache, row: u32) -> Decision {
        cache.get(row).unwrap().decision
    }

    #[test]
    fn begin_patches_immediately_and_marks_pending() {
        let mut c = cache(&[5]);

        c.begin(5, Decision::Approved).unwrap();

        assert_eq!(decision(&c, 5), Decision::Approved);
        assert!(c.is_pending(5));
    }

    #[test]
    fn rollback_restores_previous_decision() {
        let mut c = cache(&[5]);
        let t = c.begin(5, Decision::Approved).unwrap();

        assert!(c.rollback(5, t));

        assert_eq!(decision(&c, 5), Decision::Unreviewed);
        assert!(!c.is_pending(5));
    }

    #[test]
    fn commit_keeps_patched_decision() {
        let mut c = cache(&[5]);
        let t = c.begin(5, Decision::Rejected).unwrap();

        assert!(c.commit(5, t));

        assert_eq!(decision(&c, 5), Decision::Rejected);
        assert!(!c.has_pending());
    }

    #[test]
    fn second_write_on_pending_row_is_refused() {
        let mut c = cache(&[5]);
        c.begin(5, Decision::Approved).unwrap();

        assert_eq!(
            c.begin(5, Decision::Rejected),
            Err(ReviewError::AlreadyPending(5))
        );
        assert_eq!(decision(&c, 5), Decision::Approved);
    }

    #[test]
    fn unknown_row_is_refused() {
        let mut c = cache(&[2, 3]);
        assert_eq!(c.begin(9, Decision::Approved), Err(ReviewError::UnknownRow(9)));
        assert!(!c.has_pending());
    }

    #[test]
    fn same_decision_twice_is_idempotent() {
        let mut c = cache(&[5]);
        let t = c.begin(5, Decision::Approved).unwrap();
        c.commit(5, t);
        let after_first: Vec<Record> = c.records().to_vec();

        let t = c.begin(5, Decision::Approved).unwrap();
        c.commit(5, t);

        assert_eq!(c.records(), after_first.as_slice());
        assert!(!c.is_pending(5));
    }

    #[test]
    fn stale_ticket_does_not_settle() {
        let mut c = cache(&[5]);
        let t = c.begin(5, Decision::Approved).unwrap();

        assert!(!c.rollback(5, t + 1));
        assert!(!c.commit(6, t));
        assert!(c.is_pending(5));
    }

    #[test]
    fn failed_write_keeps_later_write_on_other_row() {
        let mut c = cache(&[2, 3]);
        let a = c.begin(2, Decision::Approved).unwrap();
        let b = c.begin(3, Decision::Rejected).unwrap();

        c.rollback(2, a);

        assert_eq!(decision(&c, 2), Decision::Unreviewed);
        assert_eq!(decision(&c, 3), Decision::Rejected);
        assert!(c.is_pending(3));

        // The later write's own rollback must not resurrect the first patch
        c.rollback(3, b);
        assert_eq!(decision(&c, 2), Decision::Unreviewed);
        assert_eq!(decision(&c, 3), Decision::Unreviewed);
    }

    #[test]
    fn failed_write_keeps_committed_write_issued_after_it() {
        let mut c = cache(&[2, 3]);
        let a = c.begin(2, Decision::Approved).unwrap();
        let b = c.begin(3, Decision::Approved).unwrap();
        c.commit(3, b);

        c.rollback(2, a);

        assert_eq!(decision(&c, 2), Decision::Unreviewed);
        assert_eq!(decision(&c, 3), Decision::Approved);
    }

    #[test]
    fn rollback_after_rewrite_of_committed_row() {
        let mut c = cache(&[2, 3]);
        let a = c.begin(2, Decision::Approved).unwrap();
        let b = c.begin(3, Decision::Approved).unwrap();
        c.commit(2, a);
        let d = c.begin(2, Decision::Rejected).unwrap();

        c.rollback(3, b);
        assert_eq!(decision(&c, 2), Decision::Rejected);
        assert_eq!(decision(&c, 3), Decision::Unreviewed);

        c.rollback(2, d);
        assert_eq!(decision(&c, 2), Decision::Approved);
        assert_eq!(decision(&c, 3), Decision::Unreviewed);
    }

    #[test]
    fn replace_recomputes_categories_and_clears_pending() {
        let mut c = cache(&[2]);
        c.begin(2, Decision::Approved).unwrap();

        let mut fresh = vec![record(2, Decision::Rejected), record(3, Decision::Unreviewed)];
        fresh[0].category = "B".into();
        fresh[1].category = "A".into();
        c.replace(fresh);

        assert!(!c.has_pending());
        assert_eq!(c.categories(), ["A".to_string(), "B".to_string()]);
        assert_eq!(decision(&c, 2), Decision::Rejected);
    }
}
