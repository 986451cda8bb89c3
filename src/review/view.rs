//! Filtering, paging and summary figures over the cached record list.
//! Everything here is pure.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use crate::models::{Decision, FilterState, Record};

pub const PAGE_SIZE: usize = 10;

/// How many page numbers the pager shows at once.
const PAGE_WINDOW: usize = 5;

/// One page of the filtered list.
#[derive(Debug)]
pub struct PageView<'a> {
    pub items: Vec<&'a Record>,
    /// Records passing the filter, across all pages
    pub total_count: usize,
    pub page_count: usize,
    /// 1-based
    pub page: usize,
}

impl PageView<'_> {
    /// 0-based index of the first item on this page within the filtered list.
    pub fn first_index(&self) -> usize {
        (self.page - 1).saturating_mul(PAGE_SIZE)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count
    }
}

/// Category, status and search all have to pass.
pub fn matches(record: &Record, filter: &FilterState) -> bool {
    filter.accepts_category(record)
        && filter.status.accepts(record.decision)
        && filter.accepts_search(record)
}

pub fn filter_records<'a>(records: &'a [Record], filter: &FilterState) -> Vec<&'a Record> {
    records.iter().filter(|r| matches(r, filter)).collect()
}

/// Never less than 1, so an empty result still shows "page 1 of 1".
pub fn page_count(filtered: usize) -> usize {
    filtered.div_ceil(PAGE_SIZE).max(1)
}

/// Pages past the end come back empty; callers stop navigation at `page_count`.
pub fn view<'a>(records: &'a [Record], filter: &FilterState, page: usize) -> PageView<'a> {
    let filtered = filter_records(records, filter);
    let total_count = filtered.len();
    let page = page.max(1);

    let items = filtered
        .into_iter()
        .skip((page - 1).saturating_mul(PAGE_SIZE))
        .take(PAGE_SIZE)
        .collect();

    PageView {
        items,
        total_count,
        page_count: page_count(total_count),
        page,
    }
}

pub fn categories(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .filter(|r| !r.category.is_empty())
        .map(|r| r.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Page numbers to list around `current`, at most five of them.
pub fn page_window(current: usize, page_count: usize) -> RangeInclusive<usize> {
    let page_count = page_count.max(1);
    let current = current.clamp(1, page_count);

    if page_count <= PAGE_WINDOW || current <= 3 {
        1..=page_count.min(PAGE_WINDOW)
    } else if current + 2 >= page_count {
        page_count - (PAGE_WINDOW - 1)..=page_count
    } else {
        current - 2..=current + 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReviewStats {
    pub total: usize,
    pub reviewed: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl ReviewStats {
    pub fn from_records(records: &[Record]) -> Self {
        records.iter().fold(Self::default(), |mut stats, r| {
            stats.total += 1;
            match r.decision {
                Decision::Unreviewed => {}
                Decision::Approved => {
                    stats.reviewed += 1;
                    stats.approved += 1;
                }
                Decision::Rejected => {
                    stats.reviewed += 1;
                    stats.rejected += 1;
                }
            }
            stats
        })
    }

    /// Rounded share of reviewed entries, 0 when there are none.
    pub fn percent_reviewed(&self) -> u16 {
        if self.total == 0 {
            return 0;
        }
        ((self.reviewed as f64 / self.total as f64) * 100.0).round() as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{test_record as record, StatusFilter};

    fn records(n: u32) -> Vec<Record> {
        (0..n).map(|i| record(i + 2, Decision::Unreviewed)).collect()
    }

    #[test]
    fn page_count_has_a_floor_of_one() {
        assert_eq!(page_count(0), 1);
        assert_eq!(page_count(1), 1);
        assert_eq!(page_count(10), 1);
        assert_eq!(page_count(11), 2);
        assert_eq!(page_count(30), 3);
    }

    #[test]
    fn pages_concatenate_to_filtered_list() {
        let mut all = records(37);
        for r in all.iter_mut().step_by(3) {
            r.decision = Decision::Approved;
        }
        let filter = FilterState {
            status: StatusFilter::Pending,
            ..FilterState::default()
        };
        let expected: Vec<u32> = filter_records(&all, &filter).iter().map(|r| r.row).collect();

        let first = view(&all, &filter, 1);
        let mut seen = Vec::new();
        for page in 1..=first.page_count {
            let v = view(&all, &filter, page);
            assert!(v.items.len() <= PAGE_SIZE);
            seen.extend(v.items.iter().map(|r| r.row));
        }

        assert_eq!(expected.len(), 24);
        assert_eq!(first.page_count, 3);
        assert_eq!(seen, expected);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let all = records(12);
        let v = view(&all, &FilterState::default(), 4);

        assert!(v.items.is_empty());
        assert_eq!(v.total_count, 12);
        assert_eq!(v.page_count, 2);
        assert!(!v.has_next());
    }

    #[test]
    fn huge_page_number_is_empty() {
        let all = records(3);
        let v = view(&all, &FilterState::default(), usize::MAX);

        assert!(v.items.is_empty());
        assert_eq!(v.total_count, 3);
        assert!(v.has_prev());
        assert_eq!(v.first_index(), usize::MAX);
    }

    #[test]
    fn page_zero_is_treated_as_first() {
        let all = records(3);
        let v = view(&all, &FilterState::default(), 0);
        assert_eq!(v.page, 1);
        assert_eq!(v.items.len(), 3);
        assert!(!v.has_prev());
    }

    #[test]
    fn empty_result_is_one_empty_page() {
        let v = view(&[], &FilterState::default(), 1);
        assert_eq!(v.total_count, 0);
        assert_eq!(v.page_count, 1);
        assert!(v.items.is_empty());
    }

    #[test]
    fn all_predicates_must_pass() {
        let mut r = record(2, Decision::Approved);
        r.category = "Billing".into();
        r.title = "Refund policy".into();

        let mut filter = FilterState {
            category: Some("Billing".into()),
            status: StatusFilter::Approved,
            search: "REFUND".into(),
        };
        assert!(matches(&r, &filter));

        filter.status = StatusFilter::Rejected;
        assert!(!matches(&r, &filter));

        filter.status = StatusFilter::All;
        filter.category = Some("Shipping".into());
        assert!(!matches(&r, &filter));

        filter.category = None;
        filter.search = "shipping".into();
        assert!(!matches(&r, &filter));
    }

    #[test]
    fn search_example() {
        let mut r = record(2, Decision::Unreviewed);
        r.title = "Hello World".into();
        r.body = "foo".into();

        let mut filter = FilterState {
            search: "world".into(),
            ..FilterState::default()
        };
        assert!(matches(&r, &filter));

        filter.search = "xyz".into();
        assert!(!matches(&r, &filter));
    }

    #[test]
    fn categories_are_distinct_sorted_non_empty() {
        let all: Vec<Record> = ["B", "A", "A", ""]
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let mut r = record(i as u32 + 2, Decision::Unreviewed);
                r.category = c.to_string();
                r
            })
            .collect();

        assert_eq!(categories(&all), vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn page_window_slides_and_clamps() {
        assert_eq!(page_window(1, 3), 1..=3);
        assert_eq!(page_window(2, 10), 1..=5);
        assert_eq!(page_window(3, 10), 1..=5);
        assert_eq!(page_window(6, 10), 4..=8);
        assert_eq!(page_window(9, 10), 6..=10);
        assert_eq!(page_window(10, 10), 6..=10);
        assert_eq!(page_window(1, 0), 1..=1);
    }

    #[test]
    fn stats_count_each_decision() {
        let mut all = records(4);
        all[0].decision = Decision::Approved;
        all[1].decision = Decision::Rejected;
        all[2].decision = Decision::Approved;

        let stats = ReviewStats::from_records(&all);

        assert_eq!(
            stats,
            ReviewStats {
                total: 4,
                reviewed: 3,
                approved: 2,
                rejected: 1
            }
        );
        assert_eq!(stats.percent_reviewed(), 75);
        assert_eq!(ReviewStats::default().percent_reviewed(), 0);
    }
}
