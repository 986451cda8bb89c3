mod filter;
mod record;

pub use filter::{FilterState, StatusFilter};
pub use record::{Decision, Record, Verdict};

#[cfg(test)]
pub(crate) use record::tests::record as test_record;
