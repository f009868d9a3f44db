//! History scanning and download selection.

pub mod scanner;
pub mod selector;

pub use scanner::{cutoff_for_period, scan_chat, CandidateMessage, ScanSummary};
pub use selector::{rank_candidates, select_for_download, Selection};
