//! Current-conditions summary derived from resolved Kp buckets.

pub mod builder;
pub mod classify;

pub use builder::{build_summary, no_data_summary, NO_DATA_MESSAGE, RECENT_HISTORY_LEN};
pub use classify::{classify, message, status_label, trend};
