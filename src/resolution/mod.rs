pub mod bucket;
pub mod selector;
pub mod validation;

pub use bucket::{bucket_start, bucketize, round2};
pub use selector::{fetch_bounded, AttemptOutcome, FallbackSelector, Resolution, SourceAttempt};
pub use validation::{validate, Rejection, ValidationPolicy};
