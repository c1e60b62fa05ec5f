//! Utility functions for timestamp handling.

pub mod timestamps;

pub use timestamps::{date_stamp, epoch_millis, format_date, iso_timestamp, now_utc, Timestamp};
