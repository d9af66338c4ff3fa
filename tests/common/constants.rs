//! Shared constants for end-to-end tests
#![allow(dead_code)] // Not every test binary uses every constant

pub const TEST_USER: &str = "test_user";
pub const OTHER_USER: &str = "other_user";

pub const MOVIE_1_ID: i64 = 603;
pub const MOVIE_2_ID: i64 = 604;
pub const MOVIE_3_ID: i64 = 605;
pub const TV_1_ID: i64 = 1399;
pub const BOOK_1_ID: i64 = 374572;

pub const REQUEST_TIMEOUT_SECS: u64 = 5;
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

/// Debounce window used by test servers, kept short so tests stay fast.
pub const TEST_DEBOUNCE_MS: u64 = 40;

/// Comfortably longer than [`TEST_DEBOUNCE_MS`]: sleeping this long after a
/// PATCH guarantees the deferred write has been committed.
pub const DEBOUNCE_SETTLE_MS: u64 = 250;

/// Achievement thresholds served by test servers (see the fixture catalog in
/// `server.rs`): every key levels up at 1 and again at 3.
pub const TEST_THRESHOLDS: [i64; 2] = [1, 3];
