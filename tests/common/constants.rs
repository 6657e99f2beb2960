//! Shared constants for end-to-end tests
//!
//! When the fixture catalog changes, update only this file.

// ============================================================================
// Test Catalog
// ============================================================================

pub const ARTIST_1_NAME: &str = "The Test Band";
pub const ARTIST_1_MBID: &str = "mbid-test-band";
pub const ARTIST_2_NAME: &str = "Jazz Ensemble";
pub const ARTIST_2_MBID: &str = "mbid-jazz-ensemble";

/// Video ids, 11 characters like the real ones.
pub const SONG_1_ID: &str = "testsong001";
pub const SONG_2_ID: &str = "testsong002";
pub const SONG_3_ID: &str = "jazzsong001";

pub const SONG_1_TITLE: &str = "First Song";
pub const SONG_2_TITLE: &str = "Second Song";
pub const SONG_3_TITLE: &str = "Blue Number";

pub const ALL_SONG_IDS: [&str; 3] = [SONG_1_ID, SONG_2_ID, SONG_3_ID];

// ============================================================================
// Timing
// ============================================================================

/// Maximum time to wait for the test server to accept requests
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Interval between readiness checks
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Maximum time to wait for a player page message or a playback change
pub const EVENT_TIMEOUT_MS: u64 = 3000;

/// Fade duration used by skips in tests
pub const TEST_SKIP_FADE_MS: u64 = 200;
