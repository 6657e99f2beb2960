//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{PlayerPage, TestServer};
//!
//! #[tokio::test]
//! async fn test_player_loads_a_video() {
//!     let server = TestServer::spawn().await;
//!     let mut page = PlayerPage::connect(&server.ws_url()).await;
//!     page.ready().await;
//!     let video_id = page.wait_for_load().await;
//!     assert_eq!(video_id.len(), 11);
//! }
//! ```

mod constants;
mod fixtures;
mod player_page;
mod server;

// Public API - this is what tests import
pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{create_test_catalog, FakeWidget, WidgetCall};
#[allow(unused_imports)]
pub use player_page::PlayerPage;
#[allow(unused_imports)]
pub use server::TestServer;
