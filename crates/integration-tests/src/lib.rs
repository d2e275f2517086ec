//! Integration test support for Sliceworks.
//!
//! The actual tests live in the `tests/` directory and run against a live
//! service instance; they are `#[ignore]`d by default. Start a server with
//! a migrated database, then run:
//!
//! ```bash
//! cargo test -p sliceworks-integration-tests -- --ignored
//! ```
