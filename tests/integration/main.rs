//! Workspace integration tests: full stack on in-memory stores.

mod api_test;
mod helpers;
mod lifecycle_test;
