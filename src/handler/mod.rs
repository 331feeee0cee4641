//! Request handler module
//!
//! Responsible for request routing dispatch: the plugin descriptors, the
//! `/modify` command endpoint and health probes.

pub mod manifest;
pub mod modify;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
