//! Safety and cleanup
//!
//! Per-run scratch directories and the guarded removal that tears them down.

pub mod safe_cleanup;
pub mod workspace;
