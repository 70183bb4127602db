//! License domain rules: issuance, external verification and lifecycle.
//!
//! Everything here is synchronous and takes a plain `&Connection`, so handlers
//! run it through `AppState::run` and tests can call it directly.

mod issue;
mod lifecycle;
mod verify;

pub use issue::*;
pub use lifecycle::*;
pub use verify::*;
