//! Reading history and severity classification.
//!
//! ## Submodules
//!
//! - [`band`]: Severity bands ([`SeverityBand`]) and the two-threshold [`classify`]
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "1s", "500ms")
//! - [`trace`]: Bounded per-sensor reading history ([`TraceBuffer`]) for trend lines

pub mod band;
pub mod duration;
pub mod trace;

pub use band::{classify, SeverityBand};
pub use trace::TraceBuffer;
