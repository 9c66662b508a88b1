//! Resolution run: manifest discovery, resolver setup, reporting.

pub mod discovery;
pub mod resolve;
pub mod signal;

pub use discovery::{group_by_top_level, TopLevelProject};
pub use resolve::{run_resolve, EcosystemChoice, Report, ResolveOptions};
pub use signal::interrupted;
