//! CLI commands for the surebet finder.

pub mod allocate;
pub mod markets;
pub mod report;
pub mod scan;
pub mod snapshot;

pub use allocate::AllocateArgs;
pub use markets::MarketsArgs;
pub use scan::ScanArgs;
