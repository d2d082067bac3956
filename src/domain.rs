//! Domain module - release history entities and run bookkeeping
//!
//! Pure data types shared by the harvesting pipeline. Nothing in here
//! touches the network or the filesystem.

pub mod dataset;
pub mod ledger;
pub mod release;
pub mod run;

pub use dataset::ReleaseDataset;
pub use ledger::ScrapedUrlLedger;
pub use release::{ChangelogFragment, ChangelogRecord, Product, ReleaseRow};
pub use run::{RunPhase, RunSummary};
