//! Reading archived proposal documents and writing reconciled tables.
//!
//! # Example
//!
//! ```no_run
//! use exocat_apt::core::domain::ProposalId;
//! use exocat_apt::io::loaders::ProposalLoader;
//! use std::path::Path;
//!
//! let loaded = ProposalLoader::load_from_dir(Path::new("apt_files"), &ProposalId::new("15469"))
//!     .expect("Failed to load");
//! println!("Loaded {} exposures", loaded.extract.exposures.len());
//! ```

pub mod loaders;
pub mod writer;


pub use loaders::{ProposalLoadResult, ProposalLoader, VisitStatusLoader};
pub use writer::{output_file_name, records_to_dataframe, write_table, TIMESTAMP_FORMAT};
