//! Fetch the `disease_h5` epidemic feed and reshape its nested area tree
//! into flat national, provincial, city and international tables.

pub mod config;
pub mod error;
pub mod fetch;
pub mod labels;
pub mod raw;
pub mod report;
pub mod reshape;
pub mod snapshot;
pub mod table;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{Config, FetchConfig, LabelSet};
pub use error::{ConfigError, MalformedInput, Omission, SnapshotError, UnwrapError};
pub use labels::LabelDictionary;
pub use raw::RawTree;
pub use reshape::{Reshaped, Reshaper};
pub use snapshot::{snapshot, Snapshot};
pub use table::{Dimension, RegionKey, Row, Table, TableKind};
