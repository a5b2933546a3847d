#![forbid(unsafe_code)]

mod store;

pub use store::{SCHEMA_VERSION, SqliteStore, StoreConfig, StoreError};
