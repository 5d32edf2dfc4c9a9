pub mod config;
pub mod error;
pub mod json_bridge;
pub mod profile;
pub mod schema;
pub mod store;

pub use config::Config;
pub use error::{Result, StoreError};
pub use profile::{Profile, default_base_dir};
pub use store::Store;
