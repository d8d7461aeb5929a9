//! # Bundle Store
//!
//! Read-only access to a support-bundle export: one large JSON object whose
//! root keys are API paths (`/v1/group`, `/v1/host`, ...).
//!
//! ## Pipeline
//!
//! ```text
//! nvsupport.json.gz
//!     │
//!     ├──> Loader (gzip + serde_json)
//!     │      └─> Document (root object)
//!     │
//!     ├──> DocumentStore (install once, shared reads)
//!     │      ├─ list_keys: case-insensitive key catalog
//!     │      └─ view: key lookup + projection
//!     │
//!     └──> Shape projector
//!            ├─ /v1/group, /v1/scan/platform, /v1/domain, /v1/host
//!            │    └─> filtered, flattened record lists
//!            └─ any other key: raw value
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use bundle_store::{decode_key, DocumentStore, QueryParams};
//!
//! fn main() -> bundle_store::Result<()> {
//!     let store = DocumentStore::open("nvsupport.json.gz")?;
//!     let key = decode_key("%2Fv1%2Fgroup")?;
//!     let groups = store.view(&key, &QueryParams::new().with("domain", "prod"))?;
//!
//!     println!("{groups}");
//!     Ok(())
//! }
//! ```

mod catalog;
mod error;
mod key;
mod loader;
mod query;
mod shape;
mod store;
pub mod value;

pub use catalog::list_keys;
pub use error::{Result, StoreError};
pub use key::decode_key;
pub use loader::{load_bundle, parse_document};
pub use query::QueryParams;
pub use shape::{project, Shape};
pub use store::DocumentStore;

/// The parsed bundle: root key to arbitrary JSON.
pub type Document = serde_json::Map<String, serde_json::Value>;
