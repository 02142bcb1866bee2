//! rust-xmldb - configuration datastore engine for NETCONF/RESTCONF agents
//!
//! This library maintains the named configuration datastores of a network
//! device (running, candidate, startup, tmp). Each datastore is a backing file
//! `<dir>/<name>_db` plus an optional cached tree, with per-datastore locks
//! held by management sessions and copy operations implementing commit and
//! discard-changes.
//!
//! # Example
//!
//! ```no_run
//! use rust_xmldb::{Datastore, DatastoreConfig, SessionId, StoreName};
//!
//! let config = DatastoreConfig::new().dir("/usr/local/var/example");
//! let mut datastore = Datastore::connect(config);
//!
//! datastore.reset(StoreName::Candidate).unwrap();
//! datastore.lock(StoreName::Candidate, SessionId(1)).unwrap();
//! datastore.copy(StoreName::Candidate, StoreName::Running).unwrap();
//! datastore.unlock_all(SessionId(1));
//! ```

mod config;
mod copy;
pub mod datastore;
mod error;
pub mod handler;
mod lifecycle;
mod lock;
pub mod registry;
mod rename;
mod store;
mod tree;

pub use config::{CacheMode, DatastoreConfig};
pub use datastore::{Datastore, SharedDatastore, StoreStatus};
pub use error::{Result, XmldbError};
pub use handler::{ErrorTag, RequestHandler, Rpc, RpcReply};
pub use registry::{StoreMeta, StoreRegistry};
pub use store::{Existence, SessionId, StoreName};
pub use tree::{ConfigTree, TOP_NAME};
