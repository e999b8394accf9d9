//! ORKG graph: statement-graph mutation engine for scholarly content types
//!
//! Composite entities such as comparisons, literature lists and rosetta-stone
//! templates have no row of their own. They are projections over resources,
//! literals, predicates, classes and the statements connecting them.
//!
//! # Layers
//!
//! - **storage**: repository ports and the SQLite adapter, with a shared read cache
//! - **services**: use cases per node kind, enforcing the graph rules
//! - **actions**: step pipelines, validators, updaters and the reference-counted deleter
//! - **contenttypes**: hydration and create/update/publish/delete flows
//!
//! # Example
//!
//! ```
//! use orkg_graph::{seed_vocabulary, GraphContext, OpenStore, SqliteGraph};
//! use std::sync::Arc;
//!
//! let store = Arc::new(SqliteGraph::open_in_memory().unwrap());
//! seed_vocabulary(store.as_ref()).unwrap();
//! let ctx = GraphContext::over(store);
//! ```

pub mod actions;
pub mod config;
pub mod contenttypes;
pub mod doi;
pub mod error;
pub mod graph;
pub mod services;
pub mod storage;

pub use actions::GraphContext;
pub use config::{Config, ConfigError};
pub use contenttypes::{ComparisonService, LiteratureListService, RosettaStoneTemplateService};
pub use doi::{Doi, DoiService, LocalDoiService};
pub use error::{DomainError, DomainResult, ErrorKind};
pub use graph::{ContributorId, Resource, Statement, Thing, ThingId};
pub use services::{seed_vocabulary, GraphServices, UseCases};
pub use storage::{GraphRepository, OpenStore, SqliteGraph, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
