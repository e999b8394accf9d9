//! Storage backends for the statement graph
//!
//! Persistence is expressed through the repository traits in [`traits`]; the
//! primary implementation is [`SqliteGraph`]. Lookups are served through the
//! shared [`ThingCache`].

mod cache;
mod ids;
mod sqlite;
mod traits;

pub use cache::{CacheStats, EntityCache, ThingCache};
pub use ids::{next_free, IdSequence};
pub use sqlite::SqliteGraph;
pub use traits::{
    BundleConfiguration, ChildClass, ClassHierarchyEntry, ClassHierarchyRepository, ClassRepository,
    ClassSubclassRelation, GraphRepository, LiteralRepository, OpenStore, Page, PageRequest,
    PredicateRepository, PublishedContent, PublishedContentRepository, ResourceFilter,
    ResourceRepository, SearchString, Sort, SortDirection, SortProperty, StatementFilter,
    StatementRepository, StorageError, StorageResult, ThingRepository, VisibilityFilter,
};
