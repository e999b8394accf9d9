//! Repository ports and query types

use crate::graph::{
    Class, ContributorId, Literal, ObservatoryId, OrganizationId, Predicate, Resource, Statement,
    StatementId, Thing, ThingId, Visibility,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Version conflict on \"{id}\": expected version {expected}")]
    Conflict { id: ThingId, expected: i64 },

    #[error("Thing not found: {0}")]
    ThingNotFound(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

// === Pagination ===

/// Sortable properties shared by all node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortProperty {
    Id,
    Label,
    CreatedAt,
    CreatedBy,
    Visibility,
}

impl SortProperty {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            SortProperty::Id => "id",
            SortProperty::Label => "label",
            SortProperty::CreatedAt => "created_at",
            SortProperty::CreatedBy => "created_by",
            SortProperty::Visibility => "visibility",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub property: SortProperty,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(property: SortProperty) -> Self {
        Self { property, direction: SortDirection::Asc }
    }

    pub fn desc(property: SortProperty) -> Self {
        Self { property, direction: SortDirection::Desc }
    }
}

/// Offset/limit page request with multi-field sorting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    /// Page size; `None` requests everything
    pub size: Option<usize>,
    pub sort: Vec<Sort>,
}

impl PageRequest {
    pub fn of(page: usize, size: usize) -> Self {
        Self { page, size: Some(size), sort: Vec::new() }
    }

    /// A single page holding every match
    pub fn all() -> Self {
        Self { page: 0, size: None, sort: Vec::new() }
    }

    /// Request a single element, for existence checks
    pub fn single() -> Self {
        Self::of(0, 1)
    }

    pub fn sorted_by(mut self, sort: Sort) -> Self {
        self.sort.push(sort);
        self
    }

    pub(crate) fn offset(&self) -> usize {
        self.size.map(|s| s * self.page).unwrap_or(0)
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: usize,
    pub size: Option<usize>,
    pub total_elements: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn total_pages(&self) -> usize {
        match self.size {
            Some(0) | None => usize::from(self.total_elements > 0),
            Some(size) => self.total_elements.div_ceil(size),
        }
    }
}

// === Search ===

/// Label search mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchString {
    /// Case-insensitive equality
    Exact(String),
    /// Token match, ranked by label length, score and age
    Fuzzy(String),
}

impl SearchString {
    pub fn of(input: impl Into<String>, exact: bool) -> Self {
        let input = input.into().trim().to_string();
        if exact {
            SearchString::Exact(input)
        } else {
            SearchString::Fuzzy(input)
        }
    }

    pub fn input(&self) -> &str {
        match self {
            SearchString::Exact(s) | SearchString::Fuzzy(s) => s,
        }
    }

    /// Lowercased, non-empty search tokens
    pub fn tokens(&self) -> Vec<String> {
        self.input()
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect()
    }
}

/// Visibility filter groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityFilter {
    AllListed,
    Unlisted,
    Featured,
    NonFeatured,
    Deleted,
}

impl VisibilityFilter {
    pub fn targets(&self) -> &'static [Visibility] {
        match self {
            VisibilityFilter::AllListed => &[Visibility::Default, Visibility::Featured],
            VisibilityFilter::Unlisted => &[Visibility::Unlisted],
            VisibilityFilter::Featured => &[Visibility::Featured],
            VisibilityFilter::NonFeatured => &[Visibility::Default],
            VisibilityFilter::Deleted => &[Visibility::Deleted],
        }
    }
}

/// Filter criteria for querying resources
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    pub label: Option<SearchString>,
    pub visibility: Option<VisibilityFilter>,
    pub created_by: Option<ContributorId>,
    pub created_at_start: Option<DateTime<Utc>>,
    pub created_at_end: Option<DateTime<Utc>>,
    pub include_classes: BTreeSet<ThingId>,
    pub exclude_classes: BTreeSet<ThingId>,
    /// Only instances of this class or any of its subclasses
    pub base_class: Option<ThingId>,
    pub observatory_id: Option<ObservatoryId>,
    pub organization_id: Option<OrganizationId>,
}

impl ResourceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, label: SearchString) -> Self {
        self.label = Some(label);
        self
    }

    pub fn with_visibility(mut self, visibility: VisibilityFilter) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_created_by(mut self, contributor: ContributorId) -> Self {
        self.created_by = Some(contributor);
        self
    }

    pub fn with_created_between(
        mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_at_start = start;
        self.created_at_end = end;
        self
    }

    pub fn with_class(mut self, class: impl Into<ThingId>) -> Self {
        self.include_classes.insert(class.into());
        self
    }

    pub fn without_class(mut self, class: impl Into<ThingId>) -> Self {
        self.exclude_classes.insert(class.into());
        self
    }

    pub fn with_base_class(mut self, class: impl Into<ThingId>) -> Self {
        self.base_class = Some(class.into());
        self
    }

    pub fn with_observatory(mut self, id: ObservatoryId) -> Self {
        self.observatory_id = Some(id);
        self
    }

    pub fn with_organization(mut self, id: OrganizationId) -> Self {
        self.organization_id = Some(id);
        self
    }
}

/// Filter criteria for querying statements
#[derive(Debug, Clone, Default)]
pub struct StatementFilter {
    pub subject_id: Option<ThingId>,
    pub subject_classes: BTreeSet<ThingId>,
    pub predicate_id: Option<ThingId>,
    pub object_id: Option<ThingId>,
    pub object_classes: BTreeSet<ThingId>,
    pub object_label: Option<String>,
    pub created_by: Option<ContributorId>,
    pub created_at_start: Option<DateTime<Utc>>,
    pub created_at_end: Option<DateTime<Utc>>,
}

impl StatementFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subject(mut self, id: impl Into<ThingId>) -> Self {
        self.subject_id = Some(id.into());
        self
    }

    pub fn with_subject_class(mut self, class: impl Into<ThingId>) -> Self {
        self.subject_classes.insert(class.into());
        self
    }

    pub fn with_predicate(mut self, id: impl Into<ThingId>) -> Self {
        self.predicate_id = Some(id.into());
        self
    }

    pub fn with_object(mut self, id: impl Into<ThingId>) -> Self {
        self.object_id = Some(id.into());
        self
    }

    pub fn with_object_class(mut self, class: impl Into<ThingId>) -> Self {
        self.object_classes.insert(class.into());
        self
    }

    pub fn with_object_label(mut self, label: impl Into<String>) -> Self {
        self.object_label = Some(label.into());
        self
    }

    pub fn with_created_by(mut self, contributor: ContributorId) -> Self {
        self.created_by = Some(contributor);
        self
    }
}

/// Traversal settings for [`StatementRepository::fetch_as_bundle`]
///
/// Levels count hops from the root: statements whose subject is the root are
/// on level 1. Nodes carrying a blacklisted class are neither returned nor
/// traversed; a non-empty whitelist restricts traversal to nodes carrying at
/// least one whitelisted class. Literals carry the `Literal` class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleConfiguration {
    pub min_level: Option<usize>,
    pub max_level: Option<usize>,
    pub blacklist: Vec<ThingId>,
    pub whitelist: Vec<ThingId>,
}

impl BundleConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_level(mut self, level: usize) -> Self {
        self.max_level = Some(level);
        self
    }

    pub fn with_min_level(mut self, level: usize) -> Self {
        self.min_level = Some(level);
        self
    }

    pub fn with_blacklist<I, T>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ThingId>,
    {
        self.blacklist = classes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_whitelist<I, T>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ThingId>,
    {
        self.whitelist = classes.into_iter().map(Into::into).collect();
        self
    }

    /// Whether a node with the given labels may be entered
    pub fn admits(&self, labels: &BTreeSet<ThingId>) -> bool {
        if self.blacklist.iter().any(|c| labels.contains(c)) {
            return false;
        }
        self.whitelist.is_empty() || self.whitelist.iter().any(|c| labels.contains(c))
    }
}

// === Class hierarchy ===

/// A subclass relation between two classes
#[derive(Debug, Clone, PartialEq)]
pub struct ClassSubclassRelation {
    pub child: ThingId,
    pub parent: ThingId,
    pub created_by: ContributorId,
    pub created_at: DateTime<Utc>,
}

/// A child class with its own number of children
#[derive(Debug, Clone, PartialEq)]
pub struct ChildClass {
    pub class: Class,
    pub child_count: usize,
}

/// A class on the path from a class to its root, with its parent
#[derive(Debug, Clone, PartialEq)]
pub struct ClassHierarchyEntry {
    pub class: Class,
    pub parent_id: Option<ThingId>,
}

// === Published snapshots ===

/// Frozen subgraph of a published content-type version
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PublishedContent {
    pub id: ThingId,
    pub root_id: ThingId,
    pub subgraph: Vec<Statement>,
}

// === Repository traits ===
//
// Implementations must be thread-safe (Send + Sync) so that one store can be
// shared by request handlers running on separate threads.

/// Persistence of resources
pub trait ResourceRepository: Send + Sync {
    /// Next free resource id
    fn next_resource_id(&self) -> StorageResult<ThingId>;

    /// Insert a new resource (stored with version 0) or update an existing one
    ///
    /// Updates only apply when the stored version equals `resource.version`;
    /// otherwise [`StorageError::Conflict`] is returned and nothing is written.
    fn save_resource(&self, resource: &Resource) -> StorageResult<()>;

    fn delete_resource(&self, id: &ThingId) -> StorageResult<bool>;

    fn find_resource(&self, id: &ThingId) -> StorageResult<Option<Resource>>;

    fn resource_exists(&self, id: &ThingId) -> StorageResult<bool>;

    fn find_resources(&self, filter: &ResourceFilter, page: &PageRequest) -> StorageResult<Page<Resource>>;

    fn count_resources(&self, filter: &ResourceFilter) -> StorageResult<usize>;
}

/// Persistence of literals
pub trait LiteralRepository: Send + Sync {
    fn next_literal_id(&self) -> StorageResult<ThingId>;

    fn save_literal(&self, literal: &Literal) -> StorageResult<()>;

    fn delete_literal(&self, id: &ThingId) -> StorageResult<bool>;

    fn find_literal(&self, id: &ThingId) -> StorageResult<Option<Literal>>;

    fn literal_exists(&self, id: &ThingId) -> StorageResult<bool>;
}

/// Persistence of predicates
pub trait PredicateRepository: Send + Sync {
    fn next_predicate_id(&self) -> StorageResult<ThingId>;

    fn save_predicate(&self, predicate: &Predicate) -> StorageResult<()>;

    fn delete_predicate(&self, id: &ThingId) -> StorageResult<bool>;

    fn find_predicate(&self, id: &ThingId) -> StorageResult<Option<Predicate>>;

    fn predicate_exists(&self, id: &ThingId) -> StorageResult<bool>;

    fn find_predicates(&self, label: Option<&SearchString>, page: &PageRequest) -> StorageResult<Page<Predicate>>;
}

/// Persistence of classes
pub trait ClassRepository: Send + Sync {
    fn next_class_id(&self) -> StorageResult<ThingId>;

    fn save_class(&self, class: &Class) -> StorageResult<()>;

    fn find_class(&self, id: &ThingId) -> StorageResult<Option<Class>>;

    fn class_exists(&self, id: &ThingId) -> StorageResult<bool>;

    /// Whether every id refers to an existing class
    fn all_classes_exist(&self, ids: &BTreeSet<ThingId>) -> StorageResult<bool>;

    fn find_class_by_uri(&self, uri: &str) -> StorageResult<Option<Class>>;

    fn find_classes(&self, label: Option<&SearchString>, page: &PageRequest) -> StorageResult<Page<Class>>;
}

/// Kind-agnostic lookup of things
pub trait ThingRepository: Send + Sync {
    fn find_thing(&self, id: &ThingId) -> StorageResult<Option<Thing>>;

    fn thing_exists(&self, id: &ThingId) -> StorageResult<bool>;
}

/// Persistence of statements
pub trait StatementRepository: Send + Sync {
    fn next_statement_id(&self) -> StorageResult<StatementId>;

    /// Insert a statement; subject, predicate and object must exist
    fn save_statement(&self, statement: &Statement) -> StorageResult<()>;

    /// Delete statements by id
    ///
    /// Literal objects left without any statement afterwards are deleted as
    /// well and evicted from the read caches.
    fn delete_statements(&self, ids: &BTreeSet<StatementId>) -> StorageResult<()>;

    fn update_statement_index(&self, id: &StatementId, index: Option<i64>) -> StorageResult<()>;

    fn find_statement(&self, id: &StatementId) -> StorageResult<Option<Statement>>;

    fn find_statements(&self, filter: &StatementFilter, page: &PageRequest) -> StorageResult<Page<Statement>>;

    /// Number of statements pointing at the given thing
    fn count_incoming_statements(&self, id: &ThingId) -> StorageResult<usize>;

    /// Bounded-depth subgraph rooted at `id`, following statements from subject to object
    fn fetch_as_bundle(&self, id: &ThingId, configuration: &BundleConfiguration) -> StorageResult<Vec<Statement>>;
}

/// Persistence of the subclass forest
pub trait ClassHierarchyRepository: Send + Sync {
    fn save_relations(&self, relations: &[ClassSubclassRelation]) -> StorageResult<()>;

    fn delete_relation_by_child(&self, child: &ThingId) -> StorageResult<()>;

    fn find_children(&self, id: &ThingId, page: &PageRequest) -> StorageResult<Page<ChildClass>>;

    fn find_parent(&self, id: &ThingId) -> StorageResult<Option<Class>>;

    fn find_root(&self, id: &ThingId) -> StorageResult<Option<Class>>;

    fn find_all_roots(&self, page: &PageRequest) -> StorageResult<Page<Class>>;

    /// The class followed by all of its ancestors, each with its parent id
    fn find_class_hierarchy(&self, id: &ThingId, page: &PageRequest) -> StorageResult<Page<ClassHierarchyEntry>>;

    /// Instances of the class or any of its subclasses
    fn count_class_instances(&self, id: &ThingId) -> StorageResult<usize>;

    /// Whether `child` is a (transitive) subclass of `id`
    fn exists_child(&self, id: &ThingId, child: &ThingId) -> StorageResult<bool>;

    fn exists_children(&self, id: &ThingId) -> StorageResult<bool>;
}

/// Snapshots of published content-type versions
pub trait PublishedContentRepository: Send + Sync {
    fn save_published(&self, content: &PublishedContent) -> StorageResult<()>;

    fn find_published(&self, id: &ThingId) -> StorageResult<Option<PublishedContent>>;
}

/// Everything a content-type service reads from
pub trait GraphRepository:
    ResourceRepository
    + LiteralRepository
    + PredicateRepository
    + ClassRepository
    + ThingRepository
    + StatementRepository
    + ClassHierarchyRepository
    + PublishedContentRepository
{
}

impl<T> GraphRepository for T where
    T: ResourceRepository
        + LiteralRepository
        + PredicateRepository
        + ClassRepository
        + ThingRepository
        + StatementRepository
        + ClassHierarchyRepository
        + PublishedContentRepository
{
}

/// Extension trait for opening stores from paths
pub trait OpenStore: Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
