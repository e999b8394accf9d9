//! Use-case ports per node kind and their implementation over the repositories
//!
//! Content-type pipelines write to the graph exclusively through these ports,
//! which lets tests observe every mutation (see [`RecordingUseCases`]).

mod bootstrap;
mod commands;
mod graph;
mod recording;

pub use bootstrap::seed_vocabulary;
pub use commands::{
    CreateClassCommand, CreateClassHierarchyCommand, CreateLiteralCommand, CreatePredicateCommand,
    CreateResourceCommand, CreateStatementCommand, UpdateClassCommand, UpdateLiteralCommand,
    UpdateResourceCommand,
};
pub use graph::GraphServices;
pub use recording::{Mutation, RecordingUseCases};

use crate::error::DomainResult;
use crate::graph::{Class, ContributorId, Literal, Predicate, Resource, Statement, StatementId, ThingId};
use crate::storage::{
    ChildClass, ClassHierarchyEntry, Page, PageRequest, ResourceFilter, SearchString, StatementFilter,
};
use std::collections::BTreeSet;

pub trait ResourceUseCases: Send + Sync {
    fn create_resource(&self, command: CreateResourceCommand) -> DomainResult<ThingId>;

    fn update_resource(&self, command: UpdateResourceCommand) -> DomainResult<()>;

    /// Delete a resource that nothing refers to, on behalf of its owner or a curator
    fn delete_resource(&self, id: &ThingId, contributor: ContributorId) -> DomainResult<()>;

    /// Whether `contributor` owns `resource` or is a curator
    fn may_delete(&self, resource: &Resource, contributor: ContributorId) -> bool;

    fn find_resource_by_id(&self, id: &ThingId) -> DomainResult<Option<Resource>>;

    fn find_all_resources(&self, filter: &ResourceFilter, page: &PageRequest) -> DomainResult<Page<Resource>>;
}

pub trait LiteralUseCases: Send + Sync {
    fn create_literal(&self, command: CreateLiteralCommand) -> DomainResult<ThingId>;

    fn update_literal(&self, command: UpdateLiteralCommand) -> DomainResult<()>;

    fn find_literal_by_id(&self, id: &ThingId) -> DomainResult<Option<Literal>>;
}

pub trait PredicateUseCases: Send + Sync {
    fn create_predicate(&self, command: CreatePredicateCommand) -> DomainResult<ThingId>;

    fn update_predicate_label(&self, id: &ThingId, label: &str) -> DomainResult<()>;

    fn find_predicate_by_id(&self, id: &ThingId) -> DomainResult<Option<Predicate>>;

    fn find_all_predicates(&self, label: Option<&SearchString>, page: &PageRequest) -> DomainResult<Page<Predicate>>;
}

pub trait ClassUseCases: Send + Sync {
    fn create_class(&self, command: CreateClassCommand) -> DomainResult<ThingId>;

    fn update_class(&self, command: UpdateClassCommand) -> DomainResult<()>;

    fn find_class_by_id(&self, id: &ThingId) -> DomainResult<Option<Class>>;

    fn find_all_classes(&self, label: Option<&SearchString>, page: &PageRequest) -> DomainResult<Page<Class>>;
}

pub trait StatementUseCases: Send + Sync {
    /// Add a statement; adding an existing triple again returns the existing id
    fn add_statement(&self, command: CreateStatementCommand) -> DomainResult<StatementId>;

    fn update_statement_index(&self, id: &StatementId, index: Option<i64>) -> DomainResult<()>;

    /// Delete statements; orphaned literal objects go with them
    fn delete_statements(&self, ids: &BTreeSet<StatementId>) -> DomainResult<()>;

    fn find_statement_by_id(&self, id: &StatementId) -> DomainResult<Option<Statement>>;

    fn find_all_statements(&self, filter: &StatementFilter, page: &PageRequest) -> DomainResult<Page<Statement>>;
}

pub trait ClassHierarchyUseCases: Send + Sync {
    fn create_class_relations(&self, command: CreateClassHierarchyCommand) -> DomainResult<()>;

    fn delete_class_relation(&self, child: &ThingId) -> DomainResult<()>;

    fn find_child_classes(&self, id: &ThingId, page: &PageRequest) -> DomainResult<Page<ChildClass>>;

    fn find_parent_class(&self, id: &ThingId) -> DomainResult<Option<Class>>;

    fn find_root_class(&self, id: &ThingId) -> DomainResult<Option<Class>>;

    fn find_all_root_classes(&self, page: &PageRequest) -> DomainResult<Page<Class>>;

    fn find_class_hierarchy(&self, id: &ThingId, page: &PageRequest) -> DomainResult<Page<ClassHierarchyEntry>>;

    fn count_class_instances(&self, id: &ThingId) -> DomainResult<usize>;
}

/// All use cases a content-type service writes through
pub trait UseCases:
    ResourceUseCases
    + LiteralUseCases
    + PredicateUseCases
    + ClassUseCases
    + StatementUseCases
    + ClassHierarchyUseCases
{
}

impl<T> UseCases for T where
    T: ResourceUseCases
        + LiteralUseCases
        + PredicateUseCases
        + ClassUseCases
        + StatementUseCases
        + ClassHierarchyUseCases
{
}
