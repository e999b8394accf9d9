//! Use-case decorator that records every mutating call

use super::commands::{
    CreateClassCommand, CreateClassHierarchyCommand, CreateLiteralCommand, CreatePredicateCommand,
    CreateResourceCommand, CreateStatementCommand, UpdateClassCommand, UpdateLiteralCommand,
    UpdateResourceCommand,
};
use super::{
    ClassHierarchyUseCases, ClassUseCases, LiteralUseCases, PredicateUseCases, ResourceUseCases,
    StatementUseCases, UseCases,
};
use crate::error::DomainResult;
use crate::graph::{Class, ContributorId, Literal, Predicate, Resource, Statement, StatementId, ThingId};
use crate::storage::{
    ChildClass, ClassHierarchyEntry, Page, PageRequest, ResourceFilter, SearchString, StatementFilter,
};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

/// A mutating use-case call, recorded before it is forwarded
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreateResource(CreateResourceCommand),
    UpdateResource(UpdateResourceCommand),
    DeleteResource { id: ThingId, contributor: ContributorId },
    CreateLiteral(CreateLiteralCommand),
    UpdateLiteral(UpdateLiteralCommand),
    CreatePredicate(CreatePredicateCommand),
    UpdatePredicateLabel { id: ThingId, label: String },
    CreateClass(CreateClassCommand),
    UpdateClass(UpdateClassCommand),
    AddStatement(CreateStatementCommand),
    UpdateStatementIndex { id: StatementId, index: Option<i64> },
    DeleteStatements(BTreeSet<StatementId>),
    CreateClassRelations(CreateClassHierarchyCommand),
    DeleteClassRelation(ThingId),
}

/// Forwards to the wrapped use cases, logging each mutation in call order
///
/// Reads are forwarded without being recorded. Tests use this to assert that
/// an operation performed no writes, or exactly the expected ones.
pub struct RecordingUseCases<U: ?Sized> {
    inner: Arc<U>,
    log: Mutex<Vec<Mutation>>,
}

impl<U: UseCases + ?Sized> RecordingUseCases<U> {
    pub fn new(inner: Arc<U>) -> Self {
        Self { inner, log: Mutex::new(Vec::new()) }
    }

    fn record(&self, mutation: Mutation) {
        tracing::trace!(?mutation, "recorded mutation");
        self.log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(mutation);
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    pub fn is_untouched(&self) -> bool {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).is_empty()
    }

    /// Forget everything recorded so far, e.g. after fixture setup
    pub fn reset(&self) {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clear();
    }
}

impl<U: UseCases + ?Sized> ResourceUseCases for RecordingUseCases<U> {
    fn create_resource(&self, command: CreateResourceCommand) -> DomainResult<ThingId> {
        self.record(Mutation::CreateResource(command.clone()));
        self.inner.create_resource(command)
    }

    fn update_resource(&self, command: UpdateResourceCommand) -> DomainResult<()> {
        self.record(Mutation::UpdateResource(command.clone()));
        self.inner.update_resource(command)
    }

    fn delete_resource(&self, id: &ThingId, contributor: ContributorId) -> DomainResult<()> {
        self.record(Mutation::DeleteResource { id: id.clone(), contributor });
        self.inner.delete_resource(id, contributor)
    }

    fn may_delete(&self, resource: &Resource, contributor: ContributorId) -> bool {
        self.inner.may_delete(resource, contributor)
    }

    fn find_resource_by_id(&self, id: &ThingId) -> DomainResult<Option<Resource>> {
        self.inner.find_resource_by_id(id)
    }

    fn find_all_resources(&self, filter: &ResourceFilter, page: &PageRequest) -> DomainResult<Page<Resource>> {
        self.inner.find_all_resources(filter, page)
    }
}

impl<U: UseCases + ?Sized> LiteralUseCases for RecordingUseCases<U> {
    fn create_literal(&self, command: CreateLiteralCommand) -> DomainResult<ThingId> {
        self.record(Mutation::CreateLiteral(command.clone()));
        self.inner.create_literal(command)
    }

    fn update_literal(&self, command: UpdateLiteralCommand) -> DomainResult<()> {
        self.record(Mutation::UpdateLiteral(command.clone()));
        self.inner.update_literal(command)
    }

    fn find_literal_by_id(&self, id: &ThingId) -> DomainResult<Option<Literal>> {
        self.inner.find_literal_by_id(id)
    }
}

impl<U: UseCases + ?Sized> PredicateUseCases for RecordingUseCases<U> {
    fn create_predicate(&self, command: CreatePredicateCommand) -> DomainResult<ThingId> {
        self.record(Mutation::CreatePredicate(command.clone()));
        self.inner.create_predicate(command)
    }

    fn update_predicate_label(&self, id: &ThingId, label: &str) -> DomainResult<()> {
        self.record(Mutation::UpdatePredicateLabel { id: id.clone(), label: label.to_string() });
        self.inner.update_predicate_label(id, label)
    }

    fn find_predicate_by_id(&self, id: &ThingId) -> DomainResult<Option<Predicate>> {
        self.inner.find_predicate_by_id(id)
    }

    fn find_all_predicates(&self, label: Option<&SearchString>, page: &PageRequest) -> DomainResult<Page<Predicate>> {
        self.inner.find_all_predicates(label, page)
    }
}

impl<U: UseCases + ?Sized> ClassUseCases for RecordingUseCases<U> {
    fn create_class(&self, command: CreateClassCommand) -> DomainResult<ThingId> {
        self.record(Mutation::CreateClass(command.clone()));
        self.inner.create_class(command)
    }

    fn update_class(&self, command: UpdateClassCommand) -> DomainResult<()> {
        self.record(Mutation::UpdateClass(command.clone()));
        self.inner.update_class(command)
    }

    fn find_class_by_id(&self, id: &ThingId) -> DomainResult<Option<Class>> {
        self.inner.find_class_by_id(id)
    }

    fn find_all_classes(&self, label: Option<&SearchString>, page: &PageRequest) -> DomainResult<Page<Class>> {
        self.inner.find_all_classes(label, page)
    }
}

impl<U: UseCases + ?Sized> StatementUseCases for RecordingUseCases<U> {
    fn add_statement(&self, command: CreateStatementCommand) -> DomainResult<StatementId> {
        self.record(Mutation::AddStatement(command.clone()));
        self.inner.add_statement(command)
    }

    fn update_statement_index(&self, id: &StatementId, index: Option<i64>) -> DomainResult<()> {
        self.record(Mutation::UpdateStatementIndex { id: id.clone(), index });
        self.inner.update_statement_index(id, index)
    }

    fn delete_statements(&self, ids: &BTreeSet<StatementId>) -> DomainResult<()> {
        self.record(Mutation::DeleteStatements(ids.clone()));
        self.inner.delete_statements(ids)
    }

    fn find_statement_by_id(&self, id: &StatementId) -> DomainResult<Option<Statement>> {
        self.inner.find_statement_by_id(id)
    }

    fn find_all_statements(&self, filter: &StatementFilter, page: &PageRequest) -> DomainResult<Page<Statement>> {
        self.inner.find_all_statements(filter, page)
    }
}

impl<U: UseCases + ?Sized> ClassHierarchyUseCases for RecordingUseCases<U> {
    fn create_class_relations(&self, command: CreateClassHierarchyCommand) -> DomainResult<()> {
        self.record(Mutation::CreateClassRelations(command.clone()));
        self.inner.create_class_relations(command)
    }

    fn delete_class_relation(&self, child: &ThingId) -> DomainResult<()> {
        self.record(Mutation::DeleteClassRelation(child.clone()));
        self.inner.delete_class_relation(child)
    }

    fn find_child_classes(&self, id: &ThingId, page: &PageRequest) -> DomainResult<Page<ChildClass>> {
        self.inner.find_child_classes(id, page)
    }

    fn find_parent_class(&self, id: &ThingId) -> DomainResult<Option<Class>> {
        self.inner.find_parent_class(id)
    }

    fn find_root_class(&self, id: &ThingId) -> DomainResult<Option<Class>> {
        self.inner.find_root_class(id)
    }

    fn find_all_root_classes(&self, page: &PageRequest) -> DomainResult<Page<Class>> {
        self.inner.find_all_root_classes(page)
    }

    fn find_class_hierarchy(&self, id: &ThingId, page: &PageRequest) -> DomainResult<Page<ClassHierarchyEntry>> {
        self.inner.find_class_hierarchy(id, page)
    }

    fn count_class_instances(&self, id: &ThingId) -> DomainResult<usize> {
        self.inner.count_class_instances(id)
    }
}
