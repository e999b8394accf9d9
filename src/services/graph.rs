//! Use cases over a [`GraphRepository`]

use super::commands::{
    CreateClassCommand, CreateClassHierarchyCommand, CreateLiteralCommand, CreatePredicateCommand,
    CreateResourceCommand, CreateStatementCommand, UpdateClassCommand, UpdateLiteralCommand,
    UpdateResourceCommand,
};
use super::{
    ClassHierarchyUseCases, ClassUseCases, LiteralUseCases, PredicateUseCases, ResourceUseCases,
    StatementUseCases,
};
use crate::error::{DomainError, DomainResult};
use crate::graph::{
    is_valid_label, vocab::classes, Class, ContributorId, Literal, Predicate, Resource, Statement,
    StatementId, Thing, ThingId, Visibility,
};
use crate::storage::{
    ChildClass, ClassHierarchyEntry, ClassSubclassRelation, GraphRepository, Page, PageRequest,
    ResourceFilter, SearchString, StatementFilter,
};
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Enforces the graph rules on top of a repository
pub struct GraphServices<R: ?Sized> {
    repository: Arc<R>,
    curators: BTreeSet<ContributorId>,
}

impl<R: GraphRepository + ?Sized> GraphServices<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            curators: BTreeSet::new(),
        }
    }

    /// Contributors allowed to delete things they do not own
    pub fn with_curators(mut self, curators: impl IntoIterator<Item = ContributorId>) -> Self {
        self.curators.extend(curators);
        self
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    fn is_curator(&self, contributor: &ContributorId) -> bool {
        self.curators.contains(contributor)
    }

    fn validate_label(label: &str) -> DomainResult<()> {
        if is_valid_label(label) {
            Ok(())
        } else {
            Err(DomainError::InvalidLabel { property: "label".to_string() })
        }
    }

    fn validate_classes(&self, ids: &BTreeSet<ThingId>) -> DomainResult<()> {
        if let Some(reserved) = ids.iter().find(|id| classes::is_reserved(id.as_str())) {
            return Err(DomainError::ReservedClass(reserved.clone()));
        }
        let mut missing = Vec::new();
        for id in ids {
            if !self.repository.class_exists(id)? {
                missing.push(id.clone());
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DomainError::InvalidClassCollection(missing))
        }
    }

    fn ensure_free(&self, id: &Option<ThingId>) -> DomainResult<()> {
        match id {
            Some(id) if self.repository.thing_exists(id)? => Err(DomainError::ThingAlreadyExists(id.clone())),
            _ => Ok(()),
        }
    }

    /// Subject or object of any statement
    fn has_statements(&self, id: &ThingId) -> DomainResult<bool> {
        if self.repository.count_incoming_statements(id)? > 0 {
            return Ok(true);
        }
        let outgoing = self
            .repository
            .find_statements(&StatementFilter::new().with_subject(id.clone()), &PageRequest::single())?;
        Ok(!outgoing.is_empty())
    }

    fn require_class(&self, id: &ThingId) -> DomainResult<()> {
        if self.repository.class_exists(id)? {
            Ok(())
        } else {
            Err(DomainError::ClassNotFound(id.clone()))
        }
    }
}

impl<R: GraphRepository + ?Sized> ResourceUseCases for GraphServices<R> {
    fn create_resource(&self, command: CreateResourceCommand) -> DomainResult<ThingId> {
        Self::validate_label(&command.label)?;
        self.validate_classes(&command.classes)?;
        if let Some(id) = &command.id {
            if self.repository.thing_exists(id)? {
                return Err(DomainError::ResourceAlreadyExists(id.clone()));
            }
        }
        let id = match command.id {
            Some(id) => id,
            None => self.repository.next_resource_id()?,
        };
        let resource = Resource {
            id: id.clone(),
            label: command.label,
            classes: command.classes,
            created_by: command.contributor,
            created_at: Utc::now(),
            observatory_id: command.observatory_id,
            organization_id: command.organization_id,
            extraction_method: command.extraction_method,
            visibility: Visibility::Default,
            verified: false,
            unlisted_by: None,
            modifiable: command.modifiable,
            version: 0,
        };
        self.repository.save_resource(&resource)?;
        tracing::debug!(%id, "created resource");
        Ok(id)
    }

    fn update_resource(&self, command: UpdateResourceCommand) -> DomainResult<()> {
        let found = self
            .repository
            .find_resource(&command.id)?
            .ok_or_else(|| DomainError::ResourceNotFound(command.id.clone()))?;
        if !found.modifiable {
            return Err(DomainError::ResourceNotModifiable(found.id));
        }

        let mut updated = found.clone();
        if let Some(label) = command.label {
            Self::validate_label(&label)?;
            updated.label = label;
        }
        if let Some(classes) = command.classes {
            self.validate_classes(&classes)?;
            updated.classes = classes;
        }
        if let Some(visibility) = command.visibility {
            if visibility != found.visibility {
                updated.unlisted_by = match visibility {
                    Visibility::Unlisted => Some(command.contributor),
                    _ => None,
                };
            }
            updated.visibility = visibility;
        }
        if let Some(observatory) = command.observatory_id {
            updated.observatory_id = observatory;
        }
        if let Some(organization) = command.organization_id {
            updated.organization_id = organization;
        }
        if let Some(method) = command.extraction_method {
            updated.extraction_method = method;
        }
        if let Some(modifiable) = command.modifiable {
            updated.modifiable = modifiable;
        }

        if updated == found {
            return Ok(());
        }
        self.repository.save_resource(&updated)?;
        Ok(())
    }

    fn delete_resource(&self, id: &ThingId, contributor: ContributorId) -> DomainResult<()> {
        let resource = self
            .repository
            .find_resource(id)?
            .ok_or_else(|| DomainError::ResourceNotFound(id.clone()))?;
        if !resource.modifiable {
            return Err(DomainError::ResourceNotModifiable(resource.id));
        }
        if self.has_statements(id)? {
            return Err(DomainError::ResourceUsedInStatement(resource.id));
        }
        if !self.may_delete(&resource, contributor) {
            return Err(DomainError::NeitherOwnerNorCurator(contributor));
        }
        self.repository.delete_resource(id)?;
        tracing::debug!(%id, "deleted resource");
        Ok(())
    }

    fn may_delete(&self, resource: &Resource, contributor: ContributorId) -> bool {
        resource.created_by == contributor || self.is_curator(&contributor)
    }

    fn find_resource_by_id(&self, id: &ThingId) -> DomainResult<Option<Resource>> {
        Ok(self.repository.find_resource(id)?)
    }

    fn find_all_resources(&self, filter: &ResourceFilter, page: &PageRequest) -> DomainResult<Page<Resource>> {
        Ok(self.repository.find_resources(filter, page)?)
    }
}

impl<R: GraphRepository + ?Sized> LiteralUseCases for GraphServices<R> {
    fn create_literal(&self, command: CreateLiteralCommand) -> DomainResult<ThingId> {
        self.ensure_free(&command.id)?;
        let id = match command.id {
            Some(id) => id,
            None => self.repository.next_literal_id()?,
        };
        let literal = Literal {
            id: id.clone(),
            label: command.label,
            datatype: command.datatype,
            created_by: command.contributor,
            created_at: Utc::now(),
            modifiable: command.modifiable,
        };
        self.repository.save_literal(&literal)?;
        Ok(id)
    }

    fn update_literal(&self, command: UpdateLiteralCommand) -> DomainResult<()> {
        let found = self
            .repository
            .find_literal(&command.id)?
            .ok_or_else(|| DomainError::LiteralNotFound(command.id.clone()))?;
        if !found.modifiable {
            return Err(DomainError::LiteralNotModifiable(found.id));
        }
        let mut updated = found.clone();
        if let Some(label) = command.label {
            updated.label = label;
        }
        if let Some(datatype) = command.datatype {
            updated.datatype = datatype;
        }
        if updated != found {
            self.repository.save_literal(&updated)?;
        }
        Ok(())
    }

    fn find_literal_by_id(&self, id: &ThingId) -> DomainResult<Option<Literal>> {
        Ok(self.repository.find_literal(id)?)
    }
}

impl<R: GraphRepository + ?Sized> PredicateUseCases for GraphServices<R> {
    fn create_predicate(&self, command: CreatePredicateCommand) -> DomainResult<ThingId> {
        Self::validate_label(&command.label)?;
        self.ensure_free(&command.id)?;
        let id = match command.id {
            Some(id) => id,
            None => self.repository.next_predicate_id()?,
        };
        let predicate = Predicate {
            id: id.clone(),
            label: command.label,
            created_by: command.contributor,
            created_at: Utc::now(),
            modifiable: command.modifiable,
        };
        self.repository.save_predicate(&predicate)?;
        Ok(id)
    }

    fn update_predicate_label(&self, id: &ThingId, label: &str) -> DomainResult<()> {
        let mut predicate = self
            .repository
            .find_predicate(id)?
            .ok_or_else(|| DomainError::PredicateNotFound(id.clone()))?;
        if !predicate.modifiable {
            return Err(DomainError::PredicateNotModifiable(id.clone()));
        }
        Self::validate_label(label)?;
        if predicate.label != label {
            predicate.label = label.to_string();
            self.repository.save_predicate(&predicate)?;
        }
        Ok(())
    }

    fn find_predicate_by_id(&self, id: &ThingId) -> DomainResult<Option<Predicate>> {
        Ok(self.repository.find_predicate(id)?)
    }

    fn find_all_predicates(&self, label: Option<&SearchString>, page: &PageRequest) -> DomainResult<Page<Predicate>> {
        Ok(self.repository.find_predicates(label, page)?)
    }
}

impl<R: GraphRepository + ?Sized> ClassUseCases for GraphServices<R> {
    fn create_class(&self, command: CreateClassCommand) -> DomainResult<ThingId> {
        Self::validate_label(&command.label)?;
        self.ensure_free(&command.id)?;
        if let Some(uri) = &command.uri {
            if let Some(existing) = self.repository.find_class_by_uri(uri)? {
                return Err(DomainError::DuplicateUri { uri: uri.clone(), id: existing.id });
            }
        }
        let id = match command.id {
            Some(id) => id,
            None => self.repository.next_class_id()?,
        };
        let class = Class {
            id: id.clone(),
            label: command.label,
            uri: command.uri,
            created_by: command.contributor,
            created_at: Utc::now(),
            modifiable: command.modifiable,
        };
        self.repository.save_class(&class)?;
        Ok(id)
    }

    fn update_class(&self, command: UpdateClassCommand) -> DomainResult<()> {
        let found = self
            .repository
            .find_class(&command.id)?
            .ok_or_else(|| DomainError::ClassNotFound(command.id.clone()))?;
        if !found.modifiable {
            return Err(DomainError::ClassNotModifiable(found.id));
        }
        let mut updated = found.clone();
        if let Some(label) = command.label {
            Self::validate_label(&label)?;
            updated.label = label;
        }
        if let Some(uri) = command.uri {
            if found.uri.as_deref() != Some(uri.as_str()) {
                if let Some(existing) = self.repository.find_class_by_uri(&uri)? {
                    return Err(DomainError::DuplicateUri { uri, id: existing.id });
                }
            }
            updated.uri = Some(uri);
        }
        if updated != found {
            self.repository.save_class(&updated)?;
        }
        Ok(())
    }

    fn find_class_by_id(&self, id: &ThingId) -> DomainResult<Option<Class>> {
        Ok(self.repository.find_class(id)?)
    }

    fn find_all_classes(&self, label: Option<&SearchString>, page: &PageRequest) -> DomainResult<Page<Class>> {
        Ok(self.repository.find_classes(label, page)?)
    }
}

impl<R: GraphRepository + ?Sized> StatementUseCases for GraphServices<R> {
    fn add_statement(&self, command: CreateStatementCommand) -> DomainResult<StatementId> {
        let subject = self
            .repository
            .find_thing(&command.subject_id)?
            .ok_or_else(|| DomainError::StatementSubjectNotFound(command.subject_id.clone()))?;
        if matches!(subject, Thing::Literal(_)) {
            return Err(DomainError::InvalidStatementSubject(command.subject_id));
        }
        let predicate = self
            .repository
            .find_predicate(&command.predicate_id)?
            .ok_or_else(|| DomainError::StatementPredicateNotFound(command.predicate_id.clone()))?;
        let object = self
            .repository
            .find_thing(&command.object_id)?
            .ok_or_else(|| DomainError::StatementObjectNotFound(command.object_id.clone()))?;

        let same_triple = StatementFilter::new()
            .with_subject(command.subject_id.clone())
            .with_predicate(command.predicate_id.clone())
            .with_object(command.object_id.clone());
        let existing = self.repository.find_statements(&same_triple, &PageRequest::single())?;
        if let Some(existing) = existing.content.into_iter().next() {
            return match command.id {
                Some(id) if id != existing.id => Err(DomainError::StatementAlreadyExists(existing.id)),
                _ => Ok(existing.id),
            };
        }

        let id = match command.id {
            Some(id) => {
                if self.repository.find_statement(&id)?.is_some() {
                    return Err(DomainError::StatementAlreadyExists(id));
                }
                id
            }
            None => self.repository.next_statement_id()?,
        };
        let statement = Statement {
            id: id.clone(),
            subject,
            predicate,
            object,
            created_by: command.contributor,
            created_at: Utc::now(),
            index: command.index,
            modifiable: command.modifiable,
        };
        self.repository.save_statement(&statement)?;
        Ok(id)
    }

    fn update_statement_index(&self, id: &StatementId, index: Option<i64>) -> DomainResult<()> {
        let statement = self
            .repository
            .find_statement(id)?
            .ok_or_else(|| DomainError::StatementNotFound(id.clone()))?;
        if !statement.modifiable {
            return Err(DomainError::StatementNotModifiable(id.clone()));
        }
        if statement.index != index {
            self.repository.update_statement_index(id, index)?;
        }
        Ok(())
    }

    fn delete_statements(&self, ids: &BTreeSet<StatementId>) -> DomainResult<()> {
        for id in ids {
            if let Some(statement) = self.repository.find_statement(id)? {
                if !statement.modifiable {
                    return Err(DomainError::StatementNotModifiable(statement.id));
                }
            }
        }
        self.repository.delete_statements(ids)?;
        tracing::debug!(count = ids.len(), "deleted statements");
        Ok(())
    }

    fn find_statement_by_id(&self, id: &StatementId) -> DomainResult<Option<Statement>> {
        Ok(self.repository.find_statement(id)?)
    }

    fn find_all_statements(&self, filter: &StatementFilter, page: &PageRequest) -> DomainResult<Page<Statement>> {
        Ok(self.repository.find_statements(filter, page)?)
    }
}

impl<R: GraphRepository + ?Sized> ClassHierarchyUseCases for GraphServices<R> {
    fn create_class_relations(&self, command: CreateClassHierarchyCommand) -> DomainResult<()> {
        let parent = &command.parent;
        if command.children.contains(parent) {
            return Err(DomainError::InvalidSubclassRelation { child: parent.clone(), parent: parent.clone() });
        }
        if command.check_if_parent_is_leaf && self.repository.exists_children(parent)? {
            return Err(DomainError::ParentClassAlreadyHasChildren(parent.clone()));
        }
        self.require_class(parent)?;

        let now = Utc::now();
        let mut relations = Vec::with_capacity(command.children.len());
        for child in &command.children {
            self.require_class(child)?;
            if let Some(existing) = self.repository.find_parent(child)? {
                return Err(DomainError::ParentClassAlreadyExists { child: child.clone(), parent: existing.id });
            }
            if self.repository.exists_child(child, parent)? {
                return Err(DomainError::InvalidSubclassRelation { child: child.clone(), parent: parent.clone() });
            }
            relations.push(ClassSubclassRelation {
                child: child.clone(),
                parent: parent.clone(),
                created_by: command.contributor,
                created_at: now,
            });
        }
        self.repository.save_relations(&relations)?;
        Ok(())
    }

    fn delete_class_relation(&self, child: &ThingId) -> DomainResult<()> {
        self.require_class(child)?;
        self.repository.delete_relation_by_child(child)?;
        Ok(())
    }

    fn find_child_classes(&self, id: &ThingId, page: &PageRequest) -> DomainResult<Page<ChildClass>> {
        self.require_class(id)?;
        Ok(self.repository.find_children(id, page)?)
    }

    fn find_parent_class(&self, id: &ThingId) -> DomainResult<Option<Class>> {
        self.require_class(id)?;
        Ok(self.repository.find_parent(id)?)
    }

    fn find_root_class(&self, id: &ThingId) -> DomainResult<Option<Class>> {
        self.require_class(id)?;
        Ok(self.repository.find_root(id)?)
    }

    fn find_all_root_classes(&self, page: &PageRequest) -> DomainResult<Page<Class>> {
        Ok(self.repository.find_all_roots(page)?)
    }

    fn find_class_hierarchy(&self, id: &ThingId, page: &PageRequest) -> DomainResult<Page<ClassHierarchyEntry>> {
        self.require_class(id)?;
        Ok(self.repository.find_class_hierarchy(id, page)?)
    }

    fn count_class_instances(&self, id: &ThingId) -> DomainResult<usize> {
        self.require_class(id)?;
        Ok(self.repository.count_class_instances(id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::services::seed_vocabulary;
    use crate::storage::{OpenStore, SqliteGraph};

    fn create_services() -> GraphServices<SqliteGraph> {
        let store = Arc::new(SqliteGraph::open_in_memory().unwrap());
        seed_vocabulary(store.as_ref()).unwrap();
        GraphServices::new(store)
    }

    fn class(services: &GraphServices<SqliteGraph>, id: &str) -> ThingId {
        services
            .create_class(CreateClassCommand::new(ContributorId::UNKNOWN, id).with_id(id))
            .unwrap()
    }

    // === Resources ===

    #[test]
    fn create_rejects_reserved_and_unknown_classes() {
        let services = create_services();
        let owner = ContributorId::new();

        let reserved = services
            .create_resource(CreateResourceCommand::new(owner, "r").with_class("Literal"))
            .unwrap_err();
        assert!(matches!(reserved, DomainError::ReservedClass(id) if id.as_str() == "Literal"));

        let unknown = services
            .create_resource(CreateResourceCommand::new(owner, "r").with_class("NoSuchClass"))
            .unwrap_err();
        assert!(matches!(unknown, DomainError::InvalidClassCollection(_)));

        let invalid = services
            .create_resource(CreateResourceCommand::new(owner, "two\nlines"))
            .unwrap_err();
        assert!(matches!(invalid, DomainError::InvalidLabel { .. }));
    }

    #[test]
    fn create_with_taken_id_fails() {
        let services = create_services();
        let owner = ContributorId::new();
        services
            .create_resource(CreateResourceCommand::new(owner, "r").with_id("R100"))
            .unwrap();
        let err = services
            .create_resource(CreateResourceCommand::new(owner, "r").with_id("R100"))
            .unwrap_err();
        assert!(matches!(err, DomainError::ResourceAlreadyExists(_)));
    }

    #[test]
    fn unlisting_records_the_contributor() {
        let services = create_services();
        let owner = ContributorId::new();
        let curator = ContributorId::new();
        let id = services.create_resource(CreateResourceCommand::new(owner, "r")).unwrap();

        services
            .update_resource(UpdateResourceCommand::new(id.clone(), curator).with_visibility(Visibility::Unlisted))
            .unwrap();

        let resource = services.find_resource_by_id(&id).unwrap().unwrap();
        assert_eq!(resource.visibility, Visibility::Unlisted);
        assert_eq!(resource.unlisted_by, Some(curator));
        assert_eq!(resource.version, 1);
    }

    #[test]
    fn unchanged_update_does_not_bump_version() {
        let services = create_services();
        let owner = ContributorId::new();
        let id = services.create_resource(CreateResourceCommand::new(owner, "same")).unwrap();

        services
            .update_resource(UpdateResourceCommand::new(id.clone(), owner).with_label("same"))
            .unwrap();

        assert_eq!(services.find_resource_by_id(&id).unwrap().unwrap().version, 0);
    }

    #[test]
    fn delete_checks_rules_in_order() {
        let services = create_services().with_curators([ContributorId::from_uuid(uuid::Uuid::from_u128(7))]);
        let owner = ContributorId::new();
        let stranger = ContributorId::new();
        let curator = ContributorId::from_uuid(uuid::Uuid::from_u128(7));

        let frozen = services
            .create_resource(CreateResourceCommand { modifiable: false, ..CreateResourceCommand::new(owner, "f") })
            .unwrap();
        assert!(matches!(
            services.delete_resource(&frozen, owner),
            Err(DomainError::ResourceNotModifiable(_))
        ));

        let used = services.create_resource(CreateResourceCommand::new(owner, "u")).unwrap();
        let user = services.create_resource(CreateResourceCommand::new(owner, "x")).unwrap();
        services
            .add_statement(CreateStatementCommand::new(owner, user.clone(), "description", used.clone()))
            .unwrap();
        assert!(matches!(
            services.delete_resource(&used, owner),
            Err(DomainError::ResourceUsedInStatement(_))
        ));

        let free = services.create_resource(CreateResourceCommand::new(owner, "free")).unwrap();
        let err = services.delete_resource(&free, stranger).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        services.delete_resource(&free, curator).unwrap();
        assert!(services.find_resource_by_id(&free).unwrap().is_none());

        let missing = services.delete_resource(&ThingId::new("missing"), owner).unwrap_err();
        assert!(missing.is_not_found());
    }

    // === Statements ===

    #[test]
    fn literal_subjects_are_rejected() {
        let services = create_services();
        let owner = ContributorId::new();
        let literal = services.create_literal(CreateLiteralCommand::new(owner, "text")).unwrap();
        let resource = services.create_resource(CreateResourceCommand::new(owner, "r")).unwrap();

        let err = services
            .add_statement(CreateStatementCommand::new(owner, literal, "description", resource))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidStatementSubject(_)));
    }

    #[test]
    fn adding_an_existing_triple_returns_its_id() {
        let services = create_services();
        let owner = ContributorId::new();
        let a = services.create_resource(CreateResourceCommand::new(owner, "a")).unwrap();
        let b = services.create_resource(CreateResourceCommand::new(owner, "b")).unwrap();

        let first = services
            .add_statement(CreateStatementCommand::new(owner, a.clone(), "description", b.clone()))
            .unwrap();
        let second = services
            .add_statement(CreateStatementCommand::new(owner, a, "description", b))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unmodifiable_statements_cannot_be_deleted() {
        let services = create_services();
        let owner = ContributorId::new();
        let a = services.create_resource(CreateResourceCommand::new(owner, "a")).unwrap();
        let b = services.create_resource(CreateResourceCommand::new(owner, "b")).unwrap();
        let id = services
            .add_statement(CreateStatementCommand {
                modifiable: false,
                ..CreateStatementCommand::new(owner, a, "description", b)
            })
            .unwrap();

        let err = services.delete_statements(&BTreeSet::from([id.clone()])).unwrap_err();
        assert!(matches!(err, DomainError::StatementNotModifiable(s) if s == id));
        assert!(services.find_statement_by_id(&id).unwrap().is_some());
    }

    // === Classes ===

    #[test]
    fn class_uris_are_unique() {
        let services = create_services();
        services
            .create_class(CreateClassCommand::new(ContributorId::UNKNOWN, "a").with_uri("https://example.org/A"))
            .unwrap();
        let err = services
            .create_class(CreateClassCommand::new(ContributorId::UNKNOWN, "b").with_uri("https://example.org/A"))
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateUri { .. }));
    }

    // === Class hierarchy ===

    fn relate(services: &GraphServices<SqliteGraph>, parent: &str, children: &[&str], leaf: bool) -> DomainResult<()> {
        services.create_class_relations(CreateClassHierarchyCommand {
            contributor: ContributorId::UNKNOWN,
            parent: ThingId::new(parent),
            children: children.iter().map(|c| ThingId::new(*c)).collect(),
            check_if_parent_is_leaf: leaf,
        })
    }

    #[test]
    fn hierarchy_rules() {
        let services = create_services();
        for id in ["A", "B", "C", "D"] {
            class(&services, id);
        }

        assert!(matches!(relate(&services, "A", &["A"], false), Err(DomainError::InvalidSubclassRelation { .. })));
        assert!(matches!(relate(&services, "A", &["X"], false), Err(DomainError::ClassNotFound(_))));
        assert!(matches!(relate(&services, "X", &["A"], false), Err(DomainError::ClassNotFound(_))));

        relate(&services, "A", &["B"], false).unwrap();
        relate(&services, "B", &["C"], true).unwrap();

        assert!(matches!(
            relate(&services, "A", &["D"], true),
            Err(DomainError::ParentClassAlreadyHasChildren(_))
        ));
        assert!(matches!(
            relate(&services, "D", &["C"], false),
            Err(DomainError::ParentClassAlreadyExists { parent, .. }) if parent.as_str() == "B"
        ));
        // A is an ancestor of C
        assert!(matches!(
            relate(&services, "C", &["A"], false),
            Err(DomainError::InvalidSubclassRelation { .. })
        ));

        assert_eq!(services.find_root_class(&ThingId::new("C")).unwrap().unwrap().id, ThingId::new("A"));
        services.delete_class_relation(&ThingId::new("B")).unwrap();
        assert!(services.find_parent_class(&ThingId::new("B")).unwrap().is_none());
        assert_eq!(services.find_root_class(&ThingId::new("C")).unwrap().unwrap().id, ThingId::new("B"));
    }
}
