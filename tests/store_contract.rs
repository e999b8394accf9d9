//! The SQLite store behind the use-case ports: persistence across reopen,
//! bundle traversal and the class hierarchy rules.

use orkg_graph::graph::vocab::predicates;
use orkg_graph::graph::{ContributorId, ThingId};
use orkg_graph::services::{
    seed_vocabulary, ClassHierarchyUseCases, ClassUseCases, CreateClassCommand, CreateClassHierarchyCommand,
    CreateLiteralCommand, CreatePredicateCommand, CreateResourceCommand, CreateStatementCommand, GraphServices,
    LiteralUseCases, PredicateUseCases, ResourceUseCases, StatementUseCases,
};
use orkg_graph::storage::{
    BundleConfiguration, OpenStore, PageRequest, ResourceFilter, SearchString, SqliteGraph, StatementFilter,
    StatementRepository, ThingCache,
};
use orkg_graph::{DomainError, ErrorKind};
use std::collections::BTreeSet;
use std::sync::Arc;
use tempfile::TempDir;

fn in_memory() -> GraphServices<SqliteGraph> {
    let store = Arc::new(SqliteGraph::open_in_memory().unwrap());
    seed_vocabulary(store.as_ref()).unwrap();
    GraphServices::new(store)
}

fn class(services: &GraphServices<SqliteGraph>, id: &str) -> ThingId {
    services
        .create_class(CreateClassCommand::new(ContributorId::UNKNOWN, id).with_id(id))
        .unwrap()
}

fn subclass(services: &GraphServices<SqliteGraph>, parent: &str, children: &[&str]) -> Result<(), DomainError> {
    services.create_class_relations(CreateClassHierarchyCommand {
        contributor: ContributorId::UNKNOWN,
        parent: ThingId::new(parent),
        children: children.iter().map(|c| ThingId::new(*c)).collect(),
        check_if_parent_is_leaf: false,
    })
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn graph_survives_reopening_the_database() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("graph.db");
    let owner = ContributorId::new();

    let (paper, statement) = {
        let store = Arc::new(SqliteGraph::open(&path).unwrap());
        seed_vocabulary(store.as_ref()).unwrap();
        let services = GraphServices::new(store);
        let paper = services
            .create_resource(CreateResourceCommand::new(owner, "Attention is all you need").with_class("Paper"))
            .unwrap();
        let title = services
            .create_literal(CreateLiteralCommand::new(owner, "Transformers"))
            .unwrap();
        let statement = services
            .add_statement(CreateStatementCommand::new(owner, paper.clone(), predicates::DESCRIPTION, title))
            .unwrap();
        (paper, statement)
    };

    let store = Arc::new(SqliteGraph::open(&path).unwrap().with_cache(Arc::new(ThingCache::new(true))));
    assert_eq!(seed_vocabulary(store.as_ref()).unwrap(), 0);
    let services = GraphServices::new(store);

    let resource = services.find_resource_by_id(&paper).unwrap().unwrap();
    assert_eq!(resource.label, "Attention is all you need");
    assert_eq!(resource.created_by, owner);
    let stored = services.find_statement_by_id(&statement).unwrap().unwrap();
    assert_eq!(stored.object.label(), "Transformers");
}

#[test]
fn label_search_finds_resources_of_a_class() {
    let services = in_memory();
    let owner = ContributorId::new();
    for label in ["Graph neural networks", "Graph databases", "Relational algebra"] {
        services
            .create_resource(CreateResourceCommand::new(owner, label).with_class("Paper"))
            .unwrap();
    }
    services.create_resource(CreateResourceCommand::new(owner, "Graph theory")).unwrap();

    let filter = ResourceFilter::new()
        .with_label(SearchString::of("graph", false))
        .with_class("Paper");
    let found = services.find_all_resources(&filter, &PageRequest::all()).unwrap();
    let labels: BTreeSet<_> = found.content.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, BTreeSet::from(["Graph neural networks", "Graph databases"]));

    let exact = ResourceFilter::new().with_label(SearchString::of("graph databases", true));
    assert_eq!(services.find_all_resources(&exact, &PageRequest::all()).unwrap().total_elements, 1);
}

// ============================================================================
// Statements and bundles
// ============================================================================

#[test]
fn bundles_stop_at_the_configured_depth_and_classes() {
    let services = in_memory();
    let owner = ContributorId::new();
    let relates = services
        .create_predicate(CreatePredicateCommand::new(owner, "relates to").with_id("relatesTo"))
        .unwrap();
    class(&services, "Hidden");
    let chain: Vec<ThingId> = (0..4)
        .map(|i| services.create_resource(CreateResourceCommand::new(owner, format!("node {}", i))).unwrap())
        .collect();
    let hidden = services
        .create_resource(CreateResourceCommand::new(owner, "hidden").with_class("Hidden"))
        .unwrap();
    for pair in chain.windows(2) {
        services
            .add_statement(CreateStatementCommand::new(owner, pair[0].clone(), relates.clone(), pair[1].clone()))
            .unwrap();
    }
    services
        .add_statement(CreateStatementCommand::new(owner, chain[0].clone(), relates.clone(), hidden.clone()))
        .unwrap();

    let store = services.repository();
    let all = store.fetch_as_bundle(&chain[0], &BundleConfiguration::new()).unwrap();
    assert_eq!(all.len(), 4);

    let shallow = store
        .fetch_as_bundle(&chain[0], &BundleConfiguration::new().with_max_level(2))
        .unwrap();
    let subjects: BTreeSet<_> = shallow.iter().map(|s| s.subject_id().clone()).collect();
    assert_eq!(subjects, BTreeSet::from([chain[0].clone(), chain[1].clone()]));

    let filtered = store
        .fetch_as_bundle(&chain[0], &BundleConfiguration::new().with_blacklist(["Hidden"]))
        .unwrap();
    assert!(filtered.iter().all(|s| s.object_id() != &hidden));
    assert_eq!(filtered.len(), 3);
}

#[test]
fn literals_cannot_be_subjects() {
    let services = in_memory();
    let owner = ContributorId::new();
    let literal = services.create_literal(CreateLiteralCommand::new(owner, "42")).unwrap();
    let paper = services.create_resource(CreateResourceCommand::new(owner, "paper")).unwrap();

    let err = services
        .add_statement(CreateStatementCommand::new(owner, literal, predicates::DESCRIPTION, paper))
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidStatementSubject(_)));
}

#[test]
fn resources_in_use_cannot_be_deleted() {
    let services = in_memory();
    let owner = ContributorId::new();
    let paper = services.create_resource(CreateResourceCommand::new(owner, "paper")).unwrap();
    let author = services.create_resource(CreateResourceCommand::new(owner, "author")).unwrap();
    let link = services
        .add_statement(CreateStatementCommand::new(owner, paper.clone(), predicates::HAS_AUTHOR, author.clone()))
        .unwrap();

    let err = services.delete_resource(&author, owner).unwrap_err();
    assert!(matches!(err, DomainError::ResourceUsedInStatement(_)));

    services.delete_statements(&BTreeSet::from([link])).unwrap();
    let err = services.delete_resource(&author, ContributorId::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    services.delete_resource(&author, owner).unwrap();
    assert!(services.find_resource_by_id(&author).unwrap().is_none());
    let remaining = services
        .repository()
        .find_statements(&StatementFilter::new().with_subject(paper), &PageRequest::all())
        .unwrap();
    assert!(remaining.content.is_empty());
}

#[test]
fn resources_with_own_statements_cannot_be_deleted() {
    let services = in_memory();
    let owner = ContributorId::new();
    let paper = services.create_resource(CreateResourceCommand::new(owner, "paper")).unwrap();
    let title = services.create_literal(CreateLiteralCommand::new(owner, "A title")).unwrap();
    let link = services
        .add_statement(CreateStatementCommand::new(owner, paper.clone(), predicates::DESCRIPTION, title))
        .unwrap();

    let err = services.delete_resource(&paper, owner).unwrap_err();
    assert!(matches!(err, DomainError::ResourceUsedInStatement(ref id) if id == &paper));
    assert!(services.find_statement_by_id(&link).unwrap().is_some());

    services.delete_statements(&BTreeSet::from([link])).unwrap();
    services.delete_resource(&paper, owner).unwrap();
    assert!(services.find_resource_by_id(&paper).unwrap().is_none());
}

// ============================================================================
// Class hierarchy
// ============================================================================

#[test]
fn hierarchy_paths_and_instance_counts() {
    let services = in_memory();
    for id in ["Animal", "Mammal", "Dog", "Cat"] {
        class(&services, id);
    }
    subclass(&services, "Animal", &["Mammal"]).unwrap();
    subclass(&services, "Mammal", &["Dog", "Cat"]).unwrap();
    let owner = ContributorId::new();
    for (label, class) in [("Rex", "Dog"), ("Tom", "Cat"), ("Generic", "Mammal")] {
        services
            .create_resource(CreateResourceCommand::new(owner, label).with_class(class))
            .unwrap();
    }

    let path = services.find_class_hierarchy(&ThingId::new("Dog"), &PageRequest::all()).unwrap();
    let entries: Vec<_> = path
        .content
        .iter()
        .map(|e| (e.class.id.as_str().to_string(), e.parent_id.as_ref().map(|p| p.as_str().to_string())))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("Animal".to_string(), None),
            ("Dog".to_string(), Some("Mammal".to_string())),
            ("Mammal".to_string(), Some("Animal".to_string())),
        ]
    );

    assert_eq!(services.find_root_class(&ThingId::new("Cat")).unwrap().unwrap().id.as_str(), "Animal");
    assert_eq!(services.count_class_instances(&ThingId::new("Mammal")).unwrap(), 3);
    assert_eq!(services.count_class_instances(&ThingId::new("Dog")).unwrap(), 1);

    let children = services.find_child_classes(&ThingId::new("Animal"), &PageRequest::all()).unwrap();
    assert_eq!(children.content.len(), 1);
    assert_eq!(children.content[0].child_count, 2);

    let roots = services.find_all_root_classes(&PageRequest::all()).unwrap();
    assert!(roots.content.iter().any(|c| c.id.as_str() == "Animal"));
    assert!(roots.content.iter().all(|c| c.id.as_str() != "Mammal"));
}

#[test]
fn hierarchy_rejects_cycles_and_second_parents() {
    let services = in_memory();
    for id in ["A", "B", "C", "D"] {
        class(&services, id);
    }
    subclass(&services, "A", &["B"]).unwrap();
    subclass(&services, "B", &["C"]).unwrap();

    let err = subclass(&services, "C", &["A"]).unwrap_err();
    assert!(matches!(err, DomainError::InvalidSubclassRelation { .. }));

    let err = subclass(&services, "D", &["C"]).unwrap_err();
    assert!(matches!(err, DomainError::ParentClassAlreadyExists { ref parent, .. } if parent.as_str() == "B"));

    let err = subclass(&services, "A", &["A"]).unwrap_err();
    assert!(matches!(err, DomainError::InvalidSubclassRelation { .. }));

    let err = services
        .create_class_relations(CreateClassHierarchyCommand {
            contributor: ContributorId::UNKNOWN,
            parent: ThingId::new("A"),
            children: BTreeSet::from([ThingId::new("D")]),
            check_if_parent_is_leaf: true,
        })
        .unwrap_err();
    assert!(matches!(err, DomainError::ParentClassAlreadyHasChildren(_)));

    services.delete_class_relation(&ThingId::new("C")).unwrap();
    subclass(&services, "D", &["C"]).unwrap();
    assert_eq!(services.find_parent_class(&ThingId::new("C")).unwrap().unwrap().id.as_str(), "D");
}
