//! Rosetta-stone templates: property validation, label placeholders and the
//! rules that apply once statements use a template.

mod common;

use common::TestGraph;
use orkg_graph::actions::{PropertyType, TemplatePropertyDefinition};
use orkg_graph::contenttypes::{CreateRosettaStoneTemplateCommand, UpdateRosettaStoneTemplateCommand};
use orkg_graph::graph::vocab::{classes, predicates};
use orkg_graph::graph::{ContributorId, Resource, ThingId};
use orkg_graph::storage::ResourceRepository;
use orkg_graph::{DomainError, ErrorKind};

fn subject() -> TemplatePropertyDefinition {
    TemplatePropertyDefinition::new(
        "measurement",
        predicates::HAS_SUBJECT_POSITION,
        PropertyType::Resource { class: ThingId::new(classes::PAPER) },
    )
    .with_placeholder("measurement")
    .with_cardinality(Some(1), Some(1))
}

fn quantity(min_inclusive: f64, max_inclusive: f64) -> TemplatePropertyDefinition {
    TemplatePropertyDefinition::new(
        "value",
        predicates::HAS_OBJECT_POSITION,
        PropertyType::NumberLiteral {
            datatype: ThingId::new(classes::DECIMAL),
            min_inclusive: Some(min_inclusive),
            max_inclusive: Some(max_inclusive),
        },
    )
    .with_placeholder("value")
    .with_cardinality(Some(1), Some(1))
}

fn unit(pattern: &str) -> TemplatePropertyDefinition {
    TemplatePropertyDefinition::new(
        "unit",
        predicates::HAS_OBJECT_POSITION,
        PropertyType::StringLiteral { datatype: ThingId::new(classes::STRING), pattern: Some(pattern.into()) },
    )
    .with_placeholder("unit")
    .with_cardinality(Some(0), Some(1))
}

fn command(contributor: ContributorId, properties: Vec<TemplatePropertyDefinition>) -> CreateRosettaStoneTemplateCommand {
    CreateRosettaStoneTemplateCommand {
        contributor,
        label: "measured".into(),
        description: "a quantity measured in a study".into(),
        formatted_label: "{0} measured {1}[ {2}]".into(),
        example_usage: "The trial measured 0.95".into(),
        properties,
        observatories: vec![],
        organizations: vec![],
    }
}

// ============================================================================
// Create
// ============================================================================

#[test]
fn literal_positions_are_stored_as_shapes() {
    let graph = TestGraph::new();
    let templates = graph.templates();

    let id = templates
        .create(&command(graph.contributor, vec![subject(), quantity(0.0, 1.0), unit("^[a-z]+$")]))
        .unwrap();

    let template = templates.find_by_id(&id).unwrap().unwrap();
    let labels: Vec<_> = template.properties.iter().map(|p| p.definition.label.as_str()).collect();
    assert_eq!(labels, vec!["measurement", "value", "unit"]);
    assert_eq!(template.properties[2].definition.placeholder.as_deref(), Some("unit"));
    assert!(template.properties[1].definition.is_required());
    assert!(!template.properties[2].definition.is_required());
    assert_eq!(template.example_usage.as_deref(), Some("The trial measured 0.95"));
    for shape in &template.properties {
        assert!(graph.store.find_resource(&shape.id).unwrap().unwrap().has_class(classes::PROPERTY_SHAPE));
    }
}

#[test]
fn invalid_property_types_write_nothing() {
    let graph = TestGraph::new();
    let templates = graph.templates();

    let err = templates
        .create(&command(graph.contributor, vec![subject(), quantity(2.0, 1.0), unit("^[a-z]+$")]))
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidBounds { .. }));

    let err = templates
        .create(&command(graph.contributor, vec![subject(), quantity(0.0, 1.0), unit("([a-z")]))
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidRegexPattern(ref pattern) if pattern == "([a-z"));
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert!(graph.is_untouched());
}

#[test]
fn every_position_needs_a_label_placeholder() {
    let graph = TestGraph::new();
    let mut create = command(graph.contributor, vec![subject(), quantity(0.0, 1.0), unit("^[a-z]+$")]);
    create.formatted_label = "{0} measured {1}".into();

    let err = graph.templates().create(&create).unwrap_err();

    assert!(matches!(err, DomainError::MissingFormattedLabelPlaceholder(2)));
    assert!(graph.is_untouched());
}

// ============================================================================
// Templates in use
// ============================================================================

#[test]
fn instances_of_the_target_class_freeze_the_description() {
    let graph = TestGraph::new();
    let templates = graph.templates();
    let mut create = command(graph.contributor, vec![subject(), quantity(0.0, 1.0)]);
    create.formatted_label = "{0} measured {1}".into();
    let id = templates.create(&create).unwrap();
    let class = templates.find_by_id(&id).unwrap().unwrap().target_class.unwrap();

    let mut update = UpdateRosettaStoneTemplateCommand::new(id.clone(), graph.contributor);
    update.description = Some("a measured quantity".into());
    templates.update(&update).unwrap();

    graph
        .store
        .save_resource(&Resource::new(ThingId::new("RS1"), "The trial measured 0.95").with_class(class))
        .unwrap();
    graph.reset();

    update.description = Some("anything measured".into());
    let err = templates.update(&update).unwrap_err();
    assert!(matches!(
        err,
        DomainError::RosettaStoneTemplateInUseCantUpdateProperty { ref property, .. } if property == "description"
    ));

    let err = templates.delete(&id, graph.contributor).unwrap_err();
    assert!(matches!(err, DomainError::RosettaStoneTemplateInUse(_)));
    assert_eq!(err.kind(), ErrorKind::NotModifiable);
    assert!(graph.is_untouched());
}

#[test]
fn example_usage_may_only_be_extended_while_in_use() {
    let graph = TestGraph::new();
    let templates = graph.templates();
    let mut create = command(graph.contributor, vec![subject(), quantity(0.0, 1.0)]);
    create.formatted_label = "{0} measured {1}".into();
    let id = templates.create(&create).unwrap();
    let class = templates.find_by_id(&id).unwrap().unwrap().target_class.unwrap();
    graph
        .store
        .save_resource(&Resource::new(ThingId::new("RS1"), "statement").with_class(class))
        .unwrap();

    let mut update = UpdateRosettaStoneTemplateCommand::new(id.clone(), graph.contributor);
    update.example_usage = Some("The trial measured 0.95 on average".into());
    templates.update(&update).unwrap();

    assert_eq!(
        templates.find_by_id(&id).unwrap().unwrap().example_usage.as_deref(),
        Some("The trial measured 0.95 on average")
    );
}

#[test]
fn deleting_an_unknown_template_is_a_no_op() {
    let graph = TestGraph::new();

    graph.templates().delete(&ThingId::new("R404"), graph.contributor).unwrap();

    assert!(graph.is_untouched());
}
