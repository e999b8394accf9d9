//! Template properties stored as `PropertyShape` resources

use super::validators::{validate_label, validate_optional_description};
use super::{create_literal_statement, link, GraphContext};
use crate::error::{DomainError, DomainResult};
use crate::graph::vocab::{classes, literals, predicates};
use crate::graph::{ContributorId, Statement, StatementSliceExt, StatementsBySubject, Thing, ThingId};
use crate::services::{CreateResourceCommand, ResourceUseCases};
use crate::storage::{ClassRepository, PredicateRepository};

const NUMBER_DATATYPES: [&str; 3] = [classes::INTEGER, classes::DECIMAL, classes::FLOAT];

/// What values a template property accepts
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyType {
    Untyped,
    StringLiteral { datatype: ThingId, pattern: Option<String> },
    NumberLiteral { datatype: ThingId, min_inclusive: Option<f64>, max_inclusive: Option<f64> },
    OtherLiteral { datatype: ThingId },
    Resource { class: ThingId },
}

impl PropertyType {
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            PropertyType::StringLiteral { .. } | PropertyType::NumberLiteral { .. } | PropertyType::OtherLiteral { .. }
        )
    }

    /// The form the type is read back as from its shape
    pub fn normalized(self) -> Self {
        match self {
            PropertyType::OtherLiteral { datatype } if datatype.as_str() == classes::STRING => {
                PropertyType::StringLiteral { datatype, pattern: None }
            }
            PropertyType::OtherLiteral { datatype } if NUMBER_DATATYPES.contains(&datatype.as_str()) => {
                PropertyType::NumberLiteral { datatype, min_inclusive: None, max_inclusive: None }
            }
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplatePropertyDefinition {
    pub label: String,
    pub placeholder: Option<String>,
    pub description: Option<String>,
    pub min_count: Option<i64>,
    /// `0` means unbounded
    pub max_count: Option<i64>,
    pub path: ThingId,
    pub kind: PropertyType,
}

impl TemplatePropertyDefinition {
    pub fn new(label: impl Into<String>, path: impl Into<ThingId>, kind: PropertyType) -> Self {
        Self {
            label: label.into(),
            placeholder: None,
            description: None,
            min_count: None,
            max_count: None,
            path: path.into(),
            kind,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_cardinality(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.min_count = min;
        self.max_count = max;
        self
    }

    pub fn is_required(&self) -> bool {
        self.min_count.is_some_and(|min| min > 0)
    }

    pub fn normalized(mut self) -> Self {
        self.kind = self.kind.normalized();
        self
    }
}

/// A stored property with the id of its shape resource
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyShape {
    pub id: ThingId,
    pub definition: TemplatePropertyDefinition,
}

pub fn validate_template_property(ctx: &GraphContext, property: &TemplatePropertyDefinition) -> DomainResult<()> {
    validate_label(&property.label, "label")?;
    if let Some(placeholder) = &property.placeholder {
        validate_label(placeholder, "placeholder")?;
    }
    validate_optional_description(property.description.as_deref(), "description")?;

    if let Some(min) = property.min_count.filter(|&min| min < 0) {
        return Err(DomainError::InvalidMinCount(min));
    }
    if let Some(max) = property.max_count.filter(|&max| max < 0) {
        return Err(DomainError::InvalidMaxCount(max));
    }
    if let (Some(min), Some(max)) = (property.min_count, property.max_count) {
        if max != 0 && max < min {
            return Err(DomainError::InvalidCardinality { min, max });
        }
    }
    if !ctx.repository.predicate_exists(&property.path)? {
        return Err(DomainError::PredicateNotFound(property.path.clone()));
    }

    match &property.kind {
        PropertyType::Untyped => {}
        PropertyType::StringLiteral { datatype, pattern } => {
            if datatype.as_str() != classes::STRING {
                return Err(DomainError::InvalidDataType {
                    actual: datatype.clone(),
                    expected: vec![ThingId::new(classes::STRING)],
                });
            }
            if let Some(pattern) = pattern {
                regex_lite::Regex::new(pattern).map_err(|_| DomainError::InvalidRegexPattern(pattern.clone()))?;
            }
        }
        PropertyType::NumberLiteral { datatype, min_inclusive, max_inclusive } => {
            if !NUMBER_DATATYPES.contains(&datatype.as_str()) {
                return Err(DomainError::InvalidDataType {
                    actual: datatype.clone(),
                    expected: NUMBER_DATATYPES.iter().map(|d| ThingId::new(*d)).collect(),
                });
            }
            if let (Some(min), Some(max)) = (min_inclusive, max_inclusive) {
                if min > max {
                    return Err(DomainError::InvalidBounds { min: min.to_string(), max: max.to_string() });
                }
            }
        }
        PropertyType::OtherLiteral { datatype: class } | PropertyType::Resource { class } => {
            if !ctx.repository.class_exists(class)? {
                return Err(DomainError::ClassNotFound(class.clone()));
            }
        }
    }
    Ok(())
}

/// Create the shape of `property` and attach it to `template` at `order`
pub fn create_property_shape(
    ctx: &GraphContext,
    contributor: ContributorId,
    template: &ThingId,
    order: usize,
    property: &TemplatePropertyDefinition,
) -> DomainResult<ThingId> {
    let shape = ctx.services.create_resource(
        CreateResourceCommand::new(contributor, property.label.clone()).with_class(classes::PROPERTY_SHAPE),
    )?;
    let integer = |predicate: &str, value: i64| {
        create_literal_statement(ctx, contributor, &shape, predicate, &value.to_string(), literals::XSD_INTEGER, None)
    };
    let string = |predicate: &str, value: &str| {
        create_literal_statement(ctx, contributor, &shape, predicate, value, literals::XSD_STRING, None)
    };

    link(ctx, contributor, &shape, predicates::SH_PATH, &property.path, None)?;
    integer(predicates::SH_ORDER, order as i64)?;
    if let Some(placeholder) = &property.placeholder {
        string(predicates::PLACEHOLDER, placeholder)?;
    }
    if let Some(description) = &property.description {
        string(predicates::DESCRIPTION, description)?;
    }
    if let Some(min) = property.min_count {
        integer(predicates::SH_MIN_COUNT, min)?;
    }
    if let Some(max) = property.max_count {
        integer(predicates::SH_MAX_COUNT, max)?;
    }

    match &property.kind {
        PropertyType::Untyped => {}
        PropertyType::StringLiteral { datatype, pattern } => {
            link(ctx, contributor, &shape, predicates::SH_DATATYPE, datatype, None)?;
            if let Some(pattern) = pattern {
                string(predicates::SH_PATTERN, pattern)?;
            }
        }
        PropertyType::NumberLiteral { datatype, min_inclusive, max_inclusive } => {
            link(ctx, contributor, &shape, predicates::SH_DATATYPE, datatype, None)?;
            for (predicate, bound) in [
                (predicates::SH_MIN_INCLUSIVE, min_inclusive),
                (predicates::SH_MAX_INCLUSIVE, max_inclusive),
            ] {
                if let Some(bound) = bound {
                    create_literal_statement(
                        ctx,
                        contributor,
                        &shape,
                        predicate,
                        &bound.to_string(),
                        literals::XSD_DECIMAL,
                        None,
                    )?;
                }
            }
        }
        PropertyType::OtherLiteral { datatype } => {
            link(ctx, contributor, &shape, predicates::SH_DATATYPE, datatype, None)?;
        }
        PropertyType::Resource { class } => {
            link(ctx, contributor, &shape, predicates::SH_CLASS, class, None)?;
        }
    }

    link(ctx, contributor, template, predicates::HAS_PROPERTY, &shape, Some(order as i64))?;
    Ok(shape)
}

/// Property shapes of `template`, ordered by `sh:order`
pub fn read_property_shapes(template: &ThingId, statements: &StatementsBySubject) -> Vec<PropertyShape> {
    let empty = Vec::new();
    let own = statements.get(template).unwrap_or(&empty);
    let mut shapes: Vec<(i64, PropertyShape)> = own
        .ordered_objects(predicates::HAS_PROPERTY)
        .into_iter()
        .filter_map(|shape| {
            let shape_statements = statements.get(shape.id()).unwrap_or(&empty);
            let property = read_definition(shape, shape_statements)?;
            let order = integer(shape_statements, predicates::SH_ORDER).unwrap_or(i64::MAX);
            Some((order, PropertyShape { id: shape.id().clone(), definition: property }))
        })
        .collect();
    shapes.sort_by_key(|(order, _)| *order);
    shapes.into_iter().map(|(_, shape)| shape).collect()
}

fn integer(statements: &[Statement], predicate: &str) -> Option<i64> {
    statements.first_object_label(predicate)?.parse().ok()
}

fn decimal(statements: &[Statement], predicate: &str) -> Option<f64> {
    statements.first_object_label(predicate)?.parse().ok()
}

fn first_object(statements: &[Statement], predicate: &str) -> Option<ThingId> {
    statements.object_ids(predicate).into_iter().next()
}

fn read_definition(shape: &Thing, statements: &[Statement]) -> Option<TemplatePropertyDefinition> {
    let Some(path) = first_object(statements, predicates::SH_PATH) else {
        tracing::warn!(shape = %shape.id(), "property shape without path, skipping");
        return None;
    };

    let kind = match (
        first_object(statements, predicates::SH_DATATYPE),
        first_object(statements, predicates::SH_CLASS),
    ) {
        (Some(datatype), _) if datatype.as_str() == classes::STRING => PropertyType::StringLiteral {
            datatype,
            pattern: statements.first_object_label(predicates::SH_PATTERN),
        },
        (Some(datatype), _) if NUMBER_DATATYPES.contains(&datatype.as_str()) => PropertyType::NumberLiteral {
            datatype,
            min_inclusive: decimal(statements, predicates::SH_MIN_INCLUSIVE),
            max_inclusive: decimal(statements, predicates::SH_MAX_INCLUSIVE),
        },
        (Some(datatype), _) => PropertyType::OtherLiteral { datatype },
        (None, Some(class)) => PropertyType::Resource { class },
        (None, None) => PropertyType::Untyped,
    };

    Some(TemplatePropertyDefinition {
        label: shape.label().to_string(),
        placeholder: statements.first_object_label(predicates::PLACEHOLDER),
        description: statements.first_object_label(predicates::DESCRIPTION),
        min_count: integer(statements, predicates::SH_MIN_COUNT),
        max_count: integer(statements, predicates::SH_MAX_COUNT),
        path,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{group_by_subject, Resource};
    use crate::services::seed_vocabulary;
    use crate::storage::{BundleConfiguration, OpenStore, ResourceRepository, SqliteGraph, StatementRepository};
    use std::sync::Arc;

    fn create_context() -> GraphContext {
        let store = Arc::new(SqliteGraph::open_in_memory().unwrap());
        seed_vocabulary(store.as_ref()).unwrap();
        GraphContext::over(store)
    }

    fn string_property() -> TemplatePropertyDefinition {
        TemplatePropertyDefinition::new(
            "name",
            predicates::DESCRIPTION,
            PropertyType::StringLiteral { datatype: ThingId::new(classes::STRING), pattern: Some("\\w+".into()) },
        )
        .with_placeholder("name")
        .with_cardinality(Some(1), Some(1))
    }

    #[test]
    fn valid_properties_pass() {
        let ctx = create_context();
        validate_template_property(&ctx, &string_property()).unwrap();
        let unbounded = string_property().with_cardinality(Some(3), Some(0));
        validate_template_property(&ctx, &unbounded).unwrap();
    }

    #[test]
    fn cardinality_rules() {
        let ctx = create_context();
        let err = validate_template_property(&ctx, &string_property().with_cardinality(Some(-1), None)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidMinCount(-1)));
        let err = validate_template_property(&ctx, &string_property().with_cardinality(None, Some(-2))).unwrap_err();
        assert!(matches!(err, DomainError::InvalidMaxCount(-2)));
        let err = validate_template_property(&ctx, &string_property().with_cardinality(Some(3), Some(2))).unwrap_err();
        assert!(matches!(err, DomainError::InvalidCardinality { min: 3, max: 2 }));
    }

    #[test]
    fn unknown_path_and_class_are_rejected() {
        let ctx = create_context();
        let mut property = string_property();
        property.path = ThingId::new("P404");
        assert!(matches!(
            validate_template_property(&ctx, &property),
            Err(DomainError::PredicateNotFound(id)) if id.as_str() == "P404"
        ));

        let property = TemplatePropertyDefinition::new(
            "thing",
            predicates::DESCRIPTION,
            PropertyType::Resource { class: ThingId::new("C404") },
        );
        assert!(matches!(validate_template_property(&ctx, &property), Err(DomainError::ClassNotFound(_))));
    }

    #[test]
    fn literal_types_are_checked() {
        let ctx = create_context();
        let mut property = string_property();
        property.kind = PropertyType::StringLiteral { datatype: ThingId::new(classes::INTEGER), pattern: None };
        assert!(matches!(validate_template_property(&ctx, &property), Err(DomainError::InvalidDataType { .. })));

        property.kind = PropertyType::StringLiteral { datatype: ThingId::new(classes::STRING), pattern: Some("(".into()) };
        assert!(matches!(validate_template_property(&ctx, &property), Err(DomainError::InvalidRegexPattern(_))));

        property.kind = PropertyType::NumberLiteral {
            datatype: ThingId::new(classes::STRING),
            min_inclusive: None,
            max_inclusive: None,
        };
        assert!(matches!(validate_template_property(&ctx, &property), Err(DomainError::InvalidDataType { .. })));

        property.kind = PropertyType::NumberLiteral {
            datatype: ThingId::new(classes::DECIMAL),
            min_inclusive: Some(5.0),
            max_inclusive: Some(1.5),
        };
        assert!(matches!(
            validate_template_property(&ctx, &property),
            Err(DomainError::InvalidBounds { min, max }) if min == "5" && max == "1.5"
        ));
    }

    #[test]
    fn shapes_read_back_in_order() {
        let ctx = create_context();
        let template = ThingId::new("T1");
        ctx.repository
            .save_resource(&Resource::new(template.clone(), "template").with_class(classes::ROSETTA_NODE_SHAPE))
            .unwrap();
        let properties = vec![
            string_property(),
            TemplatePropertyDefinition::new(
                "amount",
                predicates::HAS_URL,
                PropertyType::NumberLiteral {
                    datatype: ThingId::new(classes::INTEGER),
                    min_inclusive: Some(1.0),
                    max_inclusive: Some(10.5),
                },
            )
            .with_description("how many"),
            TemplatePropertyDefinition::new(
                "paper",
                predicates::REFERENCE,
                PropertyType::Resource { class: ThingId::new(classes::PAPER) },
            ),
        ];
        for (order, property) in properties.iter().enumerate() {
            create_property_shape(&ctx, ContributorId::UNKNOWN, &template, order, property).unwrap();
        }

        let bundle = ctx
            .repository
            .fetch_as_bundle(&template, &BundleConfiguration::new().with_max_level(2))
            .unwrap();
        let shapes = read_property_shapes(&template, &group_by_subject(bundle));
        let read: Vec<_> = shapes.into_iter().map(|s| s.definition).collect();
        assert_eq!(read, properties);
    }

    #[test]
    fn other_literal_of_string_reads_as_string() {
        let kind = PropertyType::OtherLiteral { datatype: ThingId::new(classes::STRING) }.normalized();
        assert_eq!(kind, PropertyType::StringLiteral { datatype: ThingId::new(classes::STRING), pattern: None });
        assert!(kind.is_literal());
        assert!(!PropertyType::Untyped.is_literal());
    }
}
