//! Well-known predicate, class and datatype ids
//!
//! All composite structure is encoded as statements with these predicates,
//! and content types are recognized by these classes.

/// Predicate ids
pub mod predicates {
    pub const DESCRIPTION: &str = "description";
    pub const HAS_DOI: &str = "P26";
    pub const HAS_AUTHOR: &str = "hasAuthor";
    pub const HAS_RESEARCH_FIELD: &str = "P30";
    pub const HAS_SDG: &str = "sustainableDevelopmentGoal";
    pub const HAS_CONTRIBUTION: &str = "compareContribution";
    pub const REFERENCE: &str = "reference";
    pub const IS_ANONYMIZED: &str = "IsAnonymized";
    pub const HAS_RELATED_FIGURE: &str = "hasRelatedFigure";
    pub const HAS_RELATED_RESOURCE: &str = "hasRelatedResource";
    pub const HAS_VISUALIZATION: &str = "hasVisualization";
    pub const HAS_IMAGE: &str = "Image";
    pub const HAS_URL: &str = "url";
    pub const HAS_PUBLISHED_VERSION: &str = "hasPublishedVersion";
    pub const HAS_PREVIOUS_VERSION: &str = "hasPreviousVersion";
    pub const HAS_SECTION: &str = "HasSection";
    pub const HAS_ENTRY: &str = "HasEntry";
    pub const HAS_LINK: &str = "HasLink";
    pub const HAS_HEADING_LEVEL: &str = "HasHeadingLevel";
    pub const HAS_CONTENT: &str = "hasContent";
    pub const HAS_PROPERTY: &str = "sh:property";
    pub const SH_PATH: &str = "sh:path";
    pub const SH_MIN_COUNT: &str = "sh:minCount";
    pub const SH_MAX_COUNT: &str = "sh:maxCount";
    pub const SH_DATATYPE: &str = "sh:datatype";
    pub const SH_CLASS: &str = "sh:class";
    pub const SH_ORDER: &str = "sh:order";
    pub const SH_PATTERN: &str = "sh:pattern";
    pub const SH_MIN_INCLUSIVE: &str = "sh:minInclusive";
    pub const SH_MAX_INCLUSIVE: &str = "sh:maxInclusive";
    pub const PLACEHOLDER: &str = "placeholder";
    pub const TEMPLATE_LABEL_FORMAT: &str = "TemplateLabelFormat";
    pub const EXAMPLE_OF_USAGE: &str = "exampleOfUsage";
    pub const HAS_SUBJECT_POSITION: &str = "hasSubjectPosition";
    pub const HAS_OBJECT_POSITION: &str = "hasObjectPosition";
    pub const SH_TARGET_CLASS: &str = "sh:targetClass";
}

/// Class ids
pub mod classes {
    pub const THING: &str = "Thing";
    pub const RESOURCE: &str = "Resource";
    pub const LITERAL: &str = "Literal";
    pub const PREDICATE: &str = "Predicate";
    pub const CLASS: &str = "Class";
    pub const LIST: &str = "List";

    pub const COMPARISON: &str = "Comparison";
    pub const COMPARISON_PUBLISHED: &str = "ComparisonPublished";
    pub const COMPARISON_RELATED_FIGURE: &str = "ComparisonRelatedFigure";
    pub const COMPARISON_RELATED_RESOURCE: &str = "ComparisonRelatedResource";
    pub const LITERATURE_LIST: &str = "LiteratureList";
    pub const LITERATURE_LIST_PUBLISHED: &str = "LiteratureListPublished";
    pub const LIST_SECTION: &str = "ListSection";
    pub const TEXT_SECTION: &str = "TextSection";
    pub const ENTRY: &str = "Entry";
    pub const LATEST_VERSION: &str = "LatestVersion";
    pub const ROSETTA_NODE_SHAPE: &str = "RosettaNodeShape";
    pub const PROPERTY_SHAPE: &str = "PropertyShape";
    pub const ROSETTA_STONE_STATEMENT: &str = "RosettaStoneStatement";

    pub const PAPER: &str = "Paper";
    pub const DATASET: &str = "Dataset";
    pub const SOFTWARE: &str = "Software";
    pub const VISUALIZATION: &str = "Visualization";
    pub const CONTRIBUTION: &str = "Contribution";
    pub const RESEARCH_FIELD: &str = "ResearchField";
    pub const SDG: &str = "SustainableDevelopmentGoal";
    pub const AUTHOR: &str = "Author";
    pub const VENUE: &str = "Venue";

    pub const STRING: &str = "String";
    pub const INTEGER: &str = "Integer";
    pub const DECIMAL: &str = "Decimal";
    pub const FLOAT: &str = "Float";
    pub const BOOLEAN: &str = "Boolean";

    /// Classes that cannot be assigned to resources
    pub const RESERVED: &[&str] = &[THING, RESOURCE, LITERAL, PREDICATE, CLASS, LIST];

    pub fn is_reserved(id: &str) -> bool {
        RESERVED.contains(&id)
    }
}

/// XSD datatype URIs used on literals
pub mod literals {
    pub const XSD_STRING: &str = "xsd:string";
    pub const XSD_INT: &str = "xsd:int";
    pub const XSD_INTEGER: &str = "xsd:integer";
    pub const XSD_DECIMAL: &str = "xsd:decimal";
    pub const XSD_FLOAT: &str = "xsd:float";
    pub const XSD_BOOLEAN: &str = "xsd:boolean";
    pub const XSD_ANY_URI: &str = "xsd:anyURI";
}

/// Upper bound for labels and descriptions
pub const MAX_LABEL_LENGTH: usize = 8164;
