//! Domain errors raised by services and action pipelines

use crate::graph::{vocab::MAX_LABEL_LENGTH, ContributorId, StatementId, ThingId};
use crate::storage::StorageError;
use thiserror::Error;

/// Coarse classification of a [`DomainError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    NotModifiable,
    Validation,
    Conflict,
    PermissionDenied,
    Internal,
}

fn join_ids(ids: &[ThingId]) -> String {
    ids.iter()
        .map(|id| format!("\"{}\"", id))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Every failure a use case or pipeline step can report
#[derive(Debug, Error)]
pub enum DomainError {
    // --- not found ---
    #[error("Resource \"{0}\" not found.")]
    ResourceNotFound(ThingId),
    #[error("Literal \"{0}\" not found.")]
    LiteralNotFound(ThingId),
    #[error("Predicate \"{0}\" not found.")]
    PredicateNotFound(ThingId),
    #[error("Class \"{0}\" not found.")]
    ClassNotFound(ThingId),
    #[error("Thing \"{0}\" not found.")]
    ThingNotFound(ThingId),
    #[error("Statement \"{0}\" not found.")]
    StatementNotFound(StatementId),
    #[error("Comparison \"{0}\" not found.")]
    ComparisonNotFound(ThingId),
    #[error("Comparison related resource \"{0}\" not found.")]
    ComparisonRelatedResourceNotFound(ThingId),
    #[error("Comparison related figure \"{0}\" not found.")]
    ComparisonRelatedFigureNotFound(ThingId),
    #[error("Literature list \"{0}\" not found.")]
    LiteratureListNotFound(ThingId),
    #[error("Literature list section \"{0}\" not found.")]
    LiteratureListSectionNotFound(ThingId),
    #[error("Rosetta stone template \"{0}\" not found.")]
    RosettaStoneTemplateNotFound(ThingId),
    #[error("Research field \"{0}\" not found.")]
    ResearchFieldNotFound(ThingId),
    #[error("Sustainable Development Goal \"{0}\" not found.")]
    SustainableDevelopmentGoalNotFound(ThingId),
    #[error("Author \"{0}\" not found.")]
    AuthorNotFound(ThingId),
    #[error("Contribution \"{0}\" not found.")]
    ContributionNotFound(ThingId),
    #[error("Subject \"{0}\" not found.")]
    StatementSubjectNotFound(ThingId),
    #[error("Predicate \"{0}\" not found.")]
    StatementPredicateNotFound(ThingId),
    #[error("Object \"{0}\" not found.")]
    StatementObjectNotFound(ThingId),

    // --- not modifiable ---
    #[error("Resource \"{0}\" is not modifiable.")]
    ResourceNotModifiable(ThingId),
    #[error("Literal \"{0}\" is not modifiable.")]
    LiteralNotModifiable(ThingId),
    #[error("Predicate \"{0}\" is not modifiable.")]
    PredicateNotModifiable(ThingId),
    #[error("Class \"{0}\" is not modifiable.")]
    ClassNotModifiable(ThingId),
    #[error("Statement \"{0}\" is not modifiable.")]
    StatementNotModifiable(StatementId),
    #[error("Comparison \"{0}\" is not modifiable.")]
    ComparisonNotModifiable(ThingId),
    #[error("Comparison related resource \"{0}\" is not modifiable.")]
    ComparisonRelatedResourceNotModifiable(ThingId),
    #[error("Comparison related figure \"{0}\" is not modifiable.")]
    ComparisonRelatedFigureNotModifiable(ThingId),
    #[error("Literature list \"{0}\" is not modifiable.")]
    LiteratureListNotModifiable(ThingId),
    #[error("Rosetta stone template \"{0}\" is not modifiable.")]
    RosettaStoneTemplateNotModifiable(ThingId),
    #[error("Rosetta stone template property \"{0}\" is not modifiable.")]
    RosettaStoneTemplatePropertyNotModifiable(ThingId),
    #[error("Comparison \"{0}\" is already published.")]
    ComparisonAlreadyPublished(ThingId),
    #[error("Literature list \"{0}\" is already published.")]
    LiteratureListAlreadyPublished(ThingId),
    #[error("Unable to delete rosetta stone template \"{0}\" because it is used in at least one (rosetta stone) statement.")]
    RosettaStoneTemplateInUse(ThingId),
    #[error("Unable to update property \"{property}\" of rosetta stone template \"{id}\" because it is used in at least one rosetta stone statement.")]
    RosettaStoneTemplateInUseCantUpdateProperty { id: ThingId, property: String },

    // --- permission ---
    #[error("Contributor <{0}> does not own the entity to be deleted and is not a curator.")]
    NeitherOwnerNorCurator(ContributorId),

    // --- graph rules ---
    #[error("A label must not be blank or contain newlines and must be at most {max} characters long.", max = MAX_LABEL_LENGTH)]
    InvalidLabel { property: String },
    #[error("A description must not be blank and must be at most {max} characters long.", max = MAX_LABEL_LENGTH)]
    InvalidDescription { property: String },
    #[error("Class \"{0}\" is reserved and therefore cannot be set.")]
    ReservedClass(ThingId),
    #[error("Resource \"{0}\" already exists.")]
    ResourceAlreadyExists(ThingId),
    #[error("Thing \"{0}\" already exists.")]
    ThingAlreadyExists(ThingId),
    #[error("Statement \"{0}\" already exists.")]
    StatementAlreadyExists(StatementId),
    #[error("The collection of classes contains one or more invalid classes: {}.", join_ids(.0))]
    InvalidClassCollection(Vec<ThingId>),
    #[error("Unable to delete resource \"{0}\" because it is used in at least one statement.")]
    ResourceUsedInStatement(ThingId),
    #[error("Invalid statement subject \"{0}\".")]
    InvalidStatementSubject(ThingId),
    #[error("The URI <{uri}> is already assigned to class with ID \"{id}\".")]
    DuplicateUri { uri: String, id: ThingId },
    #[error("Thing \"{0}\" is not a class.")]
    ThingIsNotAClass(ThingId),
    #[error("The class \"{child}\" cannot be a subclass of \"{parent}\".")]
    InvalidSubclassRelation { child: ThingId, parent: ThingId },
    #[error("The class \"{child}\" already has a parent class ({parent}).")]
    ParentClassAlreadyExists { child: ThingId, parent: ThingId },
    #[error("The class \"{0}\" already has a child classes.")]
    ParentClassAlreadyHasChildren(ThingId),

    // --- content types ---
    #[error("Ony one research field is allowed.")]
    OnlyOneResearchFieldAllowed,
    #[error("Ony one organization is allowed.")]
    OnlyOneOrganizationAllowed,
    #[error("Ony one observatory is allowed.")]
    OnlyOneObservatoryAllowed,
    #[error("At least two contributions are required.")]
    RequiresAtLeastTwoContributions,
    #[error("Description must not be blank when assigning a DOI.")]
    DescriptionRequiredForDoi,
    #[error("Invalid list section entry \"{id}\". Must be an instance of either {}.", join_ids(.expected))]
    InvalidListSectionEntry { id: ThingId, expected: Vec<ThingId> },
    #[error("Invalid heading size \"{0}\". Must be at least 1.")]
    InvalidHeadingSize(i64),
    #[error("Literature list section \"{section}\" does not belong to literature list \"{list}\".")]
    UnrelatedLiteratureListSection { list: ThingId, section: ThingId },
    #[error("Invalid literature list section type. Must be a text section.")]
    LiteratureListSectionTypeMismatchMustBeText,
    #[error("Invalid literature list section type. Must be a list section.")]
    LiteratureListSectionTypeMismatchMustBeList,

    // --- template properties ---
    #[error("Invalid min count \"{0}\". Must be at least 0.")]
    InvalidMinCount(i64),
    #[error("Invalid max count \"{0}\". Must be at least 0.")]
    InvalidMaxCount(i64),
    #[error("Invalid cardinality. Min count must be less than max count. Found: min: \"{min}\", max: \"{max}\".")]
    InvalidCardinality { min: i64, max: i64 },
    #[error("Invalid bounds. Min bound must be less than or equal to max bound. Found: min: \"{min}\", max: \"{max}\".")]
    InvalidBounds { min: String, max: String },
    #[error("Invalid datatype. Found \"{actual}\", expected either of {}.", join_ids(.expected))]
    InvalidDataType { actual: ThingId, expected: Vec<ThingId> },
    #[error("Invalid regex pattern \"{0}\".")]
    InvalidRegexPattern(String),
    #[error("Missing placeholder for property at index \"{0}\".")]
    MissingPropertyPlaceholder(usize),

    // --- rosetta stone templates ---
    #[error("Invalid subject position cardinality. Minimum cardinality must be at least one.")]
    InvalidSubjectPositionCardinality,
    #[error("Invalid subject position type. Subject position must not be a literal property.")]
    InvalidSubjectPositionType,
    #[error("Invalid subject position path. Must be \"hasSubjectPosition\".")]
    InvalidSubjectPositionPath,
    #[error("Invalid object position path for property at index \"{0}\". Must be \"hasObjectPosition\".")]
    InvalidObjectPositionPath(usize),
    #[error("Missing subject position. There must be at least one property with path \"hasSubjectPosition\" that has a minimum cardinality of at least one.")]
    MissingSubjectPosition,
    #[error("Too many subject positions. There must be exactly one property with path \"hasSubjectPosition\".")]
    TooManySubjectPositions,
    #[error("Missing required object position. There must be at least one property with path \"hasObjectPosition\" that has a minimum cardinality of at least one.")]
    MissingRequiredObjectPosition,
    #[error("Missing formatted label placeholder \"{{{0}}}\".")]
    MissingFormattedLabelPlaceholder(usize),
    #[error("Formatted label placeholder \"{{{0}}}\" does not refer to a template property.")]
    UnknownFormattedLabelPlaceholder(usize),
    #[error("The updated formatted label must start with the previous label.")]
    LabelMustStartWithPreviousVersion,
    #[error("Too many new formatted label sections. Must be exactly one optional section per new template property.")]
    TooManyNewLabelSections,
    #[error("The formatted label can only be updated in combination with the addition of new template properties.")]
    LabelUpdateRequiresNewTemplateProperties,
    #[error("New sections of the formatted label must be optional.")]
    NewLabelSectionsMustBeOptional,
    #[error("The formatted label must be updated when updating template properties.")]
    LabelMustBeUpdated,
    #[error("New example usage must start with the previous example usage.")]
    NewExampleUsageMustStartWithPreviousExampleUsage,
    #[error("New rosetta stone template property \"{0}\" must be optional.")]
    NewPropertyMustBeOptional(String),

    // --- infrastructure ---
    #[error("DOI registration failed: {0}")]
    DoiRegistration(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        use DomainError::*;
        match self {
            ResourceNotFound(_)
            | LiteralNotFound(_)
            | PredicateNotFound(_)
            | ClassNotFound(_)
            | ThingNotFound(_)
            | StatementNotFound(_)
            | ComparisonNotFound(_)
            | ComparisonRelatedResourceNotFound(_)
            | ComparisonRelatedFigureNotFound(_)
            | LiteratureListNotFound(_)
            | LiteratureListSectionNotFound(_)
            | RosettaStoneTemplateNotFound(_)
            | ResearchFieldNotFound(_)
            | SustainableDevelopmentGoalNotFound(_)
            | AuthorNotFound(_)
            | ContributionNotFound(_)
            | StatementSubjectNotFound(_)
            | StatementPredicateNotFound(_)
            | StatementObjectNotFound(_) => ErrorKind::NotFound,

            ResourceNotModifiable(_)
            | LiteralNotModifiable(_)
            | PredicateNotModifiable(_)
            | ClassNotModifiable(_)
            | StatementNotModifiable(_)
            | ComparisonNotModifiable(_)
            | ComparisonRelatedResourceNotModifiable(_)
            | ComparisonRelatedFigureNotModifiable(_)
            | LiteratureListNotModifiable(_)
            | RosettaStoneTemplateNotModifiable(_)
            | RosettaStoneTemplatePropertyNotModifiable(_)
            | ComparisonAlreadyPublished(_)
            | LiteratureListAlreadyPublished(_)
            | RosettaStoneTemplateInUse(_)
            | RosettaStoneTemplateInUseCantUpdateProperty { .. } => ErrorKind::NotModifiable,

            NeitherOwnerNorCurator(_) => ErrorKind::PermissionDenied,

            Storage(StorageError::Conflict { .. }) => ErrorKind::Conflict,
            Storage(_) | DoiRegistration(_) => ErrorKind::Internal,

            _ => ErrorKind::Validation,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Result type for use cases and pipeline steps
pub type DomainResult<T> = Result<T, DomainError>;
