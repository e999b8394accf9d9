//! Content types: composite entities projected from statement subgraphs
//!
//! A content type has no row of its own. Reads hydrate it from the bundle of
//! statements reachable from its root resource; writes run step pipelines
//! that translate commands into statement and resource mutations.

mod comparison;
mod literature_list;
mod rosetta;

pub use comparison::{
    Comparison, ComparisonRelatedFigure, ComparisonRelatedResource, ComparisonService,
    CreateComparisonCommand, CreateRelatedFigureCommand, CreateRelatedResourceCommand,
    PublishComparisonCommand, UpdateComparisonCommand, UpdateRelatedFigureCommand,
    UpdateRelatedResourceCommand,
};
pub use literature_list::{
    CreateLiteratureListCommand, CreateSectionCommand, LiteratureList, LiteratureListSection,
    LiteratureListService, PublishLiteratureListCommand, SectionDefinition, UpdateLiteratureListCommand,
    UpdateSectionCommand,
};
pub use rosetta::{
    CreateRosettaStoneTemplateCommand, DeleteRosettaStoneTemplateCommand, RosettaStoneTemplate, RosettaStoneTemplateService,
    UpdateRosettaStoneTemplateCommand,
};

use crate::actions::GraphContext;
use crate::error::DomainResult;
use crate::graph::vocab::{classes, predicates};
use crate::graph::{group_by_subject, Statement, StatementSliceExt, StatementsBySubject, Thing, ThingId};
use crate::storage::{BundleConfiguration, PageRequest, StatementFilter, StatementRepository};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Id and label of a referenced node
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectIdAndLabel {
    pub id: ThingId,
    pub label: String,
}

impl From<&Thing> for ObjectIdAndLabel {
    fn from(thing: &Thing) -> Self {
        Self { id: thing.id().clone(), label: thing.label().to_string() }
    }
}

/// A published version as listed on its root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub id: ThingId,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub changelog: Option<String>,
}

/// Published versions of `root`, newest first
pub(crate) fn read_versions(root: &ThingId, statements: &StatementsBySubject) -> Vec<VersionInfo> {
    let empty = Vec::new();
    let mut versions: Vec<VersionInfo> = statements
        .get(root)
        .unwrap_or(&empty)
        .where_predicate(predicates::HAS_PUBLISHED_VERSION)
        .into_iter()
        .filter_map(|s| s.object.as_resource())
        .map(|version| VersionInfo {
            id: version.id.clone(),
            label: version.label.clone(),
            created_at: version.created_at,
            changelog: statements
                .get(&version.id)
                .and_then(|own| own.first_object_label(predicates::DESCRIPTION)),
        })
        .collect();
    versions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    versions
}

/// Referenced nodes of a predicate, in statement order
pub(crate) fn objects(statements: &[Statement], predicate: &str) -> Vec<ObjectIdAndLabel> {
    statements
        .ordered_objects(predicate)
        .into_iter()
        .map(ObjectIdAndLabel::from)
        .collect()
}

/// Literal values of a predicate, in statement order
pub(crate) fn literal_values(statements: &[Statement], predicate: &str) -> Vec<String> {
    statements
        .ordered_objects(predicate)
        .into_iter()
        .filter(|thing| thing.is_literal())
        .map(|thing| thing.label().to_string())
        .collect()
}

/// Version resources of `root` with their own statements
pub(crate) fn load_versions(
    ctx: &GraphContext,
    root: &ThingId,
    published_class: &str,
) -> DomainResult<StatementsBySubject> {
    let configuration = BundleConfiguration::new()
        .with_max_level(2)
        .with_whitelist([published_class, classes::LITERAL]);
    let statements = ctx.repository.fetch_as_bundle(root, &configuration)?;
    Ok(group_by_subject(statements.into_iter().filter(|s| {
        s.subject_id() != root || s.predicate.id.as_str() == predicates::HAS_PUBLISHED_VERSION
    })))
}

/// The root's snapshot, without the links to its versions
pub(crate) fn snapshot_statements(subgraph: Vec<Statement>) -> StatementsBySubject {
    group_by_subject(
        subgraph
            .into_iter()
            .filter(|s| s.predicate.id.as_str() != predicates::HAS_PUBLISHED_VERSION),
    )
}

/// The DOI recorded on a published version
pub(crate) fn find_doi(ctx: &GraphContext, version: &ThingId) -> DomainResult<Option<String>> {
    let filter = StatementFilter::new()
        .with_subject(version.clone())
        .with_predicate(predicates::HAS_DOI);
    let found = ctx.repository.find_statements(&filter, &PageRequest::single())?;
    Ok(found.content.first().map(|s| s.object.label().to_string()))
}

/// DOIs of the earlier versions listed in `versions`
pub(crate) fn previous_dois(versions: &[VersionInfo], statements: &StatementsBySubject) -> Vec<String> {
    versions
        .iter()
        .filter_map(|v| statements.get(&v.id))
        .filter_map(|own| own.first_object_label(predicates::HAS_DOI))
        .collect()
}
