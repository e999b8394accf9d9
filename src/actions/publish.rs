//! Publishing: immutable versions chained to their predecessors
//!
//! A published version is a resource carrying the published marker class of
//! its content type. It receives unmodifiable copies of the root's direct
//! statements (except descriptions: the version's own description is its
//! changelog), an archived snapshot of the root's bundle, and is linked from
//! the root via `hasPublishedVersion`. The newest version carries
//! `LatestVersion` and points at its predecessor with `hasPreviousVersion`.

use super::validators::RootKind;
use super::{create_literal_statement, link, GraphContext};
use crate::doi::{Doi, DoiMetadata, DoiService};
use crate::error::{DomainError, DomainResult};
use crate::graph::vocab::{classes, literals, predicates};
use crate::graph::{ContributorId, Resource, Statement, StatementsBySubject, ThingId};
use crate::services::{CreateResourceCommand, CreateStatementCommand, ResourceUseCases, StatementUseCases};
use crate::storage::{PublishedContent, ResourceRepository};

/// What to publish
pub struct VersionRequest<'a> {
    pub kind: RootKind,
    pub root: &'a Resource,
    /// Bundle of the root, grouped by subject
    pub statements: &'a StatementsBySubject,
    pub changelog: Option<&'a str>,
}

impl VersionRequest<'_> {
    fn direct_statements(&self) -> &[Statement] {
        self.statements.get(&self.root.id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The version currently marked as latest
    fn latest_version(&self) -> Option<ThingId> {
        self.direct_statements()
            .iter()
            .filter(|s| s.predicate.id.as_str() == predicates::HAS_PUBLISHED_VERSION)
            .find(|s| s.object.has_class(classes::LATEST_VERSION))
            .map(|s| s.object_id().clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedVersion {
    pub id: ThingId,
    pub previous: Option<ThingId>,
}

/// Create the version resource and copy the root's direct statements onto it
///
/// The former latest version loses its `LatestVersion` class.
pub fn create_version(
    ctx: &GraphContext,
    contributor: ContributorId,
    request: &VersionRequest<'_>,
) -> DomainResult<PublishedVersion> {
    let previous = request.latest_version();
    let id = ctx.services.create_resource(CreateResourceCommand {
        modifiable: false,
        ..CreateResourceCommand::new(contributor, request.root.label.clone())
            .with_classes([request.kind.published_class, classes::LATEST_VERSION])
            .with_observatory(request.root.observatory_id)
            .with_organization(request.root.organization_id)
            .with_extraction_method(request.root.extraction_method)
    })?;

    for statement in request.direct_statements() {
        if matches!(
            statement.predicate.id.as_str(),
            predicates::HAS_PUBLISHED_VERSION | predicates::DESCRIPTION
        ) {
            continue;
        }
        let mut command = CreateStatementCommand::new(
            contributor,
            id.clone(),
            statement.predicate.id.clone(),
            statement.object_id().clone(),
        );
        command.index = statement.index;
        command.modifiable = false;
        ctx.services.add_statement(command)?;
    }

    // Versions are unmodifiable, so the marker is cleared below the use cases
    if let Some(previous) = &previous {
        if let Some(mut resource) = ctx.repository.find_resource(previous)? {
            resource.classes.remove(&ThingId::new(classes::LATEST_VERSION));
            ctx.repository.save_resource(&resource)?;
        }
    }

    tracing::info!(root = %request.root.id, version = %id, previous = ?previous, "created published version");
    Ok(PublishedVersion { id, previous })
}

/// Store the frozen bundle of the root under the version id
pub fn archive(ctx: &GraphContext, request: &VersionRequest<'_>, version: &PublishedVersion) -> DomainResult<()> {
    let mut subgraph: Vec<Statement> = request.statements.values().flatten().cloned().collect();
    subgraph.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    ctx.repository.save_published(&PublishedContent {
        id: version.id.clone(),
        root_id: request.root.id.clone(),
        subgraph,
    })?;
    Ok(())
}

/// Link the version into the history of the root
pub fn link_version(
    ctx: &GraphContext,
    contributor: ContributorId,
    request: &VersionRequest<'_>,
    version: &PublishedVersion,
) -> DomainResult<()> {
    link(ctx, contributor, &request.root.id, predicates::HAS_PUBLISHED_VERSION, &version.id, None)?;
    if let Some(changelog) = request.changelog {
        create_literal_statement(
            ctx,
            contributor,
            &version.id,
            predicates::DESCRIPTION,
            changelog,
            literals::XSD_STRING,
            None,
        )?;
    }
    if let Some(previous) = &version.previous {
        link(ctx, contributor, &version.id, predicates::HAS_PREVIOUS_VERSION, previous, None)?;
    }
    Ok(())
}

/// Register a DOI for the version, then record it with a `hasDOI` literal
///
/// The registration cannot be undone. When recording it fails, the DOI
/// stays registered and the error is returned.
pub fn publish_doi(
    ctx: &GraphContext,
    doi_service: &dyn DoiService,
    contributor: ContributorId,
    version: &ThingId,
    metadata: &DoiMetadata,
) -> DomainResult<Doi> {
    let doi = doi_service
        .register(metadata)
        .map_err(|e| DomainError::DoiRegistration(e.to_string()))?;
    let recorded = create_literal_statement(
        ctx,
        contributor,
        version,
        predicates::HAS_DOI,
        doi.as_str(),
        literals::XSD_STRING,
        None,
    );
    if let Err(e) = recorded {
        tracing::warn!(%doi, %version, error = %e, "DOI registered but not recorded");
        return Err(e);
    }
    Ok(doi)
}
