//! Comparisons of research contributions

use super::{
    find_doi, literal_values, load_versions, objects, previous_dois, read_versions, snapshot_statements,
    ObjectIdAndLabel, VersionInfo,
};
use crate::actions::{
    archive, bind, create_literal_statement, delete_child, execute, find_unpublished, link, publish_doi,
    read_authors, update_authors, update_literal_list, update_object_set, update_optional_literal,
    validate_description, validate_label, validate_optional_description, validate_single, validate_things,
    Author, ChildDeletion, GraphContext, PublishedVersion, RootKind, Steps, VersionRequest,
};
use crate::config::PublishingConfig;
use crate::doi::{Doi, DoiMetadata, DoiService};
use crate::error::{DomainError, DomainResult};
use crate::graph::vocab::{classes, literals, predicates};
use crate::graph::{
    group_by_subject, ContributorId, ExtractionMethod, ObservatoryId, OrganizationId, Resource, Statement,
    StatementSliceExt, StatementsBySubject, Thing, ThingId, Visibility,
};
use crate::services::{CreateResourceCommand, ResourceUseCases, UpdateResourceCommand};
use crate::storage::{
    BundleConfiguration, PageRequest, PublishedContentRepository, ResourceRepository, StatementFilter,
    StatementRepository,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Classes not traversed when loading a comparison; their instances are
/// loaded one level deep instead
const SHALLOW: [&str; 6] = [
    classes::RESEARCH_FIELD,
    classes::CONTRIBUTION,
    classes::VISUALIZATION,
    classes::COMPARISON_RELATED_FIGURE,
    classes::COMPARISON_RELATED_RESOURCE,
    classes::SDG,
];

const PUBLISHED: RootKind = RootKind {
    not_modifiable: DomainError::ComparisonAlreadyPublished,
    ..RootKind::COMPARISON
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub id: ThingId,
    pub title: String,
    pub description: Option<String>,
    pub research_fields: Vec<ObjectIdAndLabel>,
    pub authors: Vec<Author>,
    pub sustainable_development_goals: Vec<ObjectIdAndLabel>,
    pub contributions: Vec<ObjectIdAndLabel>,
    pub visualizations: Vec<ObjectIdAndLabel>,
    pub related_figures: Vec<ObjectIdAndLabel>,
    pub related_resources: Vec<ObjectIdAndLabel>,
    pub references: Vec<String>,
    pub is_anonymized: bool,
    pub versions: Vec<VersionInfo>,
    pub doi: Option<String>,
    pub observatory_id: ObservatoryId,
    pub organization_id: OrganizationId,
    pub extraction_method: ExtractionMethod,
    pub visibility: Visibility,
    pub created_by: ContributorId,
    pub created_at: DateTime<Utc>,
    pub published: bool,
}

impl Comparison {
    /// Fold the statements of `root` into a comparison with the id and metadata of `resource`
    fn from_graph(resource: &Resource, root: &ThingId, statements: &StatementsBySubject) -> Self {
        let own: &[Statement] = statements.get(root).map(Vec::as_slice).unwrap_or(&[]);
        Self {
            id: resource.id.clone(),
            title: resource.label.clone(),
            description: own.first_object_label(predicates::DESCRIPTION),
            research_fields: objects(own, predicates::HAS_RESEARCH_FIELD),
            authors: read_authors(own),
            sustainable_development_goals: objects(own, predicates::HAS_SDG),
            contributions: objects(own, predicates::HAS_CONTRIBUTION),
            visualizations: objects(own, predicates::HAS_VISUALIZATION),
            related_figures: objects(own, predicates::HAS_RELATED_FIGURE),
            related_resources: objects(own, predicates::HAS_RELATED_RESOURCE),
            references: literal_values(own, predicates::REFERENCE),
            is_anonymized: own.first_object_label(predicates::IS_ANONYMIZED).as_deref() == Some("true"),
            versions: read_versions(root, statements),
            doi: own.first_object_label(predicates::HAS_DOI),
            observatory_id: resource.observatory_id,
            organization_id: resource.organization_id,
            extraction_method: resource.extraction_method,
            visibility: resource.visibility,
            created_by: resource.created_by,
            created_at: resource.created_at,
            published: resource.has_class(classes::COMPARISON_PUBLISHED),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRelatedResource {
    pub id: ThingId,
    pub label: String,
    pub image: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub created_by: ContributorId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRelatedFigure {
    pub id: ThingId,
    pub label: String,
    pub image: Option<String>,
    pub description: Option<String>,
    pub created_by: ContributorId,
    pub created_at: DateTime<Utc>,
}

// === Commands ===

#[derive(Debug, Clone, PartialEq)]
pub struct CreateComparisonCommand {
    pub contributor: ContributorId,
    pub title: String,
    pub description: String,
    pub research_fields: Vec<ThingId>,
    pub authors: Vec<Author>,
    pub sustainable_development_goals: Vec<ThingId>,
    pub observatories: Vec<ObservatoryId>,
    pub organizations: Vec<OrganizationId>,
    pub contributions: Vec<ThingId>,
    pub references: Vec<String>,
    pub is_anonymized: bool,
    pub extraction_method: ExtractionMethod,
}

/// Partial update; `None` leaves a field as it is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateComparisonCommand {
    pub id: ThingId,
    pub contributor: ContributorId,
    pub title: Option<String>,
    pub description: Option<String>,
    pub research_fields: Option<Vec<ThingId>>,
    pub authors: Option<Vec<Author>>,
    pub sustainable_development_goals: Option<Vec<ThingId>>,
    pub observatories: Option<Vec<ObservatoryId>>,
    pub organizations: Option<Vec<OrganizationId>>,
    pub contributions: Option<Vec<ThingId>>,
    pub references: Option<Vec<String>>,
    pub is_anonymized: Option<bool>,
    pub extraction_method: Option<ExtractionMethod>,
    pub visibility: Option<Visibility>,
}

impl UpdateComparisonCommand {
    pub fn new(id: impl Into<ThingId>, contributor: ContributorId) -> Self {
        Self { id: id.into(), contributor, ..Self::default() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishComparisonCommand {
    pub id: ThingId,
    pub contributor: ContributorId,
    /// Changelog of the version, also the description of its DOI
    pub description: Option<String>,
    pub authors: Vec<Author>,
    pub assign_doi: bool,
}

impl PublishComparisonCommand {
    /// The description unless blank
    fn changelog(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateRelatedResourceCommand {
    pub comparison_id: ThingId,
    pub contributor: ContributorId,
    pub label: String,
    pub image: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateRelatedResourceCommand {
    pub comparison_id: ThingId,
    pub id: ThingId,
    pub contributor: ContributorId,
    pub label: Option<String>,
    pub image: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateRelatedFigureCommand {
    pub comparison_id: ThingId,
    pub contributor: ContributorId,
    pub label: String,
    pub image: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateRelatedFigureCommand {
    pub comparison_id: ThingId,
    pub id: ThingId,
    pub contributor: ContributorId,
    pub label: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
}

// === Pipeline states ===

#[derive(Debug, Default)]
pub struct CreateComparisonState {
    comparison_id: Option<ThingId>,
}

impl CreateComparisonState {
    fn id(&self) -> DomainResult<&ThingId> {
        self.comparison_id
            .as_ref()
            .ok_or_else(|| DomainError::ResourceNotFound(ThingId::new("comparison")))
    }
}

#[derive(Debug, Default)]
pub struct UpdateComparisonState {
    root: Option<Resource>,
    statements: StatementsBySubject,
}

impl UpdateComparisonState {
    fn root(&self, command_id: &ThingId) -> DomainResult<&Resource> {
        self.root.as_ref().ok_or_else(|| DomainError::ComparisonNotFound(command_id.clone()))
    }

    fn own_statements(&self, id: &ThingId) -> &[Statement] {
        self.statements.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Default)]
pub struct PublishComparisonState {
    root: Option<Resource>,
    statements: StatementsBySubject,
    comparison: Option<Comparison>,
    version: Option<PublishedVersion>,
    doi: Option<Doi>,
}

impl PublishComparisonState {
    fn root(&self, command_id: &ThingId) -> DomainResult<&Resource> {
        self.root.as_ref().ok_or_else(|| DomainError::ComparisonNotFound(command_id.clone()))
    }

    fn version(&self, command_id: &ThingId) -> DomainResult<&PublishedVersion> {
        self.version.as_ref().ok_or_else(|| DomainError::ComparisonNotFound(command_id.clone()))
    }
}

// === Service ===

pub struct ComparisonService {
    ctx: GraphContext,
    doi_service: Arc<dyn DoiService>,
    publishing: PublishingConfig,
}

impl ComparisonService {
    pub fn new(ctx: GraphContext, doi_service: Arc<dyn DoiService>, publishing: PublishingConfig) -> Self {
        Self { ctx, doi_service, publishing }
    }

    /// A comparison or one of its published versions
    pub fn find_by_id(&self, id: &ThingId) -> DomainResult<Option<Comparison>> {
        let Some(resource) = self.ctx.repository.find_resource(id)? else {
            return Ok(None);
        };
        if resource.has_class(classes::COMPARISON_PUBLISHED) {
            let published = self
                .ctx
                .repository
                .find_published(id)?
                .ok_or_else(|| DomainError::ComparisonNotFound(id.clone()))?;
            let statements = snapshot_statements(published.subgraph);
            let versions = load_versions(&self.ctx, &published.root_id, classes::COMPARISON_PUBLISHED)?;
            let mut comparison = Comparison::from_graph(&resource, &published.root_id, &statements);
            comparison.versions = read_versions(&published.root_id, &versions);
            comparison.doi = find_doi(&self.ctx, id)?;
            return Ok(Some(comparison));
        }
        if resource.has_class(classes::COMPARISON) {
            let statements = load_subgraph(&self.ctx, id)?;
            return Ok(Some(Comparison::from_graph(&resource, id, &statements)));
        }
        Ok(None)
    }

    pub fn create(&self, command: &CreateComparisonCommand) -> DomainResult<ThingId> {
        let ctx = &self.ctx;
        let steps: Steps<CreateComparisonCommand, CreateComparisonState> = vec![
            bind(ctx, create::validate_fields),
            bind(ctx, create::validate_references),
            bind(ctx, create::validate_contributions),
            bind(ctx, create::validate_research_fields),
            bind(ctx, create::validate_organizational_units),
            bind(ctx, create::validate_sdgs),
            bind(ctx, create::validate_authors),
            bind(ctx, create::create_resource),
            bind(ctx, create::create_description),
            bind(ctx, create::create_authors),
            bind(ctx, create::create_sdgs),
            bind(ctx, create::create_research_fields),
            bind(ctx, create::create_references),
            bind(ctx, create::create_is_anonymized),
            bind(ctx, create::create_contributions),
        ];
        let state = execute(&steps, command, CreateComparisonState::default())?;
        let id = state.id()?.clone();
        tracing::info!(%id, "created comparison");
        Ok(id)
    }

    pub fn update(&self, command: &UpdateComparisonCommand) -> DomainResult<()> {
        let ctx = &self.ctx;
        let steps: Steps<UpdateComparisonCommand, UpdateComparisonState> = vec![
            bind(ctx, update::validate_fields),
            bind(ctx, update::find_comparison),
            bind(ctx, update::validate_references),
            bind(ctx, update::validate_contributions),
            bind(ctx, update::validate_research_fields),
            bind(ctx, update::validate_organizational_units),
            bind(ctx, update::validate_sdgs),
            bind(ctx, update::validate_authors),
            bind(ctx, update::update_resource),
            bind(ctx, update::update_description),
            bind(ctx, update::update_research_fields),
            bind(ctx, update::update_authors),
            bind(ctx, update::update_sdgs),
            bind(ctx, update::update_contributions),
            bind(ctx, update::update_references),
            bind(ctx, update::update_is_anonymized),
        ];
        execute(&steps, command, UpdateComparisonState::default())?;
        tracing::debug!(id = %command.id, "updated comparison");
        Ok(())
    }

    /// Publish a new version of a comparison, returning the id of the version
    pub fn publish(&self, command: &PublishComparisonCommand) -> DomainResult<ThingId> {
        let ctx = &self.ctx;
        let doi_service = Arc::clone(&self.doi_service);
        let base_url = self.publishing.comparison_base_url.clone();
        let steps: Steps<PublishComparisonCommand, PublishComparisonState> = vec![
            bind(ctx, publish::find_comparison),
            bind(ctx, publish::validate_contributions),
            bind(ctx, publish::validate_description),
            bind(ctx, publish::validate_authors),
            bind(ctx, publish::create_version),
            bind(ctx, publish::archive_version),
            bind(ctx, publish::link_version),
            bind(ctx, move |ctx: &GraphContext, command: &PublishComparisonCommand, state: PublishComparisonState| {
                publish::assign_doi(ctx, doi_service.as_ref(), &base_url, command, state)
            }),
        ];
        let state = execute(&steps, command, PublishComparisonState::default())?;
        let version = state.version(&command.id)?.id.clone();
        tracing::info!(id = %command.id, %version, doi = ?state.doi, "published comparison");
        Ok(version)
    }

    // --- related resources ---

    pub fn find_related_resource(
        &self,
        comparison_id: &ThingId,
        id: &ThingId,
    ) -> DomainResult<Option<ComparisonRelatedResource>> {
        let Some(resource) = self.find_child(comparison_id, predicates::HAS_RELATED_RESOURCE, id, classes::COMPARISON_RELATED_RESOURCE)?
        else {
            return Ok(None);
        };
        let own = self.statements_of(id)?;
        Ok(Some(ComparisonRelatedResource {
            image: own.first_object_label(predicates::HAS_IMAGE),
            url: own.first_object_label(predicates::HAS_URL),
            description: own.first_object_label(predicates::DESCRIPTION),
            id: resource.id,
            label: resource.label,
            created_by: resource.created_by,
            created_at: resource.created_at,
        }))
    }

    pub fn create_related_resource(&self, command: &CreateRelatedResourceCommand) -> DomainResult<ThingId> {
        validate_label(&command.label, "label")?;
        validate_optional_label(command.image.as_deref(), "image")?;
        validate_optional_label(command.url.as_deref(), "url")?;
        validate_optional_description(command.description.as_deref(), "description")?;
        find_unpublished(&self.ctx, &command.comparison_id, RootKind::COMPARISON)?;

        let id = self.create_child(
            command.contributor,
            &command.comparison_id,
            &command.label,
            classes::COMPARISON_RELATED_RESOURCE,
            predicates::HAS_RELATED_RESOURCE,
            &[
                (predicates::HAS_IMAGE, command.image.as_deref()),
                (predicates::HAS_URL, command.url.as_deref()),
                (predicates::DESCRIPTION, command.description.as_deref()),
            ],
        )?;
        Ok(id)
    }

    pub fn update_related_resource(&self, command: &UpdateRelatedResourceCommand) -> DomainResult<()> {
        validate_optional_label(command.label.as_deref(), "label")?;
        validate_optional_label(command.image.as_deref(), "image")?;
        validate_optional_label(command.url.as_deref(), "url")?;
        validate_optional_description(command.description.as_deref(), "description")?;
        self.ensure_child_modifiable(&command.comparison_id, &command.id, DomainError::ComparisonRelatedResourceNotModifiable)?;
        let current = self
            .find_related_resource(&command.comparison_id, &command.id)?
            .ok_or_else(|| DomainError::ComparisonRelatedResourceNotFound(command.id.clone()))?;

        self.update_child_label(command.contributor, &command.id, &current.label, command.label.as_deref())?;
        let own = self.statements_of(&command.id)?;
        for (predicate, existing, updated) in [
            (predicates::HAS_IMAGE, &current.image, &command.image),
            (predicates::HAS_URL, &current.url, &command.url),
            (predicates::DESCRIPTION, &current.description, &command.description),
        ] {
            if updated.is_some() && updated != existing {
                update_optional_literal(
                    &self.ctx,
                    command.contributor,
                    &command.id,
                    &own,
                    predicate,
                    updated.as_deref(),
                    literals::XSD_STRING,
                )?;
            }
        }
        Ok(())
    }

    pub fn delete_related_resource(
        &self,
        comparison_id: &ThingId,
        id: &ThingId,
        contributor: ContributorId,
    ) -> DomainResult<()> {
        delete_child(
            &self.ctx,
            contributor,
            ChildDeletion {
                parent: comparison_id,
                predicate: predicates::HAS_RELATED_RESOURCE,
                child: id,
                owned_classes: &[],
                not_found: DomainError::ComparisonRelatedResourceNotFound,
                not_modifiable: DomainError::ComparisonRelatedResourceNotModifiable,
            },
        )
    }

    // --- related figures ---

    pub fn find_related_figure(&self, comparison_id: &ThingId, id: &ThingId) -> DomainResult<Option<ComparisonRelatedFigure>> {
        let Some(resource) = self.find_child(comparison_id, predicates::HAS_RELATED_FIGURE, id, classes::COMPARISON_RELATED_FIGURE)?
        else {
            return Ok(None);
        };
        let own = self.statements_of(id)?;
        Ok(Some(ComparisonRelatedFigure {
            image: own.first_object_label(predicates::HAS_IMAGE),
            description: own.first_object_label(predicates::DESCRIPTION),
            id: resource.id,
            label: resource.label,
            created_by: resource.created_by,
            created_at: resource.created_at,
        }))
    }

    pub fn create_related_figure(&self, command: &CreateRelatedFigureCommand) -> DomainResult<ThingId> {
        validate_label(&command.label, "label")?;
        validate_optional_label(command.image.as_deref(), "image")?;
        validate_optional_description(command.description.as_deref(), "description")?;
        find_unpublished(&self.ctx, &command.comparison_id, RootKind::COMPARISON)?;

        self.create_child(
            command.contributor,
            &command.comparison_id,
            &command.label,
            classes::COMPARISON_RELATED_FIGURE,
            predicates::HAS_RELATED_FIGURE,
            &[
                (predicates::HAS_IMAGE, command.image.as_deref()),
                (predicates::DESCRIPTION, command.description.as_deref()),
            ],
        )
    }

    pub fn update_related_figure(&self, command: &UpdateRelatedFigureCommand) -> DomainResult<()> {
        validate_optional_label(command.label.as_deref(), "label")?;
        validate_optional_label(command.image.as_deref(), "image")?;
        validate_optional_description(command.description.as_deref(), "description")?;
        self.ensure_child_modifiable(&command.comparison_id, &command.id, DomainError::ComparisonRelatedFigureNotModifiable)?;
        let current = self
            .find_related_figure(&command.comparison_id, &command.id)?
            .ok_or_else(|| DomainError::ComparisonRelatedFigureNotFound(command.id.clone()))?;

        self.update_child_label(command.contributor, &command.id, &current.label, command.label.as_deref())?;
        let own = self.statements_of(&command.id)?;
        for (predicate, existing, updated) in [
            (predicates::HAS_IMAGE, &current.image, &command.image),
            (predicates::DESCRIPTION, &current.description, &command.description),
        ] {
            if updated.is_some() && updated != existing {
                update_optional_literal(
                    &self.ctx,
                    command.contributor,
                    &command.id,
                    &own,
                    predicate,
                    updated.as_deref(),
                    literals::XSD_STRING,
                )?;
            }
        }
        Ok(())
    }

    pub fn delete_related_figure(&self, comparison_id: &ThingId, id: &ThingId, contributor: ContributorId) -> DomainResult<()> {
        delete_child(
            &self.ctx,
            contributor,
            ChildDeletion {
                parent: comparison_id,
                predicate: predicates::HAS_RELATED_FIGURE,
                child: id,
                owned_classes: &[],
                not_found: DomainError::ComparisonRelatedFigureNotFound,
                not_modifiable: DomainError::ComparisonRelatedFigureNotModifiable,
            },
        )
    }

    // --- helpers ---

    fn statements_of(&self, id: &ThingId) -> DomainResult<Vec<Statement>> {
        Ok(self
            .ctx
            .repository
            .find_statements(&StatementFilter::new().with_subject(id.clone()), &PageRequest::all())?
            .content)
    }

    fn find_child(&self, parent: &ThingId, predicate: &str, id: &ThingId, class: &str) -> DomainResult<Option<Resource>> {
        let filter = StatementFilter::new()
            .with_subject(parent.clone())
            .with_predicate(predicate)
            .with_object(id.clone());
        let found = self.ctx.repository.find_statements(&filter, &PageRequest::single())?;
        Ok(found.content.into_iter().find_map(|s| match s.object {
            Thing::Resource(resource) if resource.has_class(class) => Some(resource),
            _ => None,
        }))
    }

    /// The comparison must exist and must be neither published nor superseded
    fn ensure_child_modifiable(
        &self,
        comparison_id: &ThingId,
        child: &ThingId,
        not_modifiable: fn(ThingId) -> DomainError,
    ) -> DomainResult<()> {
        match find_unpublished(&self.ctx, comparison_id, RootKind::COMPARISON) {
            Ok(_) => Ok(()),
            Err(DomainError::ComparisonNotModifiable(_)) => Err(not_modifiable(child.clone())),
            Err(e) => Err(e),
        }
    }

    fn create_child(
        &self,
        contributor: ContributorId,
        parent: &ThingId,
        label: &str,
        class: &str,
        predicate: &str,
        values: &[(&str, Option<&str>)],
    ) -> DomainResult<ThingId> {
        let id = self
            .ctx
            .services
            .create_resource(CreateResourceCommand::new(contributor, label).with_class(class))?;
        link(&self.ctx, contributor, parent, predicate, &id, None)?;
        for (predicate, value) in values {
            if let Some(value) = value {
                create_literal_statement(&self.ctx, contributor, &id, predicate, value, literals::XSD_STRING, None)?;
            }
        }
        tracing::debug!(%parent, child = %id, class, "created comparison child");
        Ok(id)
    }

    fn update_child_label(
        &self,
        contributor: ContributorId,
        id: &ThingId,
        current: &str,
        updated: Option<&str>,
    ) -> DomainResult<()> {
        match updated {
            Some(label) if label != current => self
                .ctx
                .services
                .update_resource(UpdateResourceCommand::new(id.clone(), contributor).with_label(label)),
            _ => Ok(()),
        }
    }
}

fn validate_optional_label(value: Option<&str>, property: &str) -> DomainResult<()> {
    value.map_or(Ok(()), |value| validate_label(value, property))
}

/// Bundle of an editable comparison
fn load_subgraph(ctx: &GraphContext, id: &ThingId) -> DomainResult<StatementsBySubject> {
    let mut statements = ctx
        .repository
        .fetch_as_bundle(id, &BundleConfiguration::new().with_max_level(3).with_blacklist(SHALLOW))?;
    statements.extend(
        ctx.repository
            .fetch_as_bundle(id, &BundleConfiguration::new().with_max_level(1).with_whitelist(SHALLOW))?,
    );
    Ok(group_by_subject(statements))
}

fn validate_research_fields(ctx: &GraphContext, ids: &[ThingId]) -> DomainResult<()> {
    validate_single(ids, || DomainError::OnlyOneResearchFieldAllowed)?;
    validate_things(ctx, ids, classes::RESEARCH_FIELD, DomainError::ResearchFieldNotFound)
}

fn validate_organizational_units(
    observatories: &[ObservatoryId],
    organizations: &[OrganizationId],
) -> DomainResult<()> {
    validate_single(observatories, || DomainError::OnlyOneObservatoryAllowed)?;
    validate_single(organizations, || DomainError::OnlyOneOrganizationAllowed)
}

fn validate_references(references: &[String]) -> DomainResult<()> {
    references.iter().try_for_each(|reference| validate_label(reference, "references"))
}

fn anonymized_value(is_anonymized: bool) -> Option<&'static str> {
    is_anonymized.then_some("true")
}

mod create {
    use super::*;

    type State = CreateComparisonState;
    type Command = CreateComparisonCommand;

    pub(super) fn validate_fields(_: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        validate_label(&command.title, "title")?;
        validate_description(&command.description, "description")?;
        Ok(state)
    }

    pub(super) fn validate_references(_: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        super::validate_references(&command.references)?;
        Ok(state)
    }

    pub(super) fn validate_contributions(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        validate_things(ctx, &command.contributions, classes::CONTRIBUTION, DomainError::ContributionNotFound)?;
        Ok(state)
    }

    pub(super) fn validate_research_fields(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        super::validate_research_fields(ctx, &command.research_fields)?;
        Ok(state)
    }

    pub(super) fn validate_organizational_units(_: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        super::validate_organizational_units(&command.observatories, &command.organizations)?;
        Ok(state)
    }

    pub(super) fn validate_sdgs(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        validate_things(
            ctx,
            &command.sustainable_development_goals,
            classes::SDG,
            DomainError::SustainableDevelopmentGoalNotFound,
        )?;
        Ok(state)
    }

    pub(super) fn validate_authors(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        crate::actions::validate_authors(ctx, &command.authors)?;
        Ok(state)
    }

    pub(super) fn create_resource(ctx: &GraphContext, command: &Command, _: State) -> DomainResult<State> {
        let mut resource = CreateResourceCommand::new(command.contributor, command.title.clone())
            .with_class(classes::COMPARISON)
            .with_extraction_method(command.extraction_method);
        if let Some(observatory) = command.observatories.first() {
            resource = resource.with_observatory(*observatory);
        }
        if let Some(organization) = command.organizations.first() {
            resource = resource.with_organization(*organization);
        }
        let id = ctx.services.create_resource(resource)?;
        Ok(State { comparison_id: Some(id) })
    }

    pub(super) fn create_description(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let id = state.id()?;
        create_literal_statement(
            ctx,
            command.contributor,
            id,
            predicates::DESCRIPTION,
            &command.description,
            literals::XSD_STRING,
            None,
        )?;
        Ok(state)
    }

    pub(super) fn create_authors(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        update_authors(ctx, command.contributor, state.id()?, &[], &command.authors)?;
        Ok(state)
    }

    pub(super) fn create_sdgs(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let id = state.id()?;
        update_object_set(ctx, command.contributor, id, &[], predicates::HAS_SDG, &command.sustainable_development_goals)?;
        Ok(state)
    }

    pub(super) fn create_research_fields(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let id = state.id()?;
        update_object_set(ctx, command.contributor, id, &[], predicates::HAS_RESEARCH_FIELD, &command.research_fields)?;
        Ok(state)
    }

    pub(super) fn create_references(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let id = state.id()?;
        update_literal_list(ctx, command.contributor, id, &[], predicates::REFERENCE, &command.references, literals::XSD_STRING)?;
        Ok(state)
    }

    pub(super) fn create_is_anonymized(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        if let Some(value) = anonymized_value(command.is_anonymized) {
            create_literal_statement(
                ctx,
                command.contributor,
                state.id()?,
                predicates::IS_ANONYMIZED,
                value,
                literals::XSD_BOOLEAN,
                None,
            )?;
        }
        Ok(state)
    }

    pub(super) fn create_contributions(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let id = state.id()?;
        update_object_set(ctx, command.contributor, id, &[], predicates::HAS_CONTRIBUTION, &command.contributions)?;
        Ok(state)
    }
}

mod update {
    use super::*;

    type State = UpdateComparisonState;
    type Command = UpdateComparisonCommand;

    pub(super) fn validate_fields(_: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        validate_optional_label(command.title.as_deref(), "title")?;
        validate_optional_description(command.description.as_deref(), "description")?;
        Ok(state)
    }

    pub(super) fn find_comparison(ctx: &GraphContext, command: &Command, _: State) -> DomainResult<State> {
        let root = find_unpublished(ctx, &command.id, RootKind::COMPARISON)?;
        let statements = load_subgraph(ctx, &root.id)?;
        Ok(State { root: Some(root), statements })
    }

    pub(super) fn validate_references(_: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        if let Some(references) = &command.references {
            super::validate_references(references)?;
        }
        Ok(state)
    }

    pub(super) fn validate_contributions(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        if let Some(contributions) = &command.contributions {
            validate_things(ctx, contributions, classes::CONTRIBUTION, DomainError::ContributionNotFound)?;
        }
        Ok(state)
    }

    pub(super) fn validate_research_fields(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        if let Some(fields) = &command.research_fields {
            super::validate_research_fields(ctx, fields)?;
        }
        Ok(state)
    }

    pub(super) fn validate_organizational_units(_: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        super::validate_organizational_units(
            command.observatories.as_deref().unwrap_or_default(),
            command.organizations.as_deref().unwrap_or_default(),
        )?;
        Ok(state)
    }

    pub(super) fn validate_sdgs(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        if let Some(goals) = &command.sustainable_development_goals {
            validate_things(ctx, goals, classes::SDG, DomainError::SustainableDevelopmentGoalNotFound)?;
        }
        Ok(state)
    }

    pub(super) fn validate_authors(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        if let Some(authors) = &command.authors {
            crate::actions::validate_authors(ctx, authors)?;
        }
        Ok(state)
    }

    pub(super) fn update_resource(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let root = state.root(&command.id)?;
        let mut update = UpdateResourceCommand::new(root.id.clone(), command.contributor);
        let mut changed = false;
        if let Some(title) = command.title.as_ref().filter(|title| **title != root.label) {
            update.label = Some(title.clone());
            changed = true;
        }
        if let Some(observatory) = command.observatories.as_ref().map(|o| o.first().copied().unwrap_or(ObservatoryId::UNKNOWN)) {
            if observatory != root.observatory_id {
                update.observatory_id = Some(observatory);
                changed = true;
            }
        }
        if let Some(organization) = command.organizations.as_ref().map(|o| o.first().copied().unwrap_or(OrganizationId::UNKNOWN)) {
            if organization != root.organization_id {
                update.organization_id = Some(organization);
                changed = true;
            }
        }
        if let Some(method) = command.extraction_method.filter(|m| *m != root.extraction_method) {
            update.extraction_method = Some(method);
            changed = true;
        }
        if let Some(visibility) = command.visibility.filter(|v| *v != root.visibility) {
            update.visibility = Some(visibility);
            changed = true;
        }
        if changed {
            ctx.services.update_resource(update)?;
        }
        Ok(state)
    }

    pub(super) fn update_description(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        if let Some(description) = &command.description {
            update_optional_literal(
                ctx,
                command.contributor,
                &command.id,
                state.own_statements(&command.id),
                predicates::DESCRIPTION,
                Some(description),
                literals::XSD_STRING,
            )?;
        }
        Ok(state)
    }

    pub(super) fn update_research_fields(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        if let Some(fields) = &command.research_fields {
            let own = state.own_statements(&command.id);
            update_object_set(ctx, command.contributor, &command.id, own, predicates::HAS_RESEARCH_FIELD, fields)?;
        }
        Ok(state)
    }

    pub(super) fn update_authors(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        if let Some(authors) = &command.authors {
            let own = state.own_statements(&command.id);
            crate::actions::update_authors(ctx, command.contributor, &command.id, own, authors)?;
        }
        Ok(state)
    }

    pub(super) fn update_sdgs(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        if let Some(goals) = &command.sustainable_development_goals {
            let own = state.own_statements(&command.id);
            update_object_set(ctx, command.contributor, &command.id, own, predicates::HAS_SDG, goals)?;
        }
        Ok(state)
    }

    pub(super) fn update_contributions(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        if let Some(contributions) = &command.contributions {
            let own = state.own_statements(&command.id);
            update_object_set(ctx, command.contributor, &command.id, own, predicates::HAS_CONTRIBUTION, contributions)?;
        }
        Ok(state)
    }

    pub(super) fn update_references(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        if let Some(references) = &command.references {
            let own = state.own_statements(&command.id);
            update_literal_list(
                ctx,
                command.contributor,
                &command.id,
                own,
                predicates::REFERENCE,
                references,
                literals::XSD_STRING,
            )?;
        }
        Ok(state)
    }

    pub(super) fn update_is_anonymized(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        if let Some(is_anonymized) = command.is_anonymized {
            update_optional_literal(
                ctx,
                command.contributor,
                &command.id,
                state.own_statements(&command.id),
                predicates::IS_ANONYMIZED,
                anonymized_value(is_anonymized),
                literals::XSD_BOOLEAN,
            )?;
        }
        Ok(state)
    }
}

mod publish {
    use super::*;

    type State = PublishComparisonState;
    type Command = PublishComparisonCommand;

    pub(super) fn find_comparison(ctx: &GraphContext, command: &Command, _: State) -> DomainResult<State> {
        let root = find_unpublished(ctx, &command.id, PUBLISHED)?;
        let statements = load_subgraph(ctx, &root.id)?;
        let comparison = Comparison::from_graph(&root, &root.id, &statements);
        Ok(State { root: Some(root), statements, comparison: Some(comparison), ..State::default() })
    }

    pub(super) fn validate_contributions(_: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let count = state.comparison.as_ref().map_or(0, |c| c.contributions.len());
        if count < 2 {
            tracing::debug!(id = %command.id, count, "too few contributions to publish");
            return Err(DomainError::RequiresAtLeastTwoContributions);
        }
        Ok(state)
    }

    pub(super) fn validate_description(_: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        match command.changelog() {
            Some(description) => crate::actions::validate_description(description, "description")?,
            None if command.assign_doi => return Err(DomainError::DescriptionRequiredForDoi),
            None => {}
        }
        Ok(state)
    }

    pub(super) fn validate_authors(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        crate::actions::validate_authors(ctx, &command.authors)?;
        Ok(state)
    }

    fn request<'a>(command: &'a Command, state: &'a State) -> DomainResult<VersionRequest<'a>> {
        Ok(VersionRequest {
            kind: RootKind::COMPARISON,
            root: state.root(&command.id)?,
            statements: &state.statements,
            changelog: command.changelog(),
        })
    }

    pub(super) fn create_version(ctx: &GraphContext, command: &Command, mut state: State) -> DomainResult<State> {
        let version = crate::actions::create_version(ctx, command.contributor, &request(command, &state)?)?;
        state.version = Some(version);
        Ok(state)
    }

    pub(super) fn archive_version(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        archive(ctx, &request(command, &state)?, state.version(&command.id)?)?;
        Ok(state)
    }

    pub(super) fn link_version(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        crate::actions::link_version(ctx, command.contributor, &request(command, &state)?, state.version(&command.id)?)?;
        Ok(state)
    }

    pub(super) fn assign_doi(
        ctx: &GraphContext,
        doi_service: &dyn DoiService,
        base_url: &str,
        command: &Command,
        mut state: State,
    ) -> DomainResult<State> {
        if !command.assign_doi {
            return Ok(state);
        }
        let root = state.root(&command.id)?;
        let version = state.version(&command.id)?;
        let versions = state.comparison.as_ref().map(|c| c.versions.as_slice()).unwrap_or_default();
        let related_identifiers = previous_dois(versions, &state.statements);
        let metadata = DoiMetadata {
            suffix: version.id.to_string(),
            title: root.label.clone(),
            description: command.changelog().unwrap_or_default().to_string(),
            url: format!("{}{}", base_url, version.id),
            creators: command.authors.iter().map(|a| a.name.clone()).collect(),
            resource_type: classes::COMPARISON.to_string(),
            related_identifiers,
        };
        let doi = publish_doi(ctx, doi_service, command.contributor, &version.id, &metadata)?;
        state.doi = Some(doi);
        Ok(state)
    }
}
