//! Literature lists: ordered sections of annotated papers, datasets and software

use super::{
    find_doi, load_versions, objects, previous_dois, read_versions, snapshot_statements, ObjectIdAndLabel,
    VersionInfo,
};
use crate::actions::{
    archive, bind, create_literal_statement, delete_child, execute, find_unpublished, link, publish_doi,
    read_authors, read_entries, update_authors, update_object_set, update_optional_literal, validate_description,
    validate_label, validate_single, validate_things, Author, ChildDeletion, EntryUpdater, EntryValidator,
    GraphContext, ListEntry, PublishedVersion, RootKind, Steps, VersionRequest,
};
use crate::config::PublishingConfig;
use crate::doi::{DoiMetadata, DoiService};
use crate::error::{DomainError, DomainResult};
use crate::graph::vocab::{classes, literals, predicates};
use crate::graph::{
    group_by_subject, sort_by_position, ContributorId, ExtractionMethod, ObservatoryId, OrganizationId,
    Resource, Statement, StatementSliceExt, StatementsBySubject, Thing, ThingId, Visibility,
};
use crate::services::{CreateResourceCommand, ResourceUseCases, StatementUseCases, UpdateResourceCommand};
use crate::storage::{
    BundleConfiguration, PageRequest, PublishedContentRepository, ResourceRepository, StatementFilter,
    StatementRepository,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const PUBLISHED: RootKind = RootKind {
    not_modifiable: DomainError::LiteratureListAlreadyPublished,
    ..RootKind::LITERATURE_LIST
};

/// Nodes below entries that belong to a section and are deleted with it
const SECTION_OWNED: [&str; 1] = [classes::ENTRY];

/// List sections have no heading; they are shown through their entries only
const LIST_SECTION_LABEL: &str = "";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiteratureList {
    pub id: ThingId,
    pub title: String,
    pub research_fields: Vec<ObjectIdAndLabel>,
    pub authors: Vec<Author>,
    pub sustainable_development_goals: Vec<ObjectIdAndLabel>,
    pub sections: Vec<LiteratureListSection>,
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

impl LiteratureList {
    fn from_graph(resource: &Resource, root: &ThingId, statements: &StatementsBySubject) -> Self {
        let own: &[Statement] = statements.get(root).map(Vec::as_slice).unwrap_or(&[]);
        Self {
            id: resource.id.clone(),
            title: resource.label.clone(),
            research_fields: objects(own, predicates::HAS_RESEARCH_FIELD),
            authors: read_authors(own),
            sustainable_development_goals: objects(own, predicates::HAS_SDG),
            sections: read_sections(own, statements),
            versions: read_versions(root, statements),
            doi: None,
            observatory_id: resource.observatory_id,
            organization_id: resource.organization_id,
            extraction_method: resource.extraction_method,
            visibility: resource.visibility,
            created_by: resource.created_by,
            created_at: resource.created_at,
            published: resource.has_class(classes::LITERATURE_LIST_PUBLISHED),
        }
    }
}

/// A section as stored below a list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiteratureListSection {
    List {
        id: ThingId,
        entries: Vec<ListEntry>,
    },
    Text {
        id: ThingId,
        heading: String,
        heading_size: i64,
        text: String,
    },
}

impl LiteratureListSection {
    pub fn id(&self) -> &ThingId {
        match self {
            Self::List { id, .. } | Self::Text { id, .. } => id,
        }
    }

    pub fn to_definition(&self) -> SectionDefinition {
        match self {
            Self::List { entries, .. } => SectionDefinition::List { entries: entries.clone() },
            Self::Text { heading, heading_size, text, .. } => SectionDefinition::Text {
                heading: heading.clone(),
                heading_size: *heading_size,
                text: text.clone(),
            },
        }
    }

    /// Read a section node, `None` for nodes of another kind
    fn read(section: &Resource, statements: &StatementsBySubject) -> Option<Self> {
        if section.has_class(classes::LIST_SECTION) {
            let entries = read_entries(&section.id, statements)
                .iter()
                .filter_map(|entry| entry.to_list_entry())
                .collect();
            return Some(Self::List { id: section.id.clone(), entries });
        }
        if section.has_class(classes::TEXT_SECTION) {
            let own: &[Statement] = statements.get(&section.id).map(Vec::as_slice).unwrap_or(&[]);
            return Some(Self::Text {
                id: section.id.clone(),
                heading: section.label.clone(),
                heading_size: own
                    .first_object_label(predicates::HAS_HEADING_LEVEL)
                    .and_then(|level| level.parse().ok())
                    .unwrap_or(1),
                text: own.first_object_label(predicates::HAS_CONTENT).unwrap_or_default(),
            });
        }
        None
    }
}

fn read_sections(own: &[Statement], statements: &StatementsBySubject) -> Vec<LiteratureListSection> {
    own.ordered_objects(predicates::HAS_SECTION)
        .into_iter()
        .filter_map(Thing::as_resource)
        .filter_map(|section| LiteratureListSection::read(section, statements))
        .collect()
}

/// Desired content of a section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionDefinition {
    List { entries: Vec<ListEntry> },
    Text { heading: String, heading_size: i64, text: String },
}

impl SectionDefinition {
    fn validate(&self, ctx: &GraphContext, entries: &mut EntryValidator) -> DomainResult<()> {
        match self {
            Self::List { entries: list } => {
                for entry in list {
                    entries.validate(ctx, &entry.value)?;
                    if let Some(description) = &entry.description {
                        validate_description(description, "description")?;
                    }
                }
            }
            Self::Text { heading, heading_size, text } => {
                validate_label(heading, "heading")?;
                if *heading_size < 1 {
                    return Err(DomainError::InvalidHeadingSize(*heading_size));
                }
                validate_description(text, "text")?;
            }
        }
        Ok(())
    }
}

// === Commands ===

#[derive(Debug, Clone, PartialEq)]
pub struct CreateLiteratureListCommand {
    pub contributor: ContributorId,
    pub title: String,
    pub research_fields: Vec<ThingId>,
    pub authors: Vec<Author>,
    pub sustainable_development_goals: Vec<ThingId>,
    pub observatories: Vec<ObservatoryId>,
    pub organizations: Vec<OrganizationId>,
    pub extraction_method: ExtractionMethod,
    pub sections: Vec<SectionDefinition>,
}

/// Partial update; `None` leaves a field as it is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateLiteratureListCommand {
    pub id: ThingId,
    pub contributor: ContributorId,
    pub title: Option<String>,
    pub research_fields: Option<Vec<ThingId>>,
    pub authors: Option<Vec<Author>>,
    pub sustainable_development_goals: Option<Vec<ThingId>>,
    pub observatories: Option<Vec<ObservatoryId>>,
    pub organizations: Option<Vec<OrganizationId>>,
    pub extraction_method: Option<ExtractionMethod>,
    pub visibility: Option<Visibility>,
    pub sections: Option<Vec<SectionDefinition>>,
}

impl UpdateLiteratureListCommand {
    pub fn new(id: impl Into<ThingId>, contributor: ContributorId) -> Self {
        Self { id: id.into(), contributor, ..Self::default() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishLiteratureListCommand {
    pub id: ThingId,
    pub contributor: ContributorId,
    pub changelog: Option<String>,
    pub assign_doi: bool,
}

impl PublishLiteratureListCommand {
    /// The changelog unless blank
    fn changelog(&self) -> Option<&str> {
        self.changelog.as_deref().filter(|c| !c.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateSectionCommand {
    pub list_id: ThingId,
    pub contributor: ContributorId,
    /// Position among the sections; appended when `None` or past the end
    pub index: Option<usize>,
    pub definition: SectionDefinition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSectionCommand {
    pub list_id: ThingId,
    pub section_id: ThingId,
    pub contributor: ContributorId,
    pub definition: SectionDefinition,
}

// === Pipeline states ===

#[derive(Debug, Default)]
pub struct CreateLiteratureListState {
    list_id: Option<ThingId>,
}

impl CreateLiteratureListState {
    fn id(&self) -> DomainResult<&ThingId> {
        self.list_id
            .as_ref()
            .ok_or_else(|| DomainError::LiteratureListNotFound(ThingId::default()))
    }
}

#[derive(Debug, Default)]
pub struct UpdateLiteratureListState {
    root: Option<Resource>,
    statements: StatementsBySubject,
    list: Option<LiteratureList>,
}

impl UpdateLiteratureListState {
    fn root(&self, id: &ThingId) -> DomainResult<&Resource> {
        self.root.as_ref().ok_or_else(|| DomainError::LiteratureListNotFound(id.clone()))
    }

    fn own_statements(&self, id: &ThingId) -> &[Statement] {
        self.statements.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Default)]
pub struct PublishLiteratureListState {
    root: Option<Resource>,
    statements: StatementsBySubject,
    list: Option<LiteratureList>,
    version: Option<PublishedVersion>,
}

impl PublishLiteratureListState {
    fn root(&self, id: &ThingId) -> DomainResult<&Resource> {
        self.root.as_ref().ok_or_else(|| DomainError::LiteratureListNotFound(id.clone()))
    }

    fn version(&self, id: &ThingId) -> DomainResult<&PublishedVersion> {
        self.version.as_ref().ok_or_else(|| DomainError::LiteratureListNotFound(id.clone()))
    }
}

// === Service ===

pub struct LiteratureListService {
    ctx: GraphContext,
    doi_service: Arc<dyn DoiService>,
    publishing: PublishingConfig,
}

impl LiteratureListService {
    pub fn new(ctx: GraphContext, doi_service: Arc<dyn DoiService>, publishing: PublishingConfig) -> Self {
        Self { ctx, doi_service, publishing }
    }

    pub fn find_by_id(&self, id: &ThingId) -> DomainResult<Option<LiteratureList>> {
        let Some(resource) = self.ctx.repository.find_resource(id)? else {
            return Ok(None);
        };
        if resource.has_class(classes::LITERATURE_LIST_PUBLISHED) {
            let published = self
                .ctx
                .repository
                .find_published(id)?
                .ok_or_else(|| DomainError::LiteratureListNotFound(id.clone()))?;
            let statements = snapshot_statements(published.subgraph);
            let versions = load_versions(&self.ctx, &published.root_id, classes::LITERATURE_LIST_PUBLISHED)?;
            let mut list = LiteratureList::from_graph(&resource, &published.root_id, &statements);
            list.versions = read_versions(&published.root_id, &versions);
            list.doi = find_doi(&self.ctx, id)?;
            return Ok(Some(list));
        }
        if resource.has_class(classes::LITERATURE_LIST) {
            let statements = load_subgraph(&self.ctx, id)?;
            return Ok(Some(LiteratureList::from_graph(&resource, id, &statements)));
        }
        Ok(None)
    }

    pub fn create(&self, command: &CreateLiteratureListCommand) -> DomainResult<ThingId> {
        let ctx = &self.ctx;
        let steps: Steps<CreateLiteratureListCommand, CreateLiteratureListState> = vec![
            bind(ctx, create::validate_title),
            bind(ctx, create::validate_research_fields),
            bind(ctx, create::validate_authors),
            bind(ctx, create::validate_sdgs),
            bind(ctx, create::validate_organizational_units),
            bind(ctx, create::validate_sections),
            bind(ctx, create::create_resource),
            bind(ctx, create::create_research_fields),
            bind(ctx, create::create_authors),
            bind(ctx, create::create_sdgs),
            bind(ctx, create::create_sections),
        ];
        let state = execute(&steps, command, CreateLiteratureListState::default())?;
        let id = state.id()?.clone();
        tracing::info!(%id, "created literature list");
        Ok(id)
    }

    pub fn update(&self, command: &UpdateLiteratureListCommand) -> DomainResult<()> {
        let ctx = &self.ctx;
        let steps: Steps<UpdateLiteratureListCommand, UpdateLiteratureListState> = vec![
            bind(ctx, update::find_list),
            bind(ctx, update::validate_title),
            bind(ctx, update::validate_research_fields),
            bind(ctx, update::validate_authors),
            bind(ctx, update::validate_sdgs),
            bind(ctx, update::validate_organizational_units),
            bind(ctx, update::validate_sections),
            bind(ctx, update::update_resource),
            bind(ctx, update::update_research_fields),
            bind(ctx, update::update_authors),
            bind(ctx, update::update_sdgs),
            bind(ctx, update::update_sections),
        ];
        execute(&steps, command, UpdateLiteratureListState::default())?;
        tracing::debug!(id = %command.id, "updated literature list");
        Ok(())
    }

    /// Publish a new version of a literature list, returning the id of the version
    pub fn publish(&self, command: &PublishLiteratureListCommand) -> DomainResult<ThingId> {
        let ctx = &self.ctx;
        let doi_service = Arc::clone(&self.doi_service);
        let base_url = self.publishing.literature_list_base_url.clone();
        let steps: Steps<PublishLiteratureListCommand, PublishLiteratureListState> = vec![
            bind(ctx, publish::find_list),
            bind(ctx, publish::validate_changelog),
            bind(ctx, publish::create_version),
            bind(ctx, publish::archive_version),
            bind(ctx, publish::link_version),
            bind(ctx, move |ctx: &GraphContext, command: &PublishLiteratureListCommand, state: PublishLiteratureListState| {
                publish::assign_doi(ctx, doi_service.as_ref(), &base_url, command, state)
            }),
        ];
        let state = execute(&steps, command, PublishLiteratureListState::default())?;
        let version = state.version(&command.id)?.id.clone();
        tracing::info!(list = %command.id, %version, "published literature list");
        Ok(version)
    }

    // --- sections ---

    pub fn find_section(&self, list_id: &ThingId, section_id: &ThingId) -> DomainResult<Option<LiteratureListSection>> {
        Ok(self
            .find_by_id(list_id)?
            .and_then(|list| list.sections.into_iter().find(|s| s.id() == section_id)))
    }

    /// Create a section at the requested position, shifting later sections back
    pub fn create_section(&self, command: &CreateSectionCommand) -> DomainResult<ThingId> {
        let root = find_unpublished(&self.ctx, &command.list_id, RootKind::LITERATURE_LIST)?;
        command.definition.validate(&self.ctx, &mut EntryValidator::new())?;

        let current = self.section_statements(&root.id)?;
        let mut order: Vec<&Statement> = current.iter().collect();
        sort_by_position(&mut order);
        let position = command.index.unwrap_or(order.len()).min(order.len());

        let section = create_section(&self.ctx, command.contributor, &command.definition)?;
        for (index, statement) in order.iter().enumerate().skip(position) {
            let index = index as i64 + 1;
            if statement.index != Some(index) {
                self.ctx.services.update_statement_index(&statement.id, Some(index))?;
            }
        }
        link(&self.ctx, command.contributor, &root.id, predicates::HAS_SECTION, &section, Some(position as i64))?;
        tracing::debug!(list = %root.id, %section, position, "created section");
        Ok(section)
    }

    pub fn update_section(&self, command: &UpdateSectionCommand) -> DomainResult<()> {
        let root = find_unpublished(&self.ctx, &command.list_id, RootKind::LITERATURE_LIST)?;
        command.definition.validate(&self.ctx, &mut EntryValidator::new())?;
        let statements = load_subgraph(&self.ctx, &root.id)?;
        let own = statements.get(&root.id).map(Vec::as_slice).unwrap_or(&[]);
        let section = read_sections(own, &statements)
            .into_iter()
            .find(|s| s.id() == &command.section_id)
            .ok_or_else(|| DomainError::UnrelatedLiteratureListSection {
                list: root.id.clone(),
                section: command.section_id.clone(),
            })?;
        update_section(&self.ctx, command.contributor, &section, &command.definition, &statements)
    }

    pub fn delete_section(&self, list_id: &ThingId, section_id: &ThingId, contributor: ContributorId) -> DomainResult<()> {
        find_unpublished(&self.ctx, list_id, RootKind::LITERATURE_LIST)?;
        delete_section(&self.ctx, contributor, list_id, section_id)
    }

    fn section_statements(&self, list: &ThingId) -> DomainResult<Vec<Statement>> {
        let filter = StatementFilter::new()
            .with_subject(list.clone())
            .with_predicate(predicates::HAS_SECTION);
        Ok(self.ctx.repository.find_statements(&filter, &PageRequest::all())?.content)
    }
}

/// Bundle of an editable list, plus its research fields
fn load_subgraph(ctx: &GraphContext, id: &ThingId) -> DomainResult<StatementsBySubject> {
    let configuration = BundleConfiguration::new().with_max_level(3).with_blacklist([
        classes::RESEARCH_FIELD,
        classes::CONTRIBUTION,
        classes::VENUE,
    ]);
    let mut statements = ctx.repository.fetch_as_bundle(id, &configuration)?;
    let fields = StatementFilter::new()
        .with_subject(id.clone())
        .with_object_class(classes::RESEARCH_FIELD);
    statements.extend(ctx.repository.find_statements(&fields, &PageRequest::all())?.content);
    Ok(group_by_subject(statements))
}

fn create_section(ctx: &GraphContext, contributor: ContributorId, definition: &SectionDefinition) -> DomainResult<ThingId> {
    match definition {
        SectionDefinition::List { entries } => {
            let section = ctx
                .services
                .create_resource(CreateResourceCommand::new(contributor, LIST_SECTION_LABEL).with_class(classes::LIST_SECTION))?;
            EntryUpdater::new(ctx, contributor, &section).create_all(entries)?;
            Ok(section)
        }
        SectionDefinition::Text { heading, heading_size, text } => {
            let section = ctx
                .services
                .create_resource(CreateResourceCommand::new(contributor, heading.clone()).with_class(classes::TEXT_SECTION))?;
            create_literal_statement(
                ctx,
                contributor,
                &section,
                predicates::HAS_HEADING_LEVEL,
                &heading_size.to_string(),
                literals::XSD_INT,
                None,
            )?;
            create_literal_statement(ctx, contributor, &section, predicates::HAS_CONTENT, text, literals::XSD_STRING, None)?;
            Ok(section)
        }
    }
}

fn update_section(
    ctx: &GraphContext,
    contributor: ContributorId,
    section: &LiteratureListSection,
    definition: &SectionDefinition,
    statements: &StatementsBySubject,
) -> DomainResult<()> {
    match (section, definition) {
        (LiteratureListSection::List { id, .. }, SectionDefinition::List { entries }) => {
            let old = read_entries(id, statements);
            EntryUpdater::new(ctx, contributor, id).update(&old, entries)
        }
        (
            LiteratureListSection::Text { id, heading: old_heading, .. },
            SectionDefinition::Text { heading, heading_size, text },
        ) => {
            if heading != old_heading {
                ctx.services
                    .update_resource(UpdateResourceCommand::new(id.clone(), contributor).with_label(heading.clone()))?;
            }
            let own = statements.get(id).map(Vec::as_slice).unwrap_or(&[]);
            update_optional_literal(
                ctx,
                contributor,
                id,
                own,
                predicates::HAS_HEADING_LEVEL,
                Some(heading_size.to_string().as_str()),
                literals::XSD_INT,
            )?;
            update_optional_literal(ctx, contributor, id, own, predicates::HAS_CONTENT, Some(text.as_str()), literals::XSD_STRING)
        }
        (LiteratureListSection::Text { .. }, SectionDefinition::List { .. }) => {
            Err(DomainError::LiteratureListSectionTypeMismatchMustBeText)
        }
        (LiteratureListSection::List { .. }, SectionDefinition::Text { .. }) => {
            Err(DomainError::LiteratureListSectionTypeMismatchMustBeList)
        }
    }
}

fn delete_section(ctx: &GraphContext, contributor: ContributorId, list: &ThingId, section: &ThingId) -> DomainResult<()> {
    delete_child(
        ctx,
        contributor,
        ChildDeletion {
            parent: list,
            predicate: predicates::HAS_SECTION,
            child: section,
            owned_classes: &SECTION_OWNED,
            not_found: DomainError::LiteratureListSectionNotFound,
            not_modifiable: DomainError::LiteratureListNotModifiable,
        },
    )
}

fn validate_research_fields(ctx: &GraphContext, ids: &[ThingId]) -> DomainResult<()> {
    validate_single(ids, || DomainError::OnlyOneResearchFieldAllowed)?;
    validate_things(ctx, ids, classes::RESEARCH_FIELD, DomainError::ResearchFieldNotFound)
}

fn validate_organizational_units(observatories: &[ObservatoryId], organizations: &[OrganizationId]) -> DomainResult<()> {
    validate_single(observatories, || DomainError::OnlyOneObservatoryAllowed)?;
    validate_single(organizations, || DomainError::OnlyOneOrganizationAllowed)
}

fn validate_sections(ctx: &GraphContext, sections: &[SectionDefinition]) -> DomainResult<()> {
    let mut entries = EntryValidator::new();
    sections.iter().try_for_each(|section| section.validate(ctx, &mut entries))
}

mod create {
    use super::*;

    type State = CreateLiteratureListState;
    type Command = CreateLiteratureListCommand;

    pub(super) fn validate_title(_: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        validate_label(&command.title, "title")?;
        Ok(state)
    }

    pub(super) fn validate_research_fields(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        super::validate_research_fields(ctx, &command.research_fields)?;
        Ok(state)
    }

    pub(super) fn validate_authors(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        crate::actions::validate_authors(ctx, &command.authors)?;
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

    pub(super) fn validate_organizational_units(_: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        super::validate_organizational_units(&command.observatories, &command.organizations)?;
        Ok(state)
    }

    pub(super) fn validate_sections(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        super::validate_sections(ctx, &command.sections)?;
        Ok(state)
    }

    pub(super) fn create_resource(ctx: &GraphContext, command: &Command, _: State) -> DomainResult<State> {
        let mut resource = CreateResourceCommand::new(command.contributor, command.title.clone())
            .with_class(classes::LITERATURE_LIST)
            .with_extraction_method(command.extraction_method);
        if let Some(observatory) = command.observatories.first() {
            resource = resource.with_observatory(*observatory);
        }
        if let Some(organization) = command.organizations.first() {
            resource = resource.with_organization(*organization);
        }
        Ok(State { list_id: Some(ctx.services.create_resource(resource)?) })
    }

    pub(super) fn create_research_fields(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        update_object_set(ctx, command.contributor, state.id()?, &[], predicates::HAS_RESEARCH_FIELD, &command.research_fields)?;
        Ok(state)
    }

    pub(super) fn create_authors(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        update_authors(ctx, command.contributor, state.id()?, &[], &command.authors)?;
        Ok(state)
    }

    pub(super) fn create_sdgs(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        update_object_set(
            ctx,
            command.contributor,
            state.id()?,
            &[],
            predicates::HAS_SDG,
            &command.sustainable_development_goals,
        )?;
        Ok(state)
    }

    pub(super) fn create_sections(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let id = state.id()?;
        for (index, definition) in command.sections.iter().enumerate() {
            let section = super::create_section(ctx, command.contributor, definition)?;
            link(ctx, command.contributor, id, predicates::HAS_SECTION, &section, Some(index as i64))?;
        }
        Ok(state)
    }
}

mod update {
    use super::*;

    type State = UpdateLiteratureListState;
    type Command = UpdateLiteratureListCommand;

    pub(super) fn find_list(ctx: &GraphContext, command: &Command, _: State) -> DomainResult<State> {
        let root = find_unpublished(ctx, &command.id, RootKind::LITERATURE_LIST)?;
        let statements = load_subgraph(ctx, &root.id)?;
        let list = LiteratureList::from_graph(&root, &root.id, &statements);
        Ok(State { root: Some(root), statements, list: Some(list) })
    }

    pub(super) fn validate_title(_: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        if let Some(title) = &command.title {
            validate_label(title, "title")?;
        }
        Ok(state)
    }

    pub(super) fn validate_research_fields(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        if let Some(fields) = &command.research_fields {
            super::validate_research_fields(ctx, fields)?;
        }
        Ok(state)
    }

    pub(super) fn validate_authors(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        if let Some(authors) = &command.authors {
            crate::actions::validate_authors(ctx, authors)?;
        }
        Ok(state)
    }

    pub(super) fn validate_sdgs(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        if let Some(goals) = &command.sustainable_development_goals {
            validate_things(ctx, goals, classes::SDG, DomainError::SustainableDevelopmentGoalNotFound)?;
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

    pub(super) fn validate_sections(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        if let Some(sections) = &command.sections {
            super::validate_sections(ctx, sections)?;
        }
        Ok(state)
    }

    pub(super) fn update_resource(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let root = state.root(&command.id)?;
        let mut update = UpdateResourceCommand::new(root.id.clone(), command.contributor);
        let mut changed = false;
        if let Some(title) = command.title.as_ref().filter(|t| **t != root.label) {
            update.label = Some(title.clone());
            changed = true;
        }
        let observatory = command.observatories.as_ref().map(|o| o.first().copied().unwrap_or(ObservatoryId::UNKNOWN));
        if let Some(observatory) = observatory.filter(|o| *o != root.observatory_id) {
            update.observatory_id = Some(observatory);
            changed = true;
        }
        let organization = command.organizations.as_ref().map(|o| o.first().copied().unwrap_or(OrganizationId::UNKNOWN));
        if let Some(organization) = organization.filter(|o| *o != root.organization_id) {
            update.organization_id = Some(organization);
            changed = true;
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

    /// Keep sections whose definition is unchanged, replace the rest
    pub(super) fn update_sections(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let Some(definitions) = &command.sections else {
            return Ok(state);
        };
        let current = state.list.as_ref().map(|l| l.sections.as_slice()).unwrap_or_default();
        let mut unused: Vec<Option<&LiteratureListSection>> = current.iter().map(Some).collect();
        let matched: Vec<Option<ThingId>> = definitions
            .iter()
            .map(|definition| {
                unused
                    .iter_mut()
                    .find(|slot| slot.is_some_and(|s| s.to_definition() == *definition))
                    .and_then(Option::take)
                    .map(|s| s.id().clone())
            })
            .collect();

        for section in unused.into_iter().flatten() {
            delete_section(ctx, command.contributor, &command.id, section.id())?;
        }

        let links: Vec<&Statement> = state.own_statements(&command.id).where_predicate(predicates::HAS_SECTION);
        for (index, (definition, kept)) in definitions.iter().zip(&matched).enumerate() {
            let index = index as i64;
            match kept {
                Some(section) => {
                    let statement = links.iter().find(|s| s.object_id() == section);
                    if let Some(statement) = statement.filter(|s| s.index != Some(index)) {
                        ctx.services.update_statement_index(&statement.id, Some(index))?;
                    }
                }
                None => {
                    let section = super::create_section(ctx, command.contributor, definition)?;
                    link(ctx, command.contributor, &command.id, predicates::HAS_SECTION, &section, Some(index))?;
                }
            }
        }
        Ok(state)
    }
}

mod publish {
    use super::*;

    type State = PublishLiteratureListState;
    type Command = PublishLiteratureListCommand;

    pub(super) fn find_list(ctx: &GraphContext, command: &Command, _: State) -> DomainResult<State> {
        let root = find_unpublished(ctx, &command.id, PUBLISHED)?;
        let statements = load_subgraph(ctx, &root.id)?;
        let list = LiteratureList::from_graph(&root, &root.id, &statements);
        Ok(State { root: Some(root), statements, list: Some(list), ..State::default() })
    }

    pub(super) fn validate_changelog(_: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        match command.changelog() {
            Some(changelog) => validate_description(changelog, "changelog")?,
            None if command.assign_doi => return Err(DomainError::DescriptionRequiredForDoi),
            None => {}
        }
        Ok(state)
    }

    fn request<'a>(command: &'a Command, state: &'a State) -> DomainResult<VersionRequest<'a>> {
        Ok(VersionRequest {
            kind: RootKind::LITERATURE_LIST,
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
        state: State,
    ) -> DomainResult<State> {
        if !command.assign_doi {
            return Ok(state);
        }
        let root = state.root(&command.id)?;
        let version = state.version(&command.id)?;
        let authors = state.list.as_ref().map(|l| l.authors.as_slice()).unwrap_or_default();
        let versions = state.list.as_ref().map(|l| l.versions.as_slice()).unwrap_or_default();
        let metadata = DoiMetadata {
            suffix: version.id.to_string(),
            title: root.label.clone(),
            description: command.changelog().unwrap_or_default().to_string(),
            url: format!("{}{}", base_url, version.id),
            creators: authors.iter().map(|a| a.name.clone()).collect(),
            resource_type: classes::LITERATURE_LIST.to_string(),
            related_identifiers: previous_dois(versions, &state.statements),
        };
        publish_doi(ctx, doi_service, command.contributor, &version.id, &metadata)?;
        Ok(state)
    }
}
