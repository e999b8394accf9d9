//! Rosetta-stone templates: node shapes describing the positions of a statement type
//!
//! A template is a `RosettaNodeShape` resource pointing at its target class.
//! Its first property is the subject position, all others are object
//! positions. Once instances of the target class exist the template is in
//! use, and updates may only append optional positions.

use crate::actions::{
    bind, create_literal_statement, create_property_shape, delete_child, execute, link, read_property_shapes,
    update_optional_literal, validate_label_update, validate_placeholders, validate_single,
    validate_template_property, ChildDeletion, FormattedLabel, GraphContext, PropertyShape, Steps,
    TemplatePropertyDefinition,
};
use crate::error::{DomainError, DomainResult};
use crate::graph::vocab::{classes, literals, predicates};
use crate::graph::{
    group_by_subject, ContributorId, ObservatoryId, OrganizationId, Resource, Statement, StatementSliceExt,
    StatementsBySubject, ThingId, Visibility,
};
use crate::services::{
    ClassUseCases, CreateClassCommand, CreateResourceCommand, ResourceUseCases, StatementUseCases,
    UpdateResourceCommand,
};
use crate::storage::{BundleConfiguration, ClassHierarchyRepository, ResourceRepository, StatementRepository};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub struct RosettaStoneTemplate {
    pub id: ThingId,
    pub label: String,
    pub description: Option<String>,
    pub formatted_label: FormattedLabel,
    pub target_class: Option<ThingId>,
    pub example_usage: Option<String>,
    pub properties: Vec<PropertyShape>,
    pub observatory_id: ObservatoryId,
    pub organization_id: OrganizationId,
    pub visibility: Visibility,
    pub created_by: ContributorId,
    pub created_at: DateTime<Utc>,
    pub modifiable: bool,
}

impl RosettaStoneTemplate {
    fn from_graph(resource: &Resource, statements: &StatementsBySubject) -> Self {
        let own: &[Statement] = statements.get(&resource.id).map(Vec::as_slice).unwrap_or(&[]);
        let target_class = own.object_ids(predicates::SH_TARGET_CLASS).into_iter().next();
        let example_usage = target_class
            .as_ref()
            .and_then(|class| statements.get(class))
            .and_then(|class_statements| class_statements.first_object_label(predicates::EXAMPLE_OF_USAGE));
        Self {
            id: resource.id.clone(),
            label: resource.label.clone(),
            description: own.first_object_label(predicates::DESCRIPTION),
            formatted_label: FormattedLabel::parse(
                own.first_object_label(predicates::TEMPLATE_LABEL_FORMAT).unwrap_or_default(),
            ),
            target_class,
            example_usage,
            properties: read_property_shapes(&resource.id, statements),
            observatory_id: resource.observatory_id,
            organization_id: resource.organization_id,
            visibility: resource.visibility,
            created_by: resource.created_by,
            created_at: resource.created_at,
            modifiable: resource.modifiable,
        }
    }

    fn definitions(&self) -> Vec<TemplatePropertyDefinition> {
        self.properties.iter().map(|p| p.definition.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateRosettaStoneTemplateCommand {
    pub contributor: ContributorId,
    pub label: String,
    pub description: String,
    pub formatted_label: String,
    pub example_usage: String,
    pub properties: Vec<TemplatePropertyDefinition>,
    pub observatories: Vec<ObservatoryId>,
    pub organizations: Vec<OrganizationId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateRosettaStoneTemplateCommand {
    pub id: ThingId,
    pub contributor: ContributorId,
    pub label: Option<String>,
    pub description: Option<String>,
    pub formatted_label: Option<String>,
    pub example_usage: Option<String>,
    pub properties: Option<Vec<TemplatePropertyDefinition>>,
    pub observatories: Option<Vec<ObservatoryId>>,
    pub organizations: Option<Vec<OrganizationId>>,
}

impl UpdateRosettaStoneTemplateCommand {
    pub fn new(id: impl Into<ThingId>, contributor: ContributorId) -> Self {
        Self { id: id.into(), contributor, ..Self::default() }
    }
}

#[derive(Debug, Default)]
pub struct CreateRosettaStoneTemplateState {
    template_id: Option<ThingId>,
    target_class: Option<ThingId>,
}

#[derive(Debug, Default)]
pub struct UpdateRosettaStoneTemplateState {
    template: Option<RosettaStoneTemplate>,
    statements: StatementsBySubject,
    in_use: bool,
}

impl UpdateRosettaStoneTemplateState {
    fn template(&self, id: &ThingId) -> DomainResult<&RosettaStoneTemplate> {
        self.template
            .as_ref()
            .ok_or_else(|| DomainError::RosettaStoneTemplateNotFound(id.clone()))
    }

    fn own_statements(&self, id: &ThingId) -> &[Statement] {
        self.statements.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteRosettaStoneTemplateCommand {
    pub id: ThingId,
    pub contributor: ContributorId,
}

/// Deletion state; stays empty when the template does not exist
#[derive(Debug, Default)]
pub struct DeleteRosettaStoneTemplateState {
    resource: Option<Resource>,
    template: Option<RosettaStoneTemplate>,
    statements: StatementsBySubject,
}

pub struct RosettaStoneTemplateService {
    ctx: GraphContext,
}

impl RosettaStoneTemplateService {
    pub fn new(ctx: GraphContext) -> Self {
        Self { ctx }
    }

    pub fn find_by_id(&self, id: &ThingId) -> DomainResult<Option<RosettaStoneTemplate>> {
        match self.ctx.repository.find_resource(id)? {
            Some(resource) if resource.has_class(classes::ROSETTA_NODE_SHAPE) => {
                let statements = load_subgraph(&self.ctx, id)?;
                Ok(Some(RosettaStoneTemplate::from_graph(&resource, &statements)))
            }
            _ => Ok(None),
        }
    }

    pub fn create(&self, command: &CreateRosettaStoneTemplateCommand) -> DomainResult<ThingId> {
        let ctx = &self.ctx;
        let steps: Steps<CreateRosettaStoneTemplateCommand, CreateRosettaStoneTemplateState> = vec![
            bind(ctx, create::validate_label),
            bind(ctx, create::validate_description),
            bind(ctx, create::validate_formatted_label),
            bind(ctx, create::validate_example_usage),
            bind(ctx, create::validate_properties),
            bind(ctx, create::validate_organizational_units),
            bind(ctx, create::create_target_class),
            bind(ctx, create::create_resource),
            bind(ctx, create::create_literals),
            bind(ctx, create::create_properties),
        ];
        let state = execute(&steps, command, CreateRosettaStoneTemplateState::default())?;
        let id = state
            .template_id
            .ok_or_else(|| DomainError::RosettaStoneTemplateNotFound(ThingId::default()))?;
        tracing::info!(%id, "created rosetta stone template");
        Ok(id)
    }

    pub fn update(&self, command: &UpdateRosettaStoneTemplateCommand) -> DomainResult<()> {
        let ctx = &self.ctx;
        let steps: Steps<UpdateRosettaStoneTemplateCommand, UpdateRosettaStoneTemplateState> = vec![
            bind(ctx, update::find_template),
            bind(ctx, update::validate_label),
            bind(ctx, update::validate_description),
            bind(ctx, update::validate_example_usage),
            bind(ctx, update::validate_properties),
            bind(ctx, update::validate_formatted_label),
            bind(ctx, update::validate_organizational_units),
            bind(ctx, update::update_resource),
            bind(ctx, update::update_literals),
            bind(ctx, update::update_properties),
        ];
        execute(&steps, command, UpdateRosettaStoneTemplateState::default())?;
        tracing::debug!(id = %command.id, "updated rosetta stone template");
        Ok(())
    }

    /// Delete an unused template with its property shapes; the target class stays
    ///
    /// Deleting a template that does not exist does nothing.
    pub fn delete(&self, id: &ThingId, contributor: ContributorId) -> DomainResult<()> {
        let ctx = &self.ctx;
        let command = DeleteRosettaStoneTemplateCommand { id: id.clone(), contributor };
        let steps: Steps<DeleteRosettaStoneTemplateCommand, DeleteRosettaStoneTemplateState> = vec![
            bind(ctx, delete::find_template),
            bind(ctx, delete::validate_unused),
            bind(ctx, delete::validate_ownership),
            bind(ctx, delete::delete_statements),
            bind(ctx, delete::delete_resources),
        ];
        let state = execute(&steps, &command, DeleteRosettaStoneTemplateState::default())?;
        if state.template.is_some() {
            tracing::info!(%id, "deleted rosetta stone template");
        }
        Ok(())
    }
}

fn load_subgraph(ctx: &GraphContext, id: &ThingId) -> DomainResult<StatementsBySubject> {
    let statements = ctx
        .repository
        .fetch_as_bundle(id, &BundleConfiguration::new().with_max_level(2))?;
    Ok(group_by_subject(statements))
}

/// A template is in use once its target class has instances
fn is_in_use(ctx: &GraphContext, template: &RosettaStoneTemplate) -> DomainResult<bool> {
    match &template.target_class {
        Some(class) => Ok(ctx.repository.count_class_instances(class)? > 0),
        None => Ok(false),
    }
}

/// Structural rules of the positions, followed by the generic property rules
fn validate_positions(ctx: &GraphContext, properties: &[TemplatePropertyDefinition]) -> DomainResult<()> {
    let Some(subject) = properties.first() else {
        return Err(DomainError::MissingSubjectPosition);
    };
    if subject.path.as_str() != predicates::HAS_SUBJECT_POSITION {
        return Err(DomainError::InvalidSubjectPositionPath);
    }
    if !subject.is_required() {
        return Err(DomainError::InvalidSubjectPositionCardinality);
    }
    if subject.kind.is_literal() {
        return Err(DomainError::InvalidSubjectPositionType);
    }

    for (index, property) in properties.iter().enumerate() {
        if property.placeholder.is_none() {
            return Err(DomainError::MissingPropertyPlaceholder(index));
        }
        if index > 0 {
            match property.path.as_str() {
                predicates::HAS_SUBJECT_POSITION => return Err(DomainError::TooManySubjectPositions),
                predicates::HAS_OBJECT_POSITION => {}
                _ => return Err(DomainError::InvalidObjectPositionPath(index)),
            }
        }
        validate_template_property(ctx, property)?;
    }

    if !properties.iter().skip(1).any(TemplatePropertyDefinition::is_required) {
        return Err(DomainError::MissingRequiredObjectPosition);
    }
    Ok(())
}

fn validate_organizational_units(observatories: &[ObservatoryId], organizations: &[OrganizationId]) -> DomainResult<()> {
    validate_single(observatories, || DomainError::OnlyOneObservatoryAllowed)?;
    validate_single(organizations, || DomainError::OnlyOneOrganizationAllowed)
}

fn normalized(properties: &[TemplatePropertyDefinition]) -> Vec<TemplatePropertyDefinition> {
    properties.iter().cloned().map(TemplatePropertyDefinition::normalized).collect()
}

mod create {
    use super::*;

    type State = CreateRosettaStoneTemplateState;
    type Command = CreateRosettaStoneTemplateCommand;

    pub(super) fn validate_label(_: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        crate::actions::validate_label(&command.label, "label")?;
        Ok(state)
    }

    pub(super) fn validate_description(_: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        crate::actions::validate_description(&command.description, "description")?;
        Ok(state)
    }

    pub(super) fn validate_formatted_label(_: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        crate::actions::validate_label(&command.formatted_label, "formatted_label")?;
        validate_placeholders(&FormattedLabel::parse(command.formatted_label.as_str()), command.properties.len())?;
        Ok(state)
    }

    pub(super) fn validate_example_usage(_: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        crate::actions::validate_description(&command.example_usage, "example_usage")?;
        Ok(state)
    }

    pub(super) fn validate_properties(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        validate_positions(ctx, &command.properties)?;
        Ok(state)
    }

    pub(super) fn validate_organizational_units(_: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        super::validate_organizational_units(&command.observatories, &command.organizations)?;
        Ok(state)
    }

    pub(super) fn create_target_class(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let class = ctx
            .services
            .create_class(CreateClassCommand::new(command.contributor, command.label.clone()))?;
        Ok(State { target_class: Some(class), ..state })
    }

    pub(super) fn create_resource(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let mut resource = CreateResourceCommand::new(command.contributor, command.label.clone())
            .with_class(classes::ROSETTA_NODE_SHAPE);
        if let Some(observatory) = command.observatories.first() {
            resource = resource.with_observatory(*observatory);
        }
        if let Some(organization) = command.organizations.first() {
            resource = resource.with_organization(*organization);
        }
        let id = ctx.services.create_resource(resource)?;
        Ok(State { template_id: Some(id), ..state })
    }

    pub(super) fn create_literals(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let (Some(id), Some(class)) = (&state.template_id, &state.target_class) else {
            return Err(DomainError::RosettaStoneTemplateNotFound(ThingId::default()));
        };
        let contributor = command.contributor;
        link(ctx, contributor, id, predicates::SH_TARGET_CLASS, class, None)?;
        create_literal_statement(ctx, contributor, id, predicates::DESCRIPTION, &command.description, literals::XSD_STRING, None)?;
        create_literal_statement(
            ctx,
            contributor,
            id,
            predicates::TEMPLATE_LABEL_FORMAT,
            &command.formatted_label,
            literals::XSD_STRING,
            None,
        )?;
        create_literal_statement(
            ctx,
            contributor,
            class,
            predicates::EXAMPLE_OF_USAGE,
            &command.example_usage,
            literals::XSD_STRING,
            None,
        )?;
        Ok(state)
    }

    pub(super) fn create_properties(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let id = state
            .template_id
            .as_ref()
            .ok_or_else(|| DomainError::RosettaStoneTemplateNotFound(ThingId::default()))?;
        for (order, property) in command.properties.iter().enumerate() {
            create_property_shape(ctx, command.contributor, id, order, property)?;
        }
        Ok(state)
    }
}

mod update {
    use super::*;

    type State = UpdateRosettaStoneTemplateState;
    type Command = UpdateRosettaStoneTemplateCommand;

    fn changed<'a, T: PartialEq + ?Sized>(new: Option<&'a T>, old: &T) -> Option<&'a T> {
        new.filter(|new| *new != old)
    }

    pub(super) fn find_template(ctx: &GraphContext, command: &Command, _: State) -> DomainResult<State> {
        let resource = ctx
            .repository
            .find_resource(&command.id)?
            .filter(|r| r.has_class(classes::ROSETTA_NODE_SHAPE))
            .ok_or_else(|| DomainError::RosettaStoneTemplateNotFound(command.id.clone()))?;
        if !resource.modifiable {
            return Err(DomainError::RosettaStoneTemplateNotModifiable(command.id.clone()));
        }
        let statements = load_subgraph(ctx, &command.id)?;
        let template = RosettaStoneTemplate::from_graph(&resource, &statements);
        let in_use = is_in_use(ctx, &template)?;
        Ok(State { template: Some(template), statements, in_use })
    }

    fn ensure_unused(state: &State, template: &RosettaStoneTemplate, property: &str) -> DomainResult<()> {
        if state.in_use {
            return Err(DomainError::RosettaStoneTemplateInUseCantUpdateProperty {
                id: template.id.clone(),
                property: property.to_string(),
            });
        }
        Ok(())
    }

    pub(super) fn validate_label(_: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let template = state.template(&command.id)?;
        if let Some(label) = changed(command.label.as_deref(), template.label.as_str()) {
            crate::actions::validate_label(label, "label")?;
            ensure_unused(&state, template, "label")?;
        }
        Ok(state)
    }

    pub(super) fn validate_description(_: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let template = state.template(&command.id)?;
        let current = template.description.as_deref().unwrap_or_default();
        if let Some(description) = changed(command.description.as_deref(), current) {
            crate::actions::validate_description(description, "description")?;
            ensure_unused(&state, template, "description")?;
        }
        Ok(state)
    }

    pub(super) fn validate_example_usage(_: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let template = state.template(&command.id)?;
        let current = template.example_usage.as_deref().unwrap_or_default();
        if let Some(example) = changed(command.example_usage.as_deref(), current) {
            crate::actions::validate_description(example, "example_usage")?;
            if state.in_use && !example.starts_with(current) {
                return Err(DomainError::NewExampleUsageMustStartWithPreviousExampleUsage);
            }
        }
        Ok(state)
    }

    pub(super) fn validate_properties(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let template = state.template(&command.id)?;
        let Some(properties) = &command.properties else {
            return Ok(state);
        };
        let updated = normalized(properties);
        if updated == template.definitions() {
            return Ok(state);
        }
        validate_positions(ctx, properties)?;
        if state.in_use {
            for (index, old) in template.properties.iter().enumerate() {
                if updated.get(index) != Some(&old.definition) {
                    return Err(DomainError::RosettaStoneTemplatePropertyNotModifiable(old.id.clone()));
                }
            }
            if let Some(required) = properties[template.properties.len()..].iter().find(|p| p.is_required()) {
                return Err(DomainError::NewPropertyMustBeOptional(required.label.clone()));
            }
        }
        Ok(state)
    }

    pub(super) fn validate_formatted_label(_: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let template = state.template(&command.id)?;
        let updated = command.formatted_label.as_deref().map(FormattedLabel::parse);
        let property_count = command.properties.as_ref().map(Vec::len);

        if let Some(label) = &updated {
            crate::actions::validate_label(label.as_str(), "formatted_label")?;
        }
        if state.in_use {
            validate_label_update(
                &template.formatted_label,
                updated.as_ref(),
                template.properties.len(),
                property_count,
            )?;
        }
        if updated.is_some() || property_count.is_some() {
            let label = updated.as_ref().unwrap_or(&template.formatted_label);
            validate_placeholders(label, property_count.unwrap_or(template.properties.len()))?;
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

    pub(super) fn update_resource(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let template = state.template(&command.id)?;
        let mut update = UpdateResourceCommand::new(template.id.clone(), command.contributor);
        update.label = changed(command.label.as_ref(), &template.label).cloned();
        update.observatory_id = command
            .observatories
            .as_ref()
            .map(|o| o.first().copied().unwrap_or(ObservatoryId::UNKNOWN))
            .filter(|o| *o != template.observatory_id);
        update.organization_id = command
            .organizations
            .as_ref()
            .map(|o| o.first().copied().unwrap_or(OrganizationId::UNKNOWN))
            .filter(|o| *o != template.organization_id);
        if update.label.is_some() || update.observatory_id.is_some() || update.organization_id.is_some() {
            ctx.services.update_resource(update)?;
        }
        Ok(state)
    }

    pub(super) fn update_literals(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let template = state.template(&command.id)?;
        let own = state.own_statements(&template.id);
        if let Some(description) = &command.description {
            update_optional_literal(
                ctx,
                command.contributor,
                &template.id,
                own,
                predicates::DESCRIPTION,
                Some(description.as_str()),
                literals::XSD_STRING,
            )?;
        }
        if let Some(label) = &command.formatted_label {
            update_optional_literal(
                ctx,
                command.contributor,
                &template.id,
                own,
                predicates::TEMPLATE_LABEL_FORMAT,
                Some(label.as_str()),
                literals::XSD_STRING,
            )?;
        }
        if let (Some(example), Some(class)) = (&command.example_usage, &template.target_class) {
            update_optional_literal(
                ctx,
                command.contributor,
                class,
                state.own_statements(class),
                predicates::EXAMPLE_OF_USAGE,
                Some(example.as_str()),
                literals::XSD_STRING,
            )?;
        }
        Ok(state)
    }

    /// Keep shapes that are unchanged at their position, replace the others
    pub(super) fn update_properties(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let template = state.template(&command.id)?;
        let Some(properties) = &command.properties else {
            return Ok(state);
        };
        let updated = normalized(properties);
        for (index, old) in template.properties.iter().enumerate() {
            if updated.get(index) == Some(&old.definition) {
                continue;
            }
            delete_child(
                ctx,
                command.contributor,
                ChildDeletion {
                    parent: &template.id,
                    predicate: predicates::HAS_PROPERTY,
                    child: &old.id,
                    owned_classes: &[],
                    not_found: DomainError::RosettaStoneTemplatePropertyNotModifiable,
                    not_modifiable: DomainError::RosettaStoneTemplatePropertyNotModifiable,
                },
            )?;
        }
        for (index, property) in properties.iter().enumerate() {
            let kept = template
                .properties
                .get(index)
                .is_some_and(|old| updated.get(index) == Some(&old.definition));
            if !kept {
                create_property_shape(ctx, command.contributor, &template.id, index, property)?;
            }
        }
        Ok(state)
    }
}

mod delete {
    use super::*;

    type State = DeleteRosettaStoneTemplateState;
    type Command = DeleteRosettaStoneTemplateCommand;

    pub(super) fn find_template(ctx: &GraphContext, command: &Command, _: State) -> DomainResult<State> {
        let Some(resource) = ctx.repository.find_resource(&command.id)? else {
            return Ok(State::default());
        };
        if !resource.has_class(classes::ROSETTA_NODE_SHAPE) {
            return Err(DomainError::RosettaStoneTemplateNotFound(command.id.clone()));
        }
        if !resource.modifiable {
            return Err(DomainError::RosettaStoneTemplateNotModifiable(command.id.clone()));
        }
        let statements = load_subgraph(ctx, &command.id)?;
        let template = RosettaStoneTemplate::from_graph(&resource, &statements);
        Ok(State { resource: Some(resource), template: Some(template), statements })
    }

    pub(super) fn validate_unused(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        if let Some(template) = &state.template {
            if ctx.repository.count_incoming_statements(&command.id)? > 0 || is_in_use(ctx, template)? {
                return Err(DomainError::RosettaStoneTemplateInUse(command.id.clone()));
            }
        }
        Ok(state)
    }

    pub(super) fn validate_ownership(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        if let Some(resource) = &state.resource {
            if !ctx.services.may_delete(resource, command.contributor) {
                return Err(DomainError::NeitherOwnerNorCurator(command.contributor));
            }
        }
        Ok(state)
    }

    pub(super) fn delete_statements(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let Some(template) = &state.template else {
            return Ok(state);
        };
        let owned: BTreeSet<_> = std::iter::once(&command.id)
            .chain(template.properties.iter().map(|p| &p.id))
            .filter_map(|subject| state.statements.get(subject))
            .flatten()
            .map(|s| s.id.clone())
            .collect();
        if !owned.is_empty() {
            ctx.services.delete_statements(&owned)?;
        }
        Ok(state)
    }

    pub(super) fn delete_resources(ctx: &GraphContext, command: &Command, state: State) -> DomainResult<State> {
        let Some(template) = &state.template else {
            return Ok(state);
        };
        ctx.services.delete_resource(&command.id, command.contributor)?;
        for shape in &template.properties {
            ctx.services.delete_resource(&shape.id, command.contributor)?;
        }
        Ok(state)
    }
}
