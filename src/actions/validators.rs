//! Shared validation steps

use super::GraphContext;
use crate::error::{DomainError, DomainResult};
use crate::graph::vocab::{classes, predicates};
use crate::graph::{is_valid_description, is_valid_label, Resource, ThingId};
use crate::storage::{PageRequest, ResourceRepository, StatementFilter, StatementRepository};
use std::collections::BTreeSet;

pub fn validate_label(label: &str, property: &str) -> DomainResult<()> {
    if is_valid_label(label) {
        Ok(())
    } else {
        Err(DomainError::InvalidLabel { property: property.to_string() })
    }
}

pub fn validate_description(description: &str, property: &str) -> DomainResult<()> {
    if is_valid_description(description) {
        Ok(())
    } else {
        Err(DomainError::InvalidDescription { property: property.to_string() })
    }
}

pub fn validate_optional_description(description: Option<&str>, property: &str) -> DomainResult<()> {
    match description {
        Some(description) => validate_description(description, property),
        None => Ok(()),
    }
}

/// At most one element, e.g. research fields of a comparison
pub fn validate_single<T>(items: &[T], error: impl FnOnce() -> DomainError) -> DomainResult<()> {
    if items.len() > 1 {
        Err(error())
    } else {
        Ok(())
    }
}

/// Every id must refer to a resource carrying `class`
pub fn validate_things(
    ctx: &GraphContext,
    ids: &[ThingId],
    class: &str,
    not_found: impl Fn(ThingId) -> DomainError,
) -> DomainResult<()> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            continue;
        }
        match ctx.repository.find_resource(id)? {
            Some(resource) if resource.has_class(class) => {}
            _ => return Err(not_found(id.clone())),
        }
    }
    Ok(())
}

/// Marker classes and errors of a versioned content type
#[derive(Clone, Copy)]
pub struct RootKind {
    pub class: &'static str,
    pub published_class: &'static str,
    pub not_found: fn(ThingId) -> DomainError,
    pub not_modifiable: fn(ThingId) -> DomainError,
}

impl RootKind {
    pub const COMPARISON: RootKind = RootKind {
        class: classes::COMPARISON,
        published_class: classes::COMPARISON_PUBLISHED,
        not_found: DomainError::ComparisonNotFound,
        not_modifiable: DomainError::ComparisonNotModifiable,
    };

    pub const LITERATURE_LIST: RootKind = RootKind {
        class: classes::LITERATURE_LIST,
        published_class: classes::LITERATURE_LIST_PUBLISHED,
        not_found: DomainError::LiteratureListNotFound,
        not_modifiable: DomainError::LiteratureListNotModifiable,
    };
}

/// Fail when `id` is the target of a `hasPreviousVersion` statement
pub fn ensure_not_previous_version(
    ctx: &GraphContext,
    id: &ThingId,
    error: impl FnOnce() -> DomainError,
) -> DomainResult<()> {
    let filter = StatementFilter::new()
        .with_predicate(predicates::HAS_PREVIOUS_VERSION)
        .with_object(id.clone());
    let found = ctx.repository.find_statements(&filter, &PageRequest::single())?;
    if found.total_elements > 0 {
        Err(error())
    } else {
        Ok(())
    }
}

/// Load the root of an editable content-type entity
///
/// Fails with the kind's not-found error when no resource with the marker
/// class exists, and with its not-modifiable error when the resource is a
/// published version or has been superseded by a newer version.
pub fn find_unpublished(ctx: &GraphContext, id: &ThingId, kind: RootKind) -> DomainResult<Resource> {
    let resource = ctx
        .repository
        .find_resource(id)?
        .ok_or_else(|| (kind.not_found)(id.clone()))?;
    if resource.has_class(kind.published_class) {
        return Err((kind.not_modifiable)(id.clone()));
    }
    if !resource.has_class(kind.class) {
        return Err((kind.not_found)(id.clone()));
    }
    ensure_not_previous_version(ctx, id, || (kind.not_modifiable)(id.clone()))?;
    Ok(resource)
}

/// Validates list-section entries, remembering ids that already passed
#[derive(Debug, Default)]
pub struct EntryValidator {
    validated: BTreeSet<ThingId>,
}

impl EntryValidator {
    pub const ALLOWED_CLASSES: [&'static str; 3] = [classes::PAPER, classes::DATASET, classes::SOFTWARE];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&mut self, ctx: &GraphContext, id: &ThingId) -> DomainResult<()> {
        if self.validated.contains(id) {
            return Ok(());
        }
        let allowed = ctx
            .repository
            .find_resource(id)?
            .map(|r| Self::ALLOWED_CLASSES.iter().any(|c| r.has_class(c)))
            .unwrap_or(false);
        if !allowed {
            return Err(DomainError::InvalidListSectionEntry {
                id: id.clone(),
                expected: Self::ALLOWED_CLASSES.iter().map(|c| ThingId::new(*c)).collect(),
            });
        }
        self.validated.insert(id.clone());
        Ok(())
    }

    pub fn validated(&self) -> &BTreeSet<ThingId> {
        &self.validated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ContributorId;
    use crate::services::{seed_vocabulary, CreateStatementCommand, StatementUseCases};
    use crate::storage::{OpenStore, SqliteGraph};
    use std::sync::Arc;

    fn create_context() -> GraphContext {
        let store = Arc::new(SqliteGraph::open_in_memory().unwrap());
        seed_vocabulary(store.as_ref()).unwrap();
        GraphContext::over(store)
    }

    fn resource(ctx: &GraphContext, id: &str, class: &str) {
        ctx.repository
            .save_resource(&Resource::new(ThingId::new(id), id).with_class(class))
            .unwrap();
    }

    #[test]
    fn published_roots_are_not_modifiable() {
        let ctx = create_context();
        resource(&ctx, "R1", classes::COMPARISON);
        resource(&ctx, "R2", classes::COMPARISON_PUBLISHED);
        resource(&ctx, "R3", classes::PAPER);

        assert!(find_unpublished(&ctx, &ThingId::new("R1"), RootKind::COMPARISON).is_ok());
        assert!(matches!(
            find_unpublished(&ctx, &ThingId::new("R2"), RootKind::COMPARISON),
            Err(DomainError::ComparisonNotModifiable(_))
        ));
        assert!(matches!(
            find_unpublished(&ctx, &ThingId::new("R3"), RootKind::COMPARISON),
            Err(DomainError::ComparisonNotFound(_))
        ));
        assert!(matches!(
            find_unpublished(&ctx, &ThingId::new("R9"), RootKind::COMPARISON),
            Err(DomainError::ComparisonNotFound(_))
        ));
    }

    #[test]
    fn superseded_roots_are_frozen() {
        let ctx = create_context();
        resource(&ctx, "R1", classes::COMPARISON);
        resource(&ctx, "R2", classes::COMPARISON);
        ctx.services
            .add_statement(CreateStatementCommand::new(
                ContributorId::UNKNOWN,
                "R2",
                predicates::HAS_PREVIOUS_VERSION,
                "R1",
            ))
            .unwrap();

        assert!(matches!(
            find_unpublished(&ctx, &ThingId::new("R1"), RootKind::COMPARISON),
            Err(DomainError::ComparisonNotModifiable(_))
        ));
        assert!(find_unpublished(&ctx, &ThingId::new("R2"), RootKind::COMPARISON).is_ok());
    }

    #[test]
    fn entry_validator_caches_accepted_ids() {
        let ctx = create_context();
        resource(&ctx, "P1", classes::PAPER);
        resource(&ctx, "V1", classes::VISUALIZATION);

        let mut validator = EntryValidator::new();
        validator.validate(&ctx, &ThingId::new("P1")).unwrap();
        validator.validate(&ctx, &ThingId::new("P1")).unwrap();
        assert_eq!(validator.validated().len(), 1);

        let err = validator.validate(&ctx, &ThingId::new("V1")).unwrap_err();
        assert!(matches!(err, DomainError::InvalidListSectionEntry { .. }));
        assert!(validator.validate(&ctx, &ThingId::new("missing")).is_err());
    }

    #[test]
    fn single_allows_zero_or_one() {
        assert!(validate_single::<u8>(&[], || DomainError::OnlyOneResearchFieldAllowed).is_ok());
        assert!(validate_single(&[1], || DomainError::OnlyOneResearchFieldAllowed).is_ok());
        assert!(matches!(
            validate_single(&[1, 2], || DomainError::OnlyOneResearchFieldAllowed),
            Err(DomainError::OnlyOneResearchFieldAllowed)
        ));
    }
}
