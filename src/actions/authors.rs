//! Author lists: ordered `hasAuthor` statements to Author resources or name literals

use super::validators::validate_label;
use super::{create_literal_statement, link, GraphContext};
use crate::error::{DomainError, DomainResult};
use crate::graph::vocab::{classes, literals, predicates};
use crate::graph::{ContributorId, Statement, StatementId, StatementSliceExt, Thing, ThingId};
use crate::services::StatementUseCases;
use crate::storage::ResourceRepository;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An author, either an existing Author resource or a plain name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: Option<ThingId>,
    pub name: String,
}

impl Author {
    pub fn named(name: impl Into<String>) -> Self {
        Self { id: None, name: name.into() }
    }

    pub fn resource(id: impl Into<ThingId>, name: impl Into<String>) -> Self {
        Self { id: Some(id.into()), name: name.into() }
    }
}

/// Names must be valid labels; referenced ids must be Author resources
pub fn validate_authors(ctx: &GraphContext, authors: &[Author]) -> DomainResult<()> {
    for author in authors {
        validate_label(&author.name, "author")?;
        if let Some(id) = &author.id {
            match ctx.repository.find_resource(id)? {
                Some(resource) if resource.has_class(classes::AUTHOR) => {}
                _ => return Err(DomainError::AuthorNotFound(id.clone())),
            }
        }
    }
    Ok(())
}

/// Authors of `statements`, in statement index order
pub fn read_authors(statements: &[Statement]) -> Vec<Author> {
    statements
        .ordered_objects(predicates::HAS_AUTHOR)
        .into_iter()
        .map(|object| match object {
            Thing::Literal(literal) => Author::named(literal.label.clone()),
            other => Author::resource(other.id().clone(), other.label()),
        })
        .collect()
}

/// Replace the author list of `subject` when it differs from `authors`
pub fn update_authors(
    ctx: &GraphContext,
    contributor: ContributorId,
    subject: &ThingId,
    current: &[Statement],
    authors: &[Author],
) -> DomainResult<()> {
    if read_authors(current) == authors {
        return Ok(());
    }
    let existing: BTreeSet<StatementId> = current
        .where_predicate(predicates::HAS_AUTHOR)
        .iter()
        .map(|s| s.id.clone())
        .collect();
    if !existing.is_empty() {
        ctx.services.delete_statements(&existing)?;
    }
    for (index, author) in authors.iter().enumerate() {
        let index = Some(index as i64);
        match &author.id {
            Some(id) => {
                link(ctx, contributor, subject, predicates::HAS_AUTHOR, id, index)?;
            }
            None => {
                create_literal_statement(
                    ctx,
                    contributor,
                    subject,
                    predicates::HAS_AUTHOR,
                    &author.name,
                    literals::XSD_STRING,
                    index,
                )?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Resource;
    use crate::services::seed_vocabulary;
    use crate::storage::{OpenStore, PageRequest, SqliteGraph, StatementFilter, StatementRepository};
    use std::sync::Arc;

    #[test]
    fn authors_round_trip_through_statements() {
        let store = Arc::new(SqliteGraph::open_in_memory().unwrap());
        seed_vocabulary(store.as_ref()).unwrap();
        let ctx = GraphContext::over(store);
        ctx.repository
            .save_resource(&Resource::new(ThingId::new("R1"), "root"))
            .unwrap();
        ctx.repository
            .save_resource(&Resource::new(ThingId::new("A1"), "Ada Lovelace").with_class(classes::AUTHOR))
            .unwrap();

        let authors = vec![Author::named("Alan Turing"), Author::resource("A1", "Ada Lovelace")];
        validate_authors(&ctx, &authors).unwrap();
        update_authors(&ctx, ContributorId::UNKNOWN, &ThingId::new("R1"), &[], &authors).unwrap();

        let statements = ctx
            .repository
            .find_statements(&StatementFilter::new().with_subject("R1"), &PageRequest::all())
            .unwrap()
            .content;
        assert_eq!(read_authors(&statements), authors);
    }

    #[test]
    fn unknown_author_resources_are_rejected() {
        let store = Arc::new(SqliteGraph::open_in_memory().unwrap());
        seed_vocabulary(store.as_ref()).unwrap();
        let ctx = GraphContext::over(store);
        ctx.repository
            .save_resource(&Resource::new(ThingId::new("R2"), "not an author"))
            .unwrap();

        let err = validate_authors(&ctx, &[Author::resource("R2", "x")]).unwrap_err();
        assert!(matches!(err, DomainError::AuthorNotFound(id) if id.as_str() == "R2"));
    }
}
