//! Reference-counted deletion of child nodes shared between parents

use super::validators::ensure_not_previous_version;
use super::GraphContext;
use crate::error::{DomainError, DomainResult};
use crate::graph::{ContributorId, StatementId, Thing, ThingId};
use crate::services::{ResourceUseCases, StatementUseCases};
use crate::storage::{PageRequest, StatementFilter, StatementRepository};
use std::collections::{BTreeSet, VecDeque};

/// Which child to delete, and how to report failures
pub struct ChildDeletion<'a> {
    pub parent: &'a ThingId,
    pub predicate: &'a str,
    pub child: &'a ThingId,
    /// Classes of nodes below the child that belong to it and go with it
    pub owned_classes: &'a [&'a str],
    pub not_found: fn(ThingId) -> DomainError,
    pub not_modifiable: fn(ThingId) -> DomainError,
}

/// Remove a child from its parent, deleting it when nothing else refers to it
///
/// 1. The `parent -predicate-> child` statement must exist.
/// 2. A parent that is the target of `hasPreviousVersion` is frozen, and so
///    is a child that is not modifiable.
/// 3. A child with further incoming statements is only unlinked.
/// 4. Otherwise the linking statement, the child's own statements (and those
///    of owned nodes below it) and the nodes themselves are deleted. A node
///    that cannot be deleted for lack of permission stays in place; the
///    unlink still succeeds.
pub fn delete_child(ctx: &GraphContext, contributor: ContributorId, target: ChildDeletion<'_>) -> DomainResult<()> {
    let filter = StatementFilter::new()
        .with_subject(target.parent.clone())
        .with_predicate(target.predicate)
        .with_object(target.child.clone());
    let owning = ctx
        .repository
        .find_statements(&filter, &PageRequest::single())?
        .content
        .into_iter()
        .next()
        .ok_or_else(|| (target.not_found)(target.child.clone()))?;

    ensure_not_previous_version(ctx, target.parent, || (target.not_modifiable)(target.child.clone()))?;
    if !owning.object.is_modifiable() {
        return Err((target.not_modifiable)(target.child.clone()));
    }

    if ctx.repository.count_incoming_statements(target.child)? > 1 {
        tracing::debug!(child = %target.child, "child is shared, unlinking only");
        ctx.services.delete_statements(&BTreeSet::from([owning.id]))?;
        return Ok(());
    }

    let (statements, nodes) = owned_closure(ctx, target.child, target.owned_classes)?;
    let mut to_delete = BTreeSet::from([owning.id]);
    to_delete.extend(statements);
    ctx.services.delete_statements(&to_delete)?;

    for node in &nodes {
        delete_node(ctx, node, contributor)?;
    }
    Ok(())
}

/// Outgoing statements of `root` and of owned nodes reachable from it
fn owned_closure(
    ctx: &GraphContext,
    root: &ThingId,
    owned_classes: &[&str],
) -> DomainResult<(BTreeSet<StatementId>, Vec<ThingId>)> {
    let mut statements = BTreeSet::new();
    let mut nodes = vec![root.clone()];
    let mut visited = BTreeSet::from([root.clone()]);
    let mut queue = VecDeque::from([root.clone()]);

    while let Some(node) = queue.pop_front() {
        let outgoing = ctx
            .repository
            .find_statements(&StatementFilter::new().with_subject(node), &PageRequest::all())?
            .content;
        for statement in outgoing {
            let owned = matches!(&statement.object, Thing::Resource(r)
                if owned_classes.iter().any(|c| r.has_class(c)));
            if owned && visited.insert(statement.object_id().clone()) {
                nodes.push(statement.object_id().clone());
                queue.push_back(statement.object_id().clone());
            }
            statements.insert(statement.id);
        }
    }
    Ok((statements, nodes))
}

/// Delete a node, tolerating a missing permission
pub(crate) fn delete_node(ctx: &GraphContext, id: &ThingId, contributor: ContributorId) -> DomainResult<()> {
    match ctx.services.delete_resource(id, contributor) {
        Err(DomainError::NeitherOwnerNorCurator(contributor)) => {
            tracing::warn!(%id, %contributor, "not permitted to delete node, leaving it in place");
            Ok(())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::vocab::{classes, literals, predicates};
    use crate::graph::Resource;
    use crate::services::{
        seed_vocabulary, CreateStatementCommand, GraphServices, Mutation, RecordingUseCases, UseCases,
    };
    use crate::storage::{GraphRepository, OpenStore, ResourceRepository, SqliteGraph};
    use crate::actions::{create_literal_statement, link};
    use std::sync::Arc;

    struct Fixture {
        ctx: GraphContext,
        recorder: Arc<RecordingUseCases<GraphServices<dyn GraphRepository>>>,
        owner: ContributorId,
    }

    fn fixture() -> Fixture {
        let store: Arc<dyn GraphRepository> = Arc::new(SqliteGraph::open_in_memory().unwrap());
        seed_vocabulary(store.as_ref()).unwrap();
        let recorder = Arc::new(RecordingUseCases::new(Arc::new(GraphServices::new(Arc::clone(&store)))));
        let services: Arc<dyn UseCases> = recorder.clone();
        Fixture { ctx: GraphContext::new(store, services), recorder, owner: ContributorId::new() }
    }

    impl Fixture {
        fn resource(&self, id: &str, class: &str) -> ThingId {
            let id = ThingId::new(id);
            self.ctx
                .repository
                .save_resource(&Resource::new(id.clone(), id.as_str()).with_class(class).with_created_by(self.owner))
                .unwrap();
            id
        }

        fn figure_deletion<'a>(&self, parent: &'a ThingId, child: &'a ThingId) -> ChildDeletion<'a> {
            ChildDeletion {
                parent,
                predicate: predicates::HAS_RELATED_FIGURE,
                child,
                owned_classes: &[],
                not_found: DomainError::ComparisonRelatedFigureNotFound,
                not_modifiable: DomainError::ComparisonRelatedFigureNotModifiable,
            }
        }
    }

    #[test]
    fn sole_child_is_deleted_with_its_statements() {
        let f = fixture();
        let parent = f.resource("R1", classes::COMPARISON);
        let figure = f.resource("R2", classes::COMPARISON_RELATED_FIGURE);
        let owning = link(&f.ctx, f.owner, &parent, predicates::HAS_RELATED_FIGURE, &figure, None).unwrap();
        let s1 = create_literal_statement(&f.ctx, f.owner, &figure, predicates::HAS_IMAGE, "img.png", literals::XSD_STRING, None).unwrap();
        let s2 = create_literal_statement(&f.ctx, f.owner, &figure, predicates::DESCRIPTION, "a figure", literals::XSD_STRING, None).unwrap();
        f.recorder.reset();

        delete_child(&f.ctx, f.owner, f.figure_deletion(&parent, &figure)).unwrap();

        assert_eq!(
            f.recorder.mutations(),
            vec![
                Mutation::DeleteStatements(BTreeSet::from([owning, s1, s2])),
                Mutation::DeleteResource { id: figure.clone(), contributor: f.owner },
            ]
        );
        assert!(!f.ctx.repository.resource_exists(&figure).unwrap());
    }

    #[test]
    fn shared_child_is_only_unlinked() {
        let f = fixture();
        let parent = f.resource("R1", classes::COMPARISON);
        let other = f.resource("R3", classes::COMPARISON);
        let figure = f.resource("R2", classes::COMPARISON_RELATED_FIGURE);
        let owning = link(&f.ctx, f.owner, &parent, predicates::HAS_RELATED_FIGURE, &figure, None).unwrap();
        link(&f.ctx, f.owner, &other, predicates::HAS_RELATED_FIGURE, &figure, None).unwrap();
        f.recorder.reset();

        delete_child(&f.ctx, f.owner, f.figure_deletion(&parent, &figure)).unwrap();

        assert_eq!(f.recorder.mutations(), vec![Mutation::DeleteStatements(BTreeSet::from([owning]))]);
        assert!(f.ctx.repository.resource_exists(&figure).unwrap());
    }

    #[test]
    fn missing_link_is_not_found() {
        let f = fixture();
        let parent = f.resource("R1", classes::COMPARISON);
        let figure = f.resource("R2", classes::COMPARISON_RELATED_FIGURE);

        let err = delete_child(&f.ctx, f.owner, f.figure_deletion(&parent, &figure)).unwrap_err();
        assert!(matches!(err, DomainError::ComparisonRelatedFigureNotFound(_)));
        assert!(f.recorder.is_untouched());
    }

    #[test]
    fn frozen_parent_refuses_deletion() {
        let f = fixture();
        let parent = f.resource("R1", classes::COMPARISON);
        let newer = f.resource("R3", classes::COMPARISON);
        let figure = f.resource("R2", classes::COMPARISON_RELATED_FIGURE);
        link(&f.ctx, f.owner, &parent, predicates::HAS_RELATED_FIGURE, &figure, None).unwrap();
        f.ctx
            .services
            .add_statement(CreateStatementCommand::new(f.owner, newer, predicates::HAS_PREVIOUS_VERSION, parent.clone()))
            .unwrap();
        f.recorder.reset();

        let err = delete_child(&f.ctx, f.owner, f.figure_deletion(&parent, &figure)).unwrap_err();
        assert!(matches!(err, DomainError::ComparisonRelatedFigureNotModifiable(_)));
        assert!(f.recorder.is_untouched());
    }

    #[test]
    fn unmodifiable_child_refuses_deletion() {
        let f = fixture();
        let parent = f.resource("R1", classes::COMPARISON);
        let figure = ThingId::new("R2");
        f.ctx
            .repository
            .save_resource(
                &Resource::new(figure.clone(), "figure")
                    .with_class(classes::COMPARISON_RELATED_FIGURE)
                    .with_modifiable(false),
            )
            .unwrap();
        link(&f.ctx, f.owner, &parent, predicates::HAS_RELATED_FIGURE, &figure, None).unwrap();
        f.recorder.reset();

        let err = delete_child(&f.ctx, f.owner, f.figure_deletion(&parent, &figure)).unwrap_err();
        assert!(matches!(err, DomainError::ComparisonRelatedFigureNotModifiable(_)));
        assert!(f.recorder.is_untouched());
    }

    #[test]
    fn missing_permission_still_unlinks() {
        let f = fixture();
        let parent = f.resource("R1", classes::COMPARISON);
        let figure = f.resource("R2", classes::COMPARISON_RELATED_FIGURE);
        link(&f.ctx, f.owner, &parent, predicates::HAS_RELATED_FIGURE, &figure, None).unwrap();
        let stranger = ContributorId::new();

        delete_child(&f.ctx, stranger, f.figure_deletion(&parent, &figure)).unwrap();

        assert!(f.ctx.repository.resource_exists(&figure).unwrap());
        assert_eq!(f.ctx.repository.count_incoming_statements(&figure).unwrap(), 0);
    }

    #[test]
    fn owned_nodes_below_the_child_go_with_it() {
        let f = fixture();
        let list = f.resource("R1", classes::LITERATURE_LIST);
        let section = f.resource("R2", classes::LIST_SECTION);
        let entry = f.resource("R3", classes::ENTRY);
        let paper = f.resource("R4", classes::PAPER);
        link(&f.ctx, f.owner, &list, predicates::HAS_SECTION, &section, Some(0)).unwrap();
        link(&f.ctx, f.owner, &section, predicates::HAS_ENTRY, &entry, Some(0)).unwrap();
        link(&f.ctx, f.owner, &entry, predicates::HAS_LINK, &paper, None).unwrap();

        let deletion = ChildDeletion {
            parent: &list,
            predicate: predicates::HAS_SECTION,
            child: &section,
            owned_classes: &[classes::ENTRY],
            not_found: DomainError::LiteratureListSectionNotFound,
            not_modifiable: DomainError::LiteratureListNotModifiable,
        };
        delete_child(&f.ctx, f.owner, deletion).unwrap();

        assert!(!f.ctx.repository.resource_exists(&section).unwrap());
        assert!(!f.ctx.repository.resource_exists(&entry).unwrap());
        assert!(f.ctx.repository.resource_exists(&paper).unwrap());
        assert_eq!(f.ctx.repository.count_incoming_statements(&paper).unwrap(), 0);
    }
}
