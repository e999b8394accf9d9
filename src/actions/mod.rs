//! Step pipelines for content-type operations
//!
//! An operation is an ordered list of steps. Each step receives the command
//! and the state accumulated so far and returns the next state. The first
//! failing step aborts the remaining ones; nothing is rolled back, so every
//! pipeline runs all of its validations before its first write.

mod authors;
mod deleter;
mod entries;
mod label;
mod publish;
mod template;
mod updaters;
mod validators;

pub use authors::{read_authors, update_authors, validate_authors, Author};
pub use deleter::{delete_child, ChildDeletion};
pub use entries::{read_entries, EntryDiff, EntryUpdater, ExistingEntry, ListEntry};
pub use label::{validate_label_update, validate_placeholders, FormattedLabel, LabelComponent};
pub use publish::{archive, create_version, link_version, publish_doi, PublishedVersion, VersionRequest};
pub use template::{
    create_property_shape, read_property_shapes, validate_template_property, PropertyShape,
    PropertyType, TemplatePropertyDefinition,
};
pub use updaters::{
    create_literal_statement, link, update_literal_list, update_object_set, update_optional_literal,
};
pub use validators::{
    ensure_not_previous_version, find_unpublished, validate_description, validate_label,
    validate_optional_description, validate_single, validate_things, EntryValidator, RootKind,
};

use crate::error::DomainResult;
use crate::services::{GraphServices, UseCases};
use crate::storage::GraphRepository;
use std::sync::Arc;

/// One step of a pipeline
pub trait Action<C, S>: Send + Sync {
    fn run(&self, command: &C, state: S) -> DomainResult<S>;

    /// Name used in trace output
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<C, S, F> Action<C, S> for F
where
    F: Fn(&C, S) -> DomainResult<S> + Send + Sync,
{
    fn run(&self, command: &C, state: S) -> DomainResult<S> {
        self(command, state)
    }
}

/// An ordered list of steps
pub type Steps<C, S> = Vec<Box<dyn Action<C, S>>>;

/// A step function bound to the context it runs against
pub struct Bound<F> {
    ctx: GraphContext,
    run: F,
}

impl<C, S, F> Action<C, S> for Bound<F>
where
    F: Fn(&GraphContext, &C, S) -> DomainResult<S> + Send + Sync,
{
    fn run(&self, command: &C, state: S) -> DomainResult<S> {
        (self.run)(&self.ctx, command, state)
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<F>()
    }
}

pub fn bind<C, S, F>(ctx: &GraphContext, run: F) -> Box<dyn Action<C, S>>
where
    F: Fn(&GraphContext, &C, S) -> DomainResult<S> + Send + Sync + 'static,
{
    Box::new(Bound { ctx: ctx.clone(), run })
}

/// Thread `state` through every step, stopping at the first error
pub fn execute<C, S>(steps: &[Box<dyn Action<C, S>>], command: &C, state: S) -> DomainResult<S> {
    steps.iter().try_fold(state, |state, step| {
        tracing::trace!(step = step.name(), "running step");
        step.run(command, state)
    })
}

/// The ports a step reads from and writes through
///
/// Steps read from the repository and write through the use cases, which
/// enforce the graph rules. Published snapshots are the one exception and are
/// stored directly.
#[derive(Clone)]
pub struct GraphContext {
    pub repository: Arc<dyn GraphRepository>,
    pub services: Arc<dyn UseCases>,
}

impl GraphContext {
    pub fn new(repository: Arc<dyn GraphRepository>, services: Arc<dyn UseCases>) -> Self {
        Self { repository, services }
    }

    /// Plain [`GraphServices`] over `repository`, without curators
    pub fn over<R: GraphRepository + 'static>(repository: Arc<R>) -> Self {
        let repository: Arc<dyn GraphRepository> = repository;
        let services: Arc<dyn UseCases> = Arc::new(GraphServices::new(Arc::clone(&repository)));
        Self { repository, services }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;
    use crate::graph::ThingId;
    use crate::storage::OpenStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Append(&'static str);

    impl Action<(), Vec<&'static str>> for Append {
        fn run(&self, _: &(), mut state: Vec<&'static str>) -> DomainResult<Vec<&'static str>> {
            state.push(self.0);
            Ok(state)
        }
    }

    #[test]
    fn steps_run_in_order() {
        let steps: Steps<(), Vec<&'static str>> = vec![Box::new(Append("a")), Box::new(Append("b"))];
        let state = execute(&steps, &(), Vec::new()).unwrap();
        assert_eq!(state, vec!["a", "b"]);
    }

    #[test]
    fn bound_steps_see_their_context() {
        let store = Arc::new(crate::storage::SqliteGraph::open_in_memory().unwrap());
        let ctx = GraphContext::over(store);
        fn count_resources(ctx: &GraphContext, _: &(), _: usize) -> DomainResult<usize> {
            use crate::storage::{ResourceFilter, ResourceRepository};
            Ok(ctx.repository.count_resources(&ResourceFilter::new())?)
        }
        let steps: Steps<(), usize> = vec![bind(&ctx, count_resources)];
        assert_eq!(execute(&steps, &(), 7).unwrap(), 0);
        assert!(steps[0].name().ends_with("count_resources"));
    }

    #[test]
    fn first_error_stops_the_pipeline() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let steps: Steps<(), usize> = vec![
            Box::new(|_: &(), n: usize| -> DomainResult<usize> { Ok(n + 1) }),
            Box::new(|_: &(), _: usize| -> DomainResult<usize> {
                Err(DomainError::ComparisonNotFound(ThingId::new("R1")))
            }),
            Box::new(move |_: &(), n: usize| -> DomainResult<usize> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(n)
            }),
        ];
        let err = execute(&steps, &(), 0).unwrap_err();
        assert!(matches!(err, DomainError::ComparisonNotFound(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
