//! Comparison flows end to end: create, no-op updates, publishing and
//! deletion of shared related figures.

mod common;

use common::{ids, scholarly_fixture};
use orkg_graph::actions::Author;
use orkg_graph::contenttypes::{
    CreateComparisonCommand, CreateRelatedFigureCommand, PublishComparisonCommand, UpdateComparisonCommand,
    UpdateRelatedFigureCommand,
};
use orkg_graph::graph::vocab::predicates;
use orkg_graph::graph::{ContributorId, ExtractionMethod, ThingId};
use orkg_graph::services::{CreateStatementCommand, Mutation, StatementUseCases};
use orkg_graph::storage::{PageRequest, StatementFilter, StatementRepository};
use orkg_graph::{DomainError, ErrorKind};

fn create_command(contributor: ContributorId, contributions: &[&str]) -> CreateComparisonCommand {
    CreateComparisonCommand {
        contributor,
        title: "Vaccine trials".into(),
        description: "Efficacy across phase III trials".into(),
        research_fields: ids(&["RF1"]),
        authors: vec![Author::named("Ada Lovelace")],
        sustainable_development_goals: ids(&["SDG_3"]),
        observatories: vec![],
        organizations: vec![],
        contributions: ids(contributions),
        references: vec![],
        is_anonymized: false,
        extraction_method: ExtractionMethod::Unknown,
    }
}

fn figure_command(comparison: &ThingId, contributor: ContributorId) -> CreateRelatedFigureCommand {
    CreateRelatedFigureCommand {
        comparison_id: comparison.clone(),
        contributor,
        label: "Forest plot".into(),
        image: Some("https://example.org/forest.png".into()),
        description: Some("relative risk per trial".into()),
    }
}

// ============================================================================
// Updates
// ============================================================================

#[test]
fn setting_the_current_goals_again_writes_nothing() {
    let graph = scholarly_fixture();
    let comparisons = graph.comparisons();
    let id = comparisons.create(&create_command(graph.contributor, &["C1", "C2"])).unwrap();
    graph.reset();

    let mut command = UpdateComparisonCommand::new(id.clone(), graph.contributor);
    command.sustainable_development_goals = Some(ids(&["SDG_3"]));
    command.title = Some("Vaccine trials".into());
    comparisons.update(&command).unwrap();

    assert!(graph.is_untouched(), "unexpected writes: {:?}", graph.mutations());
    let comparison = comparisons.find_by_id(&id).unwrap().unwrap();
    assert_eq!(comparison.sustainable_development_goals.len(), 1);
}

#[test]
fn replacing_a_goal_swaps_one_statement() {
    let graph = scholarly_fixture();
    let comparisons = graph.comparisons();
    let id = comparisons.create(&create_command(graph.contributor, &["C1", "C2"])).unwrap();
    graph.reset();

    let mut command = UpdateComparisonCommand::new(id.clone(), graph.contributor);
    command.sustainable_development_goals = Some(ids(&["SDG_4"]));
    comparisons.update(&command).unwrap();

    let mutations = graph.mutations();
    assert_eq!(mutations.len(), 2);
    assert!(matches!(&mutations[0], Mutation::DeleteStatements(removed) if removed.len() == 1));
    assert!(matches!(&mutations[1], Mutation::AddStatement(added) if added.object_id.as_str() == "SDG_4"));

    let goals: Vec<_> = comparisons
        .find_by_id(&id)
        .unwrap()
        .unwrap()
        .sustainable_development_goals
        .into_iter()
        .map(|g| g.id)
        .collect();
    assert_eq!(goals, ids(&["SDG_4"]));
}

#[test]
fn unknown_contribution_rejects_the_whole_update() {
    let graph = scholarly_fixture();
    let comparisons = graph.comparisons();
    let id = comparisons.create(&create_command(graph.contributor, &["C1", "C2"])).unwrap();
    graph.reset();

    let mut command = UpdateComparisonCommand::new(id, graph.contributor);
    command.title = Some("Renamed".into());
    command.contributions = Some(ids(&["C1", "C404"]));
    let err = comparisons.update(&command).unwrap_err();

    assert!(matches!(err, DomainError::ContributionNotFound(ref id) if id.as_str() == "C404"));
    assert!(graph.is_untouched());
}

// ============================================================================
// Publishing
// ============================================================================

#[test]
fn publishing_a_single_contribution_fails_before_any_write() {
    let graph = scholarly_fixture();
    let comparisons = graph.comparisons();
    let id = comparisons.create(&create_command(graph.contributor, &["C1"])).unwrap();
    graph.reset();

    let err = comparisons
        .publish(&PublishComparisonCommand {
            id,
            contributor: graph.contributor,
            description: Some("first release".into()),
            authors: vec![],
            assign_doi: true,
        })
        .unwrap_err();

    assert!(matches!(err, DomainError::RequiresAtLeastTwoContributions));
    assert!(graph.is_untouched());
    assert!(graph.doi.registrations().is_empty());
}

#[test]
fn versions_chain_and_the_root_stays_editable() {
    let graph = scholarly_fixture();
    let comparisons = graph.comparisons();
    let id = comparisons.create(&create_command(graph.contributor, &["C1", "C2"])).unwrap();
    let publish = |changelog: &str| {
        comparisons
            .publish(&PublishComparisonCommand {
                id: id.clone(),
                contributor: graph.contributor,
                description: Some(changelog.into()),
                authors: vec![],
                assign_doi: false,
            })
            .unwrap()
    };

    let first = publish("initial");
    let mut rename = UpdateComparisonCommand::new(id.clone(), graph.contributor);
    rename.title = Some("Vaccine trials, revised".into());
    comparisons.update(&rename).unwrap();
    let second = publish("revised title");

    let previous = graph
        .store
        .find_statements(
            &StatementFilter::new()
                .with_subject(second.clone())
                .with_predicate(predicates::HAS_PREVIOUS_VERSION),
            &PageRequest::all(),
        )
        .unwrap();
    assert_eq!(previous.content.len(), 1);
    assert_eq!(previous.content[0].object_id(), &first);

    assert_eq!(comparisons.find_by_id(&first).unwrap().unwrap().title, "Vaccine trials");
    assert_eq!(comparisons.find_by_id(&second).unwrap().unwrap().title, "Vaccine trials, revised");
    assert_eq!(comparisons.find_by_id(&id).unwrap().unwrap().versions.len(), 2);

    let err = comparisons.update(&UpdateComparisonCommand::new(first, graph.contributor)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotModifiable);
}

// ============================================================================
// Related figures
// ============================================================================

#[test]
fn figure_shared_with_another_comparison_is_only_unlinked() {
    let graph = scholarly_fixture();
    let comparisons = graph.comparisons();
    let first = comparisons.create(&create_command(graph.contributor, &["C1", "C2"])).unwrap();
    let second = comparisons.create(&create_command(graph.contributor, &["C2", "C3"])).unwrap();
    let figure = comparisons.create_related_figure(&figure_command(&first, graph.contributor)).unwrap();
    graph
        .ctx
        .services
        .add_statement(CreateStatementCommand::new(
            graph.contributor,
            second.clone(),
            predicates::HAS_RELATED_FIGURE,
            figure.clone(),
        ))
        .unwrap();
    graph.reset();

    comparisons.delete_related_figure(&first, &figure, graph.contributor).unwrap();

    let mutations = graph.mutations();
    assert_eq!(mutations.len(), 1);
    assert!(matches!(&mutations[0], Mutation::DeleteStatements(removed) if removed.len() == 1));
    assert!(graph.exists(figure.as_str()));
    assert!(comparisons.find_related_figure(&first, &figure).unwrap().is_none());
    let still_linked = comparisons.find_related_figure(&second, &figure).unwrap().unwrap();
    assert_eq!(still_linked.description.as_deref(), Some("relative risk per trial"));
}

#[test]
fn sole_figure_goes_with_its_statements() {
    let graph = scholarly_fixture();
    let comparisons = graph.comparisons();
    let comparison = comparisons.create(&create_command(graph.contributor, &["C1", "C2"])).unwrap();
    let figure = comparisons.create_related_figure(&figure_command(&comparison, graph.contributor)).unwrap();
    graph.reset();

    comparisons.delete_related_figure(&comparison, &figure, graph.contributor).unwrap();

    // link, image and description
    let mutations = graph.mutations();
    assert!(matches!(&mutations[0], Mutation::DeleteStatements(removed) if removed.len() == 3));
    assert_eq!(mutations[1], Mutation::DeleteResource { id: figure.clone(), contributor: graph.contributor });
    assert!(!graph.exists(figure.as_str()));
}

#[test]
fn figure_of_another_contributor_is_unlinked_but_kept() {
    let graph = scholarly_fixture();
    let comparisons = graph.comparisons();
    let comparison = comparisons.create(&create_command(graph.contributor, &["C1", "C2"])).unwrap();
    let figure = comparisons.create_related_figure(&figure_command(&comparison, graph.contributor)).unwrap();
    let stranger = ContributorId::new();

    comparisons.delete_related_figure(&comparison, &figure, stranger).unwrap();

    assert!(graph.exists(figure.as_str()));
    assert!(comparisons.find_by_id(&comparison).unwrap().unwrap().related_figures.is_empty());
}

#[test]
fn curators_may_delete_figures_of_others() {
    let curator = ContributorId::new();
    let graph = common::TestGraph::with_curators([curator]);
    graph.seed(&[
        ("C1", orkg_graph::graph::vocab::classes::CONTRIBUTION),
        ("C2", orkg_graph::graph::vocab::classes::CONTRIBUTION),
        ("RF1", orkg_graph::graph::vocab::classes::RESEARCH_FIELD),
        ("SDG_3", orkg_graph::graph::vocab::classes::SDG),
    ]);
    let comparisons = graph.comparisons();
    let comparison = comparisons.create(&create_command(graph.contributor, &["C1", "C2"])).unwrap();
    let figure = comparisons.create_related_figure(&figure_command(&comparison, graph.contributor)).unwrap();

    comparisons.delete_related_figure(&comparison, &figure, curator).unwrap();

    assert!(!graph.exists(figure.as_str()));
}

#[test]
fn figures_of_a_superseded_comparison_cannot_be_edited() {
    let graph = scholarly_fixture();
    let comparisons = graph.comparisons();
    let comparison = comparisons.create(&create_command(graph.contributor, &["C1", "C2"])).unwrap();
    let newer = comparisons.create(&create_command(graph.contributor, &["C2", "C3"])).unwrap();
    let figure = comparisons.create_related_figure(&figure_command(&comparison, graph.contributor)).unwrap();
    graph
        .ctx
        .services
        .add_statement(CreateStatementCommand::new(
            graph.contributor,
            newer,
            predicates::HAS_PREVIOUS_VERSION,
            comparison.clone(),
        ))
        .unwrap();
    graph.reset();

    let err = comparisons
        .update_related_figure(&UpdateRelatedFigureCommand {
            comparison_id: comparison.clone(),
            id: figure.clone(),
            contributor: graph.contributor,
            label: Some("renamed".into()),
            ..UpdateRelatedFigureCommand::default()
        })
        .unwrap_err();

    assert!(matches!(err, DomainError::ComparisonRelatedFigureNotModifiable(_)));
    assert_eq!(err.kind(), ErrorKind::NotModifiable);
    assert!(graph.is_untouched());
    assert_eq!(comparisons.find_related_figure(&comparison, &figure).unwrap().unwrap().label, "Forest plot");
}

#[test]
fn deleting_an_unlinked_figure_is_not_found() {
    let graph = scholarly_fixture();
    let comparisons = graph.comparisons();
    let comparison = comparisons.create(&create_command(graph.contributor, &["C1", "C2"])).unwrap();

    let err = comparisons
        .delete_related_figure(&comparison, &ThingId::new("R404"), graph.contributor)
        .unwrap_err();
    assert!(matches!(err, DomainError::ComparisonRelatedFigureNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
