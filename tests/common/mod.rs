//! Shared fixtures for the integration suites
//!
//! Every fixture runs against an in-memory store seeded with the built-in
//! vocabulary. Writes go through a recording wrapper so suites can assert
//! exactly which mutations an operation performed.

#![allow(dead_code)]

use orkg_graph::config::PublishingConfig;
use orkg_graph::doi::LocalDoiService;
use orkg_graph::graph::vocab::classes;
use orkg_graph::graph::{ContributorId, Resource, ThingId};
use orkg_graph::services::{GraphServices, Mutation, RecordingUseCases};
use orkg_graph::storage::{GraphRepository, OpenStore, ResourceRepository, SqliteGraph};
use orkg_graph::{seed_vocabulary, ComparisonService, GraphContext, LiteratureListService, RosettaStoneTemplateService, UseCases};
use std::sync::Arc;

pub type Recorder = RecordingUseCases<GraphServices<dyn GraphRepository>>;

pub struct TestGraph {
    pub store: Arc<dyn GraphRepository>,
    pub recorder: Arc<Recorder>,
    pub ctx: GraphContext,
    pub doi: Arc<LocalDoiService>,
    pub contributor: ContributorId,
}

impl TestGraph {
    pub fn new() -> Self {
        Self::with_curators(Vec::new())
    }

    pub fn with_curators(curators: impl IntoIterator<Item = ContributorId>) -> Self {
        let store: Arc<dyn GraphRepository> = Arc::new(SqliteGraph::open_in_memory().unwrap());
        seed_vocabulary(store.as_ref()).unwrap();
        let services = GraphServices::new(Arc::clone(&store)).with_curators(curators);
        let recorder = Arc::new(RecordingUseCases::new(Arc::new(services)));
        let use_cases: Arc<dyn UseCases> = recorder.clone();
        let ctx = GraphContext::new(Arc::clone(&store), use_cases);
        Self {
            store,
            recorder,
            ctx,
            doi: Arc::new(LocalDoiService::new("10.5555")),
            contributor: ContributorId::new(),
        }
    }

    /// Save resources directly, bypassing the recorder
    pub fn seed(&self, resources: &[(&str, &str)]) -> &Self {
        for (id, class) in resources {
            self.store
                .save_resource(&Resource::new(ThingId::new(*id), *id).with_class(*class))
                .unwrap();
        }
        self
    }

    pub fn comparisons(&self) -> ComparisonService {
        ComparisonService::new(self.ctx.clone(), self.doi.clone(), PublishingConfig::default())
    }

    pub fn literature_lists(&self) -> LiteratureListService {
        LiteratureListService::new(self.ctx.clone(), self.doi.clone(), PublishingConfig::default())
    }

    pub fn templates(&self) -> RosettaStoneTemplateService {
        RosettaStoneTemplateService::new(self.ctx.clone())
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.recorder.mutations()
    }

    pub fn reset(&self) {
        self.recorder.reset();
    }

    pub fn is_untouched(&self) -> bool {
        self.recorder.is_untouched()
    }

    pub fn exists(&self, id: &str) -> bool {
        self.store.find_resource(&ThingId::new(id)).unwrap().is_some()
    }
}

/// Contributions, fields, goals and papers used across suites
pub fn scholarly_fixture() -> TestGraph {
    let graph = TestGraph::new();
    graph.seed(&[
        ("C1", classes::CONTRIBUTION),
        ("C2", classes::CONTRIBUTION),
        ("C3", classes::CONTRIBUTION),
        ("RF1", classes::RESEARCH_FIELD),
        ("SDG_3", classes::SDG),
        ("SDG_4", classes::SDG),
        ("P1", classes::PAPER),
        ("P2", classes::PAPER),
        ("P3", classes::PAPER),
        ("D1", classes::DATASET),
    ]);
    graph
}

pub fn ids(values: &[&str]) -> Vec<ThingId> {
    values.iter().map(|v| ThingId::new(*v)).collect()
}
