//! Seeding of the well-known vocabulary

use crate::graph::vocab::{classes, predicates};
use crate::graph::{Class, ContributorId, Predicate, ThingId};
use crate::storage::{GraphRepository, StorageResult};

const PREDICATES: &[(&str, &str)] = &[
    (predicates::DESCRIPTION, "description"),
    (predicates::HAS_DOI, "has DOI"),
    (predicates::HAS_AUTHOR, "has author"),
    (predicates::HAS_RESEARCH_FIELD, "has research field"),
    (predicates::HAS_SDG, "sustainable development goal"),
    (predicates::HAS_CONTRIBUTION, "compare contribution"),
    (predicates::REFERENCE, "reference"),
    (predicates::IS_ANONYMIZED, "is anonymized"),
    (predicates::HAS_RELATED_FIGURE, "has related figure"),
    (predicates::HAS_RELATED_RESOURCE, "has related resource"),
    (predicates::HAS_VISUALIZATION, "has visualization"),
    (predicates::HAS_IMAGE, "image"),
    (predicates::HAS_URL, "url"),
    (predicates::HAS_PUBLISHED_VERSION, "has published version"),
    (predicates::HAS_PREVIOUS_VERSION, "has previous version"),
    (predicates::HAS_SECTION, "has section"),
    (predicates::HAS_ENTRY, "has entry"),
    (predicates::HAS_LINK, "has link"),
    (predicates::HAS_HEADING_LEVEL, "has heading level"),
    (predicates::HAS_CONTENT, "has content"),
    (predicates::HAS_PROPERTY, "property"),
    (predicates::SH_PATH, "path"),
    (predicates::SH_MIN_COUNT, "min count"),
    (predicates::SH_MAX_COUNT, "max count"),
    (predicates::SH_DATATYPE, "datatype"),
    (predicates::SH_CLASS, "class"),
    (predicates::SH_ORDER, "order"),
    (predicates::SH_PATTERN, "pattern"),
    (predicates::SH_MIN_INCLUSIVE, "min inclusive"),
    (predicates::SH_MAX_INCLUSIVE, "max inclusive"),
    (predicates::PLACEHOLDER, "placeholder"),
    (predicates::TEMPLATE_LABEL_FORMAT, "template label format"),
    (predicates::EXAMPLE_OF_USAGE, "example of usage"),
    (predicates::HAS_SUBJECT_POSITION, "has subject position"),
    (predicates::HAS_OBJECT_POSITION, "has object position"),
    (predicates::SH_TARGET_CLASS, "target class"),
];

const CLASSES: &[&str] = &[
    classes::THING,
    classes::RESOURCE,
    classes::LITERAL,
    classes::PREDICATE,
    classes::CLASS,
    classes::LIST,
    classes::COMPARISON,
    classes::COMPARISON_PUBLISHED,
    classes::COMPARISON_RELATED_FIGURE,
    classes::COMPARISON_RELATED_RESOURCE,
    classes::LITERATURE_LIST,
    classes::LITERATURE_LIST_PUBLISHED,
    classes::LIST_SECTION,
    classes::TEXT_SECTION,
    classes::ENTRY,
    classes::LATEST_VERSION,
    classes::ROSETTA_NODE_SHAPE,
    classes::PROPERTY_SHAPE,
    classes::ROSETTA_STONE_STATEMENT,
    classes::PAPER,
    classes::DATASET,
    classes::SOFTWARE,
    classes::VISUALIZATION,
    classes::CONTRIBUTION,
    classes::RESEARCH_FIELD,
    classes::SDG,
    classes::AUTHOR,
    classes::VENUE,
    classes::STRING,
    classes::INTEGER,
    classes::DECIMAL,
    classes::FLOAT,
    classes::BOOLEAN,
];

/// Create the predicates and classes content types rely on
///
/// Existing entries are left alone, so seeding an initialized store is a no-op.
/// Returns the number of things created.
pub fn seed_vocabulary<R: GraphRepository + ?Sized>(repository: &R) -> StorageResult<usize> {
    let mut created = 0;
    for (id, label) in PREDICATES {
        let id = ThingId::new(*id);
        if !repository.thing_exists(&id)? {
            let predicate = Predicate {
                modifiable: false,
                created_by: ContributorId::UNKNOWN,
                ..Predicate::new(id, *label)
            };
            repository.save_predicate(&predicate)?;
            created += 1;
        }
    }
    for id in CLASSES {
        let id = ThingId::new(*id);
        if !repository.thing_exists(&id)? {
            let class = Class {
                modifiable: false,
                ..Class::new(id.clone(), id.as_str())
            };
            repository.save_class(&class)?;
            created += 1;
        }
    }
    tracing::info!(created, "seeded vocabulary");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{OpenStore, SqliteGraph};
    use crate::storage::{ClassRepository, PredicateRepository};

    #[test]
    fn seeding_twice_creates_nothing_new() {
        let store = SqliteGraph::open_in_memory().unwrap();
        let first = seed_vocabulary(&store).unwrap();
        assert_eq!(first, PREDICATES.len() + CLASSES.len());
        assert_eq!(seed_vocabulary(&store).unwrap(), 0);
        assert!(store.predicate_exists(&ThingId::new(predicates::HAS_ENTRY)).unwrap());
        assert!(store.class_exists(&ThingId::new(classes::COMPARISON)).unwrap());
    }
}
