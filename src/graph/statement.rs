//! Statements: directed, predicate-labeled edges between things

use super::ids::{ContributorId, StatementId, ThingId};
use super::thing::{Predicate, Thing};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A statement with its subject, predicate and object fully loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub id: StatementId,
    pub subject: Thing,
    pub predicate: Predicate,
    pub object: Thing,
    pub created_by: ContributorId,
    pub created_at: DateTime<Utc>,
    /// Ordering hint among siblings sharing subject and predicate
    pub index: Option<i64>,
    pub modifiable: bool,
}

impl Statement {
    pub fn subject_id(&self) -> &ThingId {
        self.subject.id()
    }

    pub fn predicate_id(&self) -> &ThingId {
        &self.predicate.id
    }

    pub fn object_id(&self) -> &ThingId {
        self.object.id()
    }
}

/// Statements of a bundle grouped by the id of their subject
pub type StatementsBySubject = HashMap<ThingId, Vec<Statement>>;

/// Group statements by subject id, keeping each group's input order
pub fn group_by_subject(statements: impl IntoIterator<Item = Statement>) -> StatementsBySubject {
    let mut grouped: StatementsBySubject = HashMap::new();
    for statement in statements {
        grouped
            .entry(statement.subject_id().clone())
            .or_default()
            .push(statement);
    }
    grouped
}

/// Query helpers over a slice of statements
pub trait StatementSliceExt {
    /// Statements using the given predicate
    fn where_predicate(&self, predicate: &str) -> Vec<&Statement>;

    /// Label of the first object reached via the given predicate
    fn first_object_label(&self, predicate: &str) -> Option<String>;

    /// Objects reached via the given predicate, ordered by statement index
    fn ordered_objects(&self, predicate: &str) -> Vec<&Thing>;

    /// Ids of objects reached via the given predicate
    fn object_ids(&self, predicate: &str) -> Vec<ThingId>;
}

impl StatementSliceExt for [Statement] {
    fn where_predicate(&self, predicate: &str) -> Vec<&Statement> {
        self.iter()
            .filter(|s| s.predicate.id.as_str() == predicate)
            .collect()
    }

    fn first_object_label(&self, predicate: &str) -> Option<String> {
        let mut matching = self.where_predicate(predicate);
        sort_by_position(&mut matching);
        matching.first().map(|s| s.object.label().to_string())
    }

    fn ordered_objects(&self, predicate: &str) -> Vec<&Thing> {
        let mut matching = self.where_predicate(predicate);
        sort_by_position(&mut matching);
        matching.into_iter().map(|s| &s.object).collect()
    }

    fn object_ids(&self, predicate: &str) -> Vec<ThingId> {
        self.ordered_objects(predicate)
            .into_iter()
            .map(|t| t.id().clone())
            .collect()
    }
}

/// Order statements by index, then creation time, then id
pub fn sort_by_position(statements: &mut [&Statement]) {
    statements.sort_by(|a, b| {
        a.index
            .unwrap_or(i64::MAX)
            .cmp(&b.index.unwrap_or(i64::MAX))
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::thing::{Literal, Resource};

    fn stmt(id: &str, subject: &str, predicate: &str, object: Thing, index: Option<i64>) -> Statement {
        Statement {
            id: StatementId::new(id),
            subject: Resource::new(ThingId::new(subject), subject).into(),
            predicate: Predicate::new(ThingId::new(predicate), predicate),
            object,
            created_by: ContributorId::UNKNOWN,
            created_at: Utc::now(),
            index,
            modifiable: true,
        }
    }

    #[test]
    fn ordered_objects_follow_statement_index() {
        let statements = vec![
            stmt("S1", "R1", "HasEntry", Resource::new("E2".into(), "e").into(), Some(1)),
            stmt("S2", "R1", "HasEntry", Resource::new("E1".into(), "e").into(), Some(0)),
            stmt("S3", "R1", "description", Literal::new("L1".into(), "text").into(), None),
        ];
        assert_eq!(
            statements.object_ids("HasEntry"),
            vec![ThingId::new("E1"), ThingId::new("E2")]
        );
        assert_eq!(statements.first_object_label("description").as_deref(), Some("text"));
        assert_eq!(statements.first_object_label("missing"), None);
    }

    #[test]
    fn grouping_keeps_subjects_apart() {
        let grouped = group_by_subject(vec![
            stmt("S1", "R1", "p", Literal::new("L1".into(), "a").into(), None),
            stmt("S2", "R2", "p", Literal::new("L2".into(), "b").into(), None),
            stmt("S3", "R1", "q", Literal::new("L3".into(), "c").into(), None),
        ]);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&ThingId::new("R1")].len(), 2);
    }
}
