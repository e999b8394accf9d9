//! Ordered list-entry differ for literature list sections
//!
//! Entries of a list section are `Entry` nodes reached via indexed `HasEntry`
//! statements; each links to its target via `HasLink` and may carry a
//! `description` literal. Updating a section matches old and new entries by
//! link target along their longest common subsequence: matched entries are
//! reused in place, the rest are deleted or created.

use super::deleter::delete_node;
use super::{create_literal_statement, link, GraphContext};
use crate::error::DomainResult;
use crate::graph::vocab::{classes, literals, predicates};
use crate::graph::{
    sort_by_position, ContributorId, StatementId, StatementSliceExt, StatementsBySubject, ThingId,
};
use crate::services::{
    CreateResourceCommand, LiteralUseCases, ResourceUseCases, StatementUseCases, UpdateLiteralCommand,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Desired entry of a list section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub value: ThingId,
    pub description: Option<String>,
}

impl ListEntry {
    pub fn new(value: impl Into<ThingId>) -> Self {
        Self { value: value.into(), description: None }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Description literal of a stored entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDescription {
    pub statement: StatementId,
    pub literal: ThingId,
    pub text: String,
}

/// An entry as stored in the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingEntry {
    pub node: ThingId,
    pub entry_statement: StatementId,
    pub index: Option<i64>,
    /// Link target; `None` for an entry whose link is missing
    pub value: Option<ThingId>,
    pub link_statement: Option<StatementId>,
    pub description: Option<EntryDescription>,
}

impl ExistingEntry {
    pub fn to_list_entry(&self) -> Option<ListEntry> {
        self.value.as_ref().map(|value| ListEntry {
            value: value.clone(),
            description: self.description.as_ref().map(|d| d.text.clone()),
        })
    }
}

/// Stored entries of `section`, in order
pub fn read_entries(section: &ThingId, statements: &StatementsBySubject) -> Vec<ExistingEntry> {
    let Some(own) = statements.get(section) else {
        return Vec::new();
    };
    let mut entry_statements = own.where_predicate(predicates::HAS_ENTRY);
    sort_by_position(&mut entry_statements);

    entry_statements
        .into_iter()
        .map(|statement| {
            let node = statement.object_id().clone();
            let node_statements = statements.get(&node).map(Vec::as_slice).unwrap_or(&[]);
            let target = node_statements.where_predicate(predicates::HAS_LINK).into_iter().next();
            let description = node_statements
                .where_predicate(predicates::DESCRIPTION)
                .into_iter()
                .next()
                .map(|d| EntryDescription {
                    statement: d.id.clone(),
                    literal: d.object_id().clone(),
                    text: d.object.label().to_string(),
                });
            ExistingEntry {
                node,
                entry_statement: statement.id.clone(),
                index: statement.index,
                value: target.map(|l| l.object_id().clone()),
                link_statement: target.map(|l| l.id.clone()),
                description,
            }
        })
        .collect()
}

/// Classification of old and new positions
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntryDiff {
    /// Pairs of (old position, new position) reusing the old node
    pub kept: Vec<(usize, usize)>,
    /// Old positions to delete
    pub removed: Vec<usize>,
    /// New positions to create
    pub inserted: Vec<usize>,
}

impl EntryDiff {
    pub fn compute(old: &[ExistingEntry], new: &[ListEntry]) -> Self {
        let same = |i: usize, j: usize| old[i].value.as_ref() == Some(&new[j].value);

        // lengths[i][j]: LCS length of old[i..] and new[j..]
        let mut lengths = vec![vec![0usize; new.len() + 1]; old.len() + 1];
        for i in (0..old.len()).rev() {
            for j in (0..new.len()).rev() {
                lengths[i][j] = if same(i, j) {
                    lengths[i + 1][j + 1] + 1
                } else {
                    lengths[i + 1][j].max(lengths[i][j + 1])
                };
            }
        }

        let mut diff = EntryDiff::default();
        let (mut i, mut j) = (0, 0);
        while i < old.len() && j < new.len() {
            if same(i, j) {
                diff.kept.push((i, j));
                i += 1;
                j += 1;
            } else if lengths[i + 1][j] >= lengths[i][j + 1] {
                diff.removed.push(i);
                i += 1;
            } else {
                diff.inserted.push(j);
                j += 1;
            }
        }
        diff.removed.extend(i..old.len());
        diff.inserted.extend(j..new.len());
        diff
    }
}

/// Applies an [`EntryDiff`] to one section
pub struct EntryUpdater<'a> {
    ctx: &'a GraphContext,
    contributor: ContributorId,
    section: &'a ThingId,
}

impl<'a> EntryUpdater<'a> {
    pub fn new(ctx: &'a GraphContext, contributor: ContributorId, section: &'a ThingId) -> Self {
        Self { ctx, contributor, section }
    }

    /// Create entries for a section that has none yet
    pub fn create_all(&self, entries: &[ListEntry]) -> DomainResult<()> {
        for (index, entry) in entries.iter().enumerate() {
            self.create(index, entry)?;
        }
        Ok(())
    }

    pub fn update(&self, old: &[ExistingEntry], new: &[ListEntry]) -> DomainResult<()> {
        let diff = EntryDiff::compute(old, new);
        tracing::debug!(
            section = %self.section,
            kept = diff.kept.len(),
            removed = diff.removed.len(),
            inserted = diff.inserted.len(),
            "updating section entries"
        );

        if !diff.removed.is_empty() {
            let mut statements = BTreeSet::new();
            for &i in &diff.removed {
                let entry = &old[i];
                statements.insert(entry.entry_statement.clone());
                statements.extend(entry.link_statement.clone());
                statements.extend(entry.description.as_ref().map(|d| d.statement.clone()));
            }
            self.ctx.services.delete_statements(&statements)?;
            for &i in &diff.removed {
                delete_node(self.ctx, &old[i].node, self.contributor)?;
            }
        }

        for &(i, j) in &diff.kept {
            self.reuse(&old[i], j, &new[j])?;
        }

        for &j in &diff.inserted {
            self.create(j, &new[j])?;
        }
        Ok(())
    }

    fn reuse(&self, old: &ExistingEntry, index: usize, new: &ListEntry) -> DomainResult<()> {
        let index = index as i64;
        if old.index != Some(index) {
            self.ctx
                .services
                .update_statement_index(&old.entry_statement, Some(index))?;
        }
        match (&old.description, &new.description) {
            (Some(current), Some(text)) if current.text != *text => {
                self.ctx.services.update_literal(UpdateLiteralCommand {
                    id: current.literal.clone(),
                    contributor: self.contributor,
                    label: Some(text.clone()),
                    datatype: None,
                })?;
            }
            (Some(current), None) => {
                self.ctx
                    .services
                    .delete_statements(&BTreeSet::from([current.statement.clone()]))?;
            }
            (None, Some(text)) => {
                create_literal_statement(
                    self.ctx,
                    self.contributor,
                    &old.node,
                    predicates::DESCRIPTION,
                    text,
                    literals::XSD_STRING,
                    None,
                )?;
            }
            _ => {}
        }
        Ok(())
    }

    fn create(&self, index: usize, entry: &ListEntry) -> DomainResult<()> {
        let node = self
            .ctx
            .services
            .create_resource(CreateResourceCommand::new(self.contributor, "Entry").with_class(classes::ENTRY))?;
        link(
            self.ctx,
            self.contributor,
            self.section,
            predicates::HAS_ENTRY,
            &node,
            Some(index as i64),
        )?;
        link(self.ctx, self.contributor, &node, predicates::HAS_LINK, &entry.value, None)?;
        if let Some(description) = &entry.description {
            create_literal_statement(
                self.ctx,
                self.contributor,
                &node,
                predicates::DESCRIPTION,
                description,
                literals::XSD_STRING,
                None,
            )?;
        }
        Ok(())
    }
}
