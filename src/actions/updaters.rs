//! Statement updaters translating field deltas into statement writes
//!
//! Each updater compares the current statements of a subject with the
//! desired value and only writes when they differ.

use super::GraphContext;
use crate::error::DomainResult;
use crate::graph::{ContributorId, Statement, StatementId, StatementSliceExt, ThingId};
use crate::services::{CreateLiteralCommand, CreateStatementCommand, LiteralUseCases, StatementUseCases};
use std::collections::BTreeSet;

/// Add `subject -predicate-> object`
pub fn link(
    ctx: &GraphContext,
    contributor: ContributorId,
    subject: &ThingId,
    predicate: &str,
    object: &ThingId,
    index: Option<i64>,
) -> DomainResult<StatementId> {
    let mut command = CreateStatementCommand::new(contributor, subject.clone(), predicate, object.clone());
    command.index = index;
    ctx.services.add_statement(command)
}

/// Create a literal and link it from `subject`
pub fn create_literal_statement(
    ctx: &GraphContext,
    contributor: ContributorId,
    subject: &ThingId,
    predicate: &str,
    value: &str,
    datatype: &str,
    index: Option<i64>,
) -> DomainResult<StatementId> {
    let literal = ctx
        .services
        .create_literal(CreateLiteralCommand::new(contributor, value).with_datatype(datatype))?;
    link(ctx, contributor, subject, predicate, &literal, index)
}

/// Make the set of objects reached via `predicate` equal to `targets`
///
/// Objects already linked are kept; only the difference is written.
pub fn update_object_set(
    ctx: &GraphContext,
    contributor: ContributorId,
    subject: &ThingId,
    current: &[Statement],
    predicate: &str,
    targets: &[ThingId],
) -> DomainResult<()> {
    let existing = current.where_predicate(predicate);
    let wanted: BTreeSet<&ThingId> = targets.iter().collect();
    let present: BTreeSet<&ThingId> = existing.iter().map(|s| s.object_id()).collect();

    let to_remove: BTreeSet<StatementId> = existing
        .iter()
        .filter(|s| !wanted.contains(s.object_id()))
        .map(|s| s.id.clone())
        .collect();
    if !to_remove.is_empty() {
        ctx.services.delete_statements(&to_remove)?;
    }

    let mut added = BTreeSet::new();
    for target in targets {
        if !present.contains(target) && added.insert(target) {
            link(ctx, contributor, subject, predicate, target, None)?;
        }
    }
    Ok(())
}

/// Set, replace or clear the single literal reached via `predicate`
///
/// A changed value replaces the statement and its literal rather than
/// editing the literal in place, so published versions sharing the old
/// literal keep their value.
pub fn update_optional_literal(
    ctx: &GraphContext,
    contributor: ContributorId,
    subject: &ThingId,
    current: &[Statement],
    predicate: &str,
    value: Option<&str>,
    datatype: &str,
) -> DomainResult<()> {
    let existing = current.where_predicate(predicate);
    let unchanged = match (existing.as_slice(), value) {
        ([], None) => true,
        ([statement], Some(value)) => statement.object.label() == value,
        _ => false,
    };
    if unchanged {
        return Ok(());
    }
    if !existing.is_empty() {
        let ids: BTreeSet<StatementId> = existing.iter().map(|s| s.id.clone()).collect();
        ctx.services.delete_statements(&ids)?;
    }
    if let Some(value) = value {
        create_literal_statement(ctx, contributor, subject, predicate, value, datatype, None)?;
    }
    Ok(())
}

/// Replace the ordered literal values reached via `predicate`
pub fn update_literal_list(
    ctx: &GraphContext,
    contributor: ContributorId,
    subject: &ThingId,
    current: &[Statement],
    predicate: &str,
    values: &[String],
    datatype: &str,
) -> DomainResult<()> {
    let labels: Vec<&str> = current
        .ordered_objects(predicate)
        .into_iter()
        .map(|thing| thing.label())
        .collect();
    if labels.len() == values.len() && labels.iter().zip(values).all(|(label, value)| *label == value) {
        return Ok(());
    }
    let ids: BTreeSet<StatementId> = current.where_predicate(predicate).iter().map(|s| s.id.clone()).collect();
    if !ids.is_empty() {
        ctx.services.delete_statements(&ids)?;
    }
    for (index, value) in values.iter().enumerate() {
        create_literal_statement(ctx, contributor, subject, predicate, value, datatype, Some(index as i64))?;
    }
    Ok(())
}
