//! Core graph data structures

mod ids;
mod statement;
mod text;
mod thing;
pub mod vocab;

pub use ids::{ContributorId, ObservatoryId, OrganizationId, StatementId, ThingId};
pub use statement::{group_by_subject, sort_by_position, Statement, StatementSliceExt, StatementsBySubject};
pub use text::{is_valid_description, is_valid_label};
pub use thing::{Class, ExtractionMethod, Literal, Predicate, Resource, Thing, ThingKind, Visibility};
