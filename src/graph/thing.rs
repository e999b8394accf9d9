//! Thing node kinds: resources, literals, predicates and classes

use super::ids::{ContributorId, ObservatoryId, OrganizationId, ThingId};
use super::vocab::literals;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Listing state of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    #[default]
    Default,
    Featured,
    Unlisted,
    Deleted,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Default => "DEFAULT",
            Visibility::Featured => "FEATURED",
            Visibility::Unlisted => "UNLISTED",
            Visibility::Deleted => "DELETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DEFAULT" => Some(Visibility::Default),
            "FEATURED" => Some(Visibility::Featured),
            "UNLISTED" => Some(Visibility::Unlisted),
            "DELETED" => Some(Visibility::Deleted),
            _ => None,
        }
    }
}

/// How a resource came into the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractionMethod {
    Automatic,
    Manual,
    #[default]
    Unknown,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Automatic => "AUTOMATIC",
            ExtractionMethod::Manual => "MANUAL",
            ExtractionMethod::Unknown => "UNKNOWN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AUTOMATIC" => Some(ExtractionMethod::Automatic),
            "MANUAL" => Some(ExtractionMethod::Manual),
            "UNKNOWN" => Some(ExtractionMethod::Unknown),
            _ => None,
        }
    }
}

/// A resource node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ThingId,
    pub label: String,
    pub classes: BTreeSet<ThingId>,
    pub created_by: ContributorId,
    pub created_at: DateTime<Utc>,
    pub observatory_id: ObservatoryId,
    pub organization_id: OrganizationId,
    pub extraction_method: ExtractionMethod,
    pub visibility: Visibility,
    pub verified: bool,
    pub unlisted_by: Option<ContributorId>,
    pub modifiable: bool,
    /// Optimistic concurrency counter, 0 for a freshly created resource
    pub version: i64,
}

impl Resource {
    pub fn new(id: ThingId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            classes: BTreeSet::new(),
            created_by: ContributorId::UNKNOWN,
            created_at: Utc::now(),
            observatory_id: ObservatoryId::UNKNOWN,
            organization_id: OrganizationId::UNKNOWN,
            extraction_method: ExtractionMethod::Unknown,
            visibility: Visibility::Default,
            verified: false,
            unlisted_by: None,
            modifiable: true,
            version: 0,
        }
    }

    pub fn with_class(mut self, class: impl Into<ThingId>) -> Self {
        self.classes.insert(class.into());
        self
    }

    pub fn with_created_by(mut self, contributor: ContributorId) -> Self {
        self.created_by = contributor;
        self
    }

    pub fn with_modifiable(mut self, modifiable: bool) -> Self {
        self.modifiable = modifiable;
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c.as_str() == class)
    }
}

/// A literal node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub id: ThingId,
    pub label: String,
    pub datatype: String,
    pub created_by: ContributorId,
    pub created_at: DateTime<Utc>,
    pub modifiable: bool,
}

impl Literal {
    pub fn new(id: ThingId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            datatype: literals::XSD_STRING.to_string(),
            created_by: ContributorId::UNKNOWN,
            created_at: Utc::now(),
            modifiable: true,
        }
    }

    pub fn with_datatype(mut self, datatype: impl Into<String>) -> Self {
        self.datatype = datatype.into();
        self
    }
}

/// A predicate node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub id: ThingId,
    pub label: String,
    pub created_by: ContributorId,
    pub created_at: DateTime<Utc>,
    pub modifiable: bool,
}

impl Predicate {
    pub fn new(id: ThingId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            created_by: ContributorId::UNKNOWN,
            created_at: Utc::now(),
            modifiable: true,
        }
    }
}

/// A class node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub id: ThingId,
    pub label: String,
    pub uri: Option<String>,
    pub created_by: ContributorId,
    pub created_at: DateTime<Utc>,
    pub modifiable: bool,
}

impl Class {
    pub fn new(id: ThingId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            uri: None,
            created_by: ContributorId::UNKNOWN,
            created_at: Utc::now(),
            modifiable: true,
        }
    }
}

/// Discriminant of a thing, stored alongside every node row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThingKind {
    Resource,
    Literal,
    Predicate,
    Class,
}

impl ThingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThingKind::Resource => "resource",
            ThingKind::Literal => "literal",
            ThingKind::Predicate => "predicate",
            ThingKind::Class => "class",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "resource" => Some(ThingKind::Resource),
            "literal" => Some(ThingKind::Literal),
            "predicate" => Some(ThingKind::Predicate),
            "class" => Some(ThingKind::Class),
            _ => None,
        }
    }
}

/// Any addressable graph node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_class", rename_all = "snake_case")]
pub enum Thing {
    Resource(Resource),
    Literal(Literal),
    Predicate(Predicate),
    Class(Class),
}

impl Thing {
    pub fn id(&self) -> &ThingId {
        match self {
            Thing::Resource(r) => &r.id,
            Thing::Literal(l) => &l.id,
            Thing::Predicate(p) => &p.id,
            Thing::Class(c) => &c.id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Thing::Resource(r) => &r.label,
            Thing::Literal(l) => &l.label,
            Thing::Predicate(p) => &p.label,
            Thing::Class(c) => &c.label,
        }
    }

    pub fn kind(&self) -> ThingKind {
        match self {
            Thing::Resource(_) => ThingKind::Resource,
            Thing::Literal(_) => ThingKind::Literal,
            Thing::Predicate(_) => ThingKind::Predicate,
            Thing::Class(_) => ThingKind::Class,
        }
    }

    pub fn created_by(&self) -> ContributorId {
        match self {
            Thing::Resource(r) => r.created_by,
            Thing::Literal(l) => l.created_by,
            Thing::Predicate(p) => p.created_by,
            Thing::Class(c) => c.created_by,
        }
    }

    pub fn is_modifiable(&self) -> bool {
        match self {
            Thing::Resource(r) => r.modifiable,
            Thing::Literal(l) => l.modifiable,
            Thing::Predicate(p) => p.modifiable,
            Thing::Class(c) => c.modifiable,
        }
    }

    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Thing::Resource(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Thing::Literal(l) => Some(l),
            _ => None,
        }
    }

    /// Classes of a resource. Other kinds have none.
    pub fn classes(&self) -> BTreeSet<ThingId> {
        match self {
            Thing::Resource(r) => r.classes.clone(),
            _ => BTreeSet::new(),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        matches!(self, Thing::Resource(r) if r.has_class(class))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Thing::Literal(_))
    }
}

impl From<Resource> for Thing {
    fn from(r: Resource) -> Self {
        Thing::Resource(r)
    }
}

impl From<Literal> for Thing {
    fn from(l: Literal) -> Self {
        Thing::Literal(l)
    }
}

impl From<Predicate> for Thing {
    fn from(p: Predicate) -> Self {
        Thing::Predicate(p)
    }
}

impl From<Class> for Thing {
    fn from(c: Class) -> Self {
        Thing::Class(c)
    }
}
