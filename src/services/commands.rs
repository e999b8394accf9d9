//! Commands accepted by the node-kind use cases

use crate::graph::{
    ContributorId, ExtractionMethod, ObservatoryId, OrganizationId, StatementId, ThingId, Visibility,
};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub struct CreateResourceCommand {
    /// Caller-assigned id; generated when absent
    pub id: Option<ThingId>,
    pub contributor: ContributorId,
    pub label: String,
    pub classes: BTreeSet<ThingId>,
    pub extraction_method: ExtractionMethod,
    pub observatory_id: ObservatoryId,
    pub organization_id: OrganizationId,
    pub modifiable: bool,
}

impl CreateResourceCommand {
    pub fn new(contributor: ContributorId, label: impl Into<String>) -> Self {
        Self {
            id: None,
            contributor,
            label: label.into(),
            classes: BTreeSet::new(),
            extraction_method: ExtractionMethod::Unknown,
            observatory_id: ObservatoryId::UNKNOWN,
            organization_id: OrganizationId::UNKNOWN,
            modifiable: true,
        }
    }

    pub fn with_id(mut self, id: impl Into<ThingId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<ThingId>) -> Self {
        self.classes.insert(class.into());
        self
    }

    pub fn with_classes<I, T>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ThingId>,
    {
        self.classes.extend(classes.into_iter().map(Into::into));
        self
    }

    pub fn with_observatory(mut self, id: ObservatoryId) -> Self {
        self.observatory_id = id;
        self
    }

    pub fn with_organization(mut self, id: OrganizationId) -> Self {
        self.organization_id = id;
        self
    }

    pub fn with_extraction_method(mut self, method: ExtractionMethod) -> Self {
        self.extraction_method = method;
        self
    }
}

/// Partial update of a resource; `None` fields are left untouched
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateResourceCommand {
    pub id: ThingId,
    pub contributor: ContributorId,
    pub label: Option<String>,
    pub classes: Option<BTreeSet<ThingId>>,
    pub visibility: Option<Visibility>,
    pub observatory_id: Option<ObservatoryId>,
    pub organization_id: Option<OrganizationId>,
    pub extraction_method: Option<ExtractionMethod>,
    pub modifiable: Option<bool>,
}

impl UpdateResourceCommand {
    pub fn new(id: ThingId, contributor: ContributorId) -> Self {
        Self {
            id,
            contributor,
            label: None,
            classes: None,
            visibility: None,
            observatory_id: None,
            organization_id: None,
            extraction_method: None,
            modifiable: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_classes(mut self, classes: BTreeSet<ThingId>) -> Self {
        self.classes = Some(classes);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateLiteralCommand {
    pub id: Option<ThingId>,
    pub contributor: ContributorId,
    pub label: String,
    pub datatype: String,
    pub modifiable: bool,
}

impl CreateLiteralCommand {
    pub fn new(contributor: ContributorId, label: impl Into<String>) -> Self {
        Self {
            id: None,
            contributor,
            label: label.into(),
            datatype: crate::graph::vocab::literals::XSD_STRING.to_string(),
            modifiable: true,
        }
    }

    pub fn with_datatype(mut self, datatype: impl Into<String>) -> Self {
        self.datatype = datatype.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateLiteralCommand {
    pub id: ThingId,
    pub contributor: ContributorId,
    pub label: Option<String>,
    pub datatype: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatePredicateCommand {
    pub id: Option<ThingId>,
    pub contributor: ContributorId,
    pub label: String,
    pub modifiable: bool,
}

impl CreatePredicateCommand {
    pub fn new(contributor: ContributorId, label: impl Into<String>) -> Self {
        Self { id: None, contributor, label: label.into(), modifiable: true }
    }

    pub fn with_id(mut self, id: impl Into<ThingId>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateClassCommand {
    pub id: Option<ThingId>,
    pub contributor: ContributorId,
    pub label: String,
    pub uri: Option<String>,
    pub modifiable: bool,
}

impl CreateClassCommand {
    pub fn new(contributor: ContributorId, label: impl Into<String>) -> Self {
        Self { id: None, contributor, label: label.into(), uri: None, modifiable: true }
    }

    pub fn with_id(mut self, id: impl Into<ThingId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateClassCommand {
    pub id: ThingId,
    pub contributor: ContributorId,
    pub label: Option<String>,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateStatementCommand {
    /// Caller-assigned id; generated when absent
    pub id: Option<StatementId>,
    pub contributor: ContributorId,
    pub subject_id: ThingId,
    pub predicate_id: ThingId,
    pub object_id: ThingId,
    pub index: Option<i64>,
    pub modifiable: bool,
}

impl CreateStatementCommand {
    pub fn new(
        contributor: ContributorId,
        subject_id: impl Into<ThingId>,
        predicate_id: impl Into<ThingId>,
        object_id: impl Into<ThingId>,
    ) -> Self {
        Self {
            id: None,
            contributor,
            subject_id: subject_id.into(),
            predicate_id: predicate_id.into(),
            object_id: object_id.into(),
            index: None,
            modifiable: true,
        }
    }

    pub fn at_index(mut self, index: i64) -> Self {
        self.index = Some(index);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateClassHierarchyCommand {
    pub contributor: ContributorId,
    pub parent: ThingId,
    pub children: BTreeSet<ThingId>,
    /// Refuse parents that already have children
    pub check_if_parent_is_leaf: bool,
}
