//! Formatted labels of rosetta-stone templates
//!
//! A formatted label is text with `{key}` placeholders and optional
//! `[prefix {key} postfix]` sections, which are left out when the placeholder
//! has no value. `\{`, `\[` and `\\` escape the next character. Keys of
//! template labels are property indices.

use crate::error::{DomainError, DomainResult};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelComponent {
    Text(String),
    Placeholder(String),
    Section { key: String, prefix: String, postfix: String },
}

impl LabelComponent {
    fn is_blank(&self) -> bool {
        matches!(self, LabelComponent::Text(text) if text.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedLabel {
    template: String,
    components: Vec<LabelComponent>,
}

impl FormattedLabel {
    pub fn parse(template: impl Into<String>) -> Self {
        let template = template.into();
        let components = Parser::new(&template).components();
        Self { template, components }
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    pub fn components(&self) -> &[LabelComponent] {
        &self.components
    }

    /// Keys of all placeholders and sections
    pub fn keys(&self) -> BTreeSet<&str> {
        self.components
            .iter()
            .filter_map(|c| match c {
                LabelComponent::Placeholder(key) | LabelComponent::Section { key, .. } => Some(key.as_str()),
                LabelComponent::Text(_) => None,
            })
            .collect()
    }
}

struct Parser {
    chars: Vec<char>,
}

impl Parser {
    fn new(template: &str) -> Self {
        Self { chars: template.chars().collect() }
    }

    fn escaped(&self, i: usize, specials: &[char]) -> Option<char> {
        match (self.chars.get(i), self.chars.get(i + 1)) {
            (Some('\\'), Some(next)) if specials.contains(next) => Some(*next),
            _ => None,
        }
    }

    fn components(&self) -> Vec<LabelComponent> {
        let mut components = Vec::new();
        let mut text = String::new();
        let mut i = 0;
        while i < self.chars.len() {
            if let Some(c) = self.escaped(i, &['{', '[', '\\']) {
                text.push(c);
                i += 2;
                continue;
            }
            let parsed = match self.chars[i] {
                '{' => self.placeholder(i).map(|(key, next)| (LabelComponent::Placeholder(key), next)),
                '[' => self.section(i),
                _ => None,
            };
            match parsed {
                Some((component, next)) => {
                    if !text.is_empty() {
                        components.push(LabelComponent::Text(std::mem::take(&mut text)));
                    }
                    components.push(component);
                    i = next;
                }
                None => {
                    text.push(self.chars[i]);
                    i += 1;
                }
            }
        }
        if !text.is_empty() {
            components.push(LabelComponent::Text(text));
        }
        components
    }

    /// `{key}` starting at `start`; returns the trimmed key and the next position
    fn placeholder(&self, start: usize) -> Option<(String, usize)> {
        let mut key = String::new();
        let mut i = start + 1;
        while i < self.chars.len() {
            if let Some(c) = self.escaped(i, &['{', '}', '[', '\\']) {
                key.push(c);
                i += 2;
                continue;
            }
            if self.chars[i] == '}' {
                let key = key.trim();
                return (!key.is_empty()).then(|| (key.to_string(), i + 1));
            }
            key.push(self.chars[i]);
            i += 1;
        }
        None
    }

    /// `[prefix {key} postfix]` starting at `start`
    fn section(&self, start: usize) -> Option<(LabelComponent, usize)> {
        let mut prefix = String::new();
        let mut i = start + 1;
        let (key, after_key) = loop {
            if let Some(c) = self.escaped(i, &['{', '[', '\\']) {
                prefix.push(c);
                i += 2;
                continue;
            }
            match self.chars.get(i)? {
                '{' => break self.placeholder(i)?,
                ']' => return None,
                c => prefix.push(*c),
            }
            i += 1;
        };

        let mut postfix = String::new();
        i = after_key;
        loop {
            if let Some(c) = self.escaped(i, &['{', '[', '\\']) {
                postfix.push(c);
                i += 2;
                continue;
            }
            match self.chars.get(i)? {
                ']' => break,
                c => postfix.push(*c),
            }
            i += 1;
        }

        let section = LabelComponent::Section {
            key,
            prefix: prefix.trim().to_string(),
            postfix: postfix.trim().to_string(),
        };
        Some((section, i + 1))
    }
}

/// Every property index needs a placeholder and every numeric placeholder a property
pub fn validate_placeholders(label: &FormattedLabel, property_count: usize) -> DomainResult<()> {
    let keys = label.keys();
    for index in 0..property_count {
        if !keys.contains(index.to_string().as_str()) {
            return Err(DomainError::MissingFormattedLabelPlaceholder(index));
        }
    }
    for key in keys {
        if let Ok(index) = key.parse::<usize>() {
            if index >= property_count {
                return Err(DomainError::UnknownFormattedLabelPlaceholder(index));
            }
        }
    }
    Ok(())
}

/// Label rules for a template that is already used by statements
///
/// The label may only change together with new properties. It must keep the
/// previous label as its prefix and append at most one optional section per
/// new property. New properties without a new label are rejected.
pub fn validate_label_update(
    previous: &FormattedLabel,
    updated: Option<&FormattedLabel>,
    previous_properties: usize,
    updated_properties: Option<usize>,
) -> DomainResult<()> {
    let added = updated_properties
        .filter(|&count| count > previous_properties)
        .map(|count| count - previous_properties);

    match updated {
        Some(label) if label != previous => {
            let added = added.ok_or(DomainError::LabelUpdateRequiresNewTemplateProperties)?;
            let suffix = label
                .as_str()
                .strip_prefix(previous.as_str())
                .ok_or(DomainError::LabelMustStartWithPreviousVersion)?;
            let new_sections: Vec<LabelComponent> = FormattedLabel::parse(suffix)
                .components
                .into_iter()
                .filter(|c| !c.is_blank())
                .collect();
            if new_sections.len() > added {
                return Err(DomainError::TooManyNewLabelSections);
            }
            if new_sections.iter().any(|c| !matches!(c, LabelComponent::Section { .. })) {
                return Err(DomainError::NewLabelSectionsMustBeOptional);
            }
            Ok(())
        }
        _ => match updated_properties {
            Some(count) if count != previous_properties => Err(DomainError::LabelMustBeUpdated),
            _ => Ok(()),
        },
    }
}
