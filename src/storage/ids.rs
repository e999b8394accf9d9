//! Identity generation with collision retry

use std::fmt;

/// Prefix of generated ids per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdSequence {
    Resource,
    Literal,
    Predicate,
    Class,
    Statement,
}

impl IdSequence {
    pub fn prefix(&self) -> &'static str {
        match self {
            IdSequence::Resource => "R",
            IdSequence::Literal => "L",
            IdSequence::Predicate => "P",
            IdSequence::Class => "C",
            IdSequence::Statement => "S",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IdSequence::Resource => "resource",
            IdSequence::Literal => "literal",
            IdSequence::Predicate => "predicate",
            IdSequence::Class => "class",
            IdSequence::Statement => "statement",
        }
    }

    pub fn format(&self, counter: u64) -> String {
        format!("{}{}", self.prefix(), counter)
    }
}

impl fmt::Display for IdSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Draw candidates until one is not taken
///
/// Ids may also be assigned manually, so a counter-generated candidate can
/// already be in use. `candidate` must yield a fresh value on every call.
pub fn next_free<E>(
    mut candidate: impl FnMut() -> Result<String, E>,
    mut taken: impl FnMut(&str) -> Result<bool, E>,
) -> Result<String, E> {
    loop {
        let id = candidate()?;
        if !taken(&id)? {
            return Ok(id);
        }
        tracing::debug!(%id, "generated id already taken, retrying");
    }
}
