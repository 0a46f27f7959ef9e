//! Validation diagnosis accumulator
//!
//! The uniform result of every constraint check: an ordered list of
//! human-readable problems. Empty means valid. Checks never throw for
//! data reasons; they append here instead, so one pass reports every
//! violated rule.

use std::fmt;

/// Named accumulator of validation problems.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnosis {
    name: String,
    problems: Vec<String>,
}

impl Diagnosis {
    /// Create an empty (valid) diagnosis
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            problems: Vec::new(),
        }
    }

    /// The name/tag of this diagnosis
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record a problem
    pub fn append(&mut self, problem: impl Into<String>) {
        self.problems.push(problem.into());
    }

    /// True iff no problems were recorded
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }

    /// The recorded problems, in order
    pub fn problems(&self) -> &[String] {
        &self.problems
    }

    /// Logical AND: concatenate problem lists, self's problems first.
    /// Sub-diagnoses are never dropped.
    pub fn combine(mut self, other: Diagnosis) -> Diagnosis {
        self.problems.extend(other.problems);
        self
    }

    /// Turn into a result, erring with the full problem list
    pub fn into_result(self) -> Result<(), super::EngineError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(super::EngineError::Invalid(self))
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}: ok", self.name)
        } else {
            write!(f, "{}: {}", self.name, self.problems.join("; "))
        }
    }
}
