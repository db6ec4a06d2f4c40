use serde::{Deserialize, Serialize};

/// One unmet structural precondition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Stable machine-readable code, e.g. `party_not_found`.
    pub code: String,
    /// Input path the violation refers to, e.g. `from_id`.
    pub path: String,
    /// Human-readable detail.
    pub detail: String,
}

impl Violation {
    /// Creates a violation entry.
    #[must_use]
    pub fn new(code: impl Into<String>, path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            path: path.into(),
            detail: detail.into(),
        }
    }
}

/// Collects violations so callers receive every failed precondition at once.
#[derive(Debug, Default)]
pub struct ViolationBuilder {
    violations: Vec<Violation>,
}

impl ViolationBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a violation.
    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Records a violation when `condition` is false.
    pub fn ensure(&mut self, condition: bool, violation: impl FnOnce() -> Violation) {
        if !condition {
            self.violations.push(violation());
        }
    }

    /// Returns whether no violation has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Finishes collection, returning all violations when any were recorded.
    pub fn finish(self) -> Result<(), Vec<Violation>> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(self.violations)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Violation, ViolationBuilder};

    #[test]
    fn builder_accumulates_every_violation() {
        let mut builder = ViolationBuilder::new();
        builder.push(Violation::new("party_not_found", "from_id", "missing"));
        builder.ensure(false, || {
            Violation::new("party_not_organization", "from_id", "person")
        });
        builder.ensure(true, || Violation::new("unused", "to_id", "never"));

        let result = builder.finish();
        assert!(result.is_err());
        let violations = result.err().unwrap_or_default();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[1].code, "party_not_organization");
    }

    #[test]
    fn empty_builder_finishes_ok() {
        assert!(ViolationBuilder::new().finish().is_ok());
    }
}
