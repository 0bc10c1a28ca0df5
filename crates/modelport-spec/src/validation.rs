use std::fmt;

/// One invariant failure inside a catalog document, addressed by a
/// dotted/indexed path such as `endpoints[2].url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIssue {
    path: String,
    message: String,
}

impl CatalogIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validation failure carrying every issue found, not just the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogError {
    issues: Vec<CatalogIssue>,
}

impl CatalogError {
    pub fn new(issues: Vec<CatalogIssue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[CatalogIssue] {
        &self.issues
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "catalog validation failed")?;
        for issue in &self.issues {
            write!(f, "\n  {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CatalogError {}
