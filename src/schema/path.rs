use crate::error::PathError;
use std::fmt;
use std::str::FromStr;

/// The address of a field's value: `name` at the form root, or `group.name`
/// for a field nested one level inside a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    group: Option<String>,
    name: String,
}

impl FieldPath {
    pub fn root(name: &str) -> Self {
        Self {
            group: None,
            name: name.to_string(),
        }
    }

    pub fn grouped(group: &str, name: &str) -> Self {
        Self {
            group: Some(group.to_string()),
            name: name.to_string(),
        }
    }

    /// Builds the path of a field given the group it sits in, if any.
    pub fn within(group: Option<&str>, name: &str) -> Self {
        match group {
            Some(group) => Self::grouped(group, name),
            None => Self::root(name),
        }
    }

    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }
        match path.split_once('.') {
            None => Ok(Self::root(path)),
            Some((_, rest)) if rest.contains('.') => Err(PathError::TooDeep(path.to_string())),
            Some((group, name)) if group.is_empty() || name.is_empty() => {
                Err(PathError::EmptySegment(path.to_string()))
            }
            Some((group, name)) => Ok(Self::grouped(group, name)),
        }
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.group {
            Some(group) => write!(f, "{}.{}", group, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
