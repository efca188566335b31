use super::definition::{Field, Form, Node, Options};
use super::path::FieldPath;
use ahash::AHashSet;
use std::fmt;

/// A structural problem in a configuration document. Findings are reported,
/// never enforced: the engine degrades around them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaIssue {
    NoStages,
    DuplicateName { parent: String, name: String },
    DottedName { name: String },
    MissingDependency { field: String },
    UnresolvedDependency { field: String, path: String },
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaIssue::NoStages => write!(f, "form declares no stages"),
            SchemaIssue::DuplicateName { parent, name } => {
                write!(f, "'{}' declares more than one child named '{}'", parent, name)
            }
            SchemaIssue::DottedName { name } => {
                write!(f, "name '{}' contains a '.', which collides with path syntax", name)
            }
            SchemaIssue::MissingDependency { field } => write!(
                f,
                "field '{}' has keyed options but no optionsDependentOn",
                field
            ),
            SchemaIssue::UnresolvedDependency { field, path } => write!(
                f,
                "field '{}' depends on '{}', which names no field of this form",
                field, path
            ),
        }
    }
}

impl Form {
    /// Checks the conventions the engine relies on but does not enforce.
    pub fn lint(&self) -> Vec<SchemaIssue> {
        let mut issues = Vec::new();
        if self.stages.is_empty() {
            issues.push(SchemaIssue::NoStages);
        }
        check_unique(&self.name, self.stages.iter().map(|s| s.name.as_str()), &mut issues);
        for stage in &self.stages {
            self.lint_nodes(&stage.name, &stage.fields, &mut issues);
        }
        issues
    }

    fn lint_nodes(&self, parent: &str, nodes: &[Node], issues: &mut Vec<SchemaIssue>) {
        let names = nodes.iter().map(|node| match node {
            Node::Field(field) => field.name.as_str(),
            Node::Group(group) => group.name.as_str(),
            Node::Section(section) => section.name.as_str(),
        });
        check_unique(parent, names, issues);

        for node in nodes {
            match node {
                Node::Field(field) => self.lint_field(field, None, issues),
                Node::Group(group) => {
                    check_dotted(&group.name, issues);
                    check_unique(
                        &group.name,
                        group.fields.iter().map(|f| f.name.as_str()),
                        issues,
                    );
                    for field in &group.fields {
                        self.lint_field(field, Some(&group.name), issues);
                    }
                }
                Node::Section(section) => self.lint_nodes(&section.name, &section.fields, issues),
            }
        }
    }

    fn lint_field(&self, field: &Field, group: Option<&str>, issues: &mut Vec<SchemaIssue>) {
        check_dotted(&field.name, issues);
        if matches!(field.options, Some(Options::Dependent(_)))
            && field.options_dependent_on.is_none()
        {
            issues.push(SchemaIssue::MissingDependency {
                field: field.name.clone(),
            });
        }

        let dependencies = field
            .options_dependent_on
            .iter()
            .chain(field.disabled_dependencies.iter());
        for dependency in dependencies {
            if !self.resolves(dependency, group) {
                issues.push(SchemaIssue::UnresolvedDependency {
                    field: field.name.clone(),
                    path: dependency.clone(),
                });
            }
        }
    }

    /// Whether a dependency path names a field, using the same lookup rules as
    /// option resolution: bare names try the enclosing group first.
    fn resolves(&self, dependency: &str, group: Option<&str>) -> bool {
        let Ok(path) = FieldPath::parse(dependency) else {
            return false;
        };
        if path.group().is_none() {
            if let Some(group) = group {
                if self.field(&FieldPath::grouped(group, path.name())).is_some() {
                    return true;
                }
            }
        }
        self.field(&path).is_some()
    }
}

fn check_dotted(name: &str, issues: &mut Vec<SchemaIssue>) {
    if name.contains('.') {
        issues.push(SchemaIssue::DottedName {
            name: name.to_string(),
        });
    }
}

fn check_unique<'a>(
    parent: &str,
    names: impl Iterator<Item = &'a str>,
    issues: &mut Vec<SchemaIssue>,
) {
    let mut seen = AHashSet::new();
    for name in names {
        if !seen.insert(name) {
            issues.push(SchemaIssue::DuplicateName {
                parent: parent.to_string(),
                name: name.to_string(),
            });
        }
    }
}
