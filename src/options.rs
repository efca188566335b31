//! Render-time resolution of option lists and disabled state. Nothing here
//! is cached: every call reads the tree it is given.

use crate::ast::Value;
use crate::schema::{Field, FieldPath, Options};
use crate::store::ValueTree;

/// Reads the value a dependency path points at.
///
/// A dotted path is resolved from the form root. A bare name is looked up in
/// `group` first (the group holding the dependent field), then at the root.
pub fn resolve_dependency<'t>(
    dependency: &str,
    group: Option<&str>,
    values: &'t ValueTree,
) -> Option<&'t Value> {
    let path = FieldPath::parse(dependency).ok()?;
    if path.group().is_none() {
        if let Some(group) = group {
            if let Some(value) = values.get(&FieldPath::grouped(group, path.name())) {
                return Some(value);
            }
        }
    }
    values.get(&path)
}

/// The option list a choice field offers right now.
///
/// Keyed options stay empty until the controlling field holds a truthy value
/// that names one of the keys. `0` and `false` count as no value.
pub fn resolve_options(field: &Field, group: Option<&str>, values: &ValueTree) -> Vec<String> {
    match &field.options {
        None => Vec::new(),
        Some(Options::Static(options)) => options.clone(),
        Some(Options::Dependent(by_key)) => {
            let Some(dependency) = field.options_dependent_on.as_deref() else {
                return Vec::new();
            };
            match resolve_dependency(dependency, group, values) {
                Some(key) if key.is_truthy() => {
                    by_key.get(&*key.display_text()).cloned().unwrap_or_default()
                }
                _ => Vec::new(),
            }
        }
    }
}

/// Computed and read-only fields are always disabled; other fields are
/// disabled while any of their `disabledDependencies` is empty.
pub fn is_disabled(field: &Field, group: Option<&str>, values: &ValueTree) -> bool {
    if field.is_computed() || field.is_read_only {
        return true;
    }
    field.disabled_dependencies.iter().any(|dependency| {
        resolve_dependency(dependency, group, values).is_none_or(Value::is_empty)
    })
}
