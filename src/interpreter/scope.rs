use crate::ast::{Value, Variable};
use crate::error::EvaluationError;
use crate::store::{Slot, ValueTree};
use ahash::AHashMap;

/// Variable roots readable by a computed value.
pub const COMPUTED_ROOTS: &[&str] = &["values"];

/// Variable roots readable by a custom validation predicate.
pub const PREDICATE_ROOTS: &[&str] = &["fieldName", "fieldValue", "formValue", "values"];

/// What a variable root is bound to.
#[derive(Debug, Clone)]
pub enum Binding<'a> {
    Tree(&'a ValueTree),
    /// The members of one group. A group with no slot yet reads as empty.
    Group(Option<&'a AHashMap<String, Value>>),
    Scalar(Value),
}

/// The explicit arguments an expression may read. Nothing else is reachable.
#[derive(Debug, Clone, Default)]
pub struct Scope<'a> {
    bindings: Vec<(&'static str, Binding<'a>)>,
}

impl<'a> Scope<'a> {
    /// A scope with no bindings, used for constant folding.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The scope of a computed value: `values`.
    pub fn computed(values: &'a ValueTree) -> Self {
        Self {
            bindings: vec![("values", Binding::Tree(values))],
        }
    }

    /// The scope of a custom validation predicate: `fieldName`, `fieldValue`
    /// and `formValue`. Inside a group `formValue` is the group's members;
    /// `values` is always the whole tree.
    pub fn predicate(
        field_name: &str,
        field_value: Value,
        form_value: Binding<'a>,
        values: &'a ValueTree,
    ) -> Self {
        Self {
            bindings: vec![
                ("fieldName", Binding::Scalar(Value::from(field_name))),
                ("fieldValue", Binding::Scalar(field_value)),
                ("formValue", form_value),
                ("values", Binding::Tree(values)),
            ],
        }
    }

    /// Reads a variable, following member accesses the way the configuration
    /// language does: a missing key reads as null, members of null are errors.
    pub fn resolve(&self, variable: &Variable) -> Result<Value, EvaluationError> {
        let binding = self
            .bindings
            .iter()
            .find(|(name, _)| *name == variable.root)
            .map(|(_, binding)| binding)
            .ok_or_else(|| EvaluationError::UnknownVariable(variable.root.clone()))?;

        match binding {
            Binding::Scalar(value) => {
                scalar_members(value.clone(), &variable.root, &variable.members)
            }
            Binding::Tree(tree) => tree_members(tree, variable),
            Binding::Group(members) => {
                let Some((member, rest)) = variable.members.split_first() else {
                    return Err(EvaluationError::NotAScalar(variable.root.clone()));
                };
                let value = members
                    .and_then(|members| members.get(member))
                    .cloned()
                    .unwrap_or(Value::Null);
                scalar_members(value, &format!("{}.{}", variable.root, member), rest)
            }
        }
    }
}

fn tree_members(tree: &ValueTree, variable: &Variable) -> Result<Value, EvaluationError> {
    let Some((first, rest)) = variable.members.split_first() else {
        return Err(EvaluationError::NotAScalar(variable.root.clone()));
    };
    let path = format!("{}.{}", variable.root, first);
    match tree.slot(first) {
        None => scalar_members(Value::Null, &path, rest),
        Some(Slot::Value(value)) => scalar_members(value.clone(), &path, rest),
        Some(Slot::Group(members)) => {
            let Some((member, rest)) = rest.split_first() else {
                return Err(EvaluationError::NotAScalar(path));
            };
            let value = members.get(member).cloned().unwrap_or(Value::Null);
            scalar_members(value, &format!("{}.{}", path, member), rest)
        }
    }
}

fn scalar_members(value: Value, path: &str, members: &[String]) -> Result<Value, EvaluationError> {
    let Some((member, rest)) = members.split_first() else {
        return Ok(value);
    };
    let next = match (&value, member.as_str()) {
        (Value::Null, _) => {
            return Err(EvaluationError::MemberOfNull {
                path: path.to_string(),
                member: member.clone(),
            });
        }
        (Value::Text(text), "length") => Value::Number(text.chars().count() as f64),
        _ => Value::Null,
    };
    scalar_members(next, &format!("{}.{}", path, member), rest)
}
