//! The value tree and the three operations that produce new trees from old:
//! initialization from schema defaults, a single-slot edit, and the derived
//! (computed field) pass.

use crate::ast::Value;
use crate::compiler::Calculation;
use crate::interpreter::Evaluator;
use crate::schema::{FieldPath, FlatNode, Form, flatten};
use ahash::AHashMap;
use serde_json::Map;
use tracing::trace;

/// One top-level entry of the value tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Value(Value),
    Group(AHashMap<String, Value>),
}

/// Current values keyed by field or group name. Groups nest exactly one level.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValueTree {
    slots: AHashMap<String, Slot>,
}

impl ValueTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.get(name)
    }

    /// The scalar at `path`, if the tree holds one there.
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        match (path.group(), self.slots.get(path.group().unwrap_or(path.name()))?) {
            (None, Slot::Value(value)) => Some(value),
            (Some(_), Slot::Group(members)) => members.get(path.name()),
            _ => None,
        }
    }

    pub fn group(&self, name: &str) -> Option<&AHashMap<String, Value>> {
        match self.slots.get(name)? {
            Slot::Group(members) => Some(members),
            Slot::Value(_) => None,
        }
    }

    /// Writes `value` at `path`, creating the group if it does not exist yet.
    pub(crate) fn set(&mut self, path: &FieldPath, value: Value) {
        match path.group() {
            None => {
                self.slots
                    .insert(path.name().to_string(), Slot::Value(value));
            }
            Some(group) => {
                let slot = self
                    .slots
                    .entry(group.to_string())
                    .or_insert_with(|| Slot::Group(AHashMap::new()));
                if let Slot::Value(_) = slot {
                    *slot = Slot::Group(AHashMap::new());
                }
                if let Slot::Group(members) = slot {
                    members.insert(path.name().to_string(), value);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The tree as a JSON object, in the shape the submission payload uses.
    pub fn to_json(&self) -> serde_json::Value {
        let object: Map<String, serde_json::Value> = self
            .slots
            .iter()
            .map(|(name, slot)| {
                let json = match slot {
                    Slot::Value(value) => value.to_json(),
                    Slot::Group(members) => serde_json::Value::Object(
                        members
                            .iter()
                            .map(|(name, value)| (name.clone(), value.to_json()))
                            .collect(),
                    ),
                };
                (name.clone(), json)
            })
            .collect();
        serde_json::Value::Object(object)
    }
}

/// Builds the initial tree: every field holds its default or the empty value,
/// and every group holds a (possibly empty) nested mapping.
pub fn initialize(form: &Form) -> ValueTree {
    let mut tree = ValueTree::new();
    for stage in &form.stages {
        for node in flatten(&stage.fields) {
            match node {
                FlatNode::Field(field) => {
                    let value = field.default_value.clone().unwrap_or_else(Value::empty);
                    tree.set(&FieldPath::root(&field.name), value);
                }
                FlatNode::Group(group) => {
                    let members = group
                        .fields
                        .iter()
                        .map(|field| {
                            let value = field.default_value.clone().unwrap_or_else(Value::empty);
                            (field.name.clone(), value)
                        })
                        .collect();
                    tree.slots.insert(group.name.clone(), Slot::Group(members));
                }
            }
        }
    }
    tree
}

/// Returns a new tree identical to `tree` except for the slot at `path`.
pub fn apply_change(tree: &ValueTree, path: &FieldPath, value: Value) -> ValueTree {
    let mut next = tree.clone();
    next.set(path, value);
    next
}

/// Re-evaluates every computed field in document order. Each calculation sees
/// the results of the calculations before it in the same pass.
pub fn recompute_derived(
    tree: &ValueTree,
    calculations: &[Calculation],
    evaluator: &Evaluator,
) -> ValueTree {
    let mut next = tree.clone();
    for calculation in calculations {
        let value = evaluator.compute(&calculation.expression, &calculation.path, &next);
        trace!(field = %calculation.path, value = %value, "computed field updated");
        next.set(&calculation.path, value);
    }
    next
}
