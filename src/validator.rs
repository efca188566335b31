use crate::ast::Value;
use crate::compiler::{CompiledRule, RuleCheck};
use crate::interpreter::{Binding, Evaluator};
use crate::schema::{Field, FieldPath, FlatNode};
use crate::store::ValueTree;
use ahash::AHashMap;

/// One message per field path. Keys of grouped fields are `group.field`.
pub type ErrorMap = AHashMap<FieldPath, String>;

/// Checks the fields of a stage against their required flag and compiled rules.
pub struct Validator<'a> {
    rules: &'a AHashMap<FieldPath, Vec<CompiledRule>>,
    evaluator: Evaluator<'a>,
}

impl<'a> Validator<'a> {
    pub fn new(
        rules: &'a AHashMap<FieldPath, Vec<CompiledRule>>,
        evaluator: Evaluator<'a>,
    ) -> Self {
        Self { rules, evaluator }
    }

    /// Validates a flattened node list. Groups are validated through their
    /// children, whose errors are keyed under the group's name and whose
    /// predicates see the group's members as `formValue`.
    pub fn validate_stage(&self, nodes: &[FlatNode<'_>], values: &ValueTree) -> ErrorMap {
        let mut errors = ErrorMap::new();
        for node in nodes {
            match node {
                FlatNode::Field(field) => self.validate_field(field, None, values, &mut errors),
                FlatNode::Group(group) => {
                    for field in &group.fields {
                        self.validate_field(field, Some(&group.name), values, &mut errors);
                    }
                }
            }
        }
        errors
    }

    fn validate_field(
        &self,
        field: &Field,
        parent: Option<&str>,
        values: &ValueTree,
        errors: &mut ErrorMap,
    ) {
        let path = FieldPath::within(parent, &field.name);
        let value = values.get(&path).cloned().unwrap_or(Value::Null);

        if field.required && value.is_empty() {
            errors.insert(path.clone(), format!("{} is required.", field.display_label()));
        }

        // Later failures overwrite earlier ones.
        for rule in self.rules.get(&path).into_iter().flatten() {
            if !self.passes(rule, field, parent, &value, values) {
                let message = if rule.message.is_empty() {
                    format!("{} is invalid.", field.display_label())
                } else {
                    rule.message.clone()
                };
                errors.insert(path.clone(), message);
            }
        }
    }

    fn passes(
        &self,
        rule: &CompiledRule,
        field: &Field,
        parent: Option<&str>,
        value: &Value,
        values: &ValueTree,
    ) -> bool {
        match &rule.check {
            RuleCheck::Regex(Some(regex)) => {
                !value.is_truthy() || regex.is_match(&value.display_text())
            }
            RuleCheck::Regex(None) => true,
            RuleCheck::Required => !value.is_empty(),
            RuleCheck::MinLength(min) => text_length(value).is_none_or(|len| len >= *min),
            RuleCheck::MaxLength(max) => match (text_length(value), max) {
                (Some(len), Some(max)) => len <= *max,
                _ => true,
            },
            RuleCheck::MinValue(min) => value.as_number().is_none_or(|n| n >= *min),
            RuleCheck::MaxValue(max) => match (value.as_number(), max) {
                (Some(n), Some(max)) => n <= *max,
                _ => true,
            },
            RuleCheck::Predicate(expression) => {
                let form_value = match parent {
                    Some(group) => Binding::Group(values.group(group)),
                    None => Binding::Tree(values),
                };
                self.evaluator.predicate(expression, &field.name, value, form_value, values)
            }
            RuleCheck::Unsupported(_) => true,
        }
    }
}

fn text_length(value: &Value) -> Option<usize> {
    value.as_text().map(|text| text.chars().count())
}
