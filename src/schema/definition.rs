use super::path::FieldPath;
use crate::ast::Value;
use crate::error::SchemaError;
use ahash::AHashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// The whole configuration document: a named, ordered list of stages.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "FormDocument")]
pub struct Form {
    pub name: String,
    pub description: Option<String>,
    pub show_stage_names: bool,
    pub stages: Vec<Stage>,
}

/// `Form` as written in a configuration document. Stage names can be turned
/// off with either `showStageNames: false` or `hideName: true`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FormDocument {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "showformStageName")]
    show_stage_names: Option<bool>,
    #[serde(default)]
    hide_name: Option<bool>,
    #[serde(default, alias = "formGroup")]
    stages: Vec<Stage>,
}

impl From<FormDocument> for Form {
    fn from(document: FormDocument) -> Self {
        Form {
            name: document.name,
            description: document.description,
            show_stage_names: stage_names_shown(document.show_stage_names, document.hide_name),
            stages: document.stages,
        }
    }
}

/// An explicit show flag wins over `hideName`; names are shown by default.
pub(crate) fn stage_names_shown(show: Option<bool>, hide: Option<bool>) -> bool {
    show.or(hide.map(|hide| !hide)).unwrap_or(true)
}

/// One step of the wizard.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Stage {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub fields: Vec<Node>,
}

/// A configuration node, discriminated by its `"type"` member.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Field(Field),
    Group(GroupField),
    Section(Section),
}

/// A named cluster of fields whose values live under one key of the value tree.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupField {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub hidden_label: bool,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// A labelled block used for layout only; its children share the parent's namespace.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Section {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub fields: Vec<Node>,
}

/// A leaf input descriptor.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub input_type: InputType,
    pub label: Option<String>,
    #[serde(default)]
    pub hidden_label: bool,
    pub placeholder: Option<String>,
    pub default_value: Option<Value>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    pub options: Option<Options>,
    pub options_dependent_on: Option<String>,
    pub value_calculation: Option<String>,
    #[serde(default)]
    pub is_multi_select: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default, rename = "validation")]
    pub validations: Vec<ValidationRule>,
    #[serde(default)]
    pub disabled_dependencies: Vec<String>,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub is_read_only: bool,
    pub left_icon: Option<String>,
    pub right_icon: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    #[default]
    Text,
    Textarea,
    Email,
    Number,
    Select,
    Multiselect,
    Password,
    Checkbox,
    Radio,
    Date,
    File,
    Toggle,
    Color,
    Range,
    Time,
    Url,
    Hidden,
    Button,
}

impl InputType {
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            InputType::Select | InputType::Multiselect | InputType::Radio
        )
    }
}

/// The option list of a choice field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Options {
    Static(Vec<String>),
    /// Option lists keyed by the value of the field named in `optionsDependentOn`.
    Dependent(AHashMap<String, Vec<String>>),
}

/// A declarative validation rule attached to a field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawValidationRule")]
pub enum ValidationRule {
    Regex { pattern: String, message: String },
    Function { body: String, message: String },
    Required { message: String },
    MinLength { message: String },
    MaxLength { message: String },
    MinValue { message: String },
    MaxValue { message: String },
    /// A rule kind the engine does not know, or one missing its payload. Always passes.
    Unsupported { kind: String, message: String },
}

impl ValidationRule {
    pub fn message(&self) -> &str {
        match self {
            ValidationRule::Regex { message, .. }
            | ValidationRule::Function { message, .. }
            | ValidationRule::Required { message }
            | ValidationRule::MinLength { message }
            | ValidationRule::MaxLength { message }
            | ValidationRule::MinValue { message }
            | ValidationRule::MaxValue { message }
            | ValidationRule::Unsupported { message, .. } => message,
        }
    }
}

/// The rule as it appears in the configuration document.
#[derive(Deserialize)]
struct RawValidationRule {
    #[serde(rename = "type")]
    kind: String,
    regex: Option<String>,
    function: Option<String>,
    #[serde(default)]
    message: String,
}

impl From<RawValidationRule> for ValidationRule {
    fn from(raw: RawValidationRule) -> Self {
        let message = raw.message;
        match (raw.kind.as_str(), raw.regex, raw.function) {
            ("Regex", Some(pattern), _) => ValidationRule::Regex { pattern, message },
            ("Function", _, Some(body)) => ValidationRule::Function { body, message },
            ("Required", _, _) => ValidationRule::Required { message },
            ("MinLength", _, _) => ValidationRule::MinLength { message },
            ("MaxLength", _, _) => ValidationRule::MaxLength { message },
            ("MinValue", _, _) => ValidationRule::MinValue { message },
            ("MaxValue", _, _) => ValidationRule::MaxValue { message },
            _ => ValidationRule::Unsupported {
                kind: raw.kind,
                message,
            },
        }
    }
}

/// A `Field` or `GroupField` as seen after sections have been expanded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlatNode<'a> {
    Field(&'a Field),
    Group(&'a GroupField),
}

impl<'a> FlatNode<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            FlatNode::Field(field) => &field.name,
            FlatNode::Group(group) => &group.name,
        }
    }
}

/// A field together with its value path and the stage that holds it.
#[derive(Debug, Clone)]
pub struct FieldEntry<'a> {
    pub stage: usize,
    pub path: FieldPath,
    pub field: &'a Field,
}

/// Expands `Section` wrappers in place, preserving document order.
pub fn flatten(nodes: &[Node]) -> Vec<FlatNode<'_>> {
    let mut flat = Vec::with_capacity(nodes.len());
    flatten_into(nodes, &mut flat);
    flat
}

fn flatten_into<'a>(nodes: &'a [Node], flat: &mut Vec<FlatNode<'a>>) {
    for node in nodes {
        match node {
            Node::Field(field) => flat.push(FlatNode::Field(field)),
            Node::Group(group) => flat.push(FlatNode::Group(group)),
            Node::Section(section) => flatten_into(&section.fields, flat),
        }
    }
}

/// Derives a display title from a camelCase name: `numberOfContainers` -> `Number Of Containers`.
pub fn title_case(input: &str) -> String {
    let mut spaced = String::with_capacity(input.len() + 4);
    let mut previous: Option<char> = None;
    for c in input.chars() {
        if let Some(p) = previous {
            if p.is_ascii_lowercase() && c.is_ascii_uppercase() {
                spaced.push(' ');
            }
        }
        spaced.push(c);
        previous = Some(c);
    }

    spaced
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
            }
        })
        .join(" ")
}

impl Form {
    /// Parses a configuration document in the tagged (`"type"`) format.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(json).map_err(|e| SchemaError::JsonParseError(e.to_string()))
    }

    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Every field of every stage in document order, with its value path.
    pub fn fields(&self) -> Vec<FieldEntry<'_>> {
        let mut entries = Vec::new();
        for (stage_index, stage) in self.stages.iter().enumerate() {
            for node in flatten(&stage.fields) {
                match node {
                    FlatNode::Field(field) => entries.push(FieldEntry {
                        stage: stage_index,
                        path: FieldPath::root(&field.name),
                        field,
                    }),
                    FlatNode::Group(group) => {
                        entries.extend(group.fields.iter().map(|field| FieldEntry {
                            stage: stage_index,
                            path: FieldPath::grouped(&group.name, &field.name),
                            field,
                        }))
                    }
                }
            }
        }
        entries
    }

    /// Looks up the field addressed by `path`, searching every stage.
    pub fn field(&self, path: &FieldPath) -> Option<&Field> {
        self.fields()
            .into_iter()
            .find(|entry| &entry.path == path)
            .map(|entry| entry.field)
    }
}

impl Stage {
    /// The stage's title: its label, or its name title-cased.
    pub fn title(&self) -> String {
        self.label.clone().unwrap_or_else(|| title_case(&self.name))
    }
}

impl Field {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// The label shown to the user and used in messages.
    pub fn display_label(&self) -> String {
        self.label.clone().unwrap_or_else(|| title_case(&self.name))
    }

    pub fn is_computed(&self) -> bool {
        self.value_calculation.is_some()
    }
}

impl GroupField {
    pub fn display_label(&self) -> String {
        self.label.clone().unwrap_or_else(|| title_case(&self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("numberOfContainers"), "Number Of Containers");
        assert_eq!(title_case("email"), "Email");
        assert_eq!(title_case("  cargo   TYPE "), "Cargo Type");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_flatten_expands_nested_sections() {
        let nodes = vec![
            Node::Field(Field::new("a")),
            Node::Section(Section {
                name: "s".to_string(),
                label: None,
                fields: vec![
                    Node::Group(GroupField {
                        name: "g".to_string(),
                        ..Default::default()
                    }),
                    Node::Section(Section {
                        name: "inner".to_string(),
                        label: None,
                        fields: vec![Node::Field(Field::new("b"))],
                    }),
                ],
            }),
            Node::Field(Field::new("c")),
        ];

        let names: Vec<_> = flatten(&nodes).iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["a", "g", "b", "c"]);
    }

    #[test]
    fn test_rule_from_raw_kinds() {
        let rules: Vec<ValidationRule> = serde_json::from_str(
            r#"[
                {"type": "Regex", "regex": "^a", "message": "m1"},
                {"type": "Regex", "message": "m2"},
                {"type": "Shout", "message": "m3"},
                {"type": "MinValue", "message": "m4"}
            ]"#,
        )
        .unwrap();

        assert!(matches!(&rules[0], ValidationRule::Regex { pattern, .. } if pattern == "^a"));
        assert!(matches!(&rules[1], ValidationRule::Unsupported { kind, .. } if kind == "Regex"));
        assert!(matches!(&rules[2], ValidationRule::Unsupported { kind, .. } if kind == "Shout"));
        assert_eq!(rules[3].message(), "m4");
    }
}
