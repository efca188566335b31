use super::definition::{Field, Form, GroupField, Node, Section, Stage, stage_names_shown};
use crate::error::SchemaError;
use serde::Deserialize;
use serde_json::{Map, Value as Json};

/// A trait for configuration formats that can be converted into a `Form`.
///
/// The engine only ever consumes the tagged `Form` model. Other document
/// shapes plug in by implementing this trait.
///
/// # Example
///
/// ```rust,no_run
/// use youshiki::schema::{Form, IntoForm, Stage};
/// use youshiki::error::SchemaError;
///
/// struct Questionnaire { title: String, pages: Vec<String> }
///
/// impl IntoForm for Questionnaire {
///     fn into_form(self) -> Result<Form, SchemaError> {
///         Ok(Form {
///             name: self.title,
///             description: None,
///             show_stage_names: true,
///             stages: self
///                 .pages
///                 .into_iter()
///                 .map(|name| Stage { name, label: None, fields: vec![] })
///                 .collect(),
///         })
///     }
/// }
/// ```
pub trait IntoForm {
    /// Consumes the object and converts it into the engine's form model.
    fn into_form(self) -> Result<Form, SchemaError>;
}

/// The older configuration shape, in which node kinds are recognised by their
/// attributes: an object with `fields` and no `type` (or `isSection`) is a
/// section, `type: "group"` (or `isGroup`) is a group, and any other `type`
/// names the input kind of a field.
#[derive(Debug, Deserialize)]
pub struct LegacyForm {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "showformStageName")]
    show_stage_names: Option<bool>,
    #[serde(default, rename = "hideName")]
    hide_name: Option<bool>,
    #[serde(alias = "formGroup")]
    stages: Vec<LegacyStage>,
}

#[derive(Debug, Deserialize)]
struct LegacyStage {
    name: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    fields: Vec<Json>,
}

impl LegacyForm {
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(json).map_err(|e| SchemaError::JsonParseError(e.to_string()))
    }
}

impl IntoForm for LegacyForm {
    fn into_form(self) -> Result<Form, SchemaError> {
        let stages = self
            .stages
            .into_iter()
            .map(|stage| {
                let fields = stage
                    .fields
                    .into_iter()
                    .map(|node| convert_node(&stage.name, node))
                    .collect::<Result<_, _>>()?;
                Ok(Stage {
                    name: stage.name,
                    label: stage.label,
                    fields,
                })
            })
            .collect::<Result<_, SchemaError>>()?;

        Ok(Form {
            name: self.name,
            description: self.description,
            show_stage_names: stage_names_shown(self.show_stage_names, self.hide_name),
            stages,
        })
    }
}

fn convert_node(stage: &str, node: Json) -> Result<Node, SchemaError> {
    let mut object = into_object(stage, node)?;
    let kind = object.get("type").and_then(Json::as_str).map(str::to_string);
    let flag = |object: &Map<String, Json>, key: &str| {
        object.get(key).and_then(Json::as_bool).unwrap_or(false)
    };

    if flag(&object, "isSection") || (object.contains_key("fields") && kind.is_none()) {
        let children = take_children(&mut object);
        let name = node_name(&object);
        let fields = children
            .into_iter()
            .map(|child| convert_node(stage, child))
            .collect::<Result<_, _>>()?;
        return Ok(Node::Section(Section {
            label: object.get("label").and_then(Json::as_str).map(str::to_string),
            name,
            fields,
        }));
    }

    if flag(&object, "isGroup") || kind.as_deref() == Some("group") {
        let children = take_children(&mut object);
        object.remove("type");
        let mut group: GroupField = serde_json::from_value(Json::Object(object))
            .map_err(|e| conversion_error(stage, "group", e))?;
        group.fields = children
            .into_iter()
            .map(|child| convert_field(stage, child))
            .collect::<Result<_, _>>()?;
        return Ok(Node::Group(group));
    }

    convert_field(stage, Json::Object(object)).map(Node::Field)
}

fn convert_field(stage: &str, node: Json) -> Result<Field, SchemaError> {
    let mut object = into_object(stage, node)?;
    // The legacy `type` member carries the input kind.
    if let Some(kind) = object.remove("type") {
        object.entry("inputType").or_insert(kind);
    }
    let name = node_name(&object);
    serde_json::from_value(Json::Object(object)).map_err(|e| conversion_error(stage, &name, e))
}

fn into_object(stage: &str, node: Json) -> Result<Map<String, Json>, SchemaError> {
    match node {
        Json::Object(object) => Ok(object),
        other => Err(SchemaError::ConversionError {
            stage: stage.to_string(),
            node: other.to_string(),
            message: "expected an object".to_string(),
        }),
    }
}

fn take_children(object: &mut Map<String, Json>) -> Vec<Json> {
    match object.remove("fields") {
        Some(Json::Array(children)) => children,
        _ => Vec::new(),
    }
}

fn node_name(object: &Map<String, Json>) -> String {
    object
        .get("name")
        .and_then(Json::as_str)
        .unwrap_or("<unnamed>")
        .to_string()
}

fn conversion_error(stage: &str, node: &str, e: serde_json::Error) -> SchemaError {
    SchemaError::ConversionError {
        stage: stage.to_string(),
        node: node.to_string(),
        message: e.to_string(),
    }
}
