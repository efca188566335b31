//! Common test utilities for building form definitions and sessions.
use std::sync::Arc;
use youshiki::prelude::*;
use youshiki::schema::{Field, GroupField, InputType, Node, Stage};

/// A three-stage freight quote form.
///
/// Stage 1 holds a required select, a `dimensions` group, the computed
/// `volume` and a bounded `weight` inside a section. Stage 2 holds the
/// `country`/`state` dependent options. Stage 3 holds a custom predicate.
#[allow(dead_code)]
pub const FREIGHT_FORM_JSON: &str = r#"
{
    "name": "Freight Quote",
    "description": "Tell us about your shipment",
    "showformStageName": true,
    "stages": [
        {
            "name": "shipment",
            "label": "Shipment",
            "fields": [
                {
                    "type": "field",
                    "name": "cargoType",
                    "inputType": "select",
                    "label": "Cargo Type",
                    "required": true,
                    "options": ["General", "Hazardous"]
                },
                {
                    "type": "group",
                    "name": "dimensions",
                    "label": "Dimensions",
                    "fields": [
                        { "name": "length", "inputType": "number", "required": true },
                        { "name": "width", "inputType": "number", "required": true },
                        { "name": "height", "inputType": "number", "required": true }
                    ]
                },
                {
                    "type": "field",
                    "name": "volume",
                    "inputType": "number",
                    "valueCalculation": "values.dimensions.length * values.dimensions.width * values.dimensions.height"
                },
                {
                    "type": "section",
                    "name": "weightSection",
                    "label": "Weight",
                    "fields": [
                        {
                            "type": "field",
                            "name": "weight",
                            "inputType": "number",
                            "min": 1,
                            "max": 30000,
                            "validation": [
                                { "type": "MinValue", "message": "Weight must be at least 1 kg." },
                                { "type": "MaxValue", "message": "Weight cannot exceed 30000 kg." }
                            ]
                        }
                    ]
                }
            ]
        },
        {
            "name": "destination",
            "fields": [
                {
                    "type": "field",
                    "name": "country",
                    "inputType": "select",
                    "required": true,
                    "options": ["US", "CA"]
                },
                {
                    "type": "field",
                    "name": "state",
                    "inputType": "select",
                    "optionsDependentOn": "country",
                    "options": { "US": ["CA", "NY", "TX"], "CA": ["ON", "QC"] },
                    "disabledDependencies": ["country"]
                },
                {
                    "type": "field",
                    "name": "postalCode",
                    "validation": [
                        { "type": "Regex", "regex": "^[0-9]{5}$", "message": "Postal code must have five digits." }
                    ]
                }
            ]
        },
        {
            "name": "contactDetails",
            "fields": [
                {
                    "type": "field",
                    "name": "email",
                    "inputType": "email",
                    "required": true,
                    "validation": [
                        {
                            "type": "Function",
                            "function": "{ return fieldValue.length > 5 && matches(fieldValue, '@'); }",
                            "message": "Enter a valid email address."
                        }
                    ]
                },
                {
                    "type": "field",
                    "name": "notes",
                    "inputType": "textarea",
                    "maxLength": 10,
                    "validation": [{ "type": "MaxLength", "message": "Notes are too long." }]
                }
            ]
        }
    ]
}
"#;

/// The same shape as a piece of the freight form, in the legacy format.
#[allow(dead_code)]
pub const LEGACY_FORM_JSON: &str = r#"
{
    "name": "Legacy Quote",
    "showformStageName": false,
    "formGroup": [
        {
            "name": "shipment",
            "fields": [
                { "name": "cargoType", "type": "select", "options": ["General"], "required": true },
                {
                    "name": "dimensions",
                    "type": "group",
                    "fields": [
                        { "name": "length", "type": "number" },
                        { "name": "width", "type": "number" }
                    ]
                },
                {
                    "name": "extras",
                    "label": "Extras",
                    "fields": [{ "name": "area", "type": "number", "valueCalculation": "values.dimensions.length * values.dimensions.width" }]
                }
            ]
        }
    ]
}
"#;

#[allow(dead_code)]
pub fn freight_form() -> Form {
    Form::from_json(FREIGHT_FORM_JSON).expect("fixture form should parse")
}

#[allow(dead_code)]
pub fn freight_engine() -> Arc<FormEngine> {
    Arc::new(FormEngine::new(freight_form()))
}

#[allow(dead_code)]
pub fn freight_session() -> FormSession {
    FormSession::new(freight_engine())
}

/// Fills every field of the first stage with valid values.
#[allow(dead_code)]
pub fn fill_shipment(session: &mut FormSession) {
    for (path, value) in [
        ("cargoType", "General"),
        ("dimensions.length", "2"),
        ("dimensions.width", "3"),
        ("dimensions.height", "4"),
        ("weight", "120"),
    ] {
        assert_eq!(session.change(path, value), Ok(true), "edit of {}", path);
    }
}

/// A single-stage form built in Rust: a required `name` and a computed
/// `greeting` derived from it.
#[allow(dead_code)]
pub fn greeting_form() -> Form {
    Form {
        name: "Greeting".to_string(),
        description: None,
        show_stage_names: true,
        stages: vec![Stage {
            name: "about".to_string(),
            label: None,
            fields: vec![
                Node::Field(Field {
                    required: true,
                    ..Field::new("name")
                }),
                Node::Group(GroupField {
                    name: "address".to_string(),
                    fields: vec![Field {
                        default_value: Some(Value::from("Utrecht")),
                        ..Field::new("city")
                    }],
                    ..Default::default()
                }),
                Node::Field(Field {
                    input_type: InputType::Text,
                    value_calculation: Some(
                        "'Hello, ' + values.name + ' from ' + values.address.city".to_string(),
                    ),
                    ..Field::new("greeting")
                }),
            ],
        }],
    }
}
