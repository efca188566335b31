//! Unit tests for the configuration model, field paths and the expression parser.

mod common;
use common::*;
use youshiki::compiler::parsing::parse_expression;
use youshiki::error::CompileError;
use youshiki::prelude::*;
use youshiki::schema::{InputType, Node, Options, SchemaIssue, ValidationRule, title_case};

#[test]
fn test_fixture_parses_into_tagged_nodes() {
    let form = freight_form();
    assert_eq!(form.name, "Freight Quote");
    assert!(form.show_stage_names);
    assert_eq!(form.stage_count(), 3);

    let shipment = &form.stages[0];
    assert!(matches!(&shipment.fields[0], Node::Field(f) if f.input_type == InputType::Select));
    assert!(matches!(&shipment.fields[1], Node::Group(g) if g.fields.len() == 3));
    assert!(matches!(
        &shipment.fields[3],
        Node::Section(s) if s.label.as_deref() == Some("Weight")
    ));
}

#[test]
fn test_field_entries_carry_paths_in_document_order() {
    let form = freight_form();
    let paths: Vec<String> = form
        .fields()
        .iter()
        .filter(|entry| entry.stage == 0)
        .map(|entry| entry.path.to_string())
        .collect();
    assert_eq!(
        paths,
        vec![
            "cargoType",
            "dimensions.length",
            "dimensions.width",
            "dimensions.height",
            "volume",
            "weight"
        ]
    );
}

#[test]
fn test_dependent_options_deserialize_as_keyed_map() {
    let form = freight_form();
    let state = form.field(&FieldPath::root("state")).unwrap();
    match &state.options {
        Some(Options::Dependent(by_country)) => {
            assert_eq!(by_country["CA"], vec!["ON", "QC"]);
        }
        other => panic!("expected keyed options, got {:?}", other),
    }
    assert_eq!(state.options_dependent_on.as_deref(), Some("country"));
}

#[test]
fn test_validation_rules_keep_their_payload() {
    let form = freight_form();
    let postal = form.field(&FieldPath::root("postalCode")).unwrap();
    assert_eq!(
        postal.validations,
        vec![ValidationRule::Regex {
            pattern: "^[0-9]{5}$".to_string(),
            message: "Postal code must have five digits.".to_string(),
        }]
    );
}

#[test]
fn test_labels_fall_back_to_title_case() {
    let form = freight_form();
    assert_eq!(form.field(&FieldPath::root("postalCode")).unwrap().display_label(), "Postal Code");
    assert_eq!(form.field(&FieldPath::root("cargoType")).unwrap().display_label(), "Cargo Type");
    assert_eq!(form.stages[2].title(), "Contact Details");
    assert_eq!(title_case("numberOfContainers"), "Number Of Containers");
}

#[test]
fn test_malformed_json_is_a_schema_error() {
    assert!(matches!(
        Form::from_json("{ \"name\": "),
        Err(SchemaError::JsonParseError(_))
    ));
    // Nodes must carry a known `type`.
    let untyped = r#"{"name": "x", "stages": [{"name": "s", "fields": [{"name": "a"}]}]}"#;
    assert!(Form::from_json(untyped).is_err());
}

#[test]
fn test_field_path_parsing() {
    assert_eq!("email".parse::<FieldPath>(), Ok(FieldPath::root("email")));
    assert_eq!(
        "dimensions.width".parse::<FieldPath>(),
        Ok(FieldPath::grouped("dimensions", "width"))
    );
    assert_eq!("".parse::<FieldPath>(), Err(PathError::Empty));
    assert!(matches!("a.b.c".parse::<FieldPath>(), Err(PathError::TooDeep(_))));
    assert!(matches!("a.".parse::<FieldPath>(), Err(PathError::EmptySegment(_))));
}

#[test]
fn test_value_coercions() {
    assert_eq!(Value::from("12.5").as_number(), Some(12.5));
    assert_eq!(Value::empty().as_number(), None);
    assert_eq!(Value::empty().coerce_number(), Some(0.0));
    assert!(Value::Null.is_empty());
    assert!(!Value::Number(0.0).is_empty());
    assert_eq!(Value::Number(24.0).to_string(), "24");
    assert_eq!(Value::Number(2.5).to_string(), "2.5");
}

#[test]
fn test_lint_accepts_the_fixture() {
    assert_eq!(freight_form().lint(), vec![]);
}

#[test]
fn test_lint_reports_structural_issues() {
    let json = r#"
    {
        "name": "Broken",
        "stages": [
            {
                "name": "only",
                "fields": [
                    { "type": "field", "name": "a.b" },
                    { "type": "field", "name": "twin" },
                    { "type": "field", "name": "twin" },
                    { "type": "field", "name": "region", "options": { "EU": ["NL"] } },
                    { "type": "field", "name": "city", "disabledDependencies": ["nowhere"] }
                ]
            }
        ]
    }"#;
    let issues = Form::from_json(json).unwrap().lint();

    assert!(issues.contains(&SchemaIssue::DottedName {
        name: "a.b".to_string()
    }));
    assert!(issues.contains(&SchemaIssue::DuplicateName {
        parent: "only".to_string(),
        name: "twin".to_string()
    }));
    assert!(issues.contains(&SchemaIssue::MissingDependency {
        field: "region".to_string()
    }));
    assert!(issues.contains(&SchemaIssue::UnresolvedDependency {
        field: "city".to_string(),
        path: "nowhere".to_string()
    }));
}

#[test]
fn test_lint_flags_empty_form() {
    let form = Form::from_json(r#"{"name": "Empty"}"#).unwrap();
    assert_eq!(form.lint(), vec![SchemaIssue::NoStages]);
}

#[test]
fn test_hide_name_turns_off_stage_names() {
    let shown = |json: &str| Form::from_json(json).unwrap().show_stage_names;

    assert!(shown(r#"{"name": "A"}"#));
    assert!(!shown(r#"{"name": "A", "hideName": true}"#));
    assert!(shown(r#"{"name": "A", "hideName": false}"#));
    assert!(!shown(r#"{"name": "A", "showStageNames": false}"#));
    // An explicit show flag wins.
    assert!(shown(r#"{"name": "A", "showformStageName": true, "hideName": true}"#));

    let legacy = LegacyForm::from_json(r#"{"name": "A", "hideName": true, "formGroup": []}"#)
        .and_then(IntoForm::into_form)
        .unwrap();
    assert!(!legacy.show_stage_names);
}

#[test]
fn test_legacy_form_converts_by_attributes() {
    let form = LegacyForm::from_json(LEGACY_FORM_JSON)
        .and_then(IntoForm::into_form)
        .unwrap();

    assert!(!form.show_stage_names);
    let nodes = &form.stages[0].fields;
    assert!(matches!(&nodes[0], Node::Field(f) if f.input_type == InputType::Select && f.required));
    assert!(matches!(&nodes[1], Node::Group(g) if g.fields[0].input_type == InputType::Number));
    match &nodes[2] {
        Node::Section(section) => {
            assert_eq!(section.label.as_deref(), Some("Extras"));
            assert!(matches!(&section.fields[0], Node::Field(f) if f.is_computed()));
        }
        other => panic!("expected a section, got {:?}", other),
    }
}

#[test]
fn test_legacy_conversion_rejects_non_objects() {
    let json = r#"{"name": "x", "formGroup": [{"name": "s", "fields": [42]}]}"#;
    let result = LegacyForm::from_json(json).and_then(IntoForm::into_form);
    assert!(matches!(
        result,
        Err(SchemaError::ConversionError { stage, .. }) if stage == "s"
    ));
}

#[test]
fn test_parse_accepts_function_wrapper_and_math_prefix() {
    let wrapped = parse_expression("{ return Math.round(values.a * 2); }").unwrap();
    let bare = parse_expression("round(values.a * 2)").unwrap();
    assert_eq!(wrapped, bare);
}

#[test]
fn test_parse_precedence() {
    let expr = parse_expression("1 + 2 * 3 > 6 && !false").unwrap();
    assert!(matches!(expr, Expression::And(_, _)));

    let conditional = parse_expression("values.a > 0 ? 'yes' : 'no'").unwrap();
    assert!(matches!(conditional, Expression::Conditional { .. }));
}

#[test]
fn test_parse_errors_report_offsets() {
    assert!(matches!(
        parse_expression("values.a + * 2"),
        Err(CompileError::Syntax { offset: 9, .. })
    ));
    assert!(matches!(
        parse_expression("(values.a"),
        Err(CompileError::Syntax { .. })
    ));
}
