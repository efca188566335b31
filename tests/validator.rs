//! Tests for stage validation: the required gate and each rule kind.
mod common;
use common::*;
use youshiki::prelude::*;

fn validate_with(engine: &FormEngine, stage: usize, edits: &[(&str, &str)]) -> ErrorMap {
    let mut values = engine.initialize();
    for (path, value) in edits {
        let path = path.parse::<FieldPath>().unwrap();
        values = engine.apply_change(&values, &path, Value::from(*value));
    }
    engine.validate_stage(stage, &engine.recompute_derived(&values))
}

fn validate(stage: usize, edits: &[(&str, &str)]) -> ErrorMap {
    validate_with(&freight_engine(), stage, edits)
}

fn message<'a>(errors: &'a ErrorMap, path: &str) -> Option<&'a str> {
    errors.get(&path.parse::<FieldPath>().unwrap()).map(String::as_str)
}

#[test]
fn test_empty_required_field_yields_exactly_one_error() {
    let errors = validate(1, &[]);
    assert_eq!(errors.len(), 1);
    assert_eq!(message(&errors, "country"), Some("Country is required."));
}

#[test]
fn test_required_messages_use_labels_and_group_keys() {
    let errors = validate(0, &[]);
    assert_eq!(errors.len(), 4);
    assert_eq!(message(&errors, "cargoType"), Some("Cargo Type is required."));
    assert_eq!(message(&errors, "dimensions.length"), Some("Length is required."));
    assert_eq!(message(&errors, "dimensions.height"), Some("Height is required."));
    // Computed fields are not required and carry no rules.
    assert_eq!(message(&errors, "volume"), None);
}

#[test]
fn test_filled_stage_has_no_errors() {
    let errors = validate(
        0,
        &[
            ("cargoType", "General"),
            ("dimensions.length", "2"),
            ("dimensions.width", "3"),
            ("dimensions.height", "4"),
        ],
    );
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
}

#[test]
fn test_numeric_bounds() {
    let low = validate(0, &[("weight", "0.5")]);
    assert_eq!(message(&low, "weight"), Some("Weight must be at least 1 kg."));

    let high = validate(0, &[("weight", "40000")]);
    assert_eq!(message(&high, "weight"), Some("Weight cannot exceed 30000 kg."));

    let within = validate(0, &[("weight", "30000")]);
    assert_eq!(message(&within, "weight"), None);

    // Non-numeric text is left to other rules.
    let text = validate(0, &[("weight", "heavy")]);
    assert_eq!(message(&text, "weight"), None);
}

#[test]
fn test_regex_rule_skips_empty_values() {
    assert_eq!(message(&validate(1, &[]), "postalCode"), None);
    assert_eq!(
        message(&validate(1, &[("postalCode", "1234")]), "postalCode"),
        Some("Postal code must have five digits.")
    );
    assert_eq!(message(&validate(1, &[("postalCode", "12345")]), "postalCode"), None);
}

#[test]
fn test_predicate_rule() {
    assert_eq!(
        message(&validate(2, &[("email", "a@b")]), "email"),
        Some("Enter a valid email address.")
    );
    assert_eq!(
        message(&validate(2, &[("email", "nobody.example.com")]), "email"),
        Some("Enter a valid email address.")
    );
    assert_eq!(message(&validate(2, &[("email", "ada@example.com")]), "email"), None);
}

#[test]
fn test_later_failures_overwrite_earlier_ones() {
    // The required check fails first, then the predicate rejects the empty value.
    assert_eq!(
        message(&validate(2, &[]), "email"),
        Some("Enter a valid email address.")
    );
}

#[test]
fn test_max_length_counts_characters() {
    assert_eq!(message(&validate(2, &[("notes", "ten chars!")]), "notes"), None);
    assert_eq!(
        message(&validate(2, &[("notes", "eleven char")]), "notes"),
        Some("Notes are too long.")
    );
}

#[test]
fn test_empty_rule_message_falls_back_to_label() {
    let form = Form::from_json(
        r#"{
            "name": "Codes",
            "stages": [{
                "name": "only",
                "fields": [{
                    "type": "field",
                    "name": "promoCode",
                    "minLength": 4,
                    "validation": [{"type": "MinLength"}]
                }]
            }]
        }"#,
    )
    .unwrap();
    let engine = FormEngine::new(form);
    let errors = validate_with(&engine, 0, &[("promoCode", "abc")]);
    assert_eq!(message(&errors, "promoCode"), Some("Promo Code is invalid."));
}

#[test]
fn test_stage_out_of_range_has_no_errors() {
    assert!(validate(7, &[]).is_empty());
}

const PALLET_FORM_JSON: &str = r#"
{
    "name": "Pallet",
    "stages": [{
        "name": "pallet",
        "fields": [
            { "type": "field", "name": "length", "inputType": "number" },
            {
                "type": "group",
                "name": "dimensions",
                "fields": [
                    {
                        "name": "length",
                        "inputType": "number",
                        "min": 1,
                        "max": 12,
                        "validation": [
                            { "type": "MinValue", "message": "Pallet length must be at least 1 m." },
                            { "type": "MaxValue", "message": "Pallet length cannot exceed 12 m." }
                        ]
                    },
                    {
                        "name": "width",
                        "inputType": "number",
                        "validation": [{
                            "type": "Function",
                            "function": "{ return fieldValue <= formValue.length; }",
                            "message": "Width must not exceed length."
                        }]
                    },
                    {
                        "name": "height",
                        "inputType": "number",
                        "validation": [{
                            "type": "Function",
                            "function": "fieldValue <= values.length",
                            "message": "Height must not exceed the outer length."
                        }]
                    }
                ]
            }
        ]
    }]
}
"#;

fn validate_pallet(edits: &[(&str, &str)]) -> ErrorMap {
    let engine = FormEngine::new(Form::from_json(PALLET_FORM_JSON).unwrap());
    validate_with(&engine, 0, edits)
}

#[test]
fn test_grouped_predicate_sees_group_values() {
    let edits = [
        ("length", "1"),
        ("dimensions.length", "10"),
        ("dimensions.width", "5"),
    ];
    let errors = validate_pallet(&edits);
    assert_eq!(message(&errors, "dimensions.width"), None, "errors: {:?}", errors);

    let errors = validate_pallet(&[("dimensions.length", "4"), ("dimensions.width", "5")]);
    assert_eq!(
        message(&errors, "dimensions.width"),
        Some("Width must not exceed length.")
    );
}

#[test]
fn test_grouped_predicate_can_still_read_the_whole_form() {
    let edits = [
        ("length", "3"),
        ("dimensions.length", "10"),
        ("dimensions.height", "5"),
    ];
    assert_eq!(
        message(&validate_pallet(&edits), "dimensions.height"),
        Some("Height must not exceed the outer length.")
    );
    let edits = [("length", "8"), ("dimensions.height", "5")];
    assert_eq!(message(&validate_pallet(&edits), "dimensions.height"), None);
}

#[test]
fn test_grouped_numeric_bounds() {
    assert_eq!(
        message(&validate_pallet(&[("dimensions.length", "0.5")]), "dimensions.length"),
        Some("Pallet length must be at least 1 m.")
    );
    assert_eq!(
        message(&validate_pallet(&[("dimensions.length", "13")]), "dimensions.length"),
        Some("Pallet length cannot exceed 12 m.")
    );
    assert_eq!(
        message(&validate_pallet(&[("dimensions.length", "12")]), "dimensions.length"),
        None
    );
    // The top-level field of the same name carries no bounds.
    assert_eq!(message(&validate_pallet(&[("length", "40")]), "length"), None);
}
