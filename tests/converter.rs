mod common;

use common::{convert, empty_class_definition, key, reference};
use docschema::{ClassModel, Converter, SchemaError};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};

#[rstest]
#[case::simple_string("string", json!({"type": "string"}))]
#[case::string_literal("'test'", json!({"const": "test"}))]
#[case::integer("int", json!({"type": "integer"}))]
#[case::float("float", json!({"type": "number"}))]
#[case::mixed("mixed", json!({}))]
#[case::integer_literal("123", json!({"const": 123}))]
#[case::null_literal("null", json!({"type": "null"}))]
#[case::nullable_string("?string", json!({"type": ["null", "string"]}))]
#[case::scalar("scalar", json!({"type": ["string", "integer", "number", "boolean"]}))]
#[case::false_or_integer("false|integer", json!({"anyOf": [{"const": false}, {"type": "integer"}]}))]
#[case::true_or_false("true|false", json!({"anyOf": [{"const": true}, {"const": false}]}))]
#[case::object_shape(
    "object{'aa': string, bb?: bool, cc: int|float}",
    json!({
        "type": "object",
        "properties": {
            "aa": {"type": "string"},
            "bb": {"type": "boolean"},
            "cc": {"type": ["integer", "number"]}
        },
        "required": ["aa", "cc"],
        "additionalProperties": true
    })
)]
fn plain_annotations(#[case] annotation: &str, #[case] expected: Value) {
    assert_eq!(convert(annotation, None).unwrap(), expected);
}

#[test]
fn empty_class() {
    assert_eq!(
        convert(r"\Fixtures\EmptyClass", None).unwrap(),
        json!({
            "$ref": "#/definitions/Fixtures.EmptyClass",
            "definitions": {"Fixtures.EmptyClass": empty_class_definition()}
        })
    );
}

#[test]
fn integer_or_empty_class() {
    assert_eq!(
        convert(r"int|\Fixtures\EmptyClass", None).unwrap(),
        json!({
            "anyOf": [{"type": "integer"}, reference("EmptyClass")],
            "definitions": {"Fixtures.EmptyClass": empty_class_definition()}
        })
    );
}

#[test]
fn final_empty_deprecated_class() {
    let schema = convert(r"\Fixtures\FinalEmptyDeprecatedClass", None).unwrap();
    assert_eq!(
        schema["definitions"][key("FinalEmptyDeprecatedClass")],
        json!({
            "type": "object",
            "required": [],
            "additionalProperties": false,
            "deprecated": true,
            "title": "Empty Class of Oblivion",
            "description": "An empty class that:\n- cannot be extended\n- will never have any properties"
        })
    );
}

#[test]
fn class_with_native_properties() {
    let schema = convert(r"\Fixtures\ClassWithNativeProperties", None).unwrap();
    assert_eq!(
        schema["definitions"][key("ClassWithNativeProperties")],
        json!({
            "type": "object",
            "required": ["publicNumber", "publicStrWithDef", "publicStaticBool"],
            "properties": {
                "publicNumber": {"type": ["null", "integer", "number"]},
                "publicStrWithDef": {"type": "string", "default": "something"},
                "publicStaticBool": {"type": "boolean", "default": true}
            }
        })
    );
}

#[test]
fn class_with_magic_properties() {
    let schema = convert(r"\Fixtures\ClassWithMagicProperties", None).unwrap();
    assert_eq!(
        schema["definitions"][key("ClassWithMagicProperties")],
        json!({
            "type": "object",
            "required": [],
            "properties": {
                "descriptiveStr": {"type": "string", "title": "A public string property"},
                "integerOrBoolean": {"type": ["integer", "boolean"]},
                "readonlyAliasType": {"type": "boolean", "readOnly": true}
            }
        })
    );
}

#[test]
fn class_with_augmented_properties() {
    let schema = convert(r"\Fixtures\ClassWithAugmentedProperties", None).unwrap();
    assert_eq!(
        schema["definitions"][key("ClassWithAugmentedProperties")],
        json!({
            "type": "object",
            "required": ["evenNumbers", "promotedProperty"],
            "properties": {
                "evenNumbers": {
                    "anyOf": [{"const": 2}, {"const": 4}, {"const": 6}, {"const": 8}],
                    "description": "Even numbers between 0 and 10.",
                    "deprecated": true
                },
                "promotedProperty": {
                    "type": "string",
                    "description": "A promoted property",
                    "readOnly": true
                }
            }
        })
    );
}

#[rstest]
#[case::int_backed("IntEnum", json!({"type": "integer", "enum": [1, 2]}))]
#[case::string_backed("StringEnum", json!({"type": "string", "enum": ["a", "b"]}))]
fn backed_enums(#[case] class: &str, #[case] expected: Value) {
    let schema = convert(&format!(r"\Fixtures\{class}"), None).unwrap();
    assert_eq!(schema["$ref"], reference(class)["$ref"]);
    assert_eq!(schema["definitions"][key(class)], expected);
}

#[test]
fn non_backed_enum_fails() {
    let err = convert(r"\Fixtures\NonBackedEnum", None).unwrap_err();
    assert!(matches!(err, SchemaError::MalformedEnum { ref name, .. } if name == r"Fixtures\NonBackedEnum"));
}

#[test]
fn class_referencing_another_class() {
    assert_eq!(
        convert(r"\Fixtures\ClassReferencingEmptyClass", None).unwrap(),
        json!({
            "$ref": "#/definitions/Fixtures.ClassReferencingEmptyClass",
            "definitions": {
                "Fixtures.ClassReferencingEmptyClass": {
                    "type": "object",
                    "required": ["empty"],
                    "properties": {"empty": reference("EmptyClass")},
                    "additionalProperties": false
                },
                "Fixtures.EmptyClass": empty_class_definition()
            }
        })
    );
}

#[test]
fn class_referencing_itself_terminates() {
    assert_eq!(
        convert(r"\Fixtures\SelfReferencingClass", None).unwrap(),
        json!({
            "$ref": "#/definitions/Fixtures.SelfReferencingClass",
            "definitions": {
                "Fixtures.SelfReferencingClass": {
                    "type": "object",
                    "required": ["name", "parent"],
                    "additionalProperties": false,
                    "properties": {
                        "name": {"type": "string"},
                        "parent": reference("SelfReferencingClass")
                    }
                }
            }
        })
    );
}

#[rstest]
#[case("self")]
#[case("static")]
#[case("$this")]
fn current_class_keywords(#[case] annotation: &str) {
    assert_eq!(
        convert(annotation, Some(r"Fixtures\EmptyClass")).unwrap(),
        json!({
            "$ref": "#/definitions/Fixtures.EmptyClass",
            "definitions": {"Fixtures.EmptyClass": empty_class_definition()}
        })
    );
}

#[test]
fn class_referencing_parent() {
    let schema = convert(r"\Fixtures\LessEmptyClass", Some(r"Fixtures\EmptyClass")).unwrap();
    assert_eq!(
        schema,
        json!({
            "$ref": "#/definitions/Fixtures.LessEmptyClass",
            "definitions": {
                "Fixtures.LessEmptyClass": {
                    "type": "object",
                    "required": ["parent", "maybeParent"],
                    "properties": {
                        "parent": reference("EmptyClass"),
                        "maybeParent": {
                            "default": null,
                            "anyOf": [
                                {"type": "null"},
                                reference("EmptyClass"),
                                reference("LessEmptyClass")
                            ]
                        }
                    }
                },
                "Fixtures.EmptyClass": empty_class_definition()
            }
        })
    );
}

#[test]
fn parent_without_a_parent_class_fails() {
    let err = convert("parent", Some(r"Fixtures\EmptyClass")).unwrap_err();
    assert!(matches!(err, SchemaError::MissingContext { keyword: "parent", .. }));
}

#[rstest]
#[case::void("void", "`void` cannot be converted to JSON Schema")]
#[case::never("never", "`never` cannot be converted to JSON Schema")]
#[case::resource("resource", "`resource` cannot be converted to JSON Schema")]
#[case::callable("callable", "`callable` cannot be converted to JSON Schema")]
#[case::complex_callable("callable(int): string", "`callable` cannot be converted to JSON Schema")]
#[case::generic_object("object<int>", "`object<int>` cannot be converted to JSON Schema")]
fn invalid_conversions(#[case] annotation: &str, #[case] message: &str) {
    let err = convert(annotation, None).unwrap_err();
    assert!(matches!(err, SchemaError::UnsupportedType(_)));
    assert_eq!(err.to_string(), message);
}

#[test]
fn missing_class_fails() {
    let err = convert("missing", None).unwrap_err();
    assert!(matches!(err, SchemaError::UnknownClass(name) if name == "missing"));
}

#[test]
fn failures_leave_no_partial_schema_behind() {
    let model = ClassModel::from_json_value(
        "inline",
        json!({"classes": [
            {"name": "Good", "fields": [{"name": "bad", "type": "Bad"}]},
            {"name": "Bad", "fields": [{"name": "f", "doc": "/** @var callable */"}]}
        ]}),
    )
    .unwrap();
    let converter = Converter::new(&model);
    let err = converter.convert_class("Good").unwrap_err();
    assert!(matches!(err, SchemaError::UnsupportedType(ref ty) if ty == "callable"));

    // the converter stays usable and fresh for the next call
    let schema = converter.convert_annotation("int", None).unwrap();
    assert!(schema.definitions.is_none());
}

#[test]
fn conversions_are_idempotent() {
    let model = common::fixtures();
    let converter = Converter::new(&model);
    for class in model.iter() {
        let first = converter.convert_class(&class.name).map(|s| s.to_json().unwrap());
        let second = converter.convert_class(&class.name).map(|s| s.to_json().unwrap());
        match (first, second) {
            (Ok(first), Ok(second)) => assert_eq!(first, second, "{}", class.name),
            (Err(first), Err(second)) => assert_eq!(first.to_string(), second.to_string()),
            _ => panic!("{} converted only once", class.name),
        }
    }
}

#[test]
fn shared_references_are_defined_once() {
    let schema = convert(
        r"object{a: \Fixtures\EmptyClass, b: list<\Fixtures\EmptyClass>, c: ?\Fixtures\EmptyClass}",
        None,
    )
    .unwrap();
    let definitions = schema["definitions"].as_object().unwrap();
    assert_eq!(definitions.len(), 1);
    assert_eq!(schema["properties"]["c"], json!({"anyOf": [{"type": "null"}, reference("EmptyClass")]}));
}

#[test]
fn deeply_nested_annotation_fails_cleanly() {
    let annotation = format!("{}int{}", "(".repeat(5_000), ")".repeat(5_000));
    let err = convert(&annotation, None).unwrap_err();
    assert!(matches!(err, SchemaError::Annotation(ref parse) if parse.message == "type is nested too deeply"));
}
