#![allow(dead_code)]

use docschema::{ClassModel, Converter, SchemaError};
use serde_json::{Value, json};

pub const NS: &str = r"Fixtures";

/// A class graph covering the interesting corners: docs, enums, cycles,
/// inheritance and generics.
pub fn fixtures() -> ClassModel {
    ClassModel::from_json_value(
        "fixtures",
        json!({"classes": [
            {
                "name": "Fixtures\\EmptyClass",
                "doc": "/**\n * Liberal Empty Class\n */"
            },
            {
                "name": "Fixtures\\FinalEmptyDeprecatedClass",
                "final": true,
                "doc": "/**\n * Empty Class of Oblivion\n *\n * An empty class that:\n * - cannot be extended\n * - will never have any properties\n *\n * @deprecated\n */"
            },
            {
                "name": "Fixtures\\ClassWithNativeProperties",
                "fields": [
                    {"name": "publicNumber", "type": "null|int|float"},
                    {"name": "publicStrWithDef", "type": "string", "default": "something"},
                    {"name": "protectedInt", "type": "int", "visibility": "protected"},
                    {"name": "publicStaticBool", "type": "bool", "default": true}
                ]
            },
            {
                "name": "Fixtures\\ClassWithMagicProperties",
                "doc": "/**\n * @property string $descriptiveStr A public string property\n * @property int|bool $integerOrBoolean\n * @property-read bool $readonlyAliasType\n */"
            },
            {
                "name": "Fixtures\\ClassWithAugmentedProperties",
                "fields": [
                    {
                        "name": "evenNumbers",
                        "type": "int",
                        "doc": "/**\n * Even numbers between 0 and 10.\n * @var 2|4|6|8\n * @deprecated\n */"
                    },
                    {
                        "name": "promotedProperty",
                        "type": "string",
                        "readonly": true,
                        "doc": "/**\n * A promoted property\n */"
                    }
                ]
            },
            {"name": "Fixtures\\IntEnum", "enum": {"backing": "int", "cases": [{"name": "One", "value": 1}, {"name": "Two", "value": 2}]}},
            {"name": "Fixtures\\StringEnum", "enum": {"backing": "string", "cases": [{"name": "A", "value": "a"}, {"name": "B", "value": "b"}]}},
            {"name": "Fixtures\\NonBackedEnum", "enum": {"cases": [{"name": "A"}, {"name": "B"}]}},
            {
                "name": "Fixtures\\ClassReferencingEmptyClass",
                "final": true,
                "fields": [{"name": "empty", "type": "EmptyClass"}]
            },
            {
                "name": "Fixtures\\SelfReferencingClass",
                "final": true,
                "fields": [
                    {"name": "name", "type": "string"},
                    {"name": "parent", "type": "self"}
                ]
            },
            {
                "name": "Fixtures\\LessEmptyClass",
                "parent": "Fixtures\\EmptyClass",
                "fields": [
                    {"name": "parent", "type": "parent"},
                    {"name": "maybeParent", "type": "?EmptyClass", "default": null, "doc": "/** @var null|parent|self */"}
                ]
            },
            {
                "name": "Fixtures\\Example\\Response",
                "doc": "/**\n * @template T of object\n */",
                "fields": [{"name": "data", "type": "object", "readonly": true, "doc": "/**\n * @var T\n */"}]
            },
            {
                "name": "Fixtures\\Example\\Person",
                "fields": [
                    {"name": "name", "type": "string", "readonly": true},
                    {"name": "height", "type": "int|float", "readonly": true}
                ]
            },
            {"name": "Fixtures\\Example\\GetPersonEndpoint"}
        ]}),
    )
    .expect("fixture model is valid")
}

pub fn convert(annotation: &str, context: Option<&str>) -> Result<Value, SchemaError> {
    let model = fixtures();
    let schema = Converter::new(&model).convert_annotation(annotation, context)?;
    Ok(schema.to_json().expect("schemas serialize"))
}

/// `#/definitions/...` for a class in the fixture namespace.
pub fn reference(class: &str) -> Value {
    json!({"$ref": format!("#/definitions/{NS}.{class}")})
}

pub fn key(class: &str) -> String {
    format!("{NS}.{class}")
}

pub fn empty_class_definition() -> Value {
    json!({"type": "object", "title": "Liberal Empty Class", "required": []})
}
