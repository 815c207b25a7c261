//! Tests for schema providers
//!
//! These tests verify:
//! - Static, closure and refusing providers
//! - JSON schema files
//! - The interactive prompt, including re-asks and early end of input
//! - The `name:type:length` shorthand

use std::io::Cursor;

use blocktable::schema::{
    FieldDescriptor, FieldType, JsonSchemaFile, NoSchema, PromptSchema, SchemaProvider,
    StaticSchema,
};
use blocktable::{Result, TableError};
use tempfile::TempDir;

// =============================================================================
// Fixed Providers
// =============================================================================

#[test]
fn test_static_schema_returns_its_fields() {
    let fields = vec![FieldDescriptor::new("id", FieldType::Int, 4)];
    let mut provider = StaticSchema(fields.clone());

    assert_eq!(provider.provide("t").unwrap(), fields);
    // Asking twice gives the same answer
    assert_eq!(provider.provide("t").unwrap(), fields);
}

#[test]
fn test_closure_provider_sees_table_name() {
    let mut provider = |table: &str| -> Result<Vec<FieldDescriptor>> {
        Ok(vec![FieldDescriptor::new(table, FieldType::String, 8)])
    };

    let fields = provider.provide("movies").unwrap();

    assert_eq!(fields[0].name, "movies");
}

#[test]
fn test_no_schema_refuses() {
    let result = NoSchema.provide("t");
    assert!(matches!(result, Err(TableError::Schema(_))));
}

// =============================================================================
// JSON Schema File
// =============================================================================

#[test]
fn test_json_schema_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("schema.json");
    std::fs::write(
        &path,
        r#"[
            {"name": "title", "type": "varstring", "length": 20},
            {"name": "year", "type": "int", "length": 4},
            {"name": "seen", "type": "bool", "length": 5}
        ]"#,
    )
    .unwrap();

    let fields = JsonSchemaFile::new(&path).provide("movies").unwrap();

    assert_eq!(
        fields,
        vec![
            FieldDescriptor::new("title", FieldType::VarString, 20),
            FieldDescriptor::new("year", FieldType::Int, 4),
            FieldDescriptor::new("seen", FieldType::Bool, 5),
        ]
    );
}

#[test]
fn test_json_schema_file_malformed() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("schema.json");
    std::fs::write(&path, r#"[{"name": "x", "type": "float", "length": 4}]"#).unwrap();

    let result = JsonSchemaFile::new(&path).provide("t");

    assert!(matches!(result, Err(TableError::Serialization(_))));
}

#[test]
fn test_json_schema_file_missing() {
    let temp = TempDir::new().unwrap();
    let result = JsonSchemaFile::new(temp.path().join("nope.json")).provide("t");

    assert!(matches!(result, Err(TableError::Io(_))));
}

// =============================================================================
// Interactive Prompt
// =============================================================================

#[test]
fn test_prompt_collects_fields() {
    let input = Cursor::new("2\nname\n0\n10\nage\n2\n3\n");
    let mut output = Vec::new();

    let fields = PromptSchema::new(input, &mut output).provide("people").unwrap();

    assert_eq!(
        fields,
        vec![
            FieldDescriptor::new("name", FieldType::String, 10),
            FieldDescriptor::new("age", FieldType::Int, 3),
        ]
    );
    let transcript = String::from_utf8(output).unwrap();
    assert!(transcript.contains("number of fields in table people"));
    assert!(transcript.contains("length of field 1"));
}

#[test]
fn test_prompt_reasks_invalid_type_and_length() {
    let input = Cursor::new("1\nflag\n7\nbool\n-1\nabc\n1\n");
    let mut output = Vec::new();

    let fields = PromptSchema::new(input, &mut output).provide("t").unwrap();

    assert_eq!(fields, vec![FieldDescriptor::new("flag", FieldType::Bool, 1)]);
    let transcript = String::from_utf8(output).unwrap();
    assert_eq!(transcript.matches("type of field 0").count(), 2);
    assert_eq!(transcript.matches("length of field 0").count(), 3);
}

#[test]
fn test_prompt_rejects_bad_field_count() {
    let mut output = Vec::new();
    let result = PromptSchema::new(Cursor::new("zero\n"), &mut output).provide("t");
    assert!(matches!(result, Err(TableError::Schema(_))));

    let mut output = Vec::new();
    let result = PromptSchema::new(Cursor::new("0\n"), &mut output).provide("t");
    assert!(matches!(result, Err(TableError::Schema(_))));
}

#[test]
fn test_prompt_end_of_input_aborts() {
    let mut output = Vec::new();
    let result = PromptSchema::new(Cursor::new("2\nname\n0\n"), &mut output).provide("t");

    assert!(matches!(result, Err(TableError::Schema(_))));
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn test_field_type_from_name_or_tag() {
    assert_eq!("str".parse::<FieldType>().unwrap(), FieldType::String);
    assert_eq!("VARSTR".parse::<FieldType>().unwrap(), FieldType::VarString);
    assert_eq!("2".parse::<FieldType>().unwrap(), FieldType::Int);
    assert_eq!("boolean".parse::<FieldType>().unwrap(), FieldType::Bool);
    assert!("4".parse::<FieldType>().is_err());
    assert!("float".parse::<FieldType>().is_err());
}

#[test]
fn test_field_type_tags() {
    for t in [FieldType::String, FieldType::VarString, FieldType::Int, FieldType::Bool] {
        assert_eq!(FieldType::from_tag(t.tag()), Some(t));
    }
    assert_eq!(FieldType::from_tag(-1), None);
}

#[test]
fn test_field_descriptor_shorthand() {
    let field: FieldDescriptor = "age:int:3".parse().unwrap();
    assert_eq!(field, FieldDescriptor::new("age", FieldType::Int, 3));

    assert!("age:int".parse::<FieldDescriptor>().is_err());
    assert!("age:int:x".parse::<FieldDescriptor>().is_err());
}
