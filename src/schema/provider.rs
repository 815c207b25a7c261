//! Schema Providers
//!
//! A new table file has no schema. The table asks a [`SchemaProvider`] for
//! its descriptors exactly once, right before writing block 0.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, TableError};

use super::{FieldDescriptor, FieldType};

/// Supplies the ordered field descriptors of a table being created
pub trait SchemaProvider {
    fn provide(&mut self, table: &str) -> Result<Vec<FieldDescriptor>>;
}

impl<F> SchemaProvider for F
where
    F: FnMut(&str) -> Result<Vec<FieldDescriptor>>,
{
    fn provide(&mut self, table: &str) -> Result<Vec<FieldDescriptor>> {
        self(table)
    }
}

// =============================================================================
// Fixed Schemas
// =============================================================================

/// A schema known up front
#[derive(Debug, Clone)]
pub struct StaticSchema(pub Vec<FieldDescriptor>);

impl SchemaProvider for StaticSchema {
    fn provide(&mut self, _table: &str) -> Result<Vec<FieldDescriptor>> {
        Ok(self.0.clone())
    }
}

/// Refuses to define a schema; opening succeeds only for existing tables
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSchema;

impl SchemaProvider for NoSchema {
    fn provide(&mut self, table: &str) -> Result<Vec<FieldDescriptor>> {
        Err(TableError::Schema(format!(
            "table '{}' has no schema and none was supplied",
            table
        )))
    }
}

// =============================================================================
// JSON Schema File
// =============================================================================

/// Reads `[{"name": "age", "type": "int", "length": 3}, ...]` from a file
#[derive(Debug, Clone)]
pub struct JsonSchemaFile {
    path: PathBuf,
}

impl JsonSchemaFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SchemaProvider for JsonSchemaFile {
    fn provide(&mut self, _table: &str) -> Result<Vec<FieldDescriptor>> {
        let file = File::open(&self.path)?;
        let fields: Vec<FieldDescriptor> = serde_json::from_reader(BufReader::new(file))?;
        Ok(fields)
    }
}

// =============================================================================
// Interactive Prompt
// =============================================================================

/// Asks for the field count, then name/type/length of each field
///
/// Invalid types and lengths are asked again; end of input aborts.
pub struct PromptSchema<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptSchema<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(TableError::Schema(
                "input ended before the schema was complete".to_string(),
            ));
        }
        Ok(line.trim().to_string())
    }
}

impl<R: BufRead, W: Write> SchemaProvider for PromptSchema<R, W> {
    fn provide(&mut self, table: &str) -> Result<Vec<FieldDescriptor>> {
        let answer = self.ask(&format!("please input the number of fields in table {}: ", table))?;
        let count = match answer.parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                return Err(TableError::Schema(format!(
                    "'{}' is not a positive field count",
                    answer
                )))
            }
        };

        let mut fields = Vec::with_capacity(count);
        for i in 0..count {
            let name = self.ask(&format!("please input the name of field {}: ", i))?;

            let field_type = loop {
                let answer = self.ask(&format!(
                    "please input the type of field {} (0-> str; 1-> varstr; 2-> int; 3-> bool): ",
                    i
                ))?;
                if let Ok(t) = answer.parse::<FieldType>() {
                    break t;
                }
            };

            let length = loop {
                let answer = self.ask(&format!("please input the length of field {}: ", i))?;
                match answer.parse::<usize>() {
                    Ok(n) if n > 0 => break n,
                    _ => continue,
                }
            };

            fields.push(FieldDescriptor::new(name, field_type, length));
        }

        Ok(fields)
    }
}
