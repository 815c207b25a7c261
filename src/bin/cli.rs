//! blocktable CLI
//!
//! Command-line shell around a single table file.

use std::io;
use std::path::PathBuf;
use std::process;

use blocktable::schema::{JsonSchemaFile, NoSchema, PromptSchema, StaticSchema};
use blocktable::{Config, FieldDescriptor, Result, SyncStrategy, Table, TableError};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

/// blocktable CLI
#[derive(Parser, Debug)]
#[command(name = "blocktable")]
#[command(about = "Single-file block table storage")]
#[command(version)]
struct Args {
    /// Directory holding the table files
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// Write durability
    #[arg(long, value_enum, default_value = "flush")]
    sync: SyncArg,

    /// Table name (the file is <data-dir>/<table>.dat)
    table: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SyncArg {
    Flush,
    EveryWrite,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the table (prompts for the schema unless one is given)
    Create {
        /// JSON schema file: [{"name": .., "type": .., "length": ..}]
        #[arg(short, long, conflicts_with = "field")]
        schema: Option<PathBuf>,

        /// Field as name:type:length (repeatable)
        #[arg(short, long)]
        field: Vec<String>,
    },

    /// Insert one row, one value per field
    Insert {
        /// Field values in schema order
        #[arg(allow_hyphen_values = true)]
        values: Vec<String>,
    },

    /// Print every row
    Scan,

    /// Print the field descriptors
    Fields,

    /// Delete rows where FIELD equals VALUE
    Delete {
        field: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Set TARGET to NEW where CONDITION equals OLD
    Update {
        condition: String,
        #[arg(allow_hyphen_values = true)]
        old: String,
        target: String,
        #[arg(allow_hyphen_values = true)]
        new: String,
    },

    /// Re-pack live rows and shrink the file
    Vacuum,

    /// Delete the table file
    Drop,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,blocktable=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    tracing::debug!("blocktable v{}", blocktable::VERSION);

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let sync_strategy = match args.sync {
        SyncArg::Flush => SyncStrategy::Flush,
        SyncArg::EveryWrite => SyncStrategy::EveryWrite,
    };
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .sync_strategy(sync_strategy)
        .build();

    let command = match args.command {
        Commands::Create { schema, field } => return create(&config, &args.table, schema, field),
        command => command,
    };

    let mut table = Table::open(&config, &args.table, NoSchema)?;
    // The open notice is noise for one-shot commands
    table.take_notices();

    match command {
        Commands::Insert { values } => {
            table.insert(&values)?;
        }
        Commands::Scan => print_rows(&table),
        Commands::Fields => {
            for field in table.fields() {
                println!("{:<10} {:<9} {}", field.name, field.field_type, field.length);
            }
        }
        Commands::Delete { field, value } => {
            table.delete_by_condition(&field, &value)?;
        }
        Commands::Update {
            condition,
            old,
            target,
            new,
        } => {
            table.update_by_condition(&condition, &old, &target, &new)?;
        }
        Commands::Vacuum => {
            table.vacuum()?;
        }
        Commands::Drop => {
            println!("{}", table.drop_table()?);
            return Ok(());
        }
        Commands::Create { .. } => {}
    }

    render_notices(&mut table);
    table.close()
}

fn create(
    config: &Config,
    name: &str,
    schema: Option<PathBuf>,
    fields: Vec<String>,
) -> Result<()> {
    if Table::exists(config, name)? {
        return Err(TableError::Schema(format!("table '{}' already exists", name)));
    }

    let mut table = if let Some(path) = schema {
        Table::open(config, name, JsonSchemaFile::new(path))?
    } else if !fields.is_empty() {
        let fields = fields
            .iter()
            .map(|f| f.parse::<FieldDescriptor>())
            .collect::<Result<Vec<_>>>()?;
        Table::open(config, name, StaticSchema(fields))?
    } else {
        let stdin = io::stdin();
        Table::open(config, name, PromptSchema::new(stdin.lock(), io::stdout()))?
    };

    render_notices(&mut table);
    table.close()
}

fn print_rows(table: &Table) {
    let header: Vec<&str> = table.fields().iter().map(|f| f.name.as_str()).collect();
    println!("{}", header.join(" | "));
    for row in table.scan() {
        let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        println!("{}", cells.join(" | "));
    }
}

fn render_notices(table: &mut Table) {
    for notice in table.take_notices() {
        println!("{}", notice);
    }
}
