//! crudgen CLI - CRUD scaffolding from table schemas
//!
//! Introspects one table (live database or JSON schema file) and writes the
//! entity, DTO, handler and module files for it.

use clap::Parser;
use std::error::Error as _;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

use crudgen::pipeline::{self, GenerationRequest};
use crudgen::{
    Command, FsSink, GenerateOptions, GeneratorConfig, NamingOverrides, Source, SourceKind,
};

const DEFAULT_CONFIG_FILE: &str = "crudgen.yaml";

#[derive(Parser)]
#[command(name = "crudgen")]
#[command(version, about = "CRUD scaffolding generator for relational tables", long_about = None)]
struct Cli {
    /// Table to generate for
    table: String,

    /// Where the schema comes from
    #[arg(short, long, value_enum, default_value_t = SourceKind::Mysql)]
    source: SourceKind,

    /// Which artifacts to generate
    #[arg(short = 'g', long, value_enum, default_value_t = Command::All)]
    command: Command,

    /// Configuration file (default: ./crudgen.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Schema file for the json source (default: <schema_dir>/<table>.json)
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Output root directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Template directory overlaying the built-in templates
    #[arg(short, long)]
    templates: Option<PathBuf>,

    /// Use only the templates from --templates
    #[arg(long, requires = "templates")]
    standalone: bool,

    /// Also generate the module aggregator (with `all`)
    #[arg(short, long)]
    module: bool,

    /// Override the derived struct name
    #[arg(long)]
    struct_name: Option<String>,

    /// Override the derived singular name
    #[arg(long)]
    singular_name: Option<String>,

    /// Verbose logging and full error chains
    #[arg(short, long)]
    debug: bool,
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let debug = cli.debug || std::env::var_os("DEBUG").is_some();
    init_tracing(debug);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e.summary());
        if debug {
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
        }
        process::exit(1);
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<GeneratorConfig, crudgen::Error> {
    match path {
        Some(path) => Ok(GeneratorConfig::from_file(path)?),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            Ok(GeneratorConfig::from_file(DEFAULT_CONFIG_FILE)?)
        }
        None => Ok(GeneratorConfig::default()),
    }
}

fn run(cli: Cli) -> Result<(), crudgen::Error> {
    let mut config = load_config(cli.config.as_deref())?;

    if let Some(schema) = cli.schema {
        config.file.path = Some(schema);
    }
    if let Some(output) = cli.output {
        config.output.root = output;
    }
    if let Some(templates) = cli.templates {
        config.templates.dir = Some(templates);
        config.templates.standalone = cli.standalone;
    }

    println!("🔧 Generating {} for '{}' from {}...", cli.command, cli.table, cli.source);

    let templates = pipeline::load_templates(&config.templates)?;
    let source = Source::from_config(cli.source, &config);

    let request = GenerationRequest::new(cli.table.as_str(), cli.command)
        .with_overrides(NamingOverrides {
            singular_name: cli.singular_name,
            struct_name: cli.struct_name,
        })
        .with_snippets(config.snippets.clone())
        .with_options(GenerateOptions {
            module: cli.module || config.output.module,
        });

    let mut sink = FsSink::new(&config.output.root);
    let written = pipeline::run(&source, &templates, &request, &mut sink)?;

    for path in &written {
        println!("  ✓ Generated {}", path.display());
    }
    println!("✨ Generated {} file(s) for '{}'", written.len(), cli.table);

    Ok(())
}
