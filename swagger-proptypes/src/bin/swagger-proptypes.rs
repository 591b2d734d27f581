/// CLI: compiles the `definitions` of a Swagger document, emits a PropTypes
/// module, or validates a JSON instance against one definition.
///
/// Usage:
///   swagger-proptypes compile  swagger.json
///   swagger-proptypes module   swagger.json > props.js
///   swagger-proptypes validate swagger.json Pet pet.json
///   swagger-proptypes validate swagger.json Pet --exact < pet.json
use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use swagger_proptypes::emit_js::{emit, ModuleOptions};
use swagger_proptypes::source as schema_source;
use swagger_proptypes::{compile_all, Validator, Violation};

const LOG_ENV: &str = "SWAGGER_PROPTYPES_LOG";

#[derive(Debug, Parser)]
#[command(name = "swagger-proptypes", version, about = "Swagger definitions to shape validators")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile and list the usable definitions
    Compile {
        /// Swagger document: file path or http(s) URL
        source: String,
    },
    /// Emit an ES module with one PropTypes checker per definition
    Module {
        source: String,
        /// Binding name for the imported checker library
        #[arg(long, default_value = "PropTypes")]
        binding: String,
        /// Package to import the checker library from
        #[arg(long, default_value = "prop-types")]
        package: String,
    },
    /// Validate a JSON instance against one definition
    Validate {
        source: String,
        /// Definition name, e.g. Pet
        definition: String,
        /// Instance file; stdin when omitted
        instance: Option<PathBuf>,
        /// Also reject keys the definition does not declare
        #[arg(long)]
        exact: bool,
        /// Print violations as a JSON array
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            eprintln!("error: {error:#}");
            std::process::exit(1);
        }
    }
}

async fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    match cli.command {
        Command::Compile { source } => {
            let defs = schema_source::load(&source)
                .await
                .with_context(|| format!("failed to load {source}"))?;
            let table = compile_all(&defs).context("failed to compile definitions")?;
            for (name, spec) in table.iter() {
                println!("{name}: {}", describe(spec));
            }
            Ok(0)
        }

        Command::Module {
            source,
            binding,
            package,
        } => {
            let defs = schema_source::load(&source)
                .await
                .with_context(|| format!("failed to load {source}"))?;
            let table = compile_all(&defs).context("failed to compile definitions")?;
            print!("{}", emit(&table, &ModuleOptions { binding, package }));
            Ok(0)
        }

        Command::Validate {
            source,
            definition,
            instance,
            exact,
            json,
        } => {
            let defs = schema_source::load(&source)
                .await
                .with_context(|| format!("failed to load {source}"))?;
            let table = compile_all(&defs).context("failed to compile definitions")?;
            let value = read_instance(instance.as_deref())?;

            let validator = Validator::new(&table);
            let violations = if exact {
                validator.check_exact_definition(&definition, &value)?
            } else {
                validator.validate_definition(&definition, &value)?
            };

            report(&violations, json)?;
            Ok(if violations.is_empty() { 0 } else { 1 })
        }
    }
}

fn describe(spec: &swagger_proptypes::VSpec) -> String {
    use swagger_proptypes::VSpec;
    match spec {
        VSpec::Shape { fields, .. } => {
            let required = fields.iter().filter(|f| f.required).count();
            format!("shape with {} fields ({required} required)", fields.len())
        }
        VSpec::Map { .. } => "map".into(),
        VSpec::Primitive(kind) => kind.to_string(),
        VSpec::Array { .. } => "array".into(),
        VSpec::Enum { allowed } => format!("enum of {}", allowed.len()),
        VSpec::Reference { name } => format!("reference to {name}"),
    }
}

fn read_instance(path: Option<&std::path::Path>) -> anyhow::Result<serde_json::Value> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("cannot read stdin")?;
            buf
        }
    };
    serde_json::from_str(&text).context("instance is not valid JSON")
}

fn report(violations: &[Violation], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(violations)?);
        return Ok(());
    }
    if violations.is_empty() {
        println!("ok");
    }
    for violation in violations {
        println!("{:?} {violation}", violation.kind);
    }
    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
