//! Command-line interface for xml-output-parser

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::Read;
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use xml_output_parser::{Error, ValidationMode, XmlOutputParser, XmlValidator, XsdEngine};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xml-output-parser")]
#[command(author, version, about = "Validate model XML output against an XSD schema", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate an XML document against an XSD schema
    Validate {
        /// Path to the XSD schema file
        #[arg(short, long, value_name = "SCHEMA")]
        schema: PathBuf,

        /// Path to the XML file to validate
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Validation mode: strict (first error) or lax (all errors)
        #[arg(short, long, default_value = "lax")]
        mode: String,

        /// Print diagnostics as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Print the format instructions for a schema
    Instructions {
        /// Path to the XSD schema file
        #[arg(short, long, value_name = "SCHEMA")]
        schema: PathBuf,
    },

    /// Extract and validate XML from raw model output
    Parse {
        /// Path to the XSD schema file
        #[arg(short, long, value_name = "SCHEMA")]
        schema: PathBuf,

        /// File with the model output (stdin when omitted or '-')
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

#[cfg(feature = "cli")]
#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate {
            schema,
            file,
            mode,
            json,
        } => cmd_validate(schema, file, mode, json),
        Commands::Instructions { schema } => cmd_instructions(schema),
        Commands::Parse { schema, file } => cmd_parse(schema, file).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn cmd_validate(
    schema_path: PathBuf,
    file: PathBuf,
    mode: String,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let validation_mode: ValidationMode = mode.to_lowercase().parse()?;
    let xsd = read_file(&schema_path)?;
    let xml = read_file(&file)?;

    let validator = XmlValidator::with_engine(XsdEngine::new().with_mode(validation_mode));
    match validator.validate_against_xsd(&xml, &xsd) {
        Ok(_) => {
            if json_output {
                println!("[]");
            } else {
                println!("valid");
            }
            Ok(())
        }
        Err(Error::Parse(e)) => {
            if json_output {
                println!("{}", serde_json::to_string_pretty(e.diagnostics())?);
            } else {
                println!("{}", e);
            }
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(feature = "cli")]
fn cmd_instructions(schema_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let xsd = read_file(&schema_path)?;
    print!("{}", XmlOutputParser::new(xsd).format_instructions());
    Ok(())
}

#[cfg(feature = "cli")]
async fn cmd_parse(schema_path: PathBuf, file: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let xsd = read_file(&schema_path)?;
    let text = read_input(file.as_deref())?;

    let parser = XmlOutputParser::new(xsd);
    let output = parser.parse_text(&text).await?;
    print!("{}", output);
    Ok(())
}

/// Read a whole file
#[cfg(feature = "cli")]
fn read_file(path: &Path) -> xml_output_parser::Result<String> {
    Ok(fs::read_to_string(path)?)
}

/// Read a file, or stdin for `-` or no path
#[cfg(feature = "cli")]
fn read_input(path: Option<&Path>) -> xml_output_parser::Result<String> {
    match path {
        Some(path) if path != Path::new("-") => read_file(path),
        _ => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
