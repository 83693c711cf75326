use std::path::PathBuf;
use std::process;

use clap::Parser;
use dbdoctrine::{ConvertOptions, Converter, Output, Transform};
use tracing_subscriber::EnvFilter;

const DEFAULT_OUTPUT: &str = "config/doctrine/schema.yml";

#[derive(Parser)]
#[command(name = "dbdoctrine")]
#[command(version, about = "Convert a DB designer XML model into a Doctrine schema", long_about = None)]
struct Cli {
    /// The DB designer XML file
    dbdfile: PathBuf,

    /// The Doctrine schema file (`-` for stdout)
    #[arg(default_value = DEFAULT_OUTPUT)]
    output: String,

    /// XSL template normalizing the export before conversion
    #[arg(short, long)]
    transform: Option<PathBuf>,

    /// Fail when the conversion reports any warning
    #[arg(long)]
    strict: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let options = ConvertOptions {
        source: cli.dbdfile,
        output: Output::from_arg(&cli.output),
        transform: match cli.transform {
            Some(template) => Transform::Xslt { template },
            None => Transform::None,
        },
    };

    let translation = match Converter::new(options).run() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Conversion failed: {}", e);
            process::exit(1);
        }
    };

    if cli.strict && !translation.warnings.is_empty() {
        eprintln!(
            "Conversion produced {} warning(s) in strict mode",
            translation.warnings.len()
        );
        process::exit(2);
    }
}
