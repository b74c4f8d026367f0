// Command line front end for filling scanned identity forms.

use clap::{Parser, Subcommand};
use formfill::{
    models::{CanonicalFieldRecord, RecordValidation, ValidationIssueType},
    processing::{IdTextParser, LabeledTextParser},
    validation::RecordValidator,
    FormError, FormFiller, FormFillerConfig,
};
use log::{error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "formfill")]
#[command(about = "Locate printed labels on a scanned form and write ID fields next to them")]
struct Cli {
    /// JSON configuration file; flags below override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Rasterization DPI
    #[arg(long, global = true)]
    dpi: Option<f32>,

    /// Bold TrueType font used for the overlay
    #[arg(long, global = true)]
    font: Option<PathBuf>,

    /// Tesseract language code
    #[arg(long = "lang", global = true)]
    language: Option<String>,

    /// Directory containing Tesseract traineddata files
    #[arg(long, global = true)]
    tessdata: Option<PathBuf>,

    /// Maximum number of page worker threads
    #[arg(long, global = true)]
    workers: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fill a form PDF from a field record
    Fill {
        /// Scanned form PDF
        form: PathBuf,

        /// Field record JSON (field name to value)
        #[arg(long)]
        record: PathBuf,

        /// Where to write the filled PDF
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print every label occurrence found in a form as JSON
    Locate {
        form: PathBuf,
    },
    /// Turn ID reader text into a field record and print it as JSON
    ParseId {
        /// One file per ID image; later files only fill missing fields
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

fn load_config(cli: &Cli) -> Result<FormFillerConfig, FormError> {
    let mut config = match &cli.config {
        Some(path) => FormFillerConfig::from_json_file(path)?,
        None => FormFillerConfig::default(),
    };

    if let Some(dpi) = cli.dpi {
        config.dpi = dpi;
    }
    if let Some(font) = &cli.font {
        config.font.path = Some(font.clone());
    }
    if let Some(language) = &cli.language {
        config.language = language.clone();
    }
    if let Some(tessdata) = &cli.tessdata {
        config.tessdata_dir = Some(tessdata.clone());
    }
    if cli.workers.is_some() {
        config.max_workers = cli.workers;
    }

    config.validate()?;
    Ok(config)
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, FormError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| FormError::InvalidInput(format!("Failed to serialize output: {}", e)))
}

fn print_validation_report(validation: &RecordValidation) {
    eprintln!("Fields found: {}", validation.fields_present);
    for issue in &validation.issues {
        eprintln!(
            "  - [{}] {}",
            match issue.issue_type {
                ValidationIssueType::Missing => "MISSING",
                ValidationIssueType::Format => "FORMAT",
            },
            issue.message
        );
    }
    eprintln!(
        "Record check: {}",
        if validation.is_valid { "OK" } else { "NEEDS REVIEW" }
    );
}

fn parse_id_files(inputs: &[PathBuf]) -> Result<CanonicalFieldRecord, FormError> {
    let parser = LabeledTextParser;
    let mut combined = CanonicalFieldRecord::new();

    for input in inputs {
        let text = std::fs::read_to_string(input).map_err(|e| {
            FormError::InvalidInput(format!("Failed to read {}: {}", input.display(), e))
        })?;
        combined.absorb(&parser.parse(&text));
        info!("Parsed ID text from {}", input.display());
    }

    Ok(combined)
}

fn run(cli: Cli) -> Result<(), FormError> {
    match &cli.command {
        Command::Fill { form, record, output } => {
            let config = load_config(&cli)?;
            let record = CanonicalFieldRecord::from_json_file(record)?;
            let filler = FormFiller::with_defaults(config)?;
            let written = filler.fill_file(form, &record, output)?;
            println!("{}", written.display());
        }
        Command::Locate { form } => {
            let config = load_config(&cli)?;
            let pdf = std::fs::read(form).map_err(|e| {
                FormError::InvalidInput(format!("Failed to read {}: {}", form.display(), e))
            })?;
            let filler = FormFiller::with_defaults(config)?;
            let occurrences = filler.locate(&pdf)?;
            println!("{}", to_json(&occurrences)?);
        }
        Command::ParseId { inputs } => {
            let record = parse_id_files(inputs)?;
            let validation = RecordValidator::validate(&record);
            if !validation.is_valid {
                warn!("Parsed record has fields with unexpected formats");
            }
            print_validation_report(&validation);
            println!("{}", record.to_json_string()?);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
