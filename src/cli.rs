use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};

use crate::export::{DEFAULT_FONT_NAME, DEFAULT_FONT_SIZE};
use crate::matcher::DEFAULT_CUTOFF;
use crate::ocr::{DEFAULT_OCR_LANG, DEFAULT_OCR_TIMEOUT_SECS};
use crate::util::parse_assignment;

#[derive(Parser, Debug)]
#[command(
    name = "jamabandi",
    version,
    about = "Normalize OCR'd Jamabandi land-record tables into canonical columns"
)]
pub struct Cli {
    #[arg(long, global = true, default_value = ".cache/jamabandi")]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Tokenize(TokenizeArgs),
    Ocr(OcrArgs),
    Region(RegionArgs),
    Validate(ValidateArgs),
    Schemas(SchemasArgs),
    Overrides(OverridesArgs),
    Map(MapArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TokenizeArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long = "header")]
    pub headers: Vec<String>,

    #[arg(long, conflicts_with = "headers")]
    pub positional: Option<usize>,

    #[arg(long, default_value_t = false)]
    pub tsv: bool,
}

#[derive(Args, Debug, Clone)]
pub struct OcrArgs {
    #[arg(long)]
    pub image: PathBuf,

    #[arg(long, default_value = DEFAULT_OCR_LANG)]
    pub lang: String,

    #[arg(long, default_value_t = false)]
    pub tsv: bool,

    #[arg(long, default_value_t = DEFAULT_OCR_TIMEOUT_SECS)]
    pub ocr_timeout_secs: u64,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RegionArgs {
    #[arg(long)]
    pub input: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long)]
    pub schema: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SchemasArgs {
    #[command(subcommand)]
    pub command: SchemasCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SchemasCommand {
    List,
    Show {
        name: String,
    },
    Compare {
        left: String,
        right: String,
    },
    Edit(EditSchemaArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EditSchemaArgs {
    #[arg(long, default_value = "Default")]
    pub base: String,

    #[arg(long = "set", value_parser = parse_assignment)]
    pub set: Vec<(String, String)>,

    #[arg(long = "remove")]
    pub remove: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct OverridesArgs {
    #[command(subcommand)]
    pub command: OverridesCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum OverridesCommand {
    List,
    Set {
        header: String,
        field: String,

        #[arg(long, default_value = "Default")]
        schema: String,
    },
}

#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("source").required(true).args(["input", "image"])))]
pub struct MapArgs {
    #[arg(long)]
    pub input: Option<PathBuf>,

    #[arg(long)]
    pub image: Option<PathBuf>,

    #[arg(long = "header")]
    pub headers: Vec<String>,

    #[arg(long)]
    pub schema: Option<String>,

    #[arg(long, default_value_t = DEFAULT_CUTOFF, value_parser = parse_cutoff)]
    pub cutoff: f64,

    #[arg(long = "assign", value_parser = parse_assignment)]
    pub assignments: Vec<(String, String)>,

    #[arg(long, default_value_t = false)]
    pub non_interactive: bool,

    #[arg(long)]
    pub output: PathBuf,

    #[arg(long, value_enum, default_value_t = ExportFormat::Xlsx)]
    pub format: ExportFormat,

    #[arg(long, default_value = DEFAULT_FONT_NAME)]
    pub font_name: String,

    #[arg(long, default_value_t = DEFAULT_FONT_SIZE)]
    pub font_size: u32,

    #[arg(long, default_value = DEFAULT_OCR_LANG)]
    pub lang: String,

    #[arg(long, default_value_t = DEFAULT_OCR_TIMEOUT_SECS)]
    pub ocr_timeout_secs: u64,

    #[arg(long, default_value_t = false)]
    pub no_manifest: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Xlsx,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

fn parse_cutoff(raw: &str) -> Result<f64, String> {
    let cutoff = raw
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("invalid cutoff '{raw}': {err}"))?;
    if !(0.0..=100.0).contains(&cutoff) {
        return Err(format!("cutoff must be between 0 and 100, got '{raw}'"));
    }
    Ok(cutoff)
}
