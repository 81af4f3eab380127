use std::fs;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::builder::TypedValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use coursecat::types::CourseRecord;
use coursecat::utils::{CatalogueStats, RecordFilter, index_by_course_code};
use coursecat::{ScraperConfig, WebScraper, parse_course_listing};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "coursecat")]
#[command(about = "A course catalogue scraper", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        long,
        global = true,
        default_value = coursecat::BASE_URL,
        help = "Base URL of the catalogue course listings"
    )]
    base_url: String,

    #[arg(
        long,
        global = true,
        default_value_t = 30,
        value_name = "SECS",
        help = "HTTP request timeout in seconds"
    )]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Args)]
struct OutputArgs {
    #[arg(
        long,
        default_value_t = 20,
        help = "Maximum number of records to print",
        value_parser = clap::value_parser!(u16).range(1..).map(usize::from)
    )]
    limit: usize,

    #[arg(long, help = "Number of records to skip from the beginning")]
    offset: Option<usize>,

    #[arg(long, help = "Only keep records of this department code, e.g. \"INT D\"")]
    department: Option<String>,

    #[arg(long, help = "Only keep records whose term contains this text")]
    term: Option<String>,

    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value = "text",
        help = "Output format"
    )]
    format: OutputFormat,

    #[arg(long, help = "Emit JSON as an object keyed by course code")]
    keyed: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and parse the course listing of one or more departments
    Fetch {
        #[arg(required = true, help = "Department codes, e.g. CMPUT or \"INT D\"")]
        departments: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Parse a department listing page saved to disk
    Parse {
        #[arg(help = "Path to the saved HTML listing page")]
        file: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print the JSON schema of the emitted course records
    Schema,
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn print_records(records: Vec<CourseRecord>, output: OutputArgs) {
    let filter = RecordFilter {
        department: output.department,
        term: output.term,
        limit: Some(output.limit),
        offset: output.offset,
    };

    let filter = filter.validate().unwrap_or_else(|e| {
        log::error!("Invalid args: {e}");
        process::exit(1);
    });

    let records = filter.apply(records);

    match output.format {
        OutputFormat::Json if output.keyed => serialize_json(&index_by_course_code(&records)),
        OutputFormat::Json => serialize_json(&records),
        OutputFormat::Text => {
            if output.keyed {
                log::warn!("--keyed only applies to JSON output");
            }
            if records.is_empty() {
                println!("No courses to display.");
            } else {
                for (i, record) in records.iter().enumerate() {
                    print!("{:>3}. {}", i + 1, record);
                    if let Some(url) = record.absolute_url(coursecat::CATALOGUE_HOST) {
                        println!("     {}", url);
                    }
                }
                print!("{}", CatalogueStats::from_records(&records));
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    match cli.command {
        Commands::Fetch {
            departments,
            output,
        } => {
            let scraper = WebScraper::with_config(ScraperConfig {
                base_url: cli.base_url,
                timeout: Duration::from_secs(cli.timeout),
                ..ScraperConfig::default()
            })
            .unwrap_or_else(|e| {
                log::error!("Error creating scraper: {}", e);
                process::exit(1);
            });

            let records = if let [department] = departments.as_slice() {
                scraper
                    .fetch_department(department)
                    .await
                    .unwrap_or_else(|e| {
                        log::error!("Error fetching department {}: {}", department, e);
                        process::exit(1);
                    })
            } else {
                scraper.fetch_departments(&departments).await
            };

            print_records(records, output);
        }

        Commands::Parse { file, output } => {
            log::info!("Parsing listing page {}...", file.display());

            let html = fs::read_to_string(&file).unwrap_or_else(|e| {
                log::error!("Error reading {}: {}", file.display(), e);
                process::exit(1);
            });

            let records = parse_course_listing(&html).unwrap_or_else(|e| {
                log::error!("Error parsing {}: {}", file.display(), e);
                process::exit(1);
            });

            print_records(records, output);
        }

        Commands::Schema => serialize_json(&schemars::schema_for!(Vec<CourseRecord>)),
    }
}
