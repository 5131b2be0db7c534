//! xlcsv CLI - Excel worksheet to CSV conversion tool
//!
//! A command-line tool for streaming XLSX worksheets out as CSV.

use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use xlcsv::csv::{parse_delimiter, CsvOptions, LineTerminator, QuoteStyle};
use xlcsv::{SheetSelector, XlsxConverter};

/// Excel worksheet to CSV conversion
#[derive(Parser)]
#[command(
    name = "xlcsv",
    author = "iyulab",
    version,
    about = "Convert Excel worksheets to CSV",
    long_about = "xlcsv - Streaming Excel (.xlsx) to CSV converter.\n\n\
                  Reads one worksheet and writes it as CSV, padding every row \
                  to the sheet's declared width."
)]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a worksheet to CSV
    Convert {
        /// Input workbook path
        input: PathBuf,

        /// Sheet number (1-based) or sheet name
        #[arg(short, long, default_value = "1")]
        sheet: SheetSelector,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Field delimiter (a single character, or "tab")
        #[arg(short, long, default_value = ",", value_parser = parse_delimiter_arg)]
        delimiter: u8,

        /// Quote every non-empty field
        #[arg(long)]
        quote_all: bool,

        /// End rows with LF instead of CRLF
        #[arg(long)]
        lf: bool,
    },

    /// List the sheets of a workbook
    Sheets {
        /// Input workbook path
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

fn parse_delimiter_arg(s: &str) -> Result<u8, String> {
    parse_delimiter(s).map_err(|e| e.to_string())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Level from `-v`, overridable with `RUST_LOG`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Convert {
            input,
            sheet,
            output,
            delimiter,
            quote_all,
            lf,
        } => {
            let options = CsvOptions::new()
                .with_delimiter(delimiter)
                .with_quote_style(if quote_all {
                    QuoteStyle::Always
                } else {
                    QuoteStyle::Necessary
                })
                .with_line_terminator(if lf {
                    LineTerminator::Lf
                } else {
                    LineTerminator::CrLf
                });
            let converter = XlsxConverter::open(&input)?.with_options(options);

            match output {
                Some(path) => {
                    let pb = create_spinner(&format!("Converting sheet {}...", sheet));
                    let file = File::create(&path)?;
                    let result = converter.convert(&sheet, BufWriter::new(file));
                    pb.finish_and_clear();
                    let summary = result?;

                    println!(
                        "{} Converted {} rows x {} columns: {}",
                        "✓".green().bold(),
                        summary.rows,
                        summary.columns,
                        path.display()
                    );
                    if summary.skipped_cells > 0 {
                        println!(
                            "{} Skipped {} cells outside the sheet grid",
                            "!".yellow().bold(),
                            summary.skipped_cells
                        );
                    }
                }
                None => {
                    let stdout = io::stdout();
                    converter.convert(&sheet, BufWriter::new(stdout.lock()))?;
                }
            }
        }

        Commands::Sheets { input, json } => {
            let sheets = xlcsv::list_sheets(&input)?;

            if json {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                writeln!(handle, "{}", serde_json::to_string_pretty(&sheets)?)?;
            } else {
                println!("{}", "Sheets".cyan().bold());
                println!("{}", "─".repeat(40));
                for sheet in &sheets {
                    println!(
                        "{:>3}  {}  {}",
                        sheet.position,
                        sheet.name.bold(),
                        sheet.path.as_deref().unwrap_or("(unresolved)").dimmed()
                    );
                }
                if sheets.is_empty() {
                    println!("{} No sheets listed in workbook", "!".yellow().bold());
                }
            }
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn print_version() {
    println!("{} {}", "xlcsv".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Streaming Excel worksheet to CSV conversion");
    println!();
    println!("Supported formats: XLSX, XLSM");
    println!("Repository: https://github.com/iyulab/xlcsv");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.blue} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_convert_defaults() {
        let cli = Cli::try_parse_from(["xlcsv", "convert", "book.xlsx"]).unwrap();
        assert_eq!(cli.verbose, 0);
        match cli.command {
            Commands::Convert {
                input,
                sheet,
                output,
                delimiter,
                quote_all,
                lf,
            } => {
                assert_eq!(input, PathBuf::from("book.xlsx"));
                assert_eq!(sheet, SheetSelector::Number(1));
                assert!(output.is_none());
                assert_eq!(delimiter, b',');
                assert!(!quote_all);
                assert!(!lf);
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_convert_options() {
        let cli = Cli::try_parse_from([
            "xlcsv", "-vv", "convert", "book.xlsx", "-s", "Q3", "-d", "tab", "--quote-all",
            "--lf", "-o", "q3.tsv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Convert {
                sheet,
                output,
                delimiter,
                quote_all,
                lf,
                ..
            } => {
                assert_eq!(sheet, SheetSelector::Name("Q3".to_string()));
                assert_eq!(output, Some(PathBuf::from("q3.tsv")));
                assert_eq!(delimiter, b'\t');
                assert!(quote_all);
                assert!(lf);
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(Cli::try_parse_from(["xlcsv", "convert", "book.xlsx", "-s", "0"]).is_err());
        assert!(Cli::try_parse_from(["xlcsv", "convert", "book.xlsx", "-d", ";;"]).is_err());
        assert!(Cli::try_parse_from(["xlcsv", "convert"]).is_err());
    }
}
