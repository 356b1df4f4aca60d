use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use hex_lang::ast_printer::AstPrinter;
use hex_lang::parser::Parser;
use hex_lang::scanner::Scanner;
use hex_lang::session::{RunReport, Session, EXIT_STATIC_ERROR};

#[derive(ClapParser, Debug)]
#[command(version, about = "Hex language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to hex.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Print one JSON object per token instead of the plain format
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: Option<PathBuf> },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: Option<PathBuf> },

    /// Runs input from a file as a program; starts a REPL when no file is given
    Run { filename: Option<PathBuf> },
}

/// Reads a source file into a string
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).with_context(|| format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .with_context(|| format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).with_context(|| format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger() -> Result<()> {
    let log_file = File::create("hex.log").context("Failed to create hex.log")?;

    Builder::new()
        .format(|buf, record| {
            let path = record.module_path().unwrap_or("<unnamed>");
            let module = path.strip_prefix("hex_lang::").unwrap_or(path);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to hex.log");
    Ok(())
}

fn report(report: &RunReport) {
    for diagnostic in &report.diagnostics {
        debug!("Diagnostic: {:?}", diagnostic);
        eprintln!("{}", diagnostic);
    }
}

fn exit_with(report: &RunReport) {
    let code = report.exit_code();
    if code != 0 {
        debug!("Exiting with code {}", code);
        std::process::exit(code);
    }
}

fn no_input() {
    info!("No filepath provided");
    println!("No input filepath was provided. Exiting...");
}

fn tokenize(source: &str, json: bool) -> Result<()> {
    let mut tokenized = true;

    for token in Scanner::new(source) {
        match token {
            Ok(token) => {
                debug!("Scanned token: {}", token);

                if json {
                    println!("{}", serde_json::to_string(&token)?);
                } else {
                    println!("{}", token);
                }
            }

            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EXIT_STATIC_ERROR);
        std::process::exit(EXIT_STATIC_ERROR);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn parse(source: &str) {
    let (tokens, lex_errors) = hex_lang::scanner::scan_tokens(source);
    for e in &lex_errors {
        eprintln!("{}", e);
    }

    match Parser::new(&tokens).parse_expression() {
        Ok(expr) if lex_errors.is_empty() => {
            let ast = AstPrinter.print(&expr);
            debug!("AST: {}", ast);
            println!("{}", ast);
        }

        Ok(_) => std::process::exit(EXIT_STATIC_ERROR),

        Err(errors) => {
            for e in errors {
                eprintln!("{}", e);
            }
            std::process::exit(EXIT_STATIC_ERROR);
        }
    }
}

fn repl() -> Result<()> {
    info!("Starting REPL");

    let mut session = Session::new();
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }

        // Errors are reported but never end the session.
        let outcome = session.run(&line);
        report(&outcome);
    }

    info!("REPL closed");
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => match filename {
            Some(filename) => tokenize(&read_file(&filename)?, json)?,
            None => no_input(),
        },

        Commands::Parse { filename } => match filename {
            Some(filename) => parse(&read_file(&filename)?),
            None => no_input(),
        },

        Commands::Evaluate { filename } => match filename {
            Some(filename) => {
                info!("Running Evaluate subcommand");
                let source = read_file(&filename)?;
                let mut session = Session::new();

                let (outcome, value) = session.evaluate(&source);
                if let Some(value) = value {
                    debug!("Evaluated to: {}", value);
                    println!("{}", value);
                }

                report(&outcome);
                exit_with(&outcome);
            }
            None => no_input(),
        },

        Commands::Run { filename } => match filename {
            Some(filename) => {
                info!("Running Run subcommand");
                let source = read_file(&filename)?;
                let mut session = Session::new();

                let outcome = session.run(&source);
                report(&outcome);
                exit_with(&outcome);

                info!("Program executed successfully");
            }
            None => repl()?,
        },
    }

    Ok(())
}
