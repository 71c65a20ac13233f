use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use fflt::debugger::{Debugger, DebuggerConfig, RustylineConsole};
use fflt::diagnostic::{ansi::AnsiRenderer, json, registry, Diagnostic};
use fflt::interpreter::{self, LoadError};
use fflt::verify;

/// Interpreter and debugger for the F/L/T stack language.
#[derive(Parser, Debug)]
#[command(name = "fflt", version, about)]
struct Cli {
    /// Source file to run
    #[arg(required_unless_present = "explain")]
    file: Option<PathBuf>,

    /// Print the disassembled instructions instead of running
    #[arg(long, conflicts_with = "debug")]
    dump: bool,

    /// Run under the interactive debugger
    #[arg(long)]
    debug: bool,

    /// Debugger history file (defaults to the temp directory)
    #[arg(long, value_name = "PATH", requires = "debug")]
    history: Option<PathBuf>,

    /// Emit diagnostics (and --dump output) as JSON
    #[arg(long)]
    json: bool,

    /// Disable coloured diagnostics
    #[arg(long)]
    no_color: bool,

    /// Explain a diagnostic code, e.g. FFL-R003
    #[arg(long, value_name = "CODE")]
    explain: Option<String>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

struct Reporter {
    json: bool,
    ansi: AnsiRenderer,
}

impl Reporter {
    fn report(&self, d: &Diagnostic) {
        if self.json {
            eprintln!("{}", json::render(d));
        } else {
            eprint!("{}", self.ansi.render(d));
        }
    }
}

fn explain(code: &str) -> ExitCode {
    match registry::lookup(code) {
        Some(entry) => {
            print!("{}", entry.long);
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("Unknown diagnostic code: {code}");
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    init_logging();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    if let Some(code) = &cli.explain {
        return explain(code);
    }
    let Some(path) = &cli.file else {
        return ExitCode::FAILURE;
    };

    let reporter = Reporter {
        json: cli.json,
        ansi: AnsiRenderer { use_color: !cli.no_color && std::io::stderr().is_terminal() },
    };

    let source = match interpreter::read_source(path) {
        Ok(s) => s,
        Err(e) => {
            reporter.report(&Diagnostic::error(e.to_string()));
            return ExitCode::FAILURE;
        }
    };
    let file = path.display().to_string();
    let program = match interpreter::compile(&source, &file) {
        Ok(p) => p,
        Err(e) => {
            let d = match &e {
                LoadError::Lex(e) => Diagnostic::from(e),
                LoadError::Parse(e) => Diagnostic::from(e),
                LoadError::Read { .. } => Diagnostic::error(e.to_string()),
            };
            reporter.report(&d.with_source(source));
            return ExitCode::FAILURE;
        }
    };

    if cli.dump {
        if cli.json {
            match serde_json::to_string_pretty(&program.listing()) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Serialization error: {e}");
                    return ExitCode::FAILURE;
                }
            }
        } else {
            print!("{}", program.disassemble());
        }
        return ExitCode::SUCCESS;
    }

    for warning in verify::verify(&program) {
        reporter.report(&Diagnostic::from(&warning).with_source(source.clone()));
    }

    if cli.debug {
        let mut config = DebuggerConfig::default();
        if let Some(history) = &cli.history {
            config.history_path = history.clone();
        }
        let console = match RustylineConsole::new() {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        };
        let mut executor = interpreter::stdio_executor(program);
        let mut debugger =
            Debugger::new(&mut executor, Box::new(console), Box::new(std::io::stdout()), config);
        return match debugger.run() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{e}");
                ExitCode::FAILURE
            }
        };
    }

    match interpreter::run(program) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            reporter.report(&Diagnostic::from(&e).with_source(source));
            ExitCode::FAILURE
        }
    }
}
