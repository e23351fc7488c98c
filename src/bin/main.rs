//! nl2sql CLI - natural language to SQL
//!
//! Usage:
//!   nl2sql [repl]
//!   nl2sql generate <prompt>
//!   nl2sql ask <prompt> [--format json]
//!   nl2sql normalize <prompt>
//!   nl2sql aliases
//!   nl2sql query <sql> [--format json]
//!
//! Examples:
//!   nl2sql --model-dir ./nl_to_sql_model generate "show all students older than 20"
//!   nl2sql --db user_db.sqlite ask "get all emp with age > 25"
//!   nl2sql query "SELECT * FROM employees" --format json

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use nl2sql::alias::normalize_prompt;
use nl2sql::config::Settings;
use nl2sql::inference::t5::T5Generator;
use nl2sql::inference::{GenerationResult, LazyGenerator, SqlGenerator};
use nl2sql::session::{repl, Session, Translator};
use nl2sql::store::{QueryResult, Store};

#[derive(Parser)]
#[command(name = "nl2sql")]
#[command(about = "nl2sql - translate natural-language prompts into SQL and run them")]
#[command(version)]
struct Cli {
    /// Config file (defaults to NL2SQL_CONFIG, ./nl2sql.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Directory of the pretrained model
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    /// Log more (-v for info, -vv for debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session (default)
    Repl,

    /// Generate SQL from a prompt without executing it
    Generate {
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },

    /// Generate SQL from a prompt (with alias rewriting) and execute it
    Ask {
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,

        /// Output format for the result rows
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the prompt as it would be sent to the model
    Normalize {
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },

    /// List the alias table and its conflicts
    Aliases,

    /// Execute SQL against the database
    Query {
        sql: String,

        /// Output format for the result rows
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Aligned text table
    Table,
    /// JSON array of row objects
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut settings = match Settings::resolve(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(db) = &cli.db {
        settings.store.path = db.display().to_string();
    }
    if let Some(dir) = &cli.model_dir {
        settings.model.dir = dir.display().to_string();
    }

    let filter = match cli.verbose {
        0 => settings.logging.filter.clone(),
        1 => "info".to_string(),
        _ => "debug".to_string(),
    };
    nl2sql::logging::init(&filter);

    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Repl => cmd_repl(&settings),
        Commands::Generate { prompt } => cmd_generate(&settings, &prompt.join(" ")),
        Commands::Ask { prompt, format } => cmd_ask(&settings, &prompt.join(" "), format),
        Commands::Normalize { prompt } => cmd_normalize(&settings, &prompt.join(" ")),
        Commands::Aliases => cmd_aliases(&settings),
        Commands::Query { sql, format } => cmd_query(&settings, &sql, format),
    }
}

fn load_generator(settings: &Settings) -> GenerationResult<T5Generator> {
    let dir = settings
        .model_dir()
        .map_err(|e| nl2sql::GenerationError::Other(e.to_string()))?;
    T5Generator::load(&dir, settings.generation, settings.model.device)
}

fn lazy_generator(settings: &Settings) -> LazyGenerator<T5Generator> {
    let settings = settings.clone();
    LazyGenerator::new(move || load_generator(&settings))
}

fn open_store(settings: &Settings) -> Option<Store> {
    let path = match settings.store_path() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error resolving store path: {}", e);
            return None;
        }
    };
    match Store::open(&path) {
        Ok(store) => Some(store),
        Err(e) => {
            eprintln!("Error opening database '{}': {}", path.display(), e);
            None
        }
    }
}

fn build_translator<G: SqlGenerator>(settings: &Settings, generator: G) -> Translator<G> {
    let aliases = settings.aliases.table();
    aliases.log_conflicts();
    Translator::new(generator, aliases, settings.aliases.match_mode)
}

fn print_result(result: &QueryResult, format: &OutputFormat) {
    match format {
        OutputFormat::Table => println!("{}", result.render()),
        OutputFormat::Json => match serde_json::to_string_pretty(&result.to_json()) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error serializing result: {}", e),
        },
    }
}

fn cmd_repl(settings: &Settings) -> ExitCode {
    let Some(store) = open_store(settings) else {
        return ExitCode::FAILURE;
    };
    let mut session = Session::new(store, build_translator(settings, lazy_generator(settings)));

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    match repl::run(&mut session, stdin.lock(), &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_generate(settings: &Settings, prompt: &str) -> ExitCode {
    if prompt.trim().is_empty() {
        eprintln!("Please enter a prompt first.");
        return ExitCode::FAILURE;
    }

    let mut generator = match load_generator(settings) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Model generation error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match generator.generate(prompt) {
        Ok(sql) => {
            println!("{}", sql);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Model generation error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_ask(settings: &Settings, prompt: &str, format: OutputFormat) -> ExitCode {
    if prompt.trim().is_empty() {
        eprintln!("Please enter a natural language prompt.");
        return ExitCode::FAILURE;
    }
    let Some(store) = open_store(settings) else {
        return ExitCode::FAILURE;
    };
    let generator = match load_generator(settings) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Model generation error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut translator = build_translator(settings, generator);
    let translation = match translator.translate(prompt) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Model generation error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    eprintln!("-- {}", translation.sql);

    match store.execute(&translation.sql) {
        Ok(result) => {
            print_result(&result, &format);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error executing query: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_normalize(settings: &Settings, prompt: &str) -> ExitCode {
    let aliases = settings.aliases.table();
    println!(
        "{}",
        normalize_prompt(&prompt.to_lowercase(), &aliases, settings.aliases.match_mode)
    );
    ExitCode::SUCCESS
}

fn cmd_aliases(settings: &Settings) -> ExitCode {
    let aliases = settings.aliases.table();

    println!("Aliases ({} matching):", settings.aliases.match_mode);
    for entry in aliases.iter() {
        println!("  {} -> {}", entry.alias, entry.canonical);
    }

    let conflicts = aliases.conflicts();
    if !conflicts.is_empty() {
        println!();
        println!("Conflicts:");
        for conflict in &conflicts {
            println!("  - {}", conflict);
        }
    }
    ExitCode::SUCCESS
}

fn cmd_query(settings: &Settings, sql: &str, format: OutputFormat) -> ExitCode {
    let Some(store) = open_store(settings) else {
        return ExitCode::FAILURE;
    };
    match store.execute(sql) {
        Ok(result) => {
            print_result(&result, &format);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error executing query: {}", e);
            ExitCode::FAILURE
        }
    }
}
