use anyhow::Result;

use pickleball_ranking::cli::Command;
use pickleball_ranking::config::settings::AppConfig;
use pickleball_ranking::{
    handle_completions, handle_init, handle_leaderboard, handle_process, handle_resolve,
    handle_standings, handle_validate, interpret,
};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let cli = interpret();
    let config = AppConfig::new().with_database_path(cli.database);
    execute_command(&cli.command, config)
}

fn execute_command(command: &Command, config: AppConfig) -> Result<()> {
    match command {
        Command::Init { reset } => handle_init(&config, *reset),
        Command::Validate {
            file,
            games_per_set,
        } => handle_validate(&config, file, *games_per_set),
        Command::Resolve { file } => handle_resolve(&config, file),
        Command::Process { file } => handle_process(config, file),
        Command::Standings { file } => handle_standings(&config, file),
        Command::Leaderboard {
            discipline,
            pool,
            limit,
        } => handle_leaderboard(&config, discipline, pool, *limit),
        Command::Completions { shell } => handle_completions(*shell),
    }
}
