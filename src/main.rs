use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use goalpost::cli::{self, Cli, Commands, OutputOptions};
use goalpost::{Config, Database, Profile, logging, utils};
use tracing::info;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = match cli.config {
        Some(ref path) => Config::load_from_path(path, profile)?,
        None => Config::load_with_profile(profile)?,
    };

    // A broken log file should not stop the app
    match logging::init(&config.get_log_dir(), &config.log_level) {
        Ok(path) => info!(log_file = %path.display(), ?profile, "logging initialised"),
        Err(e) => eprintln!("Warning: logging disabled: {}", e),
    }

    let db_path = config.get_database_path();
    let db = Database::new(
        db_path
            .to_str()
            .ok_or_else(|| eyre!("Database path contains invalid UTF-8"))?,
    )?;

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let app = goalpost::tui::App::new(config, db)?;
            goalpost::tui::run_event_loop(app)?;
        }
        command => {
            let options = OutputOptions {
                today: utils::today(),
                due_soon_days: config.due_soon_days,
                default_filter: config.default_task_filter,
            };
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            cli::run_command(command, &db, &options, &mut out)?;
        }
    }

    Ok(())
}
