use clap::Parser;
use color_eyre::Result;
use lavender::{
    Config, EntityStore, Planner, Profile, SqliteStore, StorageGateway,
    cli::{self, Cli, Commands},
};
use std::path::Path;

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    let cli = Cli::parse();

    // --dev keeps config and storage apart from the real planner
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = match &cli.config {
        Some(path) => Config::load_from_path(Path::new(path))?,
        None => Config::load_with_profile(profile)?,
    };

    let _log_guard = lavender::logging::init_logging(&config.get_log_dir(), &config.log_level)?;
    tracing::info!(?profile, storage = %config.get_storage_path().display(), "starting lavender");

    let storage_path = config.get_storage_path();
    let backend = SqliteStore::new(
        storage_path
            .to_str()
            .ok_or_else(|| color_eyre::eyre::eyre!("Storage path contains invalid UTF-8"))?,
    )?;
    let store = EntityStore::load(StorageGateway::new(Box::new(backend)));
    let mut planner = Planner::new(store);

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let app = lavender::tui::App::new(config, planner)?;
            lavender::tui::run_event_loop(app)?;
        }
        Commands::AddEvent {
            title,
            date,
            start,
            end,
            event_type,
            color,
            description,
        } => {
            cli::handle_add_event(
                &mut planner,
                title,
                date,
                start,
                end,
                event_type,
                color,
                description,
            )?;
        }
        Commands::AddTask {
            title,
            due,
            priority,
            course,
            description,
        } => {
            cli::handle_add_task(&mut planner, title, due, priority, course, description)?;
        }
        Commands::AddNotebook {
            title,
            subject,
            color,
            description,
        } => {
            cli::handle_add_notebook(&mut planner, title, subject, color, description)?;
        }
        Commands::AddSticky {
            content,
            title,
            color,
        } => {
            cli::handle_add_sticky(&mut planner, content, title, color)?;
        }
        Commands::Week { date } => {
            cli::handle_week(&mut planner, date)?;
        }
        Commands::Tasks {
            priority,
            status,
            sort,
        } => {
            cli::handle_tasks(&mut planner, priority, status, sort)?;
        }
    }

    Ok(())
}
