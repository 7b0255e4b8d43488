use anyhow::{bail, Result};
use std::path::PathBuf;

use arfoto::config::Config;
use arfoto::db::Database;
use arfoto::logging;

enum Command {
    Init,
    Stats,
    Export { dir: Option<PathBuf> },
    Import { file: PathBuf },
    Clear { yes: bool },
    Query { sql: String, params: Vec<String> },
    Recent { limit: usize },
}

struct Args {
    config_path: Option<PathBuf>,
    command: Command,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("arfoto {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
            }
            _ => break,
        }
        i += 1;
    }

    let command = match args.get(i).map(String::as_str) {
        Some("init") => Command::Init,
        Some("stats") => Command::Stats,
        Some("export") => Command::Export {
            dir: args.get(i + 1).map(PathBuf::from),
        },
        Some("import") => match args.get(i + 1) {
            Some(file) => Command::Import {
                file: PathBuf::from(file),
            },
            None => {
                eprintln!("Error: import requires a backup file argument");
                std::process::exit(1);
            }
        },
        Some("clear") => Command::Clear {
            yes: args.get(i + 1).map(String::as_str) == Some("--yes"),
        },
        Some("query") => match args.get(i + 1) {
            Some(sql) => Command::Query {
                sql: sql.clone(),
                params: args[i + 2..].to_vec(),
            },
            None => {
                eprintln!("Error: query requires a SQL argument");
                std::process::exit(1);
            }
        },
        Some("recent") => Command::Recent {
            limit: args
                .get(i + 1)
                .and_then(|n| n.parse().ok())
                .unwrap_or(20),
        },
        Some(other) => {
            eprintln!("Unknown command: {other}");
            print_help();
            std::process::exit(1);
        }
        None => {
            print_help();
            std::process::exit(1);
        }
    };

    Args {
        config_path,
        command,
    }
}

fn print_help() {
    println!(
        r#"arfoto - local photo store for an AR photo viewer

USAGE:
    arfoto [OPTIONS] <COMMAND>

COMMANDS:
    init                    Create the database and seed defaults
    stats                   Show store counts and file size
    export [DIR]            Copy the database to a timestamped backup
    import FILE             Replace the database with a backup file
    clear --yes             Delete all data (keeps the default user)
    query SQL [PARAMS...]   Run a parameterized read query
    recent [N]              Show the N most recent activity entries

OPTIONS:
    --config, -c PATH   Path to config file
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    ARFOTO_LOG          Log level (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/arfoto/config.toml"#
    );
}

fn main() -> Result<()> {
    let args = parse_args();

    // Initialize logging (uses journald on Linux, file fallback otherwise)
    let _ = logging::init(Some(Config::config_dir().join("logs")));

    let config = match &args.config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let mut db = Database::open(&config.db_path)?;

    match args.command {
        Command::Init => {
            println!("Database initialized at {}", config.db_path.display());
        }
        Command::Stats => {
            let stats = db.stats()?;
            println!("Photos:       {}", stats.total_photos);
            println!("  rendered:   {}", stats.rendered_photos);
            println!("Users:        {}", stats.total_users);
            println!("AR sessions:  {}", stats.total_sessions);
            println!("On disk:      {} KB", stats.disk_size_bytes / 1024);
        }
        Command::Export { dir } => {
            let dir = dir.unwrap_or_else(|| config.export_dir.clone());
            let path = db.export_to(&dir)?;
            println!("Exported to {}", path.display());
        }
        Command::Import { file } => {
            db.import_from(&file)?;
            println!("Imported {}", file.display());
        }
        Command::Clear { yes } => {
            if !yes {
                bail!("refusing to clear without --yes");
            }
            db.clear_all_data()?;
            println!("All data cleared (default user kept)");
        }
        Command::Query { sql, params } => {
            let rows = db.execute_query(&sql, &params)?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Command::Recent { limit } => {
            for entry in db.recent_activity(limit)? {
                let user = entry
                    .user_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{}  [{}] user {}  {}",
                    entry.created_at,
                    entry.action_type,
                    user,
                    entry.description.unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}
