use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use aura_client::client::ApiClient;
use aura_client::commands::{self, CliSessionListener, parse_param};
use aura_client::commands::resources::{HabitAction, TaskAction};
use aura_client::config::{AuthMode, ClientConfig, ConfigOverrides};
use aura_client::runtime::RealRuntime;

/// aura - command-line client for the Aura productivity API
///
/// Signs in, keeps the session alive and calls the API on your behalf.
/// Expired sessions are refreshed transparently; when that is no longer
/// possible you are asked to run `aura login` again.
///
/// Examples:
///   aura login --email me@example.com
///   aura habits
///   aura request GET /api/tasks --param from=2024-03-01
#[derive(Parser, Debug)]
#[command(author, version = env!("AURA_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API base URL (defaults to http://localhost:3000; also via AURA_API_URL)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    api_url: Option<String>,

    /// How the session is carried: bearer (default) or cookie
    #[arg(long = "auth-mode", value_name = "MODE", global = true)]
    auth_mode: Option<AuthMode>,

    /// Serve requests from local fixture files instead of the network
    #[arg(long = "mock", global = true)]
    mock: bool,

    /// Directory holding fixture files for --mock
    #[arg(long = "fixture-dir", value_name = "PATH", global = true)]
    fixture_dir: Option<PathBuf>,

    /// Where bearer tokens are stored
    #[arg(long = "credentials", value_name = "PATH", global = true)]
    credentials: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Sign in and store the session
    Login(LoginArgs),

    /// Create an account and sign in
    Register(RegisterArgs),

    /// Sign out and forget the stored session
    Logout,

    /// Refresh the session now
    Refresh,

    /// Send an authenticated request and print the response
    Request(RequestArgs),

    /// List or change habits
    Habits {
        #[command(subcommand)]
        action: Option<HabitCommand>,
    },

    /// List or change tasks
    Tasks {
        #[command(subcommand)]
        action: Option<TaskCommand>,
    },

    /// Finance overview
    Finance {
        #[command(subcommand)]
        action: FinanceCommand,
    },

    /// Daily reports
    Report {
        #[command(subcommand)]
        action: ReportCommand,
    },

    /// Show the signed-in user
    Me,
}

#[derive(clap::Args, Debug)]
struct LoginArgs {
    #[arg(long)]
    email: String,

    #[arg(long, env = "AURA_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(clap::Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    name: String,

    #[arg(long)]
    email: String,

    #[arg(long, env = "AURA_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(clap::Args, Debug)]
struct RequestArgs {
    /// GET, POST, PUT, PATCH or DELETE
    #[arg(value_name = "METHOD")]
    method: String,

    /// Path below the API base URL, e.g. /api/habits
    #[arg(value_name = "PATH")]
    path: String,

    /// JSON request body
    #[arg(long, value_name = "JSON")]
    data: Option<String>,

    /// Query parameter, repeatable
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    params: Vec<(String, String)>,
}

#[derive(clap::Subcommand, Debug)]
enum HabitCommand {
    List,
    Create { name: String },
    Toggle { id: String },
    Delete { id: String },
}

#[derive(clap::Subcommand, Debug)]
enum TaskCommand {
    List {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },
    Complete {
        id: String,
    },
    Delete {
        id: String,
    },
}

#[derive(clap::Subcommand, Debug)]
enum FinanceCommand {
    Summary,
}

#[derive(clap::Subcommand, Debug)]
enum ReportCommand {
    Today,
}

impl From<HabitCommand> for HabitAction {
    fn from(command: HabitCommand) -> Self {
        match command {
            HabitCommand::List => HabitAction::List,
            HabitCommand::Create { name } => HabitAction::Create { name },
            HabitCommand::Toggle { id } => HabitAction::Toggle { id },
            HabitCommand::Delete { id } => HabitAction::Delete { id },
        }
    }
}

impl From<TaskCommand> for TaskAction {
    fn from(command: TaskCommand) -> Self {
        match command {
            TaskCommand::List { from, to } => TaskAction::List { from, to },
            TaskCommand::Complete { id } => TaskAction::Complete { id },
            TaskCommand::Delete { id } => TaskAction::Delete { id },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = RealRuntime;

    let overrides = ConfigOverrides {
        api_url: cli.api_url,
        auth_mode: cli.auth_mode,
        use_mocks: cli.mock,
        fixture_dir: cli.fixture_dir,
        credentials: cli.credentials,
    };
    let config = ClientConfig::load(&runtime, overrides)?;
    let client = ApiClient::from_config(&config, runtime, Arc::new(CliSessionListener))?;

    match cli.command {
        Commands::Login(args) => commands::login(&client, &args.email, &args.password).await?,
        Commands::Register(args) => {
            commands::register(&client, &args.name, &args.email, &args.password).await?
        }
        Commands::Logout => commands::logout(&client).await?,
        Commands::Refresh => commands::refresh(&client).await?,
        Commands::Request(args) => {
            commands::request(
                &client,
                &args.method,
                &args.path,
                args.data.as_deref(),
                &args.params,
            )
            .await?
        }
        Commands::Habits { action } => {
            let action = action.map(HabitAction::from).unwrap_or(HabitAction::List);
            commands::resources::habits(&client, action).await?
        }
        Commands::Tasks { action } => {
            let action = action
                .map(TaskAction::from)
                .unwrap_or(TaskAction::List { from: None, to: None });
            commands::resources::tasks(&client, action).await?
        }
        Commands::Finance {
            action: FinanceCommand::Summary,
        } => commands::resources::finance_summary(&client).await?,
        Commands::Report {
            action: ReportCommand::Today,
        } => commands::resources::report_today(&client).await?,
        Commands::Me => commands::resources::me(&client).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_login_parsing() {
        let cli = Cli::try_parse_from([
            "aura",
            "login",
            "--email",
            "ada@example.com",
            "--password",
            "secret",
        ])
        .unwrap();
        match cli.command {
            Commands::Login(args) => {
                assert_eq!(args.email, "ada@example.com");
                assert_eq!(args.password, "secret");
            }
            _ => panic!("Expected Login command"),
        }
    }

    #[test]
    fn test_cli_request_parsing() {
        let cli = Cli::try_parse_from([
            "aura",
            "request",
            "GET",
            "/api/tasks",
            "--param",
            "from=2024-03-01",
            "--param",
            "to=2024-03-31",
        ])
        .unwrap();
        match cli.command {
            Commands::Request(args) => {
                assert_eq!(args.method, "GET");
                assert_eq!(args.path, "/api/tasks");
                assert_eq!(
                    args.params,
                    vec![
                        ("from".to_string(), "2024-03-01".to_string()),
                        ("to".to_string(), "2024-03-31".to_string()),
                    ]
                );
                assert_eq!(args.data, None);
            }
            _ => panic!("Expected Request command"),
        }
    }

    #[test]
    fn test_cli_request_rejects_bad_param() {
        let result = Cli::try_parse_from(["aura", "request", "GET", "/api/x", "--param", "oops"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from([
            "aura",
            "--auth-mode",
            "cookie",
            "--api-url",
            "http://api.test",
            "habits",
            "--mock",
        ])
        .unwrap();
        assert_eq!(cli.auth_mode, Some(AuthMode::Cookie));
        assert_eq!(cli.api_url.as_deref(), Some("http://api.test"));
        assert!(cli.mock);
        assert!(matches!(cli.command, Commands::Habits { action: None }));
    }

    #[test]
    fn test_cli_invalid_auth_mode_fails() {
        let result = Cli::try_parse_from(["aura", "--auth-mode", "session", "me"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        let result = Cli::try_parse_from(["aura"]);
        assert!(result.is_err());
    }
}
