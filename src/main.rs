use clap::Parser;
use expense_client::args::{Args, Command};
use expense_client::{commands, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("{}", e.detail());
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().expense_home().path();

    // This allows for running the program without an expense tracker server. When
    // EXPENSE_CLIENT_IN_TEST_MODE is set and non-zero in length, then the mode will be Mode::Test,
    // otherwise it will be Mode::Http.
    let mode = Mode::from_env();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(
            home,
            init_args.api_url(),
            init_args.timeout_secs(),
            init_args.currency().map(String::from),
        )
        .await?
        .print(),

        Command::Login(login_args) => {
            commands::login(home, mode, login_args.email(), login_args.password())
                .await?
                .print()
        }

        Command::Signup(signup_args) => commands::signup(
            home,
            mode,
            signup_args.name(),
            signup_args.email(),
            signup_args.password(),
        )
        .await?
        .print(),

        Command::Logout => commands::logout(home, mode).await?.print(),

        Command::Whoami => commands::whoami(home, mode).await?.print(),

        Command::List(list_args) => commands::list(home, mode, list_args.filter())
            .await?
            .print(),

        Command::Add(add_args) => commands::add(home, mode, add_args.form()).await?.print(),

        Command::Delete(delete_args) => commands::delete(home, mode, delete_args.id())
            .await?
            .print(),

        Command::Dashboard => commands::dashboard(home, mode).await?.print(),
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for the library and this binary only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level,
                env!("CARGO_CRATE_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
