use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use licensehub::config::Config;
use licensehub::db::{self, AppState, queries};
use licensehub::{accounts, app};

#[derive(Parser, Debug)]
#[command(name = "licensehub")]
#[command(about = "License management backend: products, consumers, licenses and verification")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create a credential account
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Delete expired login sessions
    PurgeSessions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("licensehub=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let pool = db::create_pool(&config.database_path, 16)
        .with_context(|| format!("opening database at {}", config.database_path))?;
    {
        let conn = pool.get().context("getting a database connection")?;
        db::init_db(&conn).context("initializing schema")?;
    }
    let state = AppState::new(pool, &config);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(state, &config).await,
        Command::CreateUser { email, password } => {
            let user = accounts::register(&state, &email, &password).await?;
            println!("Created user {} ({})", user.email, user.id);
            Ok(())
        }
        Command::PurgeSessions => {
            let purged = state.run(queries::purge_expired_sessions).await?;
            println!("Purged {} expired session(s)", purged);
            Ok(())
        }
    }
}

async fn serve(state: AppState, config: &Config) -> Result<()> {
    if config.api_secret.is_none() {
        tracing::warn!("API_SECRET is not set; every /check-license request will be rejected");
    }
    if config.dev_mode {
        tracing::info!("Development mode: CORS is permissive");
    }

    let app = app(state, config.dev_mode);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!("licensehub listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
