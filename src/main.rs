//! Song request server for DJ events.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bethedj::api::{AppState, create_router};
use bethedj::db::{DbConfig, DbPool, SoftDelete, UserRepository, setup_database};
use bethedj::error::StoreError;
use bethedj::models::CreateUser;

/// Song request backend for DJ events.
#[derive(Parser)]
#[command(name = "bethedj")]
#[command(about = "Events, DJs and the song requests people send them")]
struct Cli {
    /// Database file path
    #[arg(short, long, env = "BETHEDJ_DATABASE", default_value = "bethedj.db")]
    database: String,

    /// Server port
    #[arg(short, long, env = "BETHEDJ_PORT", default_value = "8000")]
    port: u16,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new user
    CreateUser {
        /// Email address, used to log in
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Password
        #[arg(short, long)]
        password: String,

        /// Create as staff user
        #[arg(short, long)]
        staff: bool,
    },

    /// Create the staff account named in the environment, unless it exists
    CreateSuperuser {
        #[arg(long, env = "BETHEDJ_SUPERUSER_EMAIL")]
        email: String,

        #[arg(long, env = "BETHEDJ_SUPERUSER_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long, default_value = "Admin")]
        name: String,
    },

    /// Issue (or show) a login token for a user
    IssueToken {
        #[arg(short, long)]
        email: String,
    },

    /// Revoke a user's login token
    RevokeToken {
        #[arg(short, long)]
        email: String,
    },

    /// Deactivate a user account
    DeleteUser {
        #[arg(short, long)]
        email: String,
    },

    /// Start the server (default)
    Serve,
}

fn open_database(database_url: &str) -> DbPool {
    match setup_database(&DbConfig::new(database_url)) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Failed to open database '{}': {}", database_url, e);
            std::process::exit(1);
        }
    }
}

fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", context, err);
    std::process::exit(1);
}

/// Look up an active user by email or exit.
fn user_id_for(repo: &UserRepository, email: &str) -> i32 {
    match repo.find_by_email(email) {
        Ok(Some(user)) => user.id,
        Ok(None) => fail("User not found", email),
        Err(e) => fail("Database error", e),
    }
}

fn create_user(pool: &DbPool, input: &CreateUser) -> Result<(), StoreError> {
    let user = UserRepository::new(pool.clone()).create(input)?;
    println!(
        "Created user '{}' (id: {}, staff: {})",
        user.email, user.id, user.is_staff
    );
    Ok(())
}

fn create_superuser(pool: &DbPool, email: &str, name: &str, password: &str) {
    let repo = UserRepository::new(pool.clone());
    match repo.email_exists(email) {
        Ok(true) => {
            println!("User '{}' already exists, nothing to do", email);
            return;
        }
        Ok(false) => {}
        Err(e) => fail("Database error", e),
    }

    match create_user(pool, &CreateUser::new(email, name, password).staff()) {
        Ok(()) => {}
        Err(StoreError::UniquenessViolation { .. }) => {
            println!("User '{}' already exists, nothing to do", email);
        }
        Err(e) => fail("Failed to create superuser", e),
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bethedj=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = open_database(&cli.database);

    match cli.command {
        Some(Commands::CreateUser {
            email,
            name,
            password,
            staff,
        }) => {
            let mut input = CreateUser::new(&email, &name, &password);
            if staff {
                input = input.staff();
            }
            if let Err(e) = create_user(&pool, &input) {
                fail("Failed to create user", e);
            }
        }
        Some(Commands::CreateSuperuser {
            email,
            password,
            name,
        }) => create_superuser(&pool, &email, &name, &password),
        Some(Commands::IssueToken { email }) => {
            let repo = UserRepository::new(pool.clone());
            let user_id = user_id_for(&repo, &email);
            match repo.issue_token(user_id) {
                Ok(token) => {
                    println!("Token for user '{}':", email);
                    println!("{}", token);
                }
                Err(e) => fail("Failed to issue token", e),
            }
        }
        Some(Commands::RevokeToken { email }) => {
            let repo = UserRepository::new(pool.clone());
            let user_id = user_id_for(&repo, &email);
            match repo.revoke_token(user_id) {
                Ok(()) => println!("Revoked token for user '{}'", email),
                Err(e) => fail("Failed to revoke token", e),
            }
        }
        Some(Commands::DeleteUser { email }) => {
            let repo = UserRepository::new(pool.clone());
            let user_id = user_id_for(&repo, &email);
            if let Err(e) = repo.revoke_token(user_id).and_then(|()| repo.delete(user_id)) {
                fail("Failed to delete user", e);
            }
            println!("Deactivated user '{}'", email);
        }
        Some(Commands::Serve) | None => run_server(pool, cli.port).await,
    }
}

async fn run_server(pool: DbPool, port: u16) {
    let repo = UserRepository::new(pool.clone());
    if repo.find_all().map(|users| users.is_empty()).unwrap_or(true) {
        tracing::warn!("No users found in database. Create a staff account with:");
        tracing::warn!("  bethedj create-user --email admin@example.com --name Admin --password <password> --staff");
    }

    let app = create_router(AppState::new(pool));

    let addr = format!("0.0.0.0:{}", port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            tracing::error!("Is another process already using port {}?", port);
            std::process::exit(1);
        }
    };
    match listener.local_addr() {
        Ok(local) => tracing::info!("bethedj listening on {}", local),
        Err(_) => tracing::info!("bethedj listening on {}", addr),
    }

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
