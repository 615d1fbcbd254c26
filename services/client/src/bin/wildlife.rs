//! services/client/src/bin/wildlife.rs

use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wildlife_client::{config::Config, error::ClientError, state::AppState};
use wildlife_core::{
    risk, AnimalId, AnimalRecord, Credentials, NewAccount, RegionId, SelectionOutcome, Tone,
};

#[derive(Parser)]
#[command(name = "wildlife")]
#[command(about = "Browse endangered wildlife by region", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every animal, most endangered first
    Animals {
        /// Case-insensitive substring of the common or scientific name
        #[arg(short, long, default_value = "")]
        search: String,

        /// Exact risk label, e.g. "Vulnerable"
        #[arg(short, long, default_value = "")]
        risk: String,

        /// Group the list by risk label
        #[arg(short, long)]
        grouped: bool,
    },
    /// Show the animals of one map region
    Region { id: u32 },
    /// Show the details of one animal
    Animal { id: u32 },
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        email: String,

        /// Read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account (does not log in)
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        /// Read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
    debug!("Configuration loaded.");

    let cli = Cli::parse();

    // --- 2. Wire Adapters & Restore the Previous Session ---
    let state = AppState::from_config(config)?;
    let restored = state.session.restore().await;
    info!(phase = ?restored.phase, "Session restored");

    // --- 3. Run the Command ---
    match cli.command {
        Commands::Animals {
            search,
            risk,
            grouped,
        } => {
            let catalog = state.coordinator.load_catalog().await?;
            if grouped {
                for group in catalog.grouped() {
                    let label = if group.label.is_empty() { "Unknown" } else { group.label.as_str() };
                    println!("{} {} ({})", marker(group.level.tone()), label, group.animals.len());
                    for animal in &group.animals {
                        println!("    {}", describe(animal));
                    }
                }
            } else {
                let animals = catalog.filtered(&search, &risk);
                for animal in &animals {
                    println!("{}", describe(animal));
                }
                println!("{} of {} animals", animals.len(), catalog.len());
            }
        }
        Commands::Region { id } => match state.coordinator.select(RegionId(id)).await {
            SelectionOutcome::NoInformation => println!("No information for region {}", id),
            SelectionOutcome::Failed(failure) => return Err(failure.into()),
            SelectionOutcome::Superseded => {}
            SelectionOutcome::Populated { .. } => {
                let view = state.coordinator.view();
                if let Some(region) = &view.region {
                    println!("{}: {}", region.name, region.description);
                }
                if view.animals.is_empty() {
                    println!("No animals recorded for this region.");
                }
                for animal in &view.animals {
                    println!("  {}", describe(animal));
                }
            }
        },
        Commands::Animal { id } => {
            let animal = state.coordinator.animal_detail(AnimalId(id)).await?;
            println!("{}", describe(&animal));
            for (field, value) in [
                ("Type", &animal.kind),
                ("Habitat", &animal.habitat),
                ("Distribution", &animal.distribution),
                ("Description", &animal.description),
                ("Image", &animal.image_url),
            ] {
                if let Some(value) = value {
                    println!("  {}: {}", field, value);
                }
            }
        }
        Commands::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt_password()?,
            };
            let user = state.session.login(&Credentials { email, password }).await?;
            println!("Logged in as {}", user.username);
        }
        Commands::Register {
            username,
            email,
            password,
        } => {
            let password = match password {
                Some(password) => password,
                None => prompt_password()?,
            };
            state
                .session
                .register(&NewAccount {
                    username,
                    email,
                    password,
                })
                .await?;
            println!("Account created. Log in to continue.");
        }
        Commands::Logout => {
            state.session.logout().await;
            println!("Logged out.");
        }
        Commands::Whoami => {
            if !state.session.snapshot().is_authenticated() {
                println!("Not logged in.");
            } else {
                let user = state.session.refresh_user().await?;
                let role = if user.is_admin() { " (admin)" } else { "" };
                println!("{} <{}>{}", user.username, user.email, role);
            }
        }
    }

    Ok(())
}

fn describe(animal: &AnimalRecord) -> String {
    let level = risk::bucket(animal.risk_label());
    let mut line = format!("{} #{} {}", marker(level.tone()), animal.id, animal.common_name);
    if let Some(scientific) = &animal.scientific_name {
        line.push_str(&format!(" ({})", scientific));
    }
    if !animal.risk_label().is_empty() {
        line.push_str(&format!(" - {}", animal.risk_label()));
    }
    line
}

fn marker(tone: Tone) -> &'static str {
    match tone {
        Tone::Critical => "[!!]",
        Tone::Warning => "[! ]",
        Tone::Safe => "[ok]",
        Tone::Neutral => "[  ]",
    }
}

fn prompt_password() -> Result<String, ClientError> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(&['\r', '\n'][..]).to_string();
    if password.is_empty() {
        return Err(ClientError::Internal("a password is required".to_string()));
    }
    Ok(password)
}
