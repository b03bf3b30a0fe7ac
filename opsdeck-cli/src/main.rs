//! Opsdeck CLI - terminal front end for the admin console
//!
//! Renders the view-layer state machines as plain text. All session,
//! policy, and audit behavior lives in the lower crates; this binary only
//! parses arguments, wires configuration, and prints.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use opsdeck_app::audit::{actions, AuditEvent};
use opsdeck_app::{
    check_session, notifier_from_config, AdminView, AppError, Gate, ProfileView, ViewState,
};
use opsdeck_client::{ApiClient, ApiClientConfig, SessionContext};
use opsdeck_core::{init_logging, OpsdeckConfig, RegisterRequest, Role, UserProfile};

#[derive(Parser)]
#[command(name = "opsdeck")]
#[command(about = "Admin console for the opsdeck backend")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        /// Account email
        email: String,

        /// Password (prompted on stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create an account (does not log in)
    Register {
        /// Account email
        email: String,

        /// Password (prompted on stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,

        /// Display name
        #[arg(long)]
        full_name: Option<String>,
    },

    /// Log out and delete the stored token
    Logout,

    /// View or edit your own profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// System configuration and user role management (admin only)
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show the current profile
    Show,

    /// Update profile fields
    Update {
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        job_title: Option<String>,
        #[arg(long)]
        date_of_birth: Option<String>,
    },

    /// Upload an avatar image
    Avatar {
        /// Path to the image file
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// List system configuration entries
    Configs,

    /// Set one configuration entry's value
    SetConfig {
        key: String,
        value: String,
    },

    /// List users and their roles
    Users,

    /// Change a user's role (admin, user, or viewer)
    SetRole {
        user_id: i64,
        role: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = OpsdeckConfig::from_env()?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Starting opsdeck CLI v{}", env!("CARGO_PKG_VERSION"));

    let session = SessionContext::persistent(config.token_path.clone());
    let client = ApiClient::new(ApiClientConfig::from_config(&config), session.clone())?;
    let notifier = notifier_from_config(&config);

    let outcome = match cli.command {
        Commands::Login { email, password } => {
            let password = resolve_password(password)?;
            client.login(&email, &password).await?;
            notifier
                .notify(AuditEvent::new(email.clone(), actions::USER_LOGIN).with_target_user(email))
                .await;
            println!("Logged in.");
            Ok(())
        }
        Commands::Register {
            email,
            password,
            full_name,
        } => {
            let password = resolve_password(password)?;
            let created = client
                .register(&RegisterRequest {
                    email: email.clone(),
                    password,
                    full_name,
                    phone: None,
                })
                .await?;
            notifier
                .notify(AuditEvent::new(email, actions::USER_REGISTER).with_target_user(created.email.clone()))
                .await;
            println!("Account created for {}. Run `opsdeck login` to sign in.", created.email);
            Ok(())
        }
        Commands::Logout => {
            session.teardown()?;
            println!("Logged out.");
            Ok(())
        }
        Commands::Profile { command } => {
            require_session(&session)?;
            handle_profile(command, client, notifier).await
        }
        Commands::Admin { command } => {
            require_session(&session)?;
            handle_admin(command, client, notifier).await
        }
    };

    match outcome {
        Ok(()) => Ok(()),
        Err(AppError::RedirectToLogin) => {
            bail!("Session expired or rejected. Run `opsdeck login <email>` to continue.")
        }
        Err(AppError::Client(e)) => Err(e.into()),
    }
}

/// A missing session never reaches the network: the guard rejects the
/// command locally, the same way protected views are gated.
fn require_session(session: &SessionContext) -> anyhow::Result<()> {
    match check_session(session) {
        Gate::Allow => Ok(()),
        Gate::RedirectToLogin => {
            bail!("Not logged in. Run `opsdeck login <email>` first.")
        }
    }
}

fn resolve_password(password: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("Password must not be empty");
    }
    Ok(password)
}

async fn handle_profile(
    command: ProfileCommands,
    client: ApiClient,
    notifier: std::sync::Arc<dyn opsdeck_app::AuditNotifier>,
) -> Result<(), AppError> {
    let mut view = ProfileView::mount(client, notifier).await?;

    match command {
        ProfileCommands::Show => {
            if let Some(user) = view.user() {
                print_profile(user);
            }
        }
        ProfileCommands::Update {
            full_name,
            phone,
            address,
            city,
            country,
            department,
            job_title,
            date_of_birth,
        } => {
            if let Some(form) = view.form_mut() {
                merge(&mut form.full_name, full_name);
                merge(&mut form.phone, phone);
                merge(&mut form.address, address);
                merge(&mut form.city, city);
                merge(&mut form.country, country);
                merge(&mut form.department, department);
                merge(&mut form.job_title, job_title);
                merge(&mut form.date_of_birth, date_of_birth);
            }
            view.submit().await?;
            print_message(&view);
        }
        ProfileCommands::Avatar { file } => {
            let bytes = std::fs::read(&file).map_err(|e| AppError::Client(e.into()))?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("avatar")
                .to_string();
            view.upload_avatar(&file_name, bytes).await?;
            print_message(&view);
            if let Some(url) = view.user().and_then(|u| u.avatar_url.as_deref()) {
                println!("Avatar: {}", url);
            }
        }
    }
    Ok(())
}

async fn handle_admin(
    command: AdminCommands,
    client: ApiClient,
    notifier: std::sync::Arc<dyn opsdeck_app::AuditNotifier>,
) -> Result<(), AppError> {
    let mut view = AdminView::mount(client, notifier).await?;

    if let ViewState::AccessDenied = view.state() {
        let reason = view
            .message()
            .map(|m| m.text.clone())
            .unwrap_or_else(|| "Access denied".to_string());
        eprintln!("{}", reason);
        std::process::exit(1);
    }

    match command {
        AdminCommands::Configs => {
            if let Some(data) = view.state().ready() {
                for entry in &data.configs {
                    println!(
                        "{} = {}  ({})",
                        entry.key,
                        entry.value,
                        entry.description.as_deref().unwrap_or("no description")
                    );
                }
            }
        }
        AdminCommands::SetConfig { key, value } => {
            view.edit_config_value(&key, value);
            view.save_config(&key).await?;
            print_message_admin(&view);
        }
        AdminCommands::Users => {
            if let Some(data) = view.state().ready() {
                for user in &data.users {
                    let own = if user.id == data.current.id { " (you)" } else { "" };
                    println!(
                        "#{}  {}  {}  {}{}",
                        user.id,
                        user.email,
                        user.role,
                        if user.is_active { "active" } else { "inactive" },
                        own
                    );
                }
            }
        }
        AdminCommands::SetRole { user_id, role } => {
            let role = Role::from_str(&role).map_err(|e| {
                AppError::Client(opsdeck_core::OpsdeckError::Validation {
                    message: e,
                    field: Some("role".to_string()),
                    context: opsdeck_core::ErrorContext::new("cli").with_operation("set_role"),
                })
            })?;
            view.change_role(user_id, role).await?;
            print_message_admin(&view);
        }
    }
    Ok(())
}

fn merge(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

fn print_profile(user: &UserProfile) {
    println!("Email:      {}", user.email);
    println!("Name:       {}", user.full_name.as_deref().unwrap_or("-"));
    println!("Phone:      {}", user.phone.as_deref().unwrap_or("-"));
    println!("Address:    {}", user.address.as_deref().unwrap_or("-"));
    println!("City:       {}", user.city.as_deref().unwrap_or("-"));
    println!("Country:    {}", user.country.as_deref().unwrap_or("-"));
    println!("Department: {}", user.department.as_deref().unwrap_or("-"));
    println!("Job title:  {}", user.job_title.as_deref().unwrap_or("-"));
    println!("Role:       {}", user.role);
    if let Some(url) = user.avatar_url.as_deref() {
        println!("Avatar:     {}", url);
    }
}

fn print_message(view: &ProfileView) {
    if let Some(message) = view.message() {
        if message.is_success() {
            println!("{}", message.text);
        } else {
            eprintln!("Error: {}", message.text);
            std::process::exit(1);
        }
    }
}

fn print_message_admin(view: &AdminView) {
    if let Some(message) = view.message() {
        if message.is_success() {
            println!("{}", message.text);
        } else {
            eprintln!("Error: {}", message.text);
            std::process::exit(1);
        }
    }
}
