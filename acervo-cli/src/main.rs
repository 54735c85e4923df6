//! acervo-admin - account administration from the terminal
//!
//! Signs in against the hosted backend, resolves the caller's access the same
//! way the application does, and runs one administration command.

mod logger;

use std::sync::{Arc, Mutex};

use acervo_access::{
    AccessConfig, AccessController, AccessDecision, AccessHandle, AccessSnapshot, AdminConsole,
    Navigator, Notice, Notifier, RouteGuard, RouteView, routes,
};
use acervo_client::{ClientConfig, RestDirectory, SessionStore};
use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use shared::error::AppError;
use shared::models::Role;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "acervo-admin", version, about = "Acervo account administration")]
struct Cli {
    /// Backend project URL
    #[arg(long, env = "ACERVO_URL")]
    url: String,

    /// Public API key
    #[arg(long, env = "ACERVO_ANON_KEY", hide_env_values = true)]
    anon_key: String,

    /// Request timeout in seconds
    #[arg(long, env = "ACERVO_HTTP_TIMEOUT_SECS", default_value_t = ClientConfig::DEFAULT_TIMEOUT_SECS)]
    http_timeout: u64,

    #[arg(long, env = "ACERVO_EMAIL")]
    email: Option<String>,

    #[arg(long, env = "ACERVO_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Existing access token, used instead of email and password
    #[arg(long, env = "ACERVO_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the signed-in identity and its permissions
    Whoami,
    /// List routes and whether the caller can open them
    Routes,
    /// List accounts waiting for approval
    Pending,
    /// List accounts with their roles
    Members,
    /// Count accounts per role
    Summary,
    /// Approve an account
    Approve { id: Uuid },
    /// Assign a role (admin, user, read_only)
    SetRole { id: Uuid, role: Role },
    /// Permanently delete an account with its profile and role
    Delete {
        id: Uuid,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

/// Records the redirect a route guard would issue
#[derive(Default)]
struct Redirects(Mutex<Option<String>>);

impl Navigator for Redirects {
    fn navigate_to(&self, path: &str) {
        if let Ok(mut last) = self.0.lock() {
            *last = Some(path.to_string());
        }
    }
}

impl Notifier for Redirects {
    fn notify(&self, _notice: &Notice) {}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    logger::init_logger(&cli.log_level, cli.json_logs)?;

    let config = ClientConfig::new(&cli.url, &cli.anon_key)
        .with_timeout(cli.http_timeout)
        .validated()?;
    let access_config = AccessConfig::from_env();
    let session = SessionStore::new(config.build_http_client()?);
    let directory = Arc::new(RestDirectory::new(session.clone()));

    let (controller, access) = AccessController::new(
        directory.clone(),
        directory.clone(),
        session.subscribe_identity(),
        &access_config,
    );
    controller.spawn();

    let signed_in_with_password = match (&cli.token, &cli.email, &cli.password) {
        (Some(token), _, _) => {
            session.resume(token).await.context("resuming session")?;
            false
        }
        (None, Some(email), Some(password)) => {
            session
                .sign_in_with_password(email, password)
                .await
                .context("signing in")?;
            true
        }
        _ => bail!("provide --token, or --email and --password"),
    };

    let snapshot = settled(&access).await?;
    let result = run(&cli.command, &snapshot, &access_config, directory, access).await;

    if signed_in_with_password {
        if let Err(e) = session.sign_out().await {
            tracing::warn!(error = %e, "Sign-out failed");
        }
    }
    result
}

/// Wait for the signed-in identity's access to resolve
async fn settled(access: &AccessHandle) -> anyhow::Result<AccessSnapshot> {
    let mut rx = access.subscribe();
    let snapshot = rx
        .wait_for(|s| s.identity().is_some() && !s.loading())
        .await
        .context("access controller stopped")?
        .clone();
    Ok(snapshot)
}

async fn run(
    command: &Command,
    snapshot: &AccessSnapshot,
    access_config: &AccessConfig,
    directory: Arc<RestDirectory>,
    access: AccessHandle,
) -> anyhow::Result<()> {
    match snapshot.decision() {
        AccessDecision::AwaitingApproval => {
            let notice = Notice::awaiting_approval();
            println!("{}: {}", notice.title, notice.message);
            return Ok(());
        }
        AccessDecision::Unavailable { error } => {
            let notice = Notice::unavailable();
            bail!("{}: {error}", notice.title);
        }
        _ => {}
    }

    let console = AdminConsole::new(directory, access);
    match command {
        Command::Whoami => whoami(snapshot),
        Command::Routes => list_routes(snapshot, access_config),
        Command::Pending => {
            let pending = console.pending().await.map_err(describe)?;
            if pending.is_empty() {
                println!("No accounts waiting for approval");
            }
            for profile in pending {
                let created = profile
                    .created_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!(
                    "{}  {:<16}  {}",
                    profile.id,
                    created,
                    profile.full_name.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Members => {
            for member in console.members().await.map_err(describe)? {
                println!(
                    "{}  {:<13}  {:<8}  {}",
                    member.id,
                    member.role.map(|r| r.label()).unwrap_or("(unassigned)"),
                    if member.approved { "approved" } else { "pending" },
                    member.display_name()
                );
            }
        }
        Command::Summary => {
            let summary = console.summary().await.map_err(describe)?;
            for role in Role::ALL {
                println!("{:<14} {}", role.label(), summary.count(role));
            }
            println!("{:<14} {}", "(unassigned)", summary.unassigned);
            println!("{:<14} {}", "pending", summary.pending);
            println!("{:<14} {}", "total", summary.total);
        }
        Command::Delete { id, yes } => {
            if !yes {
                bail!("deleting {id} cannot be undone; pass --yes to confirm");
            }
            console.delete_identity(*id).await.map_err(describe)?;
            println!("Deleted {id}");
        }
        Command::Approve { id } => {
            console.approve(*id).await.map_err(describe)?;
            println!("Approved {id}");
        }
        Command::SetRole { id, role } => {
            console.set_role(*id, *role).await.map_err(describe)?;
            println!("{id} is now {}", role.label());
        }
    }
    Ok(())
}

fn describe(err: acervo_access::AccessError) -> anyhow::Error {
    let app: AppError = err.into();
    if app.is_retryable() {
        anyhow::anyhow!("{} [{}], try again later", app.message, app.code)
    } else {
        anyhow::anyhow!("{} [{}]", app.message, app.code)
    }
}

fn whoami(snapshot: &AccessSnapshot) {
    if let Some(identity) = snapshot.identity() {
        println!("{} <{}>", identity.id, identity.email);
    }
    let status = snapshot.role_status();
    println!(
        "role: {}",
        status.role.map(|r| r.label()).unwrap_or("(unassigned)")
    );
    let permissions = snapshot.permissions();
    for (name, granted) in [
        ("canRead", permissions.can_read),
        ("canWrite", permissions.can_write),
        ("canDelete", permissions.can_delete),
        ("canManageUsers", permissions.can_manage_users),
        ("canAccessAdminPanel", permissions.can_access_admin_panel),
    ] {
        println!("  {name:<20} {}", if granted { "yes" } else { "no" });
    }
}

fn list_routes(snapshot: &AccessSnapshot, access_config: &AccessConfig) {
    for route in routes::ROUTES {
        let outcome = match RouteGuard::for_route(route, access_config) {
            None => "public".to_string(),
            Some(mut guard) => {
                let redirects = Redirects::default();
                match guard.update(snapshot, &redirects, &redirects) {
                    RouteView::Render => "allowed".to_string(),
                    RouteView::Nothing => {
                        let target = redirects.0.lock().ok().and_then(|p| p.clone());
                        format!("denied -> {}", target.unwrap_or_default())
                    }
                    RouteView::FullScreenLoading => "loading".to_string(),
                    RouteView::AwaitingApproval(_) => "awaiting approval".to_string(),
                    RouteView::Unavailable(_) => "unavailable".to_string(),
                }
            }
        };
        println!("{:<14} {:<16} {}", route.path, route.title, outcome);
    }

    let menu: Vec<_> = routes::navigation(&snapshot.permissions())
        .iter()
        .map(|r| r.title)
        .collect();
    println!("\nmenu: {}", menu.join(", "));
}
