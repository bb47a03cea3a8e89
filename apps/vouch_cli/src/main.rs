use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use tracing::{debug, error};
use vouch_adapters::configuration;
use vouch_adapters::telemetry;
use vouch_adapters::{
    FileCredentialRepository, GitCli, HttpProviderFactory, KeyringSecretStore,
    SystemMachineIdentity,
};
use vouch_core::config::Settings;
use vouch_core::entities::{Account, BranchStatus, ProviderKind, SyncState, Visibility};
use vouch_core::key::KeyProvider;
use vouch_core::ports::{CredentialRepository, ProviderFactory, VersionControlProvider};
use vouch_core::remote::ModuleRef;
use vouch_core::resolver::{resolve_for_module, resolve_for_owner};
use vouch_core::store::CredentialStore;
use vouch_core::use_cases::{
    BranchSyncUseCase, CreateVersionUseCase, LoginRequest, LoginUseCase, ReleaseOptions,
};

type Credentials = FileCredentialRepository<KeyringSecretStore, SystemMachineIdentity>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    // --- Account commands ---
    /// Register an account after validating its token
    Login {
        /// Provider: github or gitlab
        #[arg(short, long)]
        provider: ProviderKind,

        /// Web URL of the instance, e.g. https://gitlab.example.com
        #[arg(short, long)]
        url: String,

        /// Access token (prompted when omitted)
        #[arg(short, long)]
        token: Option<String>,

        /// Account name (defaults to <provider>-<username>)
        #[arg(short, long)]
        name: Option<String>,

        /// Comma-separated users/organizations this account is for
        #[arg(short, long)]
        owners: Option<String>,
    },

    /// Remove a registered account
    Logout {
        /// Account to remove
        name: Option<String>,

        /// Remove every account
        #[arg(short, long, default_value = "false")]
        all: bool,

        /// Skip confirmation prompt
        #[arg(short, long, default_value = "false")]
        force: bool,
    },

    /// List registered accounts
    Accounts,

    /// Show which account serves a module path such as github.com/acme/lib
    Resolve { module: String },

    // --- Repository commands ---
    /// Show the current branch's synchronization with its remote
    Status {
        /// Remote to compare against (defaults to the configured remote)
        #[arg(short, long)]
        remote: Option<String>,
    },

    /// Tag a release on the hosting provider
    CreateVersion {
        /// Version tag, vX.Y.Z
        tag: String,

        /// Continue despite uncommitted changes or a branch behind its remote
        #[arg(short, long, default_value = "false")]
        force: bool,

        /// Don't push pending commits before tagging
        #[arg(long, default_value = "false")]
        skip_push: bool,

        #[arg(short, long)]
        remote: Option<String>,
    },

    /// List the Go module repositories an account can see
    List {
        /// Account to use (required when several are configured)
        #[arg(short, long)]
        account: Option<String>,

        /// Filter by visibility: all, public, private
        #[arg(short, long, default_value = "all")]
        visibility: Visibility,

        /// User or organization to list instead of the account's own repositories
        #[arg(short, long)]
        owner: Option<String>,
    },

    /// List the version tags of a repository
    Versions {
        /// owner/name, or a module path such as github.com/acme/lib
        repo: String,

        /// Account to use instead of resolving one
        #[arg(short, long)]
        account: Option<String>,
    },
}

fn credential_repository(settings: &Settings) -> anyhow::Result<Arc<Credentials>> {
    let keys = Arc::new(KeyProvider::new(
        Arc::new(KeyringSecretStore::new(settings.keyring_service.clone())),
        Arc::new(SystemMachineIdentity::new()),
    ));
    let path = configuration::store_path(settings)?;
    debug!(path = %path.display(), "using credential file");
    Ok(Arc::new(FileCredentialRepository::with_path(path, keys)))
}

fn provider_factory(settings: &Settings) -> anyhow::Result<Arc<HttpProviderFactory>> {
    Ok(Arc::new(HttpProviderFactory::new(Duration::from_secs(
        settings.http_timeout_secs,
    ))?))
}

/// Client for the account's hosting instance
fn account_provider(
    settings: &Settings,
    account: &Account,
) -> anyhow::Result<Box<dyn VersionControlProvider>> {
    Ok(provider_factory(settings)?.create(
        account.provider,
        &format!("https://{}", account.domain),
        &account.token,
    )?)
}

fn current_repository() -> anyhow::Result<Arc<GitCli>> {
    let workdir = std::env::current_dir().context("failed to read current directory")?;
    Ok(Arc::new(GitCli::new(workdir)))
}

/// Show the first and last four characters only
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn owners_label(account: &Account) -> String {
    if account.is_wildcard() {
        "* (all)".to_string()
    } else {
        account.owners.join(", ")
    }
}

fn print_account(index: usize, account: &Account) {
    println!("  {}. {}", index, account.name);
    println!("     Provider: {}", account.provider);
    println!("     Domain:   {}", account.domain);
    println!("     API:      {}", account.api_url);
    println!("     Owners:   {}", owners_label(account));
    println!("     Token:    {}", mask_token(&account.token));
}

fn print_available(store: &CredentialStore) {
    println!("Available accounts:");
    for account in store.list() {
        println!("  - {} ({} - {})", account.name, account.provider, account.domain);
    }
}

fn print_status(status: &BranchStatus) {
    println!("Branch: {} ({})", status.branch_name, status.tracking_ref());
    match status.state() {
        SyncState::New => println!(
            "New branch, not on {} yet ({} local commit(s))",
            status.remote_name, status.commits_ahead
        ),
        SyncState::Synced => println!("Up to date with {}", status.tracking_ref()),
        SyncState::NeedsPush => println!("{} commit(s) to push", status.commits_ahead),
        SyncState::NeedsPull => println!(
            "{} commit(s) behind, {} ahead: pull before releasing",
            status.commits_behind, status.commits_ahead
        ),
    }
    if status.degraded {
        println!("Warning: fetch failed, remote information may be stale");
    }
}

fn confirm(prompt: String) -> anyhow::Result<bool> {
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

/// Account and `owner/name` path for the `versions` command
fn versions_target<'a>(
    store: &'a CredentialStore,
    repo: &str,
    account: Option<&str>,
) -> anyhow::Result<(&'a Account, String)> {
    let looks_like_module = repo
        .split('/')
        .next()
        .map(|first| first.contains('.'))
        .unwrap_or(false);

    if looks_like_module {
        let module = ModuleRef::parse(repo)?;
        let account = match account {
            Some(name) => store.select(Some(name))?,
            None => resolve_for_owner(store, &module.domain, &module.owner)?,
        };
        let path = repo
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_start_matches(&module.domain)
            .trim_matches('/')
            .to_string();
        Ok((account, path))
    } else {
        Ok((store.select(account)?, repo.trim_matches('/').to_string()))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = match configuration::get_configuration() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to load configuration: {}", e);
            return Err(anyhow::anyhow!("configuration loading failed"));
        }
    };

    let _guard = telemetry::init_subscriber("vouch_cli", &settings.log_level)?;

    let cli = Cli::parse();

    match &cli.command {
        // --- Account commands ---
        Commands::Login {
            provider,
            url,
            token,
            name,
            owners,
        } => {
            let token = match token {
                Some(t) => t.clone(),
                None => rpassword::prompt_password("Token: ")?,
            };
            let login =
                LoginUseCase::new(credential_repository(&settings)?, provider_factory(&settings)?);

            println!("Validating token against {}...", url);
            let account = login
                .execute(LoginRequest {
                    provider: *provider,
                    url: url.clone(),
                    token,
                    name: name.clone(),
                    owners: owners.iter().cloned().collect(),
                })
                .await
                .map_err(|e| {
                    error!(error = %e, "login failed");
                    e
                })?;

            println!("Account '{}' saved.", account.name);
            println!("  Provider: {}", account.provider);
            println!("  Domain:   {}", account.domain);
            println!("  Owners:   {}", owners_label(&account));
        }

        Commands::Logout { name, all, force } => {
            let credentials = credential_repository(&settings)?;
            let store = credentials.load().await?;
            if store.is_empty() {
                println!("No accounts configured.");
                return Ok(());
            }
            let login = LoginUseCase::new(credentials, provider_factory(&settings)?);

            if *all {
                if !*force && !confirm(format!("Remove ALL accounts ({})?", store.len()))? {
                    println!("Cancelled.");
                    return Ok(());
                }
                let count = login.logout_all().await?;
                println!("{} account(s) removed.", count);
                return Ok(());
            }

            let Some(name) = name else {
                print_available(&store);
                println!("Usage: vouch logout <NAME> | vouch logout --all");
                return Ok(());
            };

            let account = store.select(Some(name.as_str())).map_err(|e| {
                if e.is_not_found() {
                    print_available(&store);
                }
                e
            })?;
            if !*force {
                print_account(1, account);
                if !confirm(format!("Remove account '{}'?", name))? {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            login.logout(name).await?;
            println!("Account '{}' removed.", name);
        }

        Commands::Accounts => {
            let credentials = credential_repository(&settings)?;
            let store = credentials.load().await?;

            if store.is_empty() {
                println!("No accounts configured.");
                println!("Add one with:");
                println!("  vouch login -p github -u https://github.com -n personal");
                return Ok(());
            }

            println!("Configured accounts: {}", store.len());
            for (i, account) in store.list().iter().enumerate() {
                print_account(i + 1, account);
            }
            println!();
            println!("Stored in {}", credentials.location().display());
        }

        Commands::Resolve { module } => {
            let store = credential_repository(&settings)?.load().await?;
            let account = resolve_for_module(&store, module)?;

            println!("{} -> {}", module, account.name);
            println!("  Provider: {}", account.provider);
            println!("  API:      {}", account.api_url);
        }

        // --- Repository commands ---
        Commands::Status { remote } => {
            let remote = remote.clone().unwrap_or_else(|| settings.default_remote.clone());
            let status = BranchSyncUseCase::new(current_repository()?)
                .execute(&remote)
                .await?;
            print_status(&status);
        }

        Commands::CreateVersion {
            tag,
            force,
            skip_push,
            remote,
        } => {
            let options = ReleaseOptions {
                force: *force,
                skip_push: *skip_push,
                remote: remote.clone().unwrap_or_else(|| settings.default_remote.clone()),
            };
            let release = CreateVersionUseCase::new(
                current_repository()?,
                credential_repository(&settings)?,
                provider_factory(&settings)?,
            );

            println!("Creating version {}...", tag);
            let report = release.execute(tag, &options).await?;

            print_status(&report.status);
            if report.pushed {
                println!("Pushed {} to {}", report.status.branch_name, report.status.remote_name);
            } else if report.status.needs_push {
                println!("Push skipped, the tag points at the remote default branch");
            }
            println!();
            println!("Version {} created.", report.tag);
            println!("  Repository: {}", report.repo_path);
            println!("  Checkout:   {}", report.repo_root.display());
            println!("  Branch:     {}", report.status.branch_name);
            println!("  Account:    {}", report.account_name);
        }

        Commands::List {
            account,
            visibility,
            owner,
        } => {
            let store = credential_repository(&settings)?.load().await?;
            let account = store.select(account.as_deref())?;

            let repositories = account_provider(&settings, account)?
                .list_repositories(owner.as_deref(), *visibility)
                .await?;

            if repositories.is_empty() {
                println!("No Go modules found for this account.");
                return Ok(());
            }

            println!();
            for repository in &repositories {
                let badge = if repository.private { "[private]" } else { "[public]" };
                println!("{:<30} {}", repository.name, badge);
                if !repository.description.is_empty() {
                    println!("  {}", repository.description);
                }
            }
            println!();
            println!("provider: {}", account.provider);
            println!("domain:   {}", account.domain);
            if *visibility != Visibility::All {
                println!("filter:   {}", visibility);
            }
        }

        Commands::Versions { repo, account } => {
            let store = credential_repository(&settings)?.load().await?;
            let (account, repo_path) = versions_target(&store, repo, account.as_deref())?;

            let versions = account_provider(&settings, account)?
                .list_versions(&repo_path)
                .await?;

            if versions.is_empty() {
                println!("No versions found for '{}'.", repo_path);
                return Ok(());
            }
            for version in versions {
                println!("{:<12} {}", version.name, version.date);
            }
        }
    }

    Ok(())
}
