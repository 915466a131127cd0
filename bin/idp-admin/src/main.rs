//! IdP Settings Admin
//!
//! Operator CLI against a running settings backend:
//! - Show, validate and save the authentication provider settings
//! - Run the LDAP connection preview
//! - Drive the delegated Keycloak login (redirect URL, code exchange)

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use idp_common::{init_logging, LogFormat};
use idp_config::{AppConfig, ConfigLoader};
use idp_session::{KeycloakClientFactory, SessionService};
use idp_settings::{
    validate, AuthConfigStore, AuthSettingsService, EncryptionType, HttpSettingsGateway,
    ProviderDraft,
    ProviderKind, SaveOutcome, SettingsCollaborators, ValidationPolicy,
};

/// IdP settings administration
#[derive(Parser, Debug)]
#[command(name = "idp-admin")]
#[command(about = "Configure the identity provider that governs sign-in")]
struct Args {
    /// Config file (otherwise IDP_SETTINGS_CONFIG or the standard search paths)
    #[arg(long, short)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the persisted provider settings
    Show,

    /// Check a draft file without saving it
    Validate {
        /// JSON draft: {"provider": "...", ...fields}
        draft: PathBuf,
    },

    /// Save a draft file and sync the provider
    Save { draft: PathBuf },

    /// Switch to a provider using its persisted settings, then save
    Activate {
        /// native, keycloak, oauth2 or ldap
        #[arg(value_parser = parse_provider)]
        provider: ProviderKind,
    },

    /// Test an LDAP draft against the directory
    PreviewLdap {
        draft: PathBuf,

        /// Override the draft's encryption: none, starttls or ldaps
        #[arg(long, value_parser = parse_encryption)]
        encryption: Option<EncryptionType>,
    },

    /// Print the delegated login redirect URL
    LoginUrl,

    /// Exchange an authorization code and print the mapped profile
    Profile {
        #[arg(long)]
        code: String,
    },

    /// Print an example configuration file
    ExampleConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Command::ExampleConfig = args.command {
        print!("{}", AppConfig::example_toml());
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => ConfigLoader::with_path(path.clone()).load(),
        None => ConfigLoader::new().load(),
    }
    .context("Failed to load configuration")?;

    init_logging(
        "idp-admin",
        LogFormat::parse(&config.logging.format),
        &config.logging.level,
    );
    let policy = ValidationPolicy::from(&config.validation);
    let gateway = Arc::new(HttpSettingsGateway::from_config(&config.gateway)?);
    info!(base_url = %gateway.base_url(), "Using settings backend");

    match args.command {
        Command::Show => {
            let settings = gateway.fetch().await?;
            print_json(&settings)?;
        }
        Command::Validate { draft } => {
            let draft = read_draft(&draft)?;
            let report = validate(&draft, policy);
            if report.is_valid() {
                println!("{} draft is valid", draft.kind());
            } else {
                let fields: Vec<String> = report.invalid_fields().map(|f| f.to_string()).collect();
                bail!("Invalid fields: {}", fields.join(", "));
            }
        }
        Command::Save { draft } => {
            let draft = read_draft(&draft)?;
            let service =
                AuthSettingsService::load(SettingsCollaborators::http(gateway), policy).await?;
            service.set_draft(draft).await?;
            report_save(service.save().await?)?;
        }
        Command::Activate { provider } => {
            let service =
                AuthSettingsService::load(SettingsCollaborators::http(gateway), policy).await?;
            service.select_provider(provider).await?;
            report_save(service.save().await?)?;
        }
        Command::PreviewLdap { draft, encryption } => {
            let draft = read_draft(&draft)?;
            let service =
                AuthSettingsService::load(SettingsCollaborators::http(gateway), policy).await?;
            service.set_draft(draft).await?;
            if let Some(encryption) = encryption {
                service.set_ldap_encryption(encryption).await;
            }
            let preview = service.preview_ldap().await?;
            print_json(&preview)?;
        }
        Command::LoginUrl => {
            let session = session_service(&config, gateway.as_ref()).await?;
            info!(redirect_url = %session.redirect_url(), "Requesting login redirect");
            let redirect = session.login().await?;
            println!("{}", redirect.url);
        }
        Command::Profile { code } => {
            let session = session_service(&config, gateway.as_ref()).await?;
            let profile = session.complete_login(&code).await?;
            print_json(&profile)?;
        }
        Command::ExampleConfig => print!("{}", AppConfig::example_toml()),
    }

    Ok(())
}

fn parse_provider(value: &str) -> std::result::Result<ProviderKind, String> {
    ProviderKind::parse(value).ok_or_else(|| format!("unknown provider '{}'", value))
}

fn parse_encryption(value: &str) -> std::result::Result<EncryptionType, String> {
    EncryptionType::parse(value).ok_or_else(|| format!("unknown encryption '{}'", value))
}

fn report_save(outcome: SaveOutcome) -> Result<()> {
    match outcome {
        SaveOutcome::Invalid { field } => bail!("Invalid field: {}", field),
        SaveOutcome::Settled { settings, changed } => {
            println!(
                "Saved {} (provider changed: {})",
                settings.auth_provider, changed
            );
            Ok(())
        }
        SaveOutcome::RolledBack {
            attempted, message, ..
        } => bail!(
            "{} sync failed, reverted to native authentication: {}",
            attempted,
            message
        ),
    }
}

fn read_draft(path: &Path) -> Result<ProviderDraft> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read draft {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Malformed draft {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Session service over the persisted Keycloak configuration
async fn session_service(
    config: &AppConfig,
    gateway: &HttpSettingsGateway,
) -> Result<SessionService> {
    let settings = gateway.fetch().await?;
    if settings.auth_provider != ProviderKind::Keycloak {
        bail!(
            "Delegated login needs keycloak, active provider is {}",
            settings.auth_provider
        );
    }

    let factory = KeycloakClientFactory::new(Duration::from_secs(config.gateway.timeout_secs))?;
    Ok(SessionService::from_config(
        Arc::new(factory),
        settings.auth_config,
        &config.session,
    ))
}
