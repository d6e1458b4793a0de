// # localdnsctl - Local DNS console CLI
//
// ⚠️ ARCHITECTURAL CONSTRAINTS ⚠️
//
// CRITICAL RULES:
// - This is a THIN integration layer ONLY
// - DO NOT add API logic, join logic or retry logic here
// - All console logic MUST be in localdns-core
//
// The localdnsctl binary is responsible for:
// 1. Parsing the command line and its environment fallbacks
// 2. Initializing tracing and the log display
// 3. Setting up the session scope required by the command
// 4. Running one operation and printing its result as JSON
//
// ## Configuration
//
// Every option can be given as a flag or through its environment variable.
//
// ### Credentials
// - `MK_CSM_KEY`: Dashboard API key
//
// ### Scope
// - `LOCALDNS_ORGANIZATION_ID` / `LOCALDNS_ORGANIZATION_NAME`
// - `LOCALDNS_NETWORK_ID` / `LOCALDNS_NETWORK_NAME`
//
// ### Session
// - `LOCALDNS_API_BASE_URL`: Dashboard API base URL
// - `LOCALDNS_ENABLE_CACHING`: Memoize organization/network listings (true/false)
// - `LOCALDNS_HTTP_TIMEOUT_SECS`: Transport timeout
// - `LOCALDNS_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export MK_CSM_KEY=your_key
// export LOCALDNS_ORGANIZATION_ID=123456
//
// localdnsctl profiles
// localdnsctl create-record L_6789 printer.lan 10.0.0.20
// ```

use anyhow::{Context, Result};
use clap::builder::{BoolishValueParser, NonEmptyStringValueParser};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use localdns_core::config::DEFAULT_API_BASE_URL;
use localdns_core::logging::{LogBuffer, LogPoller};
use localdns_core::{ApiError, ApiResult, ApiSession, RequiredParameters, SessionConfig, SetupParameters};
use serde::Serialize;
use serde_json::{Value, json};
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{Level, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

/// Exit codes for different termination scenarios
///
/// - 0: Success
/// - 1: Usage, configuration or scope error
/// - 2: API or runtime error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CtlExitCode {
    /// The operation succeeded
    Success = 0,
    /// Usage, configuration or scope setup failed
    ConfigError = 1,
    /// The API returned an error or the runtime failed
    RuntimeError = 2,
}

impl From<CtlExitCode> for ExitCode {
    fn from(code: CtlExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Local DNS console for the Meraki Dashboard API
#[derive(Parser)]
#[command(name = "localdnsctl")]
#[command(about = "Manage Meraki Local DNS profiles, records and assignments", long_about = None)]
#[command(version)]
struct Cli {
    /// Dashboard API key
    #[arg(long, env = "MK_CSM_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Dashboard API base URL
    #[arg(long, env = "LOCALDNS_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,

    /// Memoize organization and network listings
    #[arg(
        long,
        env = "LOCALDNS_ENABLE_CACHING",
        action = ArgAction::Set,
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    enable_caching: bool,

    /// Transport timeout in seconds
    #[arg(
        long,
        env = "LOCALDNS_HTTP_TIMEOUT_SECS",
        default_value_t = localdns_meraki::DEFAULT_HTTP_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    http_timeout_secs: u64,

    /// Log level
    #[arg(long, env = "LOCALDNS_LOG_LEVEL", value_enum, ignore_case = true, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Organization to operate on
    #[arg(long, env = "LOCALDNS_ORGANIZATION_ID", value_parser = NonEmptyStringValueParser::new())]
    organization_id: Option<String>,

    /// Display name of the organization
    #[arg(long, env = "LOCALDNS_ORGANIZATION_NAME")]
    organization_name: Option<String>,

    /// Network to select (only `params` uses it)
    #[arg(long, env = "LOCALDNS_NETWORK_ID", value_parser = NonEmptyStringValueParser::new())]
    network_id: Option<String>,

    /// Display name of the network
    #[arg(long, env = "LOCALDNS_NETWORK_NAME")]
    network_name: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// List organizations visible to the API key
    Organizations,

    /// List networks of the organization
    Networks,

    /// List profiles with their assigned network
    Profiles,

    /// Create a profile
    CreateProfile {
        /// Profile name
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        name: String,
    },

    /// Delete a profile
    DeleteProfile {
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        profile_id: String,
    },

    /// List DNS records
    Records,

    /// Create a DNS record in a profile
    CreateRecord {
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        profile_id: String,

        /// Hostname (e.g., printer.lan)
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        hostname: String,

        /// Address the hostname resolves to
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        address: String,
    },

    /// Delete a DNS record
    DeleteRecord {
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        record_id: String,
    },

    /// List profile assignments with resolved names
    Assignments,

    /// Assign a profile to a network
    Assign {
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        network_id: String,

        #[arg(value_parser = NonEmptyStringValueParser::new())]
        profile_id: String,
    },

    /// Remove an assignment
    Unassign {
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        assignment_id: String,
    },

    /// Show the current parameters and their status
    Params,
}

impl Command {
    /// Scope fields this command needs
    fn required(&self, network_selected: bool) -> RequiredParameters {
        match self {
            Command::Organizations => RequiredParameters::api_key_only(),
            Command::Params if network_selected => RequiredParameters::network(),
            _ => RequiredParameters::organization(),
        }
    }
}

impl Cli {
    /// Build and validate the session configuration
    fn session_config(&self) -> Result<SessionConfig> {
        let mut config = SessionConfig::default()
            .with_api_base_url(&self.api_base_url)
            .with_caching(self.enable_caching);
        config.http_timeout_secs = self.http_timeout_secs;

        config.validate().context("Invalid session configuration")?;

        if config.api_base_url.starts_with("http://") {
            eprintln!(
                "WARNING: LOCALDNS_API_BASE_URL uses HTTP (not HTTPS). \
                The API key will be sent in cleartext."
            );
        }

        Ok(config)
    }

    fn setup_parameters(&self) -> SetupParameters {
        let mut setup = SetupParameters::new();
        if let Some(id) = &self.organization_id {
            setup = setup.with_organization(id, self.organization_name.clone());
        }
        if let Some(id) = &self.network_id {
            setup = setup.with_network(id, self.network_name.clone());
        }
        setup
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too
            let _ = e.print();
            return if e.use_stderr() {
                CtlExitCode::ConfigError
            } else {
                CtlExitCode::Success
            }
            .into();
        }
    };

    let config = match cli.session_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return CtlExitCode::ConfigError.into();
        }
    };

    // Initialize tracing: events go to the log buffer, drained to stderr
    let buffer = LogBuffer::new(config.log_buffer_capacity);
    let subscriber = tracing_subscriber::registry()
        .with(LevelFilter::from_level(cli.log_level.into()))
        .with(buffer.layer());

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CtlExitCode::ConfigError.into();
    }

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to create tokio runtime: {}", e);
            return CtlExitCode::RuntimeError.into();
        }
    };

    let interval = Duration::from_secs(config.log_poll_interval_secs);
    rt.block_on(with_log_display(buffer, interval, run(cli, config)))
        .into()
}

/// Run `work` while the log poller prints captured lines to stderr
async fn with_log_display<F>(buffer: LogBuffer, interval: Duration, work: F) -> CtlExitCode
where
    F: std::future::Future<Output = CtlExitCode>,
{
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = oneshot::channel();
    let poller = tokio::spawn(LogPoller::new(buffer.clone(), interval).run_with_shutdown(tx, stop_rx));
    let printer = tokio::spawn(async move {
        let mut next = 0;
        while let Some(entry) = rx.recv().await {
            eprintln!("{}", entry.line);
            next = entry.sequence + 1;
        }
        next
    });

    let code = work.await;

    let _ = stop_tx.send(());
    let _ = poller.await;
    let next = printer.await.unwrap_or(0);

    // Lines logged after the last tick
    for entry in buffer.entries_since(next) {
        eprintln!("{}", entry.line);
    }
    code
}

/// Set up the session and run one command
async fn run(cli: Cli, config: SessionConfig) -> CtlExitCode {
    info!("Starting localdnsctl");

    let mut session = match localdns_meraki::connect(config, cli.api_key.as_deref()) {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to create session: {}", e);
            return CtlExitCode::ConfigError;
        }
    };

    let required = cli.command.required(cli.network_id.is_some());
    let ready = session.setup_application_parameters(required, Some(&cli.setup_parameters()), None);

    if !ready {
        let status = session.check_current_parameters_status();
        error!("Session scope is incomplete: {}", status.missing.join(", "));
        // params still reports what is missing
        if cli.command != Command::Params {
            return CtlExitCode::ConfigError;
        }
    }

    match execute(&session, &cli.command).await {
        Ok(value) => {
            print_json(&value);
            if ready {
                CtlExitCode::Success
            } else {
                CtlExitCode::ConfigError
            }
        }
        Err(e) => {
            warn!("Command failed: {}", e);
            print_json(&e);
            CtlExitCode::RuntimeError
        }
    }
}

/// Dispatch to the session; no logic beyond shaping the output
async fn execute(session: &ApiSession, command: &Command) -> ApiResult<Value> {
    let use_cache = session.caching_enabled();
    let dns = session.local_dns();

    match command {
        Command::Organizations => render(session.list_organizations(use_cache).await?),
        Command::Networks => render(session.list_networks(None, use_cache).await?),
        Command::Profiles => render(dns.list_profiles(use_cache).await?),
        Command::CreateProfile { name } => render(dns.create_profile(name).await?),
        Command::DeleteProfile { profile_id } => {
            dns.delete_profile(profile_id).await?;
            Ok(json!({ "deleted": profile_id }))
        }
        Command::Records => render(dns.list_dns_records().await?),
        Command::CreateRecord { profile_id, hostname, address } => {
            render(dns.create_dns_record(profile_id, hostname, address).await?)
        }
        Command::DeleteRecord { record_id } => {
            dns.delete_dns_record(record_id).await?;
            Ok(json!({ "deleted": record_id }))
        }
        Command::Assignments => render(dns.list_network_assignments(use_cache).await?),
        Command::Assign { network_id, profile_id } => {
            render(dns.assign_profile_to_network(network_id, profile_id).await?)
        }
        Command::Unassign { assignment_id } => {
            dns.remove_network_assignment(assignment_id).await?;
            Ok(json!({ "removed": assignment_id }))
        }
        Command::Params => Ok(json!({
            "parameters": session.current_app_params(),
            "status": session.check_current_parameters_status(),
        })),
    }
}

fn render<T: Serialize>(value: T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|e| ApiError::unexpected(e.to_string()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Failed to render output: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("localdnsctl").chain(args.iter().copied()))
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_commands_with_arguments() {
        let cli = parse(&["create-record", "p1", "printer.lan", "10.0.0.20"]).unwrap();
        assert_eq!(
            cli.command,
            Command::CreateRecord {
                profile_id: "p1".to_string(),
                hostname: "printer.lan".to_string(),
                address: "10.0.0.20".to_string(),
            }
        );

        let cli = parse(&["assign", "n1", "p1"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Assign {
                network_id: "n1".to_string(),
                profile_id: "p1".to_string(),
            }
        );

        assert_eq!(parse(&["profiles"]).unwrap().command, Command::Profiles);
    }

    #[test]
    fn rejects_bad_invocations() {
        assert_eq!(
            parse(&[]).err().map(|e| e.kind()),
            Some(ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand)
        );
        assert_eq!(
            parse(&["profiles", "extra"]).err().map(|e| e.kind()),
            Some(ErrorKind::UnknownArgument)
        );
        assert_eq!(
            parse(&["delete-profile"]).err().map(|e| e.kind()),
            Some(ErrorKind::MissingRequiredArgument)
        );
        assert_eq!(
            parse(&["delete-profile", ""]).err().map(|e| e.kind()),
            Some(ErrorKind::InvalidValue)
        );
        assert_eq!(
            parse(&["frobnicate"]).err().map(|e| e.kind()),
            Some(ErrorKind::InvalidSubcommand)
        );
    }

    #[test]
    fn session_options_are_parsed_and_validated() {
        let cli = parse(&[
            "--enable-caching",
            "yes",
            "--log-level",
            "DEBUG",
            "--http-timeout-secs",
            "5",
            "--api-base-url",
            "https://api.test/api/v1",
            "records",
        ])
        .unwrap();
        assert!(cli.enable_caching);
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert_eq!(Level::from(cli.log_level), Level::DEBUG);

        let config = cli.session_config().unwrap();
        assert!(config.enable_caching);
        assert_eq!(config.http_timeout_secs, 5);
        assert_eq!(config.api_base_url, "https://api.test/api/v1");

        assert!(parse(&["--enable-caching", "maybe", "records"]).is_err());
        assert!(parse(&["--log-level", "verbose", "records"]).is_err());
        assert!(parse(&["--http-timeout-secs", "0", "records"]).is_err());

        let cli = parse(&["--api-base-url", "ftp://api.test", "records"]).unwrap();
        assert!(cli.session_config().is_err());
    }

    #[test]
    fn scope_flags_become_setup_parameters() {
        let cli = parse(&[
            "--organization-id",
            "o1",
            "--organization-name",
            "Acme",
            "--network-id",
            "n1",
            "params",
        ])
        .unwrap();

        let setup = cli.setup_parameters();
        assert_eq!(setup.organization_id.as_deref(), Some("o1"));
        assert_eq!(setup.organization_name.as_deref(), Some("Acme"));
        assert_eq!(setup.network_id.as_deref(), Some("n1"));

        assert!(parse(&["--organization-id", "", "params"]).is_err());
    }

    #[test]
    fn organization_listing_needs_only_the_key() {
        assert_eq!(
            Command::Organizations.required(true),
            RequiredParameters::api_key_only()
        );
        assert_eq!(Command::Records.required(true), RequiredParameters::organization());
        assert_eq!(Command::Params.required(true), RequiredParameters::network());
        assert_eq!(Command::Params.required(false), RequiredParameters::organization());
    }

    #[tokio::test]
    async fn params_reports_scope_without_calling_the_api() {
        let config = SessionConfig::default()
            .with_api_base_url("http://127.0.0.1:9")
            .with_api_key_env("LOCALDNSCTL_TEST_UNSET_KEY");
        let mut session = localdns_meraki::connect(config, Some("secret_token_12345")).unwrap();
        let setup = SetupParameters::new().with_organization("o1", Some("Acme".to_string()));
        assert!(session.setup_application_parameters(
            Command::Params.required(false),
            Some(&setup),
            None
        ));

        let report = execute(&session, &Command::Params).await.unwrap();

        assert_eq!(report["status"]["all_set"], true);
        assert_eq!(report["parameters"]["organization_id"]["value"], "o1");
        assert!(!report.to_string().contains("secret_token_12345"));
    }

    #[test]
    fn exit_codes_are_stable() {
        assert_eq!(CtlExitCode::Success as u8, 0);
        assert_eq!(CtlExitCode::ConfigError as u8, 1);
        assert_eq!(CtlExitCode::RuntimeError as u8, 2);
    }
}
