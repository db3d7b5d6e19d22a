// # aliasd - Alias Console
//
// Thin integration layer around alias-core. All allocation logic lives in
// the library; this binary only:
// 1. Reads configuration from environment variables
// 2. Initializes logging and the runtime
// 3. Opens the state store and the engine
// 4. Runs the operator console on stdin/stdout
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Addressing
// - `ALIAS_DOMAIN`: Provider domain seeds must use (default: gmail.com)
// - `ALIAS_MAX_LOCAL_PART_LEN`: Longest accepted local part (default: 20)
//
// ### State Store
// - `ALIAS_STATE_STORE_TYPE`: Type of state store (file, memory)
// - `ALIAS_POOL_PATH`: Pool file (default: gmails.txt)
// - `ALIAS_ASSIGNMENTS_PATH`: Assignment file (default: services_data.json)
//
// ### Access
// - `ALIAS_OWNER_ID`: Only this operator may use the console (optional)
// - `ALIAS_OPERATOR_ID`: Identity of the operator running this session
//
// ### Logging
// - `ALIAS_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export ALIAS_POOL_PATH=/var/lib/aliasd/gmails.txt
// export ALIAS_ASSIGNMENTS_PATH=/var/lib/aliasd/services_data.json
// export ALIAS_OWNER_ID=123456
// export ALIAS_OPERATOR_ID=123456
//
// aliasd
// ```

mod console;

use alias_core::config::{DEFAULT_ASSIGNMENTS_PATH, DEFAULT_POOL_PATH};
use alias_core::{AddressPolicy, AliasConfig, AliasEngine, OwnerPolicy, StateStoreConfig};
use anyhow::{Context, Result};
use std::env;
use std::process::ExitCode;
use tokio::io::BufReader;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use console::Console;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum AliasExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<AliasExitCode> for ExitCode {
    fn from(code: AliasExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    engine: AliasConfig,
    operator_id: Option<i64>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let mut address = AddressPolicy::default();
        if let Ok(domain) = env::var("ALIAS_DOMAIN") {
            address.domain = domain.trim().to_ascii_lowercase();
        }
        if let Ok(len) = env::var("ALIAS_MAX_LOCAL_PART_LEN") {
            address.max_local_part_len = len
                .trim()
                .parse()
                .with_context(|| format!("ALIAS_MAX_LOCAL_PART_LEN is not a number: {}", len))?;
        }

        let store_type = env::var("ALIAS_STATE_STORE_TYPE").unwrap_or_else(|_| "file".to_string());
        let state_store = match store_type.as_str() {
            "file" => StateStoreConfig::File {
                pool_path: env::var("ALIAS_POOL_PATH")
                    .unwrap_or_else(|_| DEFAULT_POOL_PATH.to_string()),
                assignments_path: env::var("ALIAS_ASSIGNMENTS_PATH")
                    .unwrap_or_else(|_| DEFAULT_ASSIGNMENTS_PATH.to_string()),
            },
            "memory" => StateStoreConfig::Memory,
            other => anyhow::bail!(
                "ALIAS_STATE_STORE_TYPE '{}' is not supported. \
                Supported types: file, memory",
                other
            ),
        };

        Ok(Self {
            engine: AliasConfig {
                address,
                state_store,
                owner_id: parse_id("ALIAS_OWNER_ID")?,
            },
            operator_id: parse_id("ALIAS_OPERATOR_ID")?,
            log_level: env::var("ALIAS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.engine.validate()?;

        if self.engine.owner_id.is_some() && self.operator_id.is_none() {
            anyhow::bail!(
                "ALIAS_OPERATOR_ID is required when ALIAS_OWNER_ID is set. \
                Set it via: export ALIAS_OPERATOR_ID=<your id>"
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "ALIAS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

fn parse_id(var: &str) -> Result<Option<i64>> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} must be an integer id, got '{}'", var, value)),
        _ => Ok(None),
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return AliasExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return AliasExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so they do not interleave with console replies
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return AliasExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return AliasExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run(config).await {
            error!("Console error: {:#}", e);
            AliasExitCode::RuntimeError
        } else {
            AliasExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Open the engine and serve the console until EOF or `/quit`
async fn run(config: Config) -> Result<()> {
    info!(
        "Starting aliasd ({} store, domain {})",
        config.engine.state_store.type_name(),
        config.engine.address.domain
    );

    let store = alias_core::open_store(&config.engine.state_store)
        .await
        .context("Failed to open state store")?;
    let engine = AliasEngine::open(store, config.engine.address.clone())
        .await
        .context("Failed to load alias engine")?;

    info!("Engine ready: {} aliases in pool", engine.pool_len().await);

    let policy = OwnerPolicy::new(config.engine.owner_id);
    let mut console = Console::new(&engine, policy, config.operator_id);

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    console.run(stdin, stdout).await?;

    info!("Console closed");
    Ok(())
}
