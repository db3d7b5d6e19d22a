//! Line-oriented operator console
//!
//! Maps text commands onto engine calls and renders the replies. The console
//! keeps the small amount of conversation state the operator relies on: the
//! currently selected service and whether a seed address is awaited.

use alias_core::{AliasEngine, Error, OwnerPolicy, Registration};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

const HELP: &str = "\
Usage:
  1. Send a service name (e.g. 'groq') to select it
  2. /register, /show or /new act on the selected service

Commands:
  /start              Greeting and status
  /help               Show this help
  /generate [email]   Generate aliases from a base address
  /register [service] Get the service's alias, binding one if needed
  /show [service]     List aliases bound to the service
  /new [service]      Bind the next unused alias to the service
  /services           List known services
  /cancel             Abort a pending /generate
  /quit               Exit";

const WIPE_WARNING: &str =
    "Warning: this erases every existing service binding.";

/// Result of handling one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Text shown to the operator
    pub text: String,
    /// Whether the session should end
    pub quit: bool,
}

impl Reply {
    fn say(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quit: false,
        }
    }
}

/// One operator session
pub struct Console<'a> {
    engine: &'a AliasEngine,
    policy: OwnerPolicy,
    operator_id: Option<i64>,
    selected: Option<String>,
    awaiting_seed: bool,
}

impl<'a> Console<'a> {
    /// Create a session for the given operator
    pub fn new(engine: &'a AliasEngine, policy: OwnerPolicy, operator_id: Option<i64>) -> Self {
        Self {
            engine,
            policy,
            operator_id,
            selected: None,
            awaiting_seed: false,
        }
    }

    /// Read commands until EOF or `/quit`
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();

        while let Some(line) = lines.next_line().await? {
            let reply = self.handle_line(&line).await;
            if !reply.text.is_empty() {
                output.write_all(reply.text.as_bytes()).await?;
                output.write_all(b"\n").await?;
                output.flush().await?;
            }
            if reply.quit {
                break;
            }
        }

        Ok(())
    }

    /// Handle one line of input
    pub async fn handle_line(&mut self, line: &str) -> Reply {
        let line = line.trim();
        if line.is_empty() {
            return Reply::say("");
        }

        if let Err(e) = self.policy.authorize(self.operator_id) {
            warn!("Rejected operator {:?}: {}", self.operator_id, e);
            return Reply::say("Sorry, you do not have access to this console.");
        }

        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, Some(arg.trim()).filter(|a| !a.is_empty())),
            None => (line, None),
        };

        if !command.starts_with('/') {
            if self.awaiting_seed {
                return self.generate(line).await;
            }
            return self.select(line).await;
        }

        debug!("Console command: {}", command);

        match command {
            "/start" => self.start().await,
            "/help" => Reply::say(HELP),
            "/generate" => match arg {
                Some(seed) => self.generate(seed).await,
                None => {
                    self.awaiting_seed = true;
                    Reply::say(format!(
                        "Send the base address to generate aliases from, e.g. example@{}.\n{}",
                        self.engine.policy().domain,
                        WIPE_WARNING
                    ))
                }
            },
            "/cancel" => {
                self.awaiting_seed = false;
                Reply::say("Cancelled.")
            }
            "/register" => match self.target(arg) {
                Some(service) => self.register(&service).await,
                None => no_service(),
            },
            "/show" => match self.target(arg) {
                Some(service) => self.show(&service).await,
                None => no_service(),
            },
            "/new" => match self.target(arg) {
                Some(service) => self.assign_new(&service).await,
                None => no_service(),
            },
            "/services" => self.list_services().await,
            "/quit" | "/exit" => Reply {
                text: "Bye.".to_string(),
                quit: true,
            },
            other => Reply::say(format!("Unknown command {}. Try /help.", other)),
        }
    }

    /// Explicit argument wins; otherwise the selected service
    fn target(&mut self, arg: Option<&str>) -> Option<String> {
        if let Some(service) = arg {
            self.selected = Some(service.to_string());
        }
        self.selected.clone()
    }

    /// Select a service and show what is already bound to it
    async fn select(&mut self, service: &str) -> Reply {
        self.selected = Some(service.to_string());
        let shown = self.show(service).await;
        Reply::say(format!("Selected service: {}\n{}", service, shown.text))
    }

    async fn start(&self) -> Reply {
        if self.engine.pool_len().await == 0 {
            Reply::say(
                "Hello! No aliases have been generated yet.\n\
                 Use /generate <email> to create them.",
            )
        } else {
            Reply::say(
                "Hello! Send the name of a service you want an address for \
                 (e.g. 'groq', 'openai', 'anthropic').\n\
                 Use /generate to regenerate the aliases.",
            )
        }
    }

    async fn generate(&mut self, seed: &str) -> Reply {
        match self.engine.generate_domain_names(seed).await {
            Ok(count) => {
                self.awaiting_seed = false;
                Reply::say(format!(
                    "Generated {} aliases from {}.\nAll previous service bindings were removed.",
                    count,
                    seed.trim()
                ))
            }
            Err(Error::InvalidAddress(msg)) => Reply::say(format!(
                "Error: {}\nPlease send a valid @{} address.",
                msg,
                self.engine.policy().domain
            )),
            Err(e) => {
                self.awaiting_seed = false;
                failure(e)
            }
        }
    }

    async fn register(&self, service: &str) -> Reply {
        match self.engine.check_and_assign(service).await {
            Ok(Registration::Existing(alias)) => {
                let count = self.engine.service_aliases(service).await.len();
                Reply::say(format!(
                    "{} already uses {}\nThis is address #{} for this service.\n\
                     Use /new to bind a new address.",
                    service, alias, count
                ))
            }
            Ok(Registration::Assigned(alias)) => Reply::say(format!(
                "Allocated {} for {}\nThis is the first address for this service. \
                 Use it to register.",
                alias, service
            )),
            Ok(Registration::Exhausted) => Reply::say(
                "All addresses are used up. Generate a new pool with /generate.",
            ),
            Err(e) => failure(e),
        }
    }

    async fn show(&self, service: &str) -> Reply {
        let aliases = self.engine.service_aliases(service).await;

        match aliases.as_slice() {
            [] => Reply::say(format!(
                "No address is bound to {} yet.\nUse /register to bind one.",
                service
            )),
            [only] => Reply::say(format!("{} uses {}", service, only)),
            [.., latest] => {
                let list = aliases
                    .iter()
                    .enumerate()
                    .map(|(i, alias)| format!("{}. {}", i + 1, alias))
                    .collect::<Vec<_>>()
                    .join("\n");
                Reply::say(format!(
                    "{} has these addresses:\n\n{}\n\nLatest: {}",
                    service, list, latest
                ))
            }
        }
    }

    async fn assign_new(&self, service: &str) -> Reply {
        match self.engine.assign_next(service).await {
            Ok(alias) => {
                let count = self.engine.service_aliases(service).await.len();
                Reply::say(format!(
                    "Bound new address {} to {}\nThis is address #{} for this service.",
                    alias, service, count
                ))
            }
            Err(Error::PoolExhausted { .. }) => Reply::say(
                "Every address has already been used for this service. \
                 Generate a new pool with /generate.",
            ),
            Err(e) => failure(e),
        }
    }

    async fn list_services(&self) -> Reply {
        let services = self.engine.services().await;
        if services.is_empty() {
            return Reply::say("No services have addresses yet.");
        }

        let mut text = String::from("Services:");
        for service in services {
            let latest = self
                .engine
                .latest_for_service(service.as_str())
                .await
                .map(|alias| alias.to_string())
                .unwrap_or_default();
            text.push_str(&format!("\n  {} -> {}", service, latest));
        }
        Reply::say(text)
    }
}

fn no_service() -> Reply {
    Reply::say("No service selected. Send a service name first.")
}

fn failure(e: Error) -> Reply {
    warn!("Engine call failed: {}", e);
    Reply::say(format!("Something went wrong: {}", e))
}
