//! utk CLI - drive the wallet controller against the local ledger
//!
//! One-shot commands load the ledger snapshot, resume the stored session,
//! run, and save the snapshot back:
//!   utk login --passphrase <words>   → authenticate and populate state
//!   utk status                       → {"phase", "principal", "balance", ...}
//!   utk mine 100                     → {"result": "Minted 100 UTK", ...}
//!   utk send <principal> 25          → transfer
//!   utk sell 10                      → redeem
//!   utk history                      → most recent first
//!
//! Interactive:
//!   utk repl                         → same commands, one process
//!
//! Output format:
//!   --json     Output compact JSON (default for non-tty)
//!   --pretty   Pretty-print JSON (default for tty)

use anyhow::{anyhow, bail, Context};
use serde_json::{json, Value};
use std::env;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;
use utk_client::executor::Submission;
use utk_client::format::{format_amount, format_principal, format_timestamp, truncate_identifier};
use utk_client::logging::init_logging;
use utk_client::{
    install_signal_handlers, ClientConfig, LocalIdentityProvider, LocalLedger, OperationForm, WalletController,
};

#[tokio::main]
async fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("utk {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let Some(command) = opts.command.clone() else {
        print_usage();
        return;
    };

    let pretty = opts.pretty_output(std::io::stdout().is_terminal());
    let result = match Workspace::open(&opts).await {
        Ok(ws) => {
            let result = if command == "repl" {
                cmd_repl(&ws, pretty).await
            } else {
                let words: Vec<&str> = std::iter::once(command.as_str())
                    .chain(opts.positional.iter().map(String::as_str))
                    .collect();
                run_command(&ws.controller, &words).await
            };
            match ws.save() {
                Ok(()) => result,
                Err(e) => result.and(Err(e)),
            }
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(Value::Null) => {}
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({"error": format!("{e:#}")}), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|e| format!("{{\"error\": \"render: {e}\"}}"))
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    positional: Vec<String>,
    passphrase: Option<String>,
    session_file: Option<String>,
    ledger_file: Option<String>,
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        let mut opts = ParsedArgs::default();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "--passphrase" | "-p" => {
                    if i + 1 < args.len() {
                        opts.passphrase = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--session-file" | "-s" => {
                    if i + 1 < args.len() {
                        opts.session_file = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--ledger-file" | "-l" => {
                    if i + 1 < args.len() {
                        opts.ledger_file = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                _ if opts.command.is_none() => opts.command = Some(arg.clone()),
                _ => opts.positional.push(arg.clone()),
            }
            i += 1;
        }

        opts
    }

    /// `--json` beats `--pretty`; otherwise pretty on a tty. Used for the REPL too.
    fn pretty_output(&self, tty: bool) -> bool { !self.json && (self.pretty || tty) }
}

/// Controller plus the local collaborators it runs against.
struct Workspace {
    controller: WalletController,
    ledger: Arc<LocalLedger>,
    ledger_file: PathBuf,
}

impl Workspace {
    async fn open(opts: &ParsedArgs) -> anyhow::Result<Self> {
        let mut config = ClientConfig::from_env().context("load config")?;
        let data_dir = config.data_dir();
        if let Some(path) = &opts.session_file {
            config = config.with_session_file(path);
        }
        if let Some(path) = &opts.ledger_file {
            config = config.with_ledger_file(path);
        }
        let session_file = config.session_file.clone().unwrap_or_else(|| data_dir.join("session.json"));
        let ledger_file = config.ledger_file.clone().unwrap_or_else(|| data_dir.join("ledger.json"));
        debug!(session = %session_file.display(), ledger = %ledger_file.display(), "workspace");

        let passphrase = opts.passphrase.clone()
            .or_else(|| env::var("UTK_PASSPHRASE").ok())
            .unwrap_or_default();
        let provider = LocalIdentityProvider::open(passphrase, &session_file)
            .with_context(|| format!("open session {}", session_file.display()))?;
        let ledger = Arc::new(
            LocalLedger::open(&ledger_file)
                .with_context(|| format!("open ledger {}", ledger_file.display()))?
                .with_symbol(config.token_symbol.clone()),
        );

        let controller = WalletController::new(config, Arc::new(provider), ledger.clone());
        controller.init().await;
        Ok(Self { controller, ledger, ledger_file })
    }

    fn save(&self) -> anyhow::Result<()> {
        self.ledger.save(&self.ledger_file).context("save ledger")
    }
}

async fn run_command(controller: &WalletController, words: &[&str]) -> anyhow::Result<Value> {
    match words {
        ["login"] => {
            controller.login().await.context("login (pass --passphrase or set UTK_PASSPHRASE)")?;
            Ok(status(controller))
        }
        ["logout"] => {
            controller.logout().await.context("logout")?;
            Ok(status(controller))
        }
        ["whoami"] => {
            controller.whoami().await;
            Ok(json!({"principal": controller.snapshot().principal()}))
        }
        ["status"] => Ok(status(controller)),
        ["balance"] => {
            let snap = controller.snapshot();
            Ok(json!({"balance": format_amount(snap.balance(), &controller.config().token_symbol)}))
        }
        ["refresh"] => {
            controller.refresh().await;
            Ok(status(controller))
        }
        ["history"] => Ok(history(controller)),
        ["mine", amount] => {
            let mut form = OperationForm::new(*amount);
            let submission = controller.mine(&mut form).await;
            Ok(report(controller, &form, &submission))
        }
        ["send", recipient, amount] => {
            let mut form = OperationForm::transfer(*recipient, *amount);
            let submission = controller.send(&mut form).await;
            Ok(report(controller, &form, &submission))
        }
        ["sell", amount] => {
            let mut form = OperationForm::new(*amount);
            let submission = controller.sell(&mut form).await;
            Ok(report(controller, &form, &submission))
        }
        [cmd, ..] => bail!("Unknown or malformed command: {cmd}. Try --help."),
        [] => Err(anyhow!("No command")),
    }
}

fn status(controller: &WalletController) -> Value {
    let snap = controller.snapshot();
    let symbol = &controller.config().token_symbol;
    json!({
        "phase": snap.phase().as_str(),
        "ledger": controller.config().ledger_canister_id.as_ref().map(|id| id.to_text()),
        "principal": truncate_identifier(snap.principal()),
        "balance": format_amount(snap.balance(), symbol),
        "total_supply": format_amount(snap.total_supply(), symbol),
        "transactions": snap.transactions().len(),
    })
}

fn history(controller: &WalletController) -> Value {
    let snap = controller.snapshot();
    let symbol = &controller.config().token_symbol;
    let items: Vec<Value> = snap.transactions().iter().map(|tx| json!({
        "type": tx.kind.as_str().to_uppercase(),
        "amount": format_amount(tx.amount, symbol),
        "from": tx.from.as_ref().map(format_principal),
        "to": tx.to.as_ref().map(format_principal),
        "time": format_timestamp(tx.timestamp),
    })).collect();
    if items.is_empty() {
        return json!({"transactions": [], "message": "No transactions found."});
    }
    json!({"transactions": items})
}

fn report(controller: &WalletController, form: &OperationForm, submission: &Submission) -> Value {
    let snap = controller.snapshot();
    let symbol = &controller.config().token_symbol;
    let status = match submission {
        Submission::Skipped => "skipped",
        Submission::Busy => "busy",
        Submission::Invalid(_) => "invalid",
        Submission::Completed(outcome) if outcome.is_failure() => "declined",
        Submission::Completed(_) => "completed",
        Submission::TransportFailed(_) => "failed",
    };
    json!({
        "status": status,
        "result": form.result_message,
        "balance": format_amount(snap.balance(), symbol),
        "total_supply": format_amount(snap.total_supply(), symbol),
    })
}

async fn cmd_repl(ws: &Workspace, pretty: bool) -> anyhow::Result<Value> {
    println!("UTK REPL - type 'help' or 'quit'\n");
    let shutdown = install_signal_handlers();
    let mut stop = shutdown.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let _ = stdout.write_all(b"utk> ").await;
        let _ = stdout.flush().await;

        let line = tokio::select! {
            _ = stop.recv() => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => line,
                Ok(None) | Err(_) => break,
            },
        };

        let words: Vec<&str> = line.split_whitespace().collect();
        match words.first().copied() {
            None => continue,
            Some("quit") | Some("exit") | Some("q") => break,
            Some("help") | Some("?") => print_commands(),
            Some(_) => match run_command(&ws.controller, &words).await {
                Ok(output) => println!("{}", render(&output, pretty)),
                Err(e) => println!("Error: {e:#}"),
            },
        }
        if let Err(e) = ws.save() {
            println!("Error: {e:#}");
        }
    }

    println!("Goodbye!");
    Ok(Value::Null)
}

fn print_commands() {
    println!("Commands:");
    println!("  login                     - Connect wallet");
    println!("  logout                    - Disconnect");
    println!("  whoami                    - Ask the ledger for your principal");
    println!("  status                    - Balance, supply, principal");
    println!("  balance                   - Your balance");
    println!("  refresh                   - Re-read balance, supply, history");
    println!("  history                   - Transactions, most recent first");
    println!("  mine <amount>             - Mine tokens");
    println!("  send <principal> <amount> - Send tokens");
    println!("  sell <amount>             - Sell tokens");
    println!("  quit                      - Exit");
}

fn print_usage() {
    println!(
        r#"utk - UTK token wallet

USAGE:
    utk <command> [args] [options]

COMMANDS:
    login                       Authenticate with the identity provider
    logout                      End the session
    whoami                      Ask the ledger for the caller principal
    status                      Show session, balance and total supply
    balance                     Show your balance
    refresh                     Re-read balance, supply and history
    history                     Transactions, most recent first
    mine <amount>               Mine tokens
    send <principal> <amount>   Send tokens to a principal
    sell <amount>               Sell tokens
    repl                        Interactive mode

OPTIONS:
    --passphrase, -p <words>    Local identity passphrase (env: UTK_PASSPHRASE)
    --session-file, -s <path>   Session file (env: UTK_SESSION_FILE)
    --ledger-file, -l <path>    Local ledger snapshot (env: UTK_LEDGER_FILE)
    --json                      Compact JSON output
    --pretty                    Pretty-print JSON
    --version, -V               Print version

ENVIRONMENT:
    UTK_IDENTITY_PROVIDER       Identity provider URL
    UTK_LEDGER_CANISTER_ID      Ledger id shown in status
    UTK_TOKEN_SYMBOL            Token symbol (default: UTK)
    UTK_MAX_TTL_SECS            Session lifetime in seconds
    UTK_ROOT                    Data root (default: platform local data dir)
    UTK_LOG_JSON=1              JSON log lines on stderr
    RUST_LOG                    Log filter (default: info)"#
    );
}
