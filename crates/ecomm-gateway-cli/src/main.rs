use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ecomm::constants::ENV_CLIENT_HANDLER_URL;
use ecomm::{
    redirect_url, CommandState, GatewayClient, GatewayConfig, GatewayError, Operation,
    TransactionType, Url,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("failed to render response: {0}")]
    Render(#[from] serde_json::Error),
}

/// Run a single command against the ECOMM merchant handler.
///
/// Connection settings come from `ECOMM_*` environment variables (a `.env`
/// file in the working directory is honoured).
#[derive(Debug, Parser)]
#[command(name = "ecomm", version)]
struct Cli {
    #[command(flatten)]
    params: TransactionArgs,

    /// Print the encoded request body instead of sending it.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Args)]
struct TransactionArgs {
    /// Amount in minor currency units.
    #[arg(long, global = true)]
    amount: Option<u64>,

    /// Numeric ISO 4217 currency code.
    #[arg(long, global = true)]
    currency: Option<u16>,

    /// Cardholder IP address.
    #[arg(long, global = true)]
    client_ip: Option<String>,

    #[arg(long, global = true)]
    description: Option<String>,

    /// ISO 639-1 language code for the payment page.
    #[arg(long, global = true)]
    language: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Register a new transaction (SMS unless --dms).
    Create {
        #[arg(long)]
        dms: bool,
    },
    /// Query the status of a transaction.
    Status { trans_id: String },
    /// Capture an authorized DMS transaction.
    Commit { trans_id: String },
    /// Register a card for recurring payments.
    RegisterCard { card_id: String },
    /// Reverse (refund) a transaction.
    Reverse { trans_id: String },
    /// Close the business day.
    CloseDay,
    /// Charge a registered card.
    RegularPayment { card_id: String },
    /// Delete a registered card.
    DeleteRegularPayment { card_id: String },
    /// Print the cardholder redirect URL for a transaction.
    RedirectUrl { trans_id: String },
}

impl Action {
    fn operation(&self) -> Option<Operation<'_>> {
        let op = match self {
            Action::Create { dms: false } => Operation::CreateTransaction(TransactionType::Sms),
            Action::Create { dms: true } => Operation::CreateTransaction(TransactionType::Dms),
            Action::Status { trans_id } => Operation::TransactionStatus {
                trans_id: trans_id.as_str(),
            },
            Action::Commit { trans_id } => Operation::CommitTransaction {
                trans_id: trans_id.as_str(),
            },
            Action::RegisterCard { card_id } => Operation::RegisterCard {
                card_id: card_id.as_str(),
            },
            Action::Reverse { trans_id } => Operation::ReverseTransaction {
                trans_id: trans_id.as_str(),
            },
            Action::CloseDay => Operation::CloseBusinessDay,
            Action::RegularPayment { card_id } => Operation::RegularPayment {
                card_id: card_id.as_str(),
            },
            Action::DeleteRegularPayment { card_id } => Operation::DeleteRegularPayment {
                card_id: card_id.as_str(),
            },
            Action::RedirectUrl { .. } => return None,
        };
        Some(op)
    }
}

impl TransactionArgs {
    fn state(&self) -> CommandState {
        CommandState {
            amount: self.amount,
            currency: self.currency,
            client_ip: self.client_ip.clone(),
            description: self.description.clone(),
            language: self.language.clone(),
        }
    }
}

/// Output of `--dry-run`: the encoded request body, or the redirect URL
/// built from the client handler setting in `lookup`. No identity is loaded.
fn dry_run<F>(cli: &Cli, lookup: F) -> Result<Option<String>, CliError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Action::RedirectUrl { trans_id } = &cli.action {
        let base = lookup(ENV_CLIENT_HANDLER_URL)
            .ok_or_else(|| GatewayError::Config(format!("{ENV_CLIENT_HANDLER_URL} is required")))?;
        let base = Url::parse(base.trim()).map_err(|e| {
            GatewayError::Config(format!("invalid {ENV_CLIENT_HANDLER_URL}: {e}"))
        })?;
        return Ok(Some(redirect_url(&base, trans_id)?.to_string()));
    }

    match cli.action.operation() {
        Some(op) => Ok(Some(cli.params.state().payload_for(&op)?.encode())),
        None => Ok(None),
    }
}

fn render<T: Serialize>(value: &T) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(value)?)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if cli.dry_run {
        if let Some(line) = dry_run(&cli, |key| std::env::var(key).ok())? {
            println!("{line}");
        }
        return Ok(());
    }

    let config = GatewayConfig::from_env()?;
    tracing::debug!(?config, "loaded gateway configuration");

    let client = GatewayClient::new(config)?;

    let Some(op) = cli.action.operation() else {
        if let Action::RedirectUrl { trans_id } = &cli.action {
            println!("{}", client.client_handler_url(trans_id)?);
        }
        return Ok(());
    };

    let response = client
        .command_with_state(cli.params.state())
        .execute(op)
        .await?;
    println!("{}", render(&response)?);

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
