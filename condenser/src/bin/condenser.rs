use std::{
    backtrace::{Backtrace, BacktraceStatus},
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::Result;
use clap::Parser;
use condenser::{
    batch::{BatchExecutor, ByteCodeExecResult},
    cfg::Config,
    exec::ExecutionResult,
    state::{Account, AccountStore},
    transaction::ContractTransaction,
    vin::{Vin, VinTracker},
};
use revm::primitives::Address;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    /// JSON file holding the accounts, contract coins and transactions of the batch.
    batch: PathBuf,
    #[clap(long, short)]
    config_file: Vec<PathBuf>,
    #[clap(long, default_value = "false")]
    log_json: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BatchFile {
    #[serde(default)]
    accounts: BTreeMap<Address, Account>,
    #[serde(default)]
    vins: BTreeMap<Address, Vin>,
    transactions: Vec<ContractTransaction>,
}

#[derive(Serialize)]
struct Output {
    results: Vec<ExecutionResult>,
    condensed: ByteCodeExecResult,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(io::stderr);
    if args.log_json {
        builder.json().init();
    } else {
        builder.init();
    }

    // Set a panic hook that records the panic as a `tracing` event at the `ERROR` verbosity level.
    std::panic::set_hook(Box::new(|panic| {
        let message = match panic.payload().downcast_ref::<&'static str>() {
            Some(s) => *s,
            None => match panic.payload().downcast_ref::<String>() {
                Some(s) => &s[..],
                None => "Box<dyn Any>",
            },
        };
        let backtrace = Backtrace::capture();
        let backtrace =
            (backtrace.status() == BacktraceStatus::Captured).then(|| backtrace.to_string());

        match (panic.location(), backtrace) {
            (None, None) => tracing::error!(message),
            (None, Some(backtrace)) => tracing::error!(message, %backtrace),
            (Some(location), None) => tracing::error!(
                message,
                panic.file = location.file(),
                panic.line = location.line(),
            ),
            (Some(location), Some(backtrace)) => tracing::error!(
                message,
                panic.file = location.file(),
                panic.line = location.line(),
                %backtrace,
            ),
        }
    }));

    let config = Config::load(&args.config_file)?;

    let batch: BatchFile = serde_json::from_str(&fs::read_to_string(&args.batch)?)?;
    let mut store: AccountStore = batch.accounts.into_iter().collect();
    let mut vins: VinTracker = batch.vins.into_iter().collect();

    let (results, condensed) =
        BatchExecutor::new(&config).execute_batch(&mut store, &mut vins, &batch.transactions)?;

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &Output { results, condensed })?;
    writeln!(stdout)?;
    Ok(())
}
