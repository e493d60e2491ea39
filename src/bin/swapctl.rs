//! Command-line tools for the SOL→USDC swap
//!
//! Usage: swapctl <setup-wallet|quote|build|swap|balance|report> [options]

use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use solana_sdk::signature::{Keypair, Signer};
use std::path::{Path, PathBuf};

use solswap::config::AppConfig;
use solswap::engine::jupiter::{check_monotonic, MonotonicCheck};
use solswap::engine::transaction_builder::encode_transaction;
use solswap::engine::{check_balance, SwapExecutor, SwapJournal};
use solswap::report::{generate_report, write_report};
use solswap::utils::{lamports_to_sol, sol_to_lamports, usdc_units_to_float};
use solswap::wallet::{generate_keypair, parse_private_key, write_private_key};

/// Exit status after Ctrl-C
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Parser)]
#[command(name = "swapctl")]
#[command(about = "Jupiter SOL→USDC swap tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a keypair and store it in a .env file
    SetupWallet {
        #[arg(long, default_value = ".env")]
        env_file: PathBuf,
        /// Replace an existing PRIVATE_KEY
        #[arg(long)]
        force: bool,
    },
    /// Fetch a quote
    Quote {
        /// Amount in SOL (defaults to the configured swap amount)
        #[arg(long)]
        amount: Option<f64>,
        /// Also quote twice the amount and check output grows with input
        #[arg(long)]
        check_monotonic: bool,
    },
    /// Build and sign the swap transaction, print it as base64
    Build {
        #[arg(long)]
        amount: Option<f64>,
    },
    /// Execute the swap
    Swap {
        #[arg(long)]
        amount: Option<f64>,
        /// Simulate only, do not send
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the wallet balance
    Balance,
    /// Write a mock performance report
    Report {
        #[arg(long)]
        samples: Option<usize>,
        #[arg(long, env = "REPORT_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "solswap=info".into()),
        )
        .init();

    let cli = Cli::parse();

    tokio::select! {
        result = run(cli.command) => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted");
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::SetupWallet { env_file, force } => setup_wallet(&env_file, force),
        Commands::Quote {
            amount,
            check_monotonic,
        } => quote(&load_config()?, amount, check_monotonic).await,
        Commands::Build { amount } => build(&load_config()?, amount).await,
        Commands::Swap { amount, dry_run } => swap(&load_config()?, amount, dry_run).await,
        Commands::Balance => balance(&load_config()?).await,
        Commands::Report {
            samples,
            output_dir,
        } => {
            let config = load_config()?;
            let report = generate_report(samples.unwrap_or(config.report.samples));
            let dir = output_dir.unwrap_or_else(|| config.report.output_dir.clone());
            let path = write_report(&dir, &report)?;

            println!("Samples:       {}", report.samples);
            println!("Success rate:  {:.1}%", report.success_rate * 100.0);
            println!(
                "Latency:       avg {:.0}ms, p50 {}ms, p95 {}ms",
                report.avg_latency_ms, report.p50_latency_ms, report.p95_latency_ms
            );
            println!("Avg slippage:  {:.1} bps", report.avg_slippage_bps);
            println!("Report:        {}", path.display());
            Ok(())
        }
    }
}

fn load_config() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();
    let config = AppConfig::load()?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;
    Ok(config)
}

fn setup_wallet(env_file: &Path, force: bool) -> anyhow::Result<()> {
    let keypair = generate_keypair();
    write_private_key(env_file, &keypair, force)?;

    println!("Wallet:   {}", keypair.pubkey());
    println!("Saved to: {}", env_file.display());
    println!("Fund this address with SOL before swapping.");
    Ok(())
}

fn load_keypair(config: &AppConfig) -> anyhow::Result<Keypair> {
    let secret = config
        .wallet
        .private_key
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("PRIVATE_KEY is not set; run `swapctl setup-wallet`"))?;
    Ok(parse_private_key(secret.expose_secret())?)
}

fn executor(config: &AppConfig, amount: Option<f64>) -> anyhow::Result<SwapExecutor> {
    let mut executor = SwapExecutor::from_config(config)?;
    if let Some(sol) = amount {
        let lamports = sol_to_lamports(sol);
        if lamports == 0 {
            anyhow::bail!("Amount must be greater than zero");
        }
        executor = executor.with_amount(lamports);
    }
    Ok(executor)
}

async fn quote(config: &AppConfig, amount: Option<f64>, check: bool) -> anyhow::Result<()> {
    let executor = executor(config, amount)?;
    let amount = executor.settings().amount_lamports;
    let slippage = executor.settings().slippage.base_bps;

    let quote = executor.quote(amount, slippage).await?;
    let out_amount = quote.out_amount()?;

    println!("In:            {} SOL", lamports_to_sol(amount));
    println!("Out:           {} USDC", usdc_units_to_float(out_amount));
    println!("Min out:       {}", quote.other_amount_threshold);
    println!("Price impact:  {}%", quote.price_impact_pct());
    println!("Slippage:      {} bps", quote.slippage_bps);
    println!("Route:         {}", quote.route_labels().join(" > "));

    if check {
        let doubled = amount.saturating_mul(2);
        let larger = executor.quote(doubled, slippage).await?;
        let verdict = check_monotonic((amount, &quote), (doubled, &larger))?;

        println!(
            "Check:         {} SOL -> {} USDC via {} ({})",
            lamports_to_sol(doubled),
            usdc_units_to_float(larger.out_amount()?),
            larger.route_labels().join(" > "),
            verdict
        );
        if verdict == MonotonicCheck::Decreasing {
            anyhow::bail!("Quote output decreased as input grew on the same route");
        }
    }

    Ok(())
}

async fn build(config: &AppConfig, amount: Option<f64>) -> anyhow::Result<()> {
    let keypair = load_keypair(config)?;
    let executor = executor(config, amount)?;

    let mut journal = SwapJournal::new();
    let prepared = executor.prepare(&keypair, &mut journal).await?;

    println!("{}", encode_transaction(&prepared.transaction)?);
    Ok(())
}

async fn swap(config: &AppConfig, amount: Option<f64>, dry_run: bool) -> anyhow::Result<()> {
    let keypair = load_keypair(config)?;
    let executor = executor(config, amount)?.with_dry_run(dry_run);

    match executor.execute(&keypair).await {
        Ok(outcome) => {
            for line in &outcome.logs {
                println!("  {}", line);
            }
            println!(
                "{} {} SOL -> {} USDC",
                if outcome.simulated_only { "Simulated" } else { "Swapped" },
                lamports_to_sol(outcome.in_amount),
                usdc_units_to_float(outcome.out_amount)
            );
            println!("Signature: {}", outcome.signature);
            Ok(())
        }
        Err(failure) => {
            for line in &failure.logs {
                eprintln!("  {}", line);
            }
            Err(failure.error.into())
        }
    }
}

async fn balance(config: &AppConfig) -> anyhow::Result<()> {
    let keypair = load_keypair(config)?;
    let executor = executor(config, None)?;
    let settings = executor.settings();

    let report = check_balance(executor.rpc().as_ref(), &keypair.pubkey()).await?;
    let sufficient =
        report.sufficient_for(settings.amount_lamports, settings.balance_reserve_lamports);

    println!("Wallet:   {}", report.owner);
    println!("Balance:  {} SOL ({} lamports)", report.sol, report.lamports);
    println!("Slot:     {}", report.slot);
    println!(
        "Swap of {} SOL: {}",
        lamports_to_sol(settings.amount_lamports),
        if sufficient { "covered" } else { "insufficient funds" }
    );
    Ok(())
}
