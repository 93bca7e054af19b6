use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use profitpath::format::{
    format_currency, format_horizon, format_percentage, format_r_ratio, format_trade_count,
};
use profitpath::presets::{self, PropFirm, TargetStyle};
use profitpath::share::{self, ParamSet};
use profitpath::simulation::{self, SimulationConfig, SimulationResults};
use profitpath::{compute_metrics, contracts, DerivedMetrics, InputState, Instrument};

#[derive(Parser, Debug)]
#[command(name = "profitpath")]
#[command(author, version, about = "Futures trading performance calculator")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Where a state comes from: a share-link query plus optional presets
#[derive(clap::Args, Debug)]
struct StateArgs {
    /// Share-link query string, e.g. "c=MES&wt=3&lt=2&tg=40&tl=20"
    #[arg(short, long, default_value = "")]
    query: String,

    /// Apply a target preset and enable the target overlay
    /// (conservative, moderate, aggressive)
    #[arg(long)]
    style: Option<TargetStyle>,

    /// Apply a prop firm preset, e.g. topstep_50k
    #[arg(long)]
    prop_firm: Option<PropFirm>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the JSON API and the static frontend
    Serve {
        /// Port to run the web server on
        #[arg(short, long, default_value = "3000", env = "PROFITPATH_PORT")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1", env = "PROFITPATH_HOST")]
        host: String,

        /// Directory with the frontend build, served at /
        #[arg(long, default_value = "frontend")]
        static_dir: PathBuf,
    },

    /// Compute metrics for a state
    Calc {
        #[command(flatten)]
        state: StateArgs,

        /// Print the full metrics snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Monte Carlo the prop firm evaluation for a state
    Simulate {
        #[command(flatten)]
        state: StateArgs,

        /// Number of simulated evaluations
        #[arg(short = 'n', long, default_value = "10000")]
        simulations: usize,

        /// Trades before an evaluation times out
        #[arg(long, default_value = "300")]
        max_trades: usize,

        /// Trade size spread as a fraction of the average
        #[arg(long, default_value = "0.3")]
        spread: f64,

        /// Seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// List supported contracts
    Contracts,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("profitpath=info".parse()?),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Serve {
            port,
            host,
            static_dir,
        } => serve(&host, port, &static_dir).await,
        Commands::Calc { state, json } => {
            let (state, instrument) = build_state(&state);
            let metrics = compute_metrics(&state, instrument);
            if json {
                let body = serde_json::json!({
                    "state": state,
                    "metrics": metrics,
                    "errors": state.validate(),
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                print_report(&state, instrument, &metrics);
            }
            Ok(())
        }
        Commands::Simulate {
            state,
            simulations,
            max_trades,
            spread,
            seed,
            json,
        } => {
            let (state, instrument) = build_state(&state);
            let config = SimulationConfig {
                num_simulations: simulations,
                max_trades,
                spread,
                seed,
            };
            let results = simulation::simulate_evaluation(&state, instrument, &config)
                .context("Simulation failed")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print_simulation(&state, &results);
            }
            Ok(())
        }
        Commands::Contracts => {
            println!(
                "{:<6} {:<28} {:>10} {:>10} {:>6} {:>8}",
                "SYMBOL", "NAME", "TICK", "POINT", "TPP", "COMM"
            );
            for c in contracts::all() {
                println!(
                    "{:<6} {:<28} {:>10} {:>10} {:>6} {:>8}",
                    c.symbol,
                    c.name,
                    format_currency(c.tick_value),
                    format_currency(c.point_value),
                    c.ticks_per_point,
                    format_currency(c.default_commission)
                );
            }
            Ok(())
        }
    }
}

async fn serve(host: &str, port: u16, static_dir: &Path) -> Result<()> {
    info!("Starting ProfitPath server");

    let mut app = profitpath::api::router();
    if static_dir.is_dir() {
        info!("Serving frontend from {}", static_dir.display());
        app = app.fallback_service(ServeDir::new(static_dir));
    } else {
        warn!("Frontend directory {} not found, serving API only", static_dir.display());
    }
    let app = app.layer(CorsLayer::permissive());

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn build_state(args: &StateArgs) -> (InputState, &'static Instrument) {
    let mut state = share::decode(&ParamSet::from_query_string(&args.query));
    let instrument = state
        .instrument()
        .unwrap_or_else(|_| contracts::default_instrument());

    if let Some(firm) = args.prop_firm {
        presets::apply_prop_firm_preset(firm, &mut state);
    }
    if let Some(style) = args.style {
        presets::apply_target_preset(style, &mut state, instrument);
        state.targets.enabled = true;
    }

    (state, instrument)
}

fn print_report(state: &InputState, instrument: &Instrument, m: &DerivedMetrics) {
    println!("\n{}", "=".repeat(60));
    println!(
        "{} ({}) x{} contracts, {} account(s), {}",
        instrument.symbol, instrument.name, state.num_contracts, state.num_accounts, state.prop_firm
    );
    println!("{}", "=".repeat(60));

    for error in state.validate() {
        println!("  ! {}", error);
    }

    println!(
        "Win Rate: {} ({}W / {}L) | R: {}",
        format_percentage(m.win_rate * 100.0, 1),
        state.winning_trades,
        state.losing_trades,
        format_r_ratio(m.r_value)
    );
    println!(
        "Avg Win: {} | Avg Loss: {}",
        format_currency(m.avg_win_amount),
        format_currency(m.avg_loss_amount)
    );
    println!(
        "Expectancy: {} per trade ({:.3}R)",
        format_currency(m.expectancy),
        m.expectancy_r
    );
    if state.targets.enabled {
        println!(
            "Targets: {:.2} pts avg exit, blended {}",
            m.avg_exit_points,
            format_r_ratio(m.blended_rr)
        );
    }
    if state.breakeven.enabled {
        println!(
            "Breakeven: {} reach, {} scratched, adjusted expectancy {}",
            format_percentage(m.breakeven_reach_rate * 100.0, 1),
            format_percentage(m.breakeven_scratch_rate * 100.0, 1),
            format_currency(m.breakeven_adjusted_expectancy)
        );
    }

    println!();
    println!("DAILY P&L:");
    println!("{}", "-".repeat(40));
    println!("  Gross (per account): {}", format_currency(m.gross_daily_gain));
    println!("  Commissions (total): {}", format_currency(m.total_commissions));
    println!("  Net (per account):   {}", format_currency(m.net_daily_gain));
    println!("  Net (all accounts):  {}", format_currency(m.net_daily_gain_total));
    println!("  Weekly:              {}", format_currency(m.weekly_net_total));
    println!(
        "  Monthly ({} days):   {}",
        state.trading_days_per_month,
        format_currency(m.monthly_net_total)
    );
    println!(
        "  Custom ({} days):   {}",
        state.custom_days,
        format_currency(m.custom_period_net_total)
    );
    println!(
        "  Days to {} target: {}",
        format_currency(state.profit_target),
        format_horizon(m.days_to_target)
    );

    println!();
    println!("RISK:");
    println!("{}", "-".repeat(40));
    println!("  Max losing streak:     {}", format_trade_count(m.max_consecutive_losses));
    println!("  Streak drawdown:       {}", format_currency(m.max_drawdown_from_losses));
    println!("  Trades to daily limit: {}", format_trade_count(m.trades_to_daily_limit));
    println!("  Days to blow account:  {}", format_horizon(m.days_to_blow_account));
    println!("  Risk of ruin:          {}", format_percentage(m.risk_of_ruin * 100.0, 2));
    println!(
        "  Max contracts:         {}{}",
        m.recommended_max_contracts,
        if m.is_oversized { " (OVERSIZED)" } else { "" }
    );
}

fn print_simulation(state: &InputState, results: &SimulationResults) {
    println!("\n{}", "=".repeat(60));
    println!(
        "EVALUATION: {} target, {} daily limit, {} max drawdown",
        format_currency(state.profit_target),
        format_currency(state.daily_loss_limit),
        format_currency(state.max_drawdown)
    );
    println!("{}", "=".repeat(60));
    println!("SIMULATION RESULTS ({} runs):", results.simulations);
    println!("{}", "-".repeat(40));

    let pct = |n: usize| format_percentage(n as f64 / results.simulations.max(1) as f64 * 100.0, 2);
    println!("  PASSED:             {} ({})", results.passed, pct(results.passed));
    println!("  Failed (drawdown):  {} ({})", results.failed_drawdown, pct(results.failed_drawdown));
    println!("  Failed (daily):     {} ({})", results.failed_daily_limit, pct(results.failed_daily_limit));
    println!("  Failed (timeout):   {} ({})", results.failed_max_trades, pct(results.failed_max_trades));

    if let (Some(avg), Some(median)) = (results.avg_trades_to_pass(), results.median_trades_to_pass()) {
        println!();
        println!("  Avg trades to pass: {:.1}", avg);
        println!("  Median trades:      {}", median);
        for p in [0.0, 0.05, 0.10] {
            if let Some(buffer) = results.percentile_min_buffer(p) {
                println!("  P{:<3} min buffer:    {}", (p * 100.0) as u32, format_currency(buffer));
            }
        }
    }
}
