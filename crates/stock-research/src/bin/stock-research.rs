//! Stock research CLI
//!
//! # Usage
//!
//! ```bash
//! export OPENAI_API_KEY="sk-..."
//!
//! # One-shot research
//! cargo run --bin stock-research -- AAPL
//! cargo run --bin stock-research -- MSFT how exposed is it to AI capex?
//!
//! # Interactive mode
//! cargo run --bin stock-research -- --interactive
//!
//! # Full advisory run from a client profile
//! cargo run --bin stock-research -- --profile client.json
//! ```

use anyhow::Context;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use stock_research::{
    AdvisoryPipeline, ClientProfile, ResearchConfig, ResearchRequest, StockResearcher,
};

/// Research a stock with an LLM agent backed by Yahoo Finance data
#[derive(Debug, Parser)]
#[command(name = "stock-research", version, about)]
struct Cli {
    /// Read `SYMBOL [question]` lines from stdin until quit or EOF
    #[arg(short, long, conflicts_with = "symbol")]
    interactive: bool,

    /// Build a researched portfolio for the client profile (JSON) in FILE
    #[arg(long, value_name = "FILE", conflicts_with_all = ["symbol", "interactive"])]
    profile: Option<PathBuf>,

    /// Ticker symbol to research
    #[arg(required_unless_present_any = ["interactive", "profile"])]
    symbol: Option<String>,

    /// Optional question about the symbol
    #[arg(trailing_var_arg = true)]
    question: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    agent_utils::init_tracing_with("warn,stock_research=info");
    let cli = Cli::parse();

    let config = ResearchConfig::from_env().context("failed to load configuration")?;
    if let Some(path) = &cli.profile {
        return advise(&config, path);
    }

    let researcher = StockResearcher::from_config(&config)?;

    if cli.interactive {
        return interactive(&researcher);
    }

    let Some(symbol) = cli.symbol else {
        anyhow::bail!("a SYMBOL is required unless --interactive or --profile is set");
    };
    let question = cli.question.join(" ");
    let query = (!question.trim().is_empty()).then_some(question.as_str());

    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(researcher.research_stock_async(&symbol, query))?;
    println!("{report}");
    Ok(())
}

fn advise(config: &ResearchConfig, path: &Path) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let profile = ClientProfile::from_json(&json)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let advice = runtime.block_on(async {
        let pipeline = AdvisoryPipeline::from_config_async(config).await?;
        pipeline.advise(&profile).await
    })?;

    println!("{}", serde_json::to_string_pretty(&advice.portfolio)?);
    Ok(())
}

fn interactive(researcher: &StockResearcher) -> anyhow::Result<()> {
    println!("Stock research. Enter `SYMBOL [question]`, or `quit` to exit.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {e}");
                continue;
            }
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_ascii_lowercase().as_str(), "quit" | "exit" | "q") {
            break;
        }

        let outcome = ResearchRequest::parse(input).and_then(|request| {
            researcher.research_stock(&request.symbol, request.query.as_deref())
        });
        match outcome {
            Ok(report) => println!("{report}\n"),
            Err(e) => eprintln!("Error: {e}\n"),
        }
    }

    println!("Goodbye!");
    Ok(())
}
