use anyhow::Result;
use clap::Parser;
use colored::*;

use testing_tools::api_client::ApiClient;
use testing_tools::output::print_test_summary;
use testing_tools::scenarios;
use testing_tools::sse_client::Connection;

#[derive(Parser)]
#[command(name = "sse-test-client")]
#[command(about = "Event hub broadcast testing tool")]
struct Cli {
    /// Base URL of the hub (e.g., http://localhost:9080)
    #[arg(long, default_value = "http://localhost:9080")]
    base_url: String,

    /// Test scenario to run
    #[arg(long, value_enum, default_value = "all")]
    scenario: ScenarioChoice,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone)]
enum ScenarioChoice {
    /// Connect two subscribers and check the welcome event
    ConnectionTest,
    /// Send a fragment and check both subscribers receive it
    Broadcast,
    /// Check that missing or malformed fragment names are rejected
    InvalidFragment,
    /// Submit badge scans and check the resulting fragment
    Scan,
    /// Run every scenario
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    println!("{}", "=== SETUP PHASE ===".bright_white().bold());

    let api_client = ApiClient::new(reqwest::Client::new(), cli.base_url.clone());

    println!("\n{} Establishing SSE connections...", "→".blue());
    let mut sse1 = Connection::establish(&cli.base_url, "Client 1".to_string()).await?;
    let mut sse2 = Connection::establish(&cli.base_url, "Client 2".to_string()).await?;

    println!("\n{}", "=== TEST PHASE ===".bright_white().bold());

    let mut results = Vec::new();

    // The welcome event is consumed by the connection test, so it always runs first.
    results.push(scenarios::test_connection(&api_client, &mut sse1, &mut sse2).await?);

    match cli.scenario {
        ScenarioChoice::ConnectionTest => {}
        ScenarioChoice::Broadcast => {
            results.push(scenarios::test_broadcast(&api_client, &mut sse1, &mut sse2).await?);
        }
        ScenarioChoice::InvalidFragment => {
            results.push(scenarios::test_invalid_fragment(&api_client).await?);
        }
        ScenarioChoice::Scan => {
            results.push(scenarios::test_scan(&api_client, &mut sse1, &mut sse2).await?);
        }
        ScenarioChoice::All => {
            results.push(scenarios::test_broadcast(&api_client, &mut sse1, &mut sse2).await?);
            results.push(scenarios::test_invalid_fragment(&api_client).await?);
            results.push(scenarios::test_scan(&api_client, &mut sse1, &mut sse2).await?);
        }
    }

    println!("\n{}", "=== RESULTS ===".bright_white().bold());
    print_test_summary(&results);

    let all_passed = results.iter().all(|r| r.passed);

    if all_passed {
        println!("\n{}", "All tests passed! ✓".bright_green().bold());
    } else {
        println!("\n{}", "Some tests failed! ✗".bright_red().bold());
    }

    std::process::exit(if all_passed { 0 } else { 1 });
}
