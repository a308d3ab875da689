use anyhow::Result;
use colored::*;
use reqwest::StatusCode;
use std::time::{Duration, Instant};

use crate::api_client::ApiClient;
use crate::output::{print_event, TestResult};
use crate::sse_client::Connection;

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

fn loads_fragment(data: &str, fragment: &str) -> bool {
    data.contains(&format!("/static/fragments/{}.html", fragment))
}

pub async fn test_connection(
    api_client: &ApiClient,
    sse1: &mut Connection,
    sse2: &mut Connection,
) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Connection Test ===".bright_cyan().bold());
    println!(
        "{}",
        "Testing that each subscriber is greeted without publishing anything".bright_white()
    );

    api_client.health().await?;
    println!("{} Health endpoint reachable", "✓".green());

    for sse in [sse1, sse2] {
        match sse.wait_for_welcome(EVENT_TIMEOUT).await {
            Ok(event) => print_event(&sse.label, &event),
            Err(e) => {
                println!("{} {} never received the welcome event", "✗".red(), sse.label);
                return Ok(TestResult::fail(
                    "connection_test",
                    format!("{}: {}", sse.label, e),
                    start.elapsed(),
                ));
            }
        }
    }

    println!(
        "{} Waiting 2 seconds to verify connections stay alive...",
        "→".blue()
    );
    tokio::time::sleep(Duration::from_secs(2)).await;
    println!("{} Connections remain stable", "✓".green());

    Ok(TestResult::pass(
        "connection_test",
        Some("Both subscribers connected and greeted".to_string()),
        start.elapsed(),
    ))
}

pub async fn test_broadcast(
    api_client: &ApiClient,
    sse1: &mut Connection,
    sse2: &mut Connection,
) -> Result<TestResult> {
    let start = Instant::now();
    let fragment = "fragment1";

    println!("\n{}", "=== TEST: Broadcast ===".bright_cyan().bold());
    println!("{} Sending {}...", "→".blue(), fragment);

    let response = api_client.send_fragment(fragment).await?;
    if response.status != StatusCode::OK {
        return Ok(TestResult::fail(
            "broadcast",
            format!("POST /send returned {} - {}", response.status, response.body),
            start.elapsed(),
        ));
    }
    println!("{} {}", "✓".green(), response.body);

    for sse in [sse1, sse2] {
        println!("{} Waiting for {} to receive it...", "→".blue(), sse.label);
        match sse
            .wait_for_event(|data| loads_fragment(data, fragment), EVENT_TIMEOUT)
            .await
        {
            Ok(event) => print_event(&sse.label, &event),
            Err(e) => {
                println!("{} {} missed the broadcast", "✗".red(), sse.label);
                return Ok(TestResult::fail(
                    "broadcast",
                    format!("{}: {}", sse.label, e),
                    start.elapsed(),
                ));
            }
        }
    }

    println!("{} Instruction delivered to every subscriber", "✓".green());
    Ok(TestResult::pass("broadcast", None, start.elapsed()))
}

pub async fn test_invalid_fragment(api_client: &ApiClient) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Invalid Fragment ===".bright_cyan().bold());

    for fragment in ["", "../secret"] {
        let response = api_client.send_fragment(fragment).await?;
        if response.status != StatusCode::BAD_REQUEST {
            return Ok(TestResult::fail(
                "invalid_fragment",
                format!("Fragment {:?} returned {}", fragment, response.status),
                start.elapsed(),
            ));
        }
        println!("{} {:?} rejected: {}", "✓".green(), fragment, response.body);
    }

    Ok(TestResult::pass("invalid_fragment", None, start.elapsed()))
}

pub async fn test_scan(
    api_client: &ApiClient,
    sse1: &mut Connection,
    sse2: &mut Connection,
) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Badge Scan ===".bright_cyan().bold());

    let cases = [
        ("123,535", "Found 2 employees", "fragment2"),
        ("999", "Found 0 employees", "error"),
    ];

    for (ids, expected_body, fragment) in cases {
        println!("{} Scanning ids [{}]...", "→".blue(), ids);
        let response = api_client.scan(ids).await?;

        if response.body != expected_body {
            return Ok(TestResult::fail(
                "scan",
                format!("Expected {:?}, got {:?}", expected_body, response.body),
                start.elapsed(),
            ));
        }
        println!("{} {}", "✓".green(), response.body);

        for sse in [&mut *sse1, &mut *sse2] {
            match sse
                .wait_for_event(|data| loads_fragment(data, fragment), EVENT_TIMEOUT)
                .await
            {
                Ok(event) => print_event(&sse.label, &event),
                Err(e) => {
                    return Ok(TestResult::fail(
                        "scan",
                        format!("{} fragment never arrived at {}: {}", fragment, sse.label, e),
                        start.elapsed(),
                    ));
                }
            }
        }
    }

    Ok(TestResult::pass("scan", None, start.elapsed()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loads_fragment() {
        let data = r##"<div hx-get="/static/fragments/fragment2.html" hx-trigger="load" hx-swap="innerHTML" hx-target="#content"></div>"##;
        assert!(loads_fragment(data, "fragment2"));
        assert!(!loads_fragment(data, "fragment1"));
    }
}
