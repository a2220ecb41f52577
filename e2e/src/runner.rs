//! Test runner - executes tests and reports results

use colored::Colorize;
use std::collections::BTreeMap;
use std::time::Instant;

use crate::types::{SharedUpstreamState, TestResult};

/// A single test case
pub struct TestCase {
    pub name: &'static str,
    pub description: &'static str,
    pub run: Box<
        dyn Fn(TestContext) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>> + Send + Sync,
    >,
}

/// Context passed to each test - contains proxy address and mock upstream state
#[derive(Clone)]
pub struct TestContext {
    pub proxy_addr: String,
    pub upstream_state: SharedUpstreamState,
    pub http_client: reqwest::Client,
}

/// Run all provided test cases sequentially and report results
pub async fn run_tests(cases: Vec<TestCase>, ctx: TestContext, filter: Option<&str>) -> Vec<TestResult> {
    let mut results = Vec::new();

    println!("\n{}", "═══════════════════════════════════════════════════".bright_blue());
    println!("{}", "  fireworks-proxy End-to-End Tests".bright_white().bold());
    println!("{}", "═══════════════════════════════════════════════════".bright_blue());
    println!("  Proxy:   {}", ctx.proxy_addr.bright_cyan());

    // Filter tests if requested
    let cases_to_run: Vec<&TestCase> = if let Some(f) = filter {
        cases.iter().filter(|c| c.name.contains(f)).collect()
    } else {
        cases.iter().collect()
    };

    println!("  Running: {} test(s)\n", cases_to_run.len().to_string().bright_cyan());

    for case in &cases_to_run {
        // Reset upstream state before each test
        {
            let mut state = ctx.upstream_state.lock().unwrap();
            state.response_queue.clear();
            state.received_requests.clear();
        }

        let start = Instant::now();
        print!("  {} {} ... ", "▶".bright_blue(), case.name.bright_white());

        let result = (case.run)(ctx.clone()).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let test_result = match result {
            Ok(()) => {
                println!("{} ({duration_ms}ms)", "PASS".bright_green().bold());
                TestResult {
                    name: case.name.to_string(),
                    passed: true,
                    error: None,
                    duration_ms,
                }
            }
            Err(e) => {
                println!("{} ({duration_ms}ms)", "FAIL".bright_red().bold());
                println!("    {} {}", "Error:".bright_red(), e);
                for cause in e.chain().skip(1) {
                    println!("    {} {}", "Caused by:".yellow(), cause);
                }
                TestResult {
                    name: case.name.to_string(),
                    passed: false,
                    error: Some(e.to_string()),
                    duration_ms,
                }
            }
        };

        results.push(test_result);
    }

    print_summary(&results);
    results
}

/// Category of a test: the part of its name before the first '/'
fn category(name: &str) -> &str {
    name.split('/').next().unwrap_or(name)
}

/// Per-category counts, then the overall result and any failures
fn print_summary(results: &[TestResult]) {
    let mut categories: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for r in results {
        let entry = categories.entry(category(&r.name)).or_default();
        if r.passed {
            entry.0 += 1;
        } else {
            entry.1 += 1;
        }
    }

    println!("\n{}", "───────────────────────────────────────────────────".bright_blue());
    for (name, (ok, bad)) in &categories {
        let line = format!("  {:12} {} passed, {} failed", name, ok, bad);
        if *bad == 0 {
            println!("{}", line.green());
        } else {
            println!("{}", line.red());
        }
    }

    let failed: Vec<&TestResult> = results.iter().filter(|r| !r.passed).collect();
    let summary = format!("  Results: {} passed, {} failed", results.len() - failed.len(), failed.len());
    if failed.is_empty() {
        println!("{}", summary.bright_green().bold());
    } else {
        println!("{}", summary.bright_red().bold());
        for r in &failed {
            println!("    {} {}", "✗".bright_red(), r.name);
        }
    }
    println!("{}\n", "═══════════════════════════════════════════════════".bright_blue());
}

/// Helper to list all available tests
pub fn list_tests(cases: &[TestCase]) {
    println!("\n{}", "Available tests:".bright_white().bold());
    for case in cases {
        println!("  {} - {}", case.name.bright_cyan(), case.description);
    }
    println!();
}
