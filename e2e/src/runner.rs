//! Test runner - executes tests and reports results

use colored::Colorize;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use crate::types::{Outcome, SharedBackendState, TestResult};

type TestFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// A single test case
pub struct TestCase {
    pub name: &'static str,
    pub description: &'static str,
    /// Spawns extra relay processes, so it only runs when the runner owns the binary
    pub needs_relay_bin: bool,
    pub run: Box<dyn Fn(TestContext) -> TestFuture + Send + Sync>,
}

/// Context passed to each test - contains relay address and backend state
#[derive(Clone)]
pub struct TestContext {
    pub relay_addr: String,
    pub backend_state: SharedBackendState,
    pub http_client: reqwest::Client,
    /// Relay binary, when the runner spawned one
    pub relay_bin: Option<String>,
}

impl TestContext {
    /// Forget queued replies and recorded requests from the previous test
    fn reset_backend(&self) {
        let mut state = self.backend_state.lock().unwrap();
        state.response_queue.clear();
        state.received_requests.clear();
    }
}

/// Run all provided test cases sequentially and report results
pub async fn run_tests(cases: Vec<TestCase>, ctx: TestContext, filter: Option<&str>) -> Vec<TestResult> {
    print_banner(&ctx);

    let selected: Vec<&TestCase> = cases
        .iter()
        .filter(|c| filter.map_or(true, |f| c.name.contains(f)))
        .collect();

    println!("  Running: {} test(s)\n", selected.len().to_string().bright_cyan());

    let mut results = Vec::with_capacity(selected.len());
    for case in selected {
        print!("  {} {} ... ", "▶".bright_blue(), case.name.bright_white());

        if case.needs_relay_bin && ctx.relay_bin.is_none() {
            println!("{} (no relay binary)", "SKIP".yellow().bold());
            results.push(TestResult {
                name: case.name.to_string(),
                outcome: Outcome::Skipped,
                duration_ms: 0,
            });
            continue;
        }

        ctx.reset_backend();
        let start = Instant::now();
        let result = (case.run)(ctx.clone()).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let outcome = match result {
            Ok(()) => {
                println!("{} ({duration_ms}ms)", "PASS".bright_green().bold());
                Outcome::Passed
            }
            Err(e) => {
                println!("{} ({duration_ms}ms)", "FAIL".bright_red().bold());
                println!("    {} {}", "Error:".bright_red(), e);
                for cause in e.chain().skip(1) {
                    println!("    {} {}", "Caused by:".yellow(), cause);
                }
                Outcome::Failed(e.to_string())
            }
        };

        results.push(TestResult {
            name: case.name.to_string(),
            outcome,
            duration_ms,
        });
    }

    print_summary(&results);
    results
}

fn print_banner(ctx: &TestContext) {
    println!("\n{}", "═══════════════════════════════════════════════════".bright_blue());
    println!("{}", "  chat-relay End-to-End Tests".bright_white().bold());
    println!("{}", "═══════════════════════════════════════════════════".bright_blue());
    println!("  Relay:   {}", ctx.relay_addr.bright_cyan());
    if let Some(ref bin) = ctx.relay_bin {
        println!("  Binary:  {}", bin.bright_cyan());
    }
}

fn print_summary(results: &[TestResult]) {
    let passed = results.iter().filter(|r| r.outcome == Outcome::Passed).count();
    let skipped = results.iter().filter(|r| r.outcome == Outcome::Skipped).count();
    let failed = results.iter().filter(|r| r.failed()).count();

    println!("\n{}", "───────────────────────────────────────────────────".bright_blue());
    let summary = format!("  Results: {} passed, {} failed, {} skipped", passed, failed, skipped);
    if failed == 0 {
        println!("{}", summary.bright_green().bold());
    } else {
        println!("{}", summary.bright_red().bold());
        for r in results.iter().filter(|r| r.failed()) {
            println!("    {} {}", "✗".bright_red(), r.name);
        }
    }
    println!("{}\n", "═══════════════════════════════════════════════════".bright_blue());
}

/// Helper to list all available tests
pub fn list_tests(cases: &[TestCase]) {
    println!("\n{}", "Available tests:".bright_white().bold());
    for case in cases {
        let marker = if case.needs_relay_bin { " [spawns relay]" } else { "" };
        println!("  {} - {}{}", case.name.bright_cyan(), case.description, marker.dimmed());
    }
    println!();
}
