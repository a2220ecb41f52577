//! fireworks-proxy e2e test runner
//!
//! With no subcommand the runner starts the mock inference API, launches the
//! proxy binary against it with `FIREWORKS_API_KEY` set, runs every scenario
//! and shuts the proxy down again.
//!
//!   cargo run                          # launch proxy, run all scenarios
//!   cargo run -- --filter streaming    # only scenarios whose name matches
//!   cargo run -- list                  # print the scenario registry
//!   cargo run -- attach                # use a proxy you started yourself

mod client;
mod runner;
mod tests;
mod types;
mod upstream;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use runner::{list_tests, run_tests, TestContext};
use tests::all_tests;
use types::TestResult;

const PROXY_BIN_CANDIDATES: &[&str] = &["../target/release/fireworks-proxy", "../target/debug/fireworks-proxy"];

#[derive(Parser)]
#[command(name = "e2e", about = "End-to-end scenarios for fireworks-proxy")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Only run scenarios whose name contains this string
    #[arg(long, short, global = true)]
    filter: Option<String>,

    /// Port the mock inference API listens on; the proxy config must point here
    #[arg(long, global = true, default_value_t = 18080)]
    upstream_port: u16,

    /// Proxy binary to launch (defaults to the release build, then debug)
    #[arg(long)]
    proxy_bin: Option<PathBuf>,

    /// Config handed to the launched proxy
    #[arg(long, default_value = "test_configs/proxy.yaml")]
    proxy_config: PathBuf,

    /// Port the launched proxy listens on, as set in its config
    #[arg(long, default_value_t = 18066)]
    proxy_port: u16,
}

#[derive(Subcommand)]
enum Command {
    /// Print the registered scenarios
    List,

    /// Run against a proxy that is already up.
    /// Start it with FIREWORKS_API_KEY=fw-e2e-test-key so the key checks line up.
    Attach {
        #[arg(long, default_value = "127.0.0.1:18066")]
        proxy_addr: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let results = match &cli.command {
        Some(Command::List) => {
            list_tests(&all_tests());
            return Ok(ExitCode::SUCCESS);
        }
        Some(Command::Attach { proxy_addr }) => {
            run_suite(proxy_addr.clone(), cli.upstream_port, cli.filter.as_deref()).await?
        }
        None => launch_and_run(&cli).await?,
    };

    Ok(if results.iter().all(|r| r.passed) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Start the mock upstream and run the scenario registry against `proxy_addr`
async fn run_suite(proxy_addr: String, upstream_port: u16, filter: Option<&str>) -> anyhow::Result<Vec<TestResult>> {
    let upstream_state = upstream::start(upstream_port).await?;
    println!("Mock inference API on 127.0.0.1:{}{}", upstream_port, upstream::CHAT_PATH);

    let ctx = TestContext {
        proxy_addr,
        upstream_state,
        http_client: client::build_client(),
    };
    Ok(run_tests(all_tests(), ctx, filter).await)
}

async fn launch_and_run(cli: &Cli) -> anyhow::Result<Vec<TestResult>> {
    let proxy_bin = match &cli.proxy_bin {
        Some(path) => path.clone(),
        None => locate_proxy_bin()?,
    };

    // Preflights never reach upstream, so the mock can start after readiness.
    let proxy_addr = format!("127.0.0.1:{}", cli.proxy_port);
    println!(
        "Launching {} with {}",
        proxy_bin.display().to_string().bright_cyan(),
        cli.proxy_config.display()
    );
    let mut proxy = tokio::process::Command::new(&proxy_bin)
        .arg("--config")
        .arg(&cli.proxy_config)
        .arg("run")
        .env("FIREWORKS_API_KEY", tests::helpers::E2E_API_KEY)
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| anyhow::anyhow!("Failed to launch {}: {}", proxy_bin.display(), e))?;

    wait_until_ready(&proxy_addr).await?;
    let results = run_suite(proxy_addr, cli.upstream_port, cli.filter.as_deref()).await;

    proxy.kill().await.ok();
    results
}

fn locate_proxy_bin() -> anyhow::Result<PathBuf> {
    PROXY_BIN_CANDIDATES
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "fireworks-proxy binary not found in {}; run `cargo build --release` in the crate root first",
                PROXY_BIN_CANDIDATES.join(" or ")
            )
        })
}

/// Poll with OPTIONS until the proxy answers, giving up after about ten seconds
async fn wait_until_ready(addr: &str) -> anyhow::Result<()> {
    let client = client::build_client();
    let url = format!("http://{}{}", addr, client::CHAT_PATH);

    for _ in 0..50 {
        if let Ok(resp) = client.request(reqwest::Method::OPTIONS, &url).send().await {
            if resp.status().is_success() {
                println!("Proxy ready at {}\n", addr);
                return Ok(());
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    }

    Err(anyhow::anyhow!("Proxy at {} never answered a preflight", addr))
}
