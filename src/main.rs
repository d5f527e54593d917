//! taskpilot - Main Entry Point
//!
//! Plan mode (default) runs the full planner/orchestrator pipeline on a
//! request; skill mode (`--skills <dir>`) selects one skill package and
//! runs it with the tool-call loop.

use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use taskpilot::agents::build_subagents;
use taskpilot::agents::render::render_markdown_terminal;
use taskpilot::config::AgentConfig;
use taskpilot::interaction::TerminalInteraction;
use taskpilot::llm::OpenRouterClient;
use taskpilot::planner::{PlanExecutor, Planner};
use taskpilot::session::Event;
use taskpilot::skills::SkillRunner;
use taskpilot::tools::web::{DuckDuckGoClient, TavilyClient, WikipediaClient};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

struct CliArgs {
    request: String,
    skills_dir: Option<PathBuf>,
    review: bool,
    auto_approve: bool,
    html: bool,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            print_usage();
            process::exit(2);
        }
    };

    let config = match AgentConfig::from_env() {
        Ok(config) => config
            .with_review(args.review)
            .with_auto_approve(args.auto_approve)
            .with_html(args.html),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            eprintln!("\nTo get started:");
            eprintln!("   1. Get an API key from https://openrouter.ai");
            eprintln!("   2. export OPENROUTER_API_KEY=your_key");
            eprintln!("   3. Optionally export TAVILY_API_KEY for primary web search");
            process::exit(1);
        }
    };

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancelling...");
            ctrl_c_cancel.cancel();
        }
    });

    let exit_code = match &args.skills_dir {
        Some(dir) => run_skill_mode(&config, &cancel, dir, &args.request).await,
        None => run_plan_mode(&config, &cancel, &args.request).await,
    };
    process::exit(exit_code);
}

async fn run_plan_mode(config: &AgentConfig, cancel: &CancellationToken, request: &str) -> i32 {
    let client = Arc::new(OpenRouterClient::with_base_url(
        config.api_key.clone(),
        config.base_url.clone(),
    ));
    let interaction = Arc::new(TerminalInteraction::new(config.auto_approve));
    let subagents = build_subagents(
        config,
        client.clone(),
        Arc::new(TavilyClient::new(config.tavily_api_key.clone())),
        Arc::new(DuckDuckGoClient::new()),
        Arc::new(WikipediaClient::new()),
        interaction.clone(),
    );
    let planner = Arc::new(Planner::new(client, &config.model));

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let executor = PlanExecutor::new(planner, subagents, interaction, event_tx)
        .with_review(config.require_review);

    let html = config.render_html;
    let printer = tokio::spawn(async move {
        let mut failed = false;
        while let Some(event) = event_rx.recv().await {
            match event {
                Event::Log { content } => println!("{}", content),
                Event::Response { content, .. } => {
                    if html {
                        println!("{}", content);
                    } else {
                        println!("\n{}", render_markdown_terminal(&content));
                    }
                }
                Event::Error { content } => {
                    eprintln!("ERROR: {}", content);
                    failed = true;
                }
                Event::PlanReview { .. } | Event::Done => {}
            }
        }
        failed
    });

    executor.run(cancel, request, "").await;
    drop(executor);

    match printer.await {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(_) => 1,
    }
}

async fn run_skill_mode(
    config: &AgentConfig,
    cancel: &CancellationToken,
    dir: &Path,
    prompt: &str,
) -> i32 {
    let client = Arc::new(OpenRouterClient::with_base_url(
        config.api_key.clone(),
        config.base_url.clone(),
    ));
    let interaction = Arc::new(TerminalInteraction::new(config.auto_approve));
    let runner = SkillRunner::new(
        client,
        config,
        interaction,
        Arc::new(DuckDuckGoClient::new()),
        Arc::new(WikipediaClient::new()),
    );

    match runner.run(cancel, dir, prompt).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            1
        }
    }
}

fn parse_args() -> Result<CliArgs, String> {
    let mut args = CliArgs {
        request: String::new(),
        skills_dir: None,
        review: false,
        auto_approve: false,
        html: false,
    };
    let mut ppt = false;
    let mut podcast = false;
    let mut rest: Vec<String> = Vec::new();

    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--skills" => {
                let dir = iter
                    .next()
                    .ok_or_else(|| "--skills requires a directory".to_string())?;
                args.skills_dir = Some(PathBuf::from(dir));
            }
            "--review" => args.review = true,
            "--auto-approve" => args.auto_approve = true,
            "--html" => args.html = true,
            "--ppt" => ppt = true,
            "--podcast" => podcast = true,
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            other if other.starts_with("--") => {
                return Err(format!("Unknown flag '{}'", other));
            }
            other => rest.push(other.to_string()),
        }
    }

    if rest.is_empty() {
        return Err("A request is required".to_string());
    }
    args.request = rest.join(" ");
    if ppt {
        args.request.push_str(taskpilot::config::PPT_DIRECTIVE);
    }
    if podcast {
        args.request.push_str(taskpilot::config::PODCAST_DIRECTIVE);
    }
    Ok(args)
}

fn print_usage() {
    println!("Usage:");
    println!("  taskpilot [flags] \"<request>\"           run the planning pipeline");
    println!("  taskpilot --skills <dir> \"<prompt>\"      run one skill package");
    println!();
    println!("Flags:");
    println!("  --review        route the plan through a review prompt before running");
    println!("  --auto-approve  skip the per-tool approval prompt");
    println!("  --html          render the final report as a full HTML page");
    println!("  --ppt           ask for a PPT outline alongside the report");
    println!("  --podcast       ask for a podcast script alongside the report");
}
