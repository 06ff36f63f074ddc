use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

use tidepool::agent::Agent;
use tidepool::config::Config;
use tidepool::llm::ollama::OllamaClient;
use tidepool::llm::openai_compat::OpenAiCompatClient;
use tidepool::llm::LlmProvider;
use tidepool::sandbox::docker::{docker_available, DockerSandbox};
use tidepool::sandbox::process::ProcessSandbox;
use tidepool::sandbox::Sandbox;

fn create_provider(cfg: &Config, model: &str) -> Box<dyn LlmProvider> {
    match cfg.llm.provider.as_str() {
        "openai_compat" => Box::new(OpenAiCompatClient::new(
            &cfg.llm.base_url,
            model,
            cfg.llm.api_key.clone(),
        )),
        _ => Box::new(OllamaClient::new(&cfg.llm.base_url, model)),
    }
}

fn create_sandbox(cfg: &Config) -> Result<Arc<dyn Sandbox>, String> {
    match cfg.sandbox.backend.as_str() {
        "process" => {
            let sandbox = ProcessSandbox::new(
                Path::new(&cfg.sandbox.dest_dir),
                cfg.sandbox.timeout_secs,
                cfg.sandbox.network,
            )
            .map_err(|e| {
                format!(
                    "Cannot prepare scratch directory '{}': {}",
                    cfg.sandbox.dest_dir, e
                )
            })?;
            Ok(Arc::new(sandbox))
        }
        _ => {
            if !docker_available() {
                return Err("Docker is not available. Install it, or set backend = \"process\" in config.".to_string());
            }
            let sandbox = DockerSandbox::new(&cfg.sandbox.container, cfg.sandbox.timeout_secs);
            if !sandbox.container_running() {
                return Err(format!(
                    "Container '{}' is not running. Start it with:\n  docker run -d --name {} --network none python:3.12-slim sleep infinity",
                    cfg.sandbox.container, cfg.sandbox.container
                ));
            }
            Ok(Arc::new(sandbox))
        }
    }
}

#[derive(Parser)]
#[command(name = "tidepool")]
#[command(about = "Ask questions about local data files. Answers are computed by model-written Python running in an isolated sandbox.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage a data file into the sandbox and answer questions about it
    Analyze {
        /// File name inside the data directory
        file: String,
        /// Model to use
        #[arg(short, long)]
        model: Option<String>,
        /// Run generated code without asking for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// List each agent's tools
    Tools,
    /// Show configuration
    Config,
}

fn run_analyze(file: String, model: Option<String>, skip_confirm: bool) {
    let cfg = Config::load();
    let model = model.unwrap_or_else(|| cfg.llm.model.clone());

    println!("{}", "tidepool v0.1.0".bold());
    println!("Model: {}", model.green());
    println!("Type {} to exit.\n", "Ctrl+D".dimmed());

    let sandbox = match create_sandbox(&cfg) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            std::process::exit(1);
        }
    };

    // Two agents, two capabilities. The stager can reach the data
    // directory but cannot run code; the analyst can run code but only
    // sees what was staged.
    let mut stager = Agent::file_access(create_provider(&cfg, &model), sandbox.clone(), &cfg);
    let mut analyst = Agent::python_exec(create_provider(&cfg, &model), sandbox, &cfg);

    eprintln!("{}", format!("Staging '{}'...", file).dimmed());
    let report = match stager.task(&format!("Stage the file '{}' for analysis.", file)) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            std::process::exit(1);
        }
    };
    println!("{}\n", report);
    analyst.add_context(&report);

    let mut approve = |name: &str, args: &serde_json::Value| -> bool {
        if skip_confirm || name != "run_python" {
            return true;
        }
        let code = args["code"].as_str().unwrap_or("(unreadable code)");
        println!("{}", "--- generated code ---".dimmed());
        println!("{}", code);
        println!("{}", "----------------------".dimmed());
        dialoguer::Confirm::new()
            .with_prompt("Run this code in the sandbox?")
            .default(true)
            .interact()
            .unwrap_or(false)
    };

    let mut rl = rustyline::DefaultEditor::new().expect("Failed to initialize readline");
    loop {
        match rl.readline(&format!("{} ", "you>".blue().bold())) {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(input);

                let start = std::time::Instant::now();
                match analyst.task_with_approval(input, &mut approve) {
                    Ok(answer) => {
                        println!("{} {}", "bot>".green().bold(), answer);
                        println!(
                            "{}\n",
                            format!("({:.1}s)", start.elapsed().as_secs_f64()).dimmed()
                        );
                    }
                    Err(e) => {
                        eprintln!("{} {}\n", "Error:".red(), e);
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("Use Ctrl+D to exit.");
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("Bye.");
                break;
            }
            Err(e) => {
                eprintln!("{} {}", "Error:".red(), e);
                break;
            }
        }
    }
}

fn run_tools() {
    let cfg = Config::load();
    // Listing needs no live sandbox; a handle is enough to build the agents.
    let sandbox: Arc<dyn Sandbox> = Arc::new(DockerSandbox::new(
        &cfg.sandbox.container,
        cfg.sandbox.timeout_secs,
    ));
    let stager = Agent::file_access(create_provider(&cfg, &cfg.llm.model), sandbox.clone(), &cfg);
    let analyst = Agent::python_exec(create_provider(&cfg, &cfg.llm.model), sandbox, &cfg);

    for (label, agent) in [("file-access agent", &stager), ("python-exec agent", &analyst)] {
        println!("{}", label.bold());
        for tool in agent.tools().list() {
            println!("  {}  {}", tool.name().cyan(), tool.description());
        }
        println!();
    }
}

fn run_config() {
    let cfg = Config::load();
    match cfg.to_toml() {
        Ok(toml) => println!("{}", toml),
        Err(e) => eprintln!("{} {}", "Error:".red(), e),
    }
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze { file, model, yes } => run_analyze(file, model, yes),
        Commands::Tools => run_tools(),
        Commands::Config => run_config(),
    }
}
