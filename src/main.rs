use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use investigator::config::Settings;
use investigator::llm::{AnthropicCaller, LlmCaller, OpenAiCaller, RetryingLlmCaller};
use investigator::prompt::DEFAULT_QUERY;
use investigator::{InvestigatorBuilder, ToolRegistry};

/// Ask questions about building violations, permits, food inspections and
/// murals at or near a Chicago address.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The question to investigate
    #[arg(short, long, default_value = DEFAULT_QUERY)]
    query: String,

    /// LLM to run the investigation with: llama3.1 (local Ollama) or claude
    #[arg(short, long = "model-name", alias = "model_name", default_value = "llama3.1")]
    model_name: String,

    /// Print the full exchange and trace after the answer
    #[arg(short, long)]
    debug: bool,

    /// Settings file (defaults to ./investigator.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provider {
    Llama,
    Claude,
}

impl Provider {
    fn from_name(name: &str) -> Self {
        match name {
            "llama3.1" => Provider::Llama,
            "claude"   => Provider::Claude,
            other => {
                tracing::warn!(model = other, "No supported model provided, defaulting to Llama 3.1");
                Provider::Llama
            }
        }
    }
}

fn caller_for(provider: Provider, settings: &Settings) -> Result<(Arc<dyn LlmCaller>, String)> {
    let (inner, model): (Arc<dyn LlmCaller>, String) = match provider {
        Provider::Llama => {
            println!("Using model Llama 3.1");
            (Arc::new(OpenAiCaller::ollama(settings)), settings.ollama_model.clone())
        }
        Provider::Claude => {
            println!("Using model Claude Haiku 4.5");
            let caller = AnthropicCaller::from_settings(settings).map_err(anyhow::Error::msg)?;
            (Arc::new(caller), settings.anthropic_model.clone())
        }
    };
    Ok((Arc::new(RetryingLlmCaller::new(inner, settings.llm_max_retries)), model))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;

    let (llm, model) = caller_for(Provider::from_name(&cli.model_name), &settings)?;
    let tools = ToolRegistry::chicago(&settings)?;

    let mut agent = InvestigatorBuilder::new(cli.query)
        .llm(llm)
        .model(model)
        .tools(tools)
        .settings(&settings)
        .build()?;

    let outcome = agent.run().await;

    match &outcome {
        Ok(answer) => println!("{}", answer),
        Err(e)     => eprintln!("Investigation failed: {}", e),
    }

    if cli.debug {
        let transcript = agent.transcript();
        println!("\nSYSTEM: {}", transcript.system_prompt);
        println!("\nHUMAN: {}", transcript.query);
        for entry in &transcript.history {
            println!("\nTOOL [{}] {}({}): {}",
                entry.step,
                entry.tool.name,
                serde_json::to_string(&entry.tool.args).unwrap_or_default(),
                entry.observation,
            );
        }
        println!("\n{}", agent.trace().render(120));
        println!("tokens: {} in / {} out", transcript.usage.input_tokens, transcript.usage.output_tokens);
    }

    outcome.map(|_| ()).map_err(Into::into)
}
