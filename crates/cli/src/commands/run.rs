//! `harkaam run`: solve one task with one architecture.

use harkaam_agent::{Architecture, create_agent};
use harkaam_config::AppConfig;
use harkaam_core::Result;
use tracing::{debug, warn};

/// Command-line overrides applied on top of the loaded configuration.
#[derive(Debug, Default)]
pub struct RunOptions {
    pub model: Option<String>,
    pub max_iterations: Option<usize>,
    pub verbose: bool,
}

pub async fn run(architecture: &str, task: &str, options: RunOptions) -> Result<()> {
    let arch: Architecture = architecture.parse()?;

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Could not load config, using defaults");
            AppConfig::default()
        }
    };
    if !config.has_api_key() {
        warn!("No API key configured; set HARKAAM_API_KEY, OPENAI_API_KEY or ANTHROPIC_API_KEY");
    }

    let mut builder = create_agent(arch.as_str())?.from_config(&config)?;
    if let Some(model) = options.model {
        builder = builder.model(model);
    }
    if let Some(max) = options.max_iterations {
        builder = builder.max_iterations(max).max_depth(max);
    }
    let agent = builder.verbose(options.verbose).build()?;
    debug!(agent = %agent.name(), architecture = %arch, "Agent built");

    println!("🤖 {} agent working on: {task}\n", arch.title());
    let result = agent.run(task).await?;
    print!("{}", result.render(options.verbose));
    Ok(())
}
