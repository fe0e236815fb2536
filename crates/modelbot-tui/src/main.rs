use anyhow::Result;
use clap::Parser;
use modelbot_core::{build_backend, logging, Config, Provider};
use tracing::{error, info};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "modelbot")]
#[command(about = "Terminal chat client for a chat-completion endpoint")]
struct Cli {
    /// Provider to use: endpoint, ollama, claude, openai
    #[arg(short, long)]
    provider: Option<Provider>,
    /// Model name passed to the provider
    #[arg(short, long)]
    model: Option<String>,
    /// Chat endpoint URL (implies --provider endpoint when no provider is given)
    #[arg(short, long, env = "MODELBOT_ENDPOINT")]
    endpoint: Option<String>,
    /// Write the effective settings to the config file and exit
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    /// Flags win over environment and config file
    fn apply(&self, mut config: Config) -> Config {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint_url = Some(endpoint.clone());
            if self.provider.is_none() {
                config.provider = Some(Provider::Endpoint.as_str().to_string());
            }
        }
        if let Some(provider) = self.provider {
            config.provider = Some(provider.as_str().to_string());
        }
        if let Some(model) = &self.model {
            config.default_model = Some(model.clone());
        }
        config
    }

    /// What `--save-config` writes: file plus flags, never environment keys
    fn persisted(&self, file: Config) -> Config {
        self.apply(file)
    }

    /// What the app runs with: file, then environment, then flags
    fn effective<F>(&self, file: Config, env: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        self.apply(file.with_env_from(env))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = logging::init(&Config::config_dir()?.join("logs"))?;

    let file_config = Config::load()?;
    if cli.save_config {
        cli.persisted(file_config).save()?;
        println!("Saved config to {}", Config::config_path()?.display());
        return Ok(());
    }

    let config = cli.effective(file_config, |name| std::env::var(name).ok());

    let provider = config.provider()?;
    let model = config.model();
    let backend = build_backend(&config)?;
    info!(%provider, %model, "starting modelbot");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(backend, provider, model, events.sender());

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    if let Err(err) = &result {
        error!(error = %err, "modelbot exited with an error");
    }
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}
