use std::io::{self, Read};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;
use mail_chat::app::App;
use mail_chat::backends::backend_for_config;
use mail_chat::cli::Cli;
use mail_chat::config::ChatConfig;
use mail_chat::runtime::{lock_unpoisoned, RuntimeController};
use mail_chat::tui::AppComponent;
use mail_chat::{headless, logging};
use mail_tui::{ProcessTerminal, TUI};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_path = logging::init()?;

    let config =
        ChatConfig::load(&cli.config_overrides()).context("failed to load configuration")?;
    let backend = backend_for_config(&config).context("failed to initialize mail backend")?;
    let profile = backend.profile();
    tracing::info!(
        backend = %profile.backend_id,
        endpoint = profile.endpoint.as_deref().unwrap_or("-"),
        log_file = %log_path.display(),
        "mail-chat starting"
    );

    if let Some(command) = cli.command {
        let stdout = io::stdout();
        let stderr = io::stderr();
        return headless::run(
            command,
            backend.as_ref(),
            || {
                let mut body = String::new();
                io::stdin().read_to_string(&mut body)?;
                Ok(body)
            },
            &mut stdout.lock(),
            &mut stderr.lock(),
        );
    }

    let app = Arc::new(Mutex::new(App::new()));

    let mut tui = TUI::with_terminal(ProcessTerminal::new());
    let runtime_handle = tui.runtime_handle();
    let host = RuntimeController::new(Arc::clone(&app), runtime_handle.clone(), backend);
    tui.set_root(Box::new(AppComponent::new(
        Arc::clone(&app),
        host,
        &runtime_handle,
    )));

    tui.start().context("failed to start terminal")?;

    while !lock_unpoisoned(&app).should_exit && !tui.is_stop_requested() {
        tui.run_blocking_once();
    }

    tui.stop().context("failed to restore terminal")?;
    tracing::info!("mail-chat exited");
    Ok(())
}
