//! Inkwell terminal player.
//!
//! Type the number or id of a choice to play it, `new` to start over and
//! `quit` to leave.

use std::error::Error;
use std::io::Write;
use std::sync::Arc;

use inkwell_player::config::PlayerConfig;
use inkwell_player::gateway::HttpGateway;
use inkwell_player::presenter::Presenter;
use inkwell_player::render::render;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

fn show(presenter: &Presenter) {
    print!("\n{}> ", render(presenter.view()));
    let _ = std::io::stdout().flush();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = PlayerConfig::from_env()?;
    let gateway = Arc::new(HttpGateway::new(&config.gateway_url));
    let (mut presenter, mut events) = Presenter::new(gateway, config.enrichment_wait);
    if let Some(dir) = &config.audio_dir {
        presenter = presenter.with_audio_dir(dir);
    }

    println!("Inkwell: a Game of Thrones story ({})", config.gateway_url);
    // Failures are recorded in the view.
    let _ = presenter.start_game().await;
    show(&presenter);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "" => {}
                    "quit" | "exit" => break,
                    "new" => {
                        let _ = presenter.start_game().await;
                    }
                    choice => {
                        let _ = presenter.choose(choice).await;
                    }
                }
                show(&presenter);
            }
            Some(event) = events.recv() => {
                if presenter.apply(event) {
                    show(&presenter);
                }
            }
        }
    }

    println!("Farewell.");
    Ok(())
}
