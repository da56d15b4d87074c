use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;

use ivr_assist::channels::{Channel, CliChannel, IncomingEvent};
use ivr_assist::classifier::LexicalClassifier;
use ivr_assist::config::Content;
use ivr_assist::controller::{SessionEvent, TurnController};
use ivr_assist::directive::Directive;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Configuration errors are fatal before any session starts
    let content = Content::load()?;
    let is_voice = content.voice.enabled;
    let inactivity_timeout = Duration::from_secs(content.voice.inactivity_timeout_secs.max(1));

    eprintln!(
        "📞 {} — {} v{}",
        content.brand.agent_name,
        content.brand.organization_name,
        env!("CARGO_PKG_VERSION")
    );
    eprintln!(
        "   Intents: {} categories, {} exceptions (stuck after {} misses)",
        content.triage.categories.len(),
        content.triage.exceptions.len(),
        content.triage.stuck.max_attempts
    );
    eprintln!("   Directory: {} members", content.auth.directory.len());
    eprintln!(
        "   Channel: cli ({})",
        if is_voice { "voice simulation" } else { "text" }
    );
    eprintln!("   Type a message and press Enter. /bye to end the session.\n");

    let controller = Arc::new(TurnController::new(
        content.controller_config(),
        content.directory(),
        content.router(),
        Arc::new(LexicalClassifier::new()),
    ));

    // Spawn session pruning task
    let pruner = controller.clone();
    let idle_timeout = Duration::from_secs(content.session.idle_timeout_secs);
    let prune_interval = Duration::from_secs(content.session.prune_interval_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(prune_interval);
        interval.tick().await; // Skip immediate first tick
        loop {
            interval.tick().await;
            pruner.sessions().prune_stale(idle_timeout).await;
        }
    });

    let channel = CliChannel::new();
    let mut events = channel.start().await?;

    tracing::info!("Dialogue controller ready and listening");

    // One session at a time on the CLI; voice mode synthesizes an
    // inactivity event when the user goes quiet between turns.
    let mut last_session: Option<String> = None;
    loop {
        let incoming = tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, shutting down...");
                break;
            }
            next = events.next() => {
                match next {
                    Some(event) => event,
                    None => {
                        tracing::info!("Event stream ended, shutting down...");
                        break;
                    }
                }
            }
            _ = tokio::time::sleep(inactivity_timeout), if is_voice && last_session.is_some() => {
                let session_id = last_session.clone().unwrap_or_default();
                IncomingEvent::new("cli", &session_id, SessionEvent::Inactivity)
            }
        };

        last_session = Some(incoming.session_id.clone());

        if let Some(output) = controller
            .handle_event(&incoming.session_id, incoming.event.clone())
            .await
        {
            let terminated = matches!(output.directive, Directive::Terminate { .. });
            if let Err(e) = channel.respond(&incoming, &output).await {
                tracing::error!("Failed to render response: {}", e);
            }
            if terminated {
                break;
            }
        }
    }

    channel.shutdown().await.ok();
    Ok(())
}
