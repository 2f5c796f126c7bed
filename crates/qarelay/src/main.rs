use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use qarelay_answer::HttpAnswerService;
use qarelay_core::{
    config::{Config, ConnectorKind},
    console::{spawn_line_reader, ConsoleConnector},
    context::SenderContextStore,
    dispatcher::RelayDispatcher,
    messaging::port::SessionConnector,
    relay,
};
use qarelay_telegram::{router::run_polling, TelegramConnector};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    qarelay_core::logging::init("qarelay")?;

    let cfg = Config::load()?;
    let answers = Arc::new(HttpAnswerService::from_config(&cfg)?);
    info!(url = answers.ask_url(), connector = ?cfg.connector, "starting relay");

    let contexts = Arc::new(SenderContextStore::new());
    let shutdown = CancellationToken::new();
    let (events_tx, events_rx) = mpsc::channel(cfg.event_buffer);

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("ctrl-c received");
                shutdown.cancel();
            }
        });
    }

    let (connector, pump): (Arc<dyn SessionConnector>, _) = match cfg.connector {
        ConnectorKind::Telegram => {
            let token = cfg
                .telegram_bot_token
                .clone()
                .context("TELEGRAM_BOT_TOKEN is required for the telegram connector")?;
            let telegram = Arc::new(TelegramConnector::new(token));
            let pump = tokio::spawn(run_polling(telegram.clone(), events_tx, shutdown.clone()));
            (telegram as Arc<dyn SessionConnector>, pump)
        }
        ConnectorKind::Console => {
            let console = Arc::new(ConsoleConnector::new(tokio::io::stdout()));
            let lines =
                spawn_line_reader(std::io::BufReader::new(std::io::stdin()), cfg.event_buffer);
            let pump = {
                let console = console.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    console
                        .run(lines, events_tx, shutdown)
                        .await
                        .map_err(anyhow::Error::from)
                })
            };
            (console as Arc<dyn SessionConnector>, pump)
        }
    };

    let dispatcher = Arc::new(RelayDispatcher::new(contexts.clone(), answers, connector));
    let stats = relay::run(events_rx, dispatcher, shutdown.clone()).await;

    shutdown.cancel();
    match pump.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "session connector failed"),
        Err(e) => error!(error = %e, "session connector task panicked"),
    }

    info!(
        messages = stats.messages,
        senders = contexts.len().await,
        "relay stopped"
    );
    Ok(())
}
