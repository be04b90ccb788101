use std::sync::Arc;

use chrono::TimeDelta;
use imsakiyah::{
    appsettings::AppSettings,
    clock::{Clock, SystemClock},
    commands::CommandHandler,
    console::{forward_stdin, run_console},
    delivery::{LogPresenceSink, discord::DiscordChannelSink},
    provider::equran::EQuranClient,
    schedule::ScheduleService,
    scheduling::{
        EventResolver, PresenceUpdater, ReminderDispatcher, ReminderSettings, spawn_periodic,
    },
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = AppSettings::load()?;
    log::info!(
        "Starting for {}, {} in {}",
        settings.location.kabkota,
        settings.location.provinsi,
        settings.timezone
    );

    let equran = Arc::new(EQuranClient::new(&settings.equran)?);
    let schedules = Arc::new(ScheduleService::new(equran.clone(), settings.location.clone()));
    let resolver = EventResolver::new(schedules, settings.timezone);
    let sink = Arc::new(DiscordChannelSink::new(&settings.discord)?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let shutdown = CancellationToken::new();

    let presence = PresenceUpdater::new(
        resolver.clone(),
        Arc::new(LogPresenceSink),
        TimeDelta::milliseconds(settings.scheduling.status_refresh_ms as i64),
    );
    let commands = CommandHandler::from_settings(&settings, resolver.clone(), equran.clone())?;
    let reminders = ReminderDispatcher::new(
        resolver,
        equran,
        sink,
        ReminderSettings::from_app_settings(&settings),
    );

    let handles = [
        spawn_periodic(presence, settings.status_refresh_interval(), clock.clone(), shutdown.clone()),
        spawn_periodic(reminders, settings.check_interval(), clock.clone(), shutdown.clone()),
    ];

    // stdin reads block, so they stay off the runtime
    let (line_sender, lines) = mpsc::channel(16);
    std::thread::spawn(move || forward_stdin(line_sender));
    let console = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(error) =
                run_console(&commands, clock.as_ref(), lines, tokio::io::stdout(), shutdown).await
            {
                log::error!("[COMMAND] Console stopped: {error:#}");
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down");
    shutdown.cancel();

    for handle in handles.into_iter().chain([console]) {
        if let Err(error) = handle.await {
            log::error!("Job task ended abnormally: {error}");
        }
    }

    Ok(())
}
