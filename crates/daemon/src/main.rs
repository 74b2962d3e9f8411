use std::{sync::Arc, time::Duration};

use daemon::{
    get_config_info, resolve_stations, send_reports, setup_logger, ApiFetcher, Cli,
    ForecastService, ObservationService, RateLimiter,
};
use slog::{debug, error, info, Logger};
use tokio::sync::Mutex;
use tokio::time::interval;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = get_config_info();
    let logger = setup_logger(&cli);

    info!(logger, "avwx daemon starting...");
    info!(logger, "  Server URL: {}", cli.base_url());
    info!(logger, "  Provider: {}", cli.provider_url());
    info!(logger, "  Fetch interval: {} seconds", cli.sleep_interval());

    // Stay polite with the provider: a few requests per refill window
    let rate_limiter = Arc::new(Mutex::new(RateLimiter::new(
        cli.token_capacity(),
        cli.refill_rate(),
    )));

    // Run the fetch/upload loop until killed
    process_weather_data(cli, logger, rate_limiter).await;
    Ok(())
}

async fn process_weather_data(cli: Cli, logger: Logger, rate_limit: Arc<Mutex<RateLimiter>>) {
    let sleep_between_checks = cli.sleep_interval();
    info!(
        logger,
        "Wait time between data pulls: {} seconds", sleep_between_checks
    );

    let mut check_interval = interval(Duration::from_secs(sleep_between_checks));
    loop {
        tokio::select! {
            _ = check_interval.tick() => {
                match process_data(cli.clone(), logger.clone(), rate_limit.clone()).await {
                    Ok(_) => info!(logger, "Finished processing data, waiting {} seconds for next run", sleep_between_checks),
                    Err(err) => error!(&logger, "Error processing data: {}", err)
                }
            }
        }
    }
}

async fn process_data(
    cli: Cli,
    logger: Logger,
    rate_limiter: Arc<Mutex<RateLimiter>>,
) -> Result<(), anyhow::Error> {
    let fetcher = Arc::new(ApiFetcher::new(
        logger.clone(),
        cli.user_agent(),
        rate_limiter,
    )?);

    let stations = resolve_stations(&cli);
    debug!(logger, "watching {} stations", stations.len());

    let observation_service = ObservationService::new(
        logger.clone(),
        fetcher.clone(),
        cli.provider_url(),
    );
    let forecast_service = ForecastService::new(logger.clone(), fetcher, cli.provider_url());

    let (metars, tafs) = tokio::try_join!(
        observation_service.get_metars(&stations),
        forecast_service.get_tafs(&stations),
    )?;
    debug!(logger, "metars: {}, tafs: {}", metars.len(), tafs.len());

    send_reports(&cli, &logger, metars, tafs).await?;
    Ok(())
}
