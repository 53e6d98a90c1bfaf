use std::time::Duration;

/// Ping interval chosen to beat a 15-minute host inactivity shutdown.
const PING_INTERVAL: Duration = Duration::from_secs(14 * 60);

/// Periodically GET the configured public URL so free-tier hosting does not
/// idle the process out. Runs forever; never touches the data model.
pub async fn run(url: String) {
    let client = reqwest::Client::new();
    let mut interval = tokio::time::interval(PING_INTERVAL);

    loop {
        interval.tick().await;
        match client.get(&url).send().await {
            Ok(response) => {
                log::debug!("Keep-alive ping to {}: {}", url, response.status());
            }
            Err(e) => {
                log::warn!("Keep-alive ping to {} failed: {}", url, e);
            }
        }
    }
}
