use anyhow::Result;

use media_daemon::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = telemetry::init("media-daemon")?;
    media_daemon::server::run().await
}
