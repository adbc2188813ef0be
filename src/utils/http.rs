use std::time::Duration;

use reqwest::Client;

/// Builds the HTTP client used for vision requests. A zero timeout keeps the
/// client default.
pub fn build_http_client(timeout_seconds: u64) -> reqwest::Result<Client> {
    let mut builder = Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if timeout_seconds > 0 {
        builder = builder.timeout(Duration::from_secs(timeout_seconds));
    }
    builder.build()
}
