//! HTTP Client Factory
//!
//! Provides a factory function for building reqwest clients shared by the
//! metered backend and the HTTP vector store.

use std::time::Duration;

/// Build a `reqwest::Client` with a connect timeout.
///
/// Per-request deadlines are applied by callers with `RequestBuilder::timeout`
/// so that each timeout tier can use its own budget on the same client.
pub fn build_http_client(connect_timeout: Duration) -> reqwest::Client {
    let builder = reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .user_agent(concat!("prose-cascade/", env!("CARGO_PKG_VERSION")));
    match builder.build() {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!("falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        }
    }
}
