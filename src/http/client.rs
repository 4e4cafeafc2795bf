//! Protocol dispatch
//!
//! The HTTP/2 driver is blocking. The HTTP/3 driver is async and runs on a
//! current-thread tokio runtime created for the one request.

use super::{h2, h3, ClientConfig, Message, Protocol, Result, Target};

/// Send one request using the configured protocol
pub fn send_request(target: &Target, config: &ClientConfig, request: &Message) -> Result<Message> {
    tracing::debug!(%target, protocol = %config.protocol(), "sending request");

    match config.protocol() {
        Protocol::H2 => h2::send_request(target, config, request),
        Protocol::H3 => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(h3::send_request(target, config, request))
        }
    }
}
