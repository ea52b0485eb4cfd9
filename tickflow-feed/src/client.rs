//! Websocket session against the exchange feed.

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

use crate::config::FeedConfig;
use crate::error::FeedError;

/// Subscription request sent right after connect.
#[derive(Debug, Serialize)]
struct SubscribeRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    product_ids: [&'a str; 1],
    channels: [&'static str; 1],
}

impl<'a> SubscribeRequest<'a> {
    fn ticker(product_id: &'a str) -> Self {
        SubscribeRequest {
            kind: "subscribe",
            product_ids: [product_id],
            channels: ["ticker"],
        }
    }
}

/// Factory for feed sessions.
pub struct FeedClient {
    config: FeedConfig,
}

impl FeedClient {
    pub fn new(config: FeedConfig) -> Self {
        FeedClient { config }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Open the websocket connection. Subscribing is a separate step so the
    /// caller can finish its own bring-up before frames start arriving.
    pub async fn connect(&self) -> Result<FeedSession, FeedError> {
        debug!(url = %self.config.ws_url, "connecting to feed");
        let (ws, response) = connect_async(&self.config.ws_url).await?;
        debug!(status = %response.status(), "feed connected");
        Ok(FeedSession {
            ws,
            product_id: self.config.product_id.clone(),
        })
    }
}

/// One live duplex session. Yields text frames until the peer closes or the
/// transport fails; there is no reconnect.
pub struct FeedSession {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    product_id: String,
}

impl FeedSession {
    /// Subscribe to the ticker channel for the configured product.
    pub async fn subscribe(&mut self) -> Result<(), FeedError> {
        let request = SubscribeRequest::ticker(&self.product_id);
        let json = serde_json::to_string(&request)?;
        debug!(product_id = %self.product_id, "subscribing to ticker channel");
        self.ws.send(Message::Text(json.into())).await?;
        Ok(())
    }

    /// Next text frame from the feed.
    ///
    /// Transport pings are answered inline and pongs and binary frames are
    /// skipped. Returns `Ok(None)` once the peer closes the stream.
    pub async fn next_frame(&mut self) -> Result<Option<String>, FeedError> {
        while let Some(msg) = self.ws.next().await {
            match msg? {
                Message::Text(text) => return Ok(Some(text.to_string())),
                Message::Ping(payload) => {
                    trace!("answering transport ping");
                    self.ws.send(Message::Pong(payload)).await?;
                }
                Message::Close(frame) => {
                    debug!(?frame, "feed closed by remote");
                    return Ok(None);
                }
                _ => {}
            }
        }
        Ok(None)
    }

    /// Initiate a clean close handshake. Errors here are of no consequence
    /// during shutdown and are left to the caller to ignore.
    pub async fn close(&mut self) -> Result<(), FeedError> {
        self.ws.close(None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_request_wire_format() {
        let request = SubscribeRequest::ticker("BTC-USD");
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"type":"subscribe","product_ids":["BTC-USD"],"channels":["ticker"]}"#
        );
    }
}
