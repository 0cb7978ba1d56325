use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace, warn};

use super::StatusEvent;

/// Fixed back-off between reconnect attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Spawns the supervised status channel reader.
///
/// The task owns a reconnect-forever loop around a single WebSocket
/// connection: it runs for the lifetime of the client session, independent
/// of any particular job, and reconnects with a fixed back-off whenever the
/// connection closes or fails. Parsed events are published onto `tx`; the
/// task exits when the receiving side is dropped. The channel is
/// receive-only — the client never sends application messages on it.
pub fn spawn_status_channel(url: String, tx: UnboundedSender<StatusEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match connect_async(url.as_str()).await {
                Ok((mut stream, _)) => {
                    debug!(%url, "status channel connected");
                    while let Some(message) = stream.next().await {
                        match message {
                            Ok(Message::Text(text)) => {
                                match StatusEvent::parse(text.as_str()) {
                                    Some(event) => {
                                        if tx.send(event).is_err() {
                                            return;
                                        }
                                    }
                                    None => trace!("ignoring unknown channel message"),
                                }
                            }
                            Ok(Message::Close(_)) => break,
                            Ok(_) => {}
                            Err(e) => {
                                warn!(error = %e, "status channel read failed");
                                break;
                            }
                        }
                    }
                    debug!("status channel closed, reconnecting");
                }
                Err(e) => {
                    warn!(error = %e, "status channel connect failed");
                }
            }

            if tx.is_closed() {
                return;
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    })
}
