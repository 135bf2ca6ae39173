//! Graceful-shutdown signalling between server owners and their tasks.
use derive_more::Display;
use tokio::sync::oneshot;

/// The message sent over a halt channel to stop a running service.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum Halted {
    Normal,
}

/// Resolves when the halt channel fires (or its sender is dropped),
/// logging the supplied message.
pub async fn shutdown_signal_with_message(rx_halt: oneshot::Receiver<Halted>, message: String) {
    let halt = rx_halt.await;

    tracing::info!("{message}: {halt:?}");
}
