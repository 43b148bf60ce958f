use anyhow::{Context, Result};
use log::info;
use tokio::select;
use tokio_util::sync::CancellationToken;

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};
#[cfg(windows)]
use tokio::signal::windows::{ctrl_c, CtrlC};

/// Listens for stop signals and cancels a [CancellationToken] on the first one.
///
/// Listeners are registered eagerly by [listen]. A signal arriving before the first
/// poll of [SignalHandler::wait_for_signal] is still delivered to it.
pub struct SignalHandler {
    tok: CancellationToken,
    #[cfg(unix)]
    streams: UnixStreams,
    #[cfg(windows)]
    ctrl_c: CtrlC,
}

#[cfg(unix)]
struct UnixStreams {
    sigterm: Signal,
    sigint: Signal,
    sighup: Signal,
}

/// Must be called from within a Tokio runtime.
#[cfg(unix)]
pub fn listen() -> Result<SignalHandler> {
    let streams = UnixStreams {
        sigterm: signal(SignalKind::terminate()).context("listening for SIGTERM")?,
        sigint: signal(SignalKind::interrupt()).context("listening for SIGINT")?,
        sighup: signal(SignalKind::hangup()).context("listening for SIGHUP")?,
    };
    Ok(SignalHandler {
        tok: CancellationToken::new(),
        streams,
    })
}

/// Must be called from within a Tokio runtime.
#[cfg(windows)]
pub fn listen() -> Result<SignalHandler> {
    Ok(SignalHandler {
        tok: CancellationToken::new(),
        ctrl_c: ctrl_c().context("listening for Ctrl-C")?,
    })
}

impl SignalHandler {
    pub fn subscribe_stop(&self) -> CancellationToken {
        self.tok.clone()
    }

    #[cfg(unix)]
    pub async fn wait_for_signal(mut self) {
        let streams = &mut self.streams;
        select! {
            _ = streams.sigterm.recv() => info!("Terminated; stopping..."),
            _ = streams.sigint.recv() => info!("Interrupted; stopping..."),
            _ = streams.sighup.recv() => info!("Hangup received; stopping..."), // used by tmux apparently
            _ = self.tok.cancelled() => return, // stopped from inside, nothing to do
        }
        self.tok.cancel();
    }

    #[cfg(windows)]
    pub async fn wait_for_signal(mut self) {
        select! {
            _ = self.ctrl_c.recv() => info!("Interrupted; stopping..."),
            _ = self.tok.cancelled() => return,
        }
        self.tok.cancel();
    }
}
