//! Output relay - drains a launched target's stdout/stderr into events.
//!
//! Attached targets have no relays; their output belongs to whoever started
//! them. Each relay is a blocking read loop on its own thread, delivering
//! chunks to the controller mailbox, never touching controller state.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::controller::ControllerMsg;

/// Output is read in chunks of this many bytes.
const CHUNK_SIZE: usize = 512;

/// Which target stream a relay drains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    fn label(self) -> &'static str {
        match self {
            OutputStream::Stdout => "stdout",
            OutputStream::Stderr => "stderr",
        }
    }
}

/// A worker thread draining one target output stream.
pub(crate) struct OutputRelay {
    handle: Option<JoinHandle<()>>,
    finished: Arc<AtomicBool>,
}

impl OutputRelay {
    /// Spawn a relay for one stream. The relay stops at end-of-stream, when
    /// the shared `finished` flag is set, or when the mailbox closes.
    pub fn spawn(
        stream: OutputStream,
        mut reader: Box<dyn Read + Send>,
        tx: UnboundedSender<ControllerMsg>,
        finished: Arc<AtomicBool>,
        epoch: u64,
    ) -> Self {
        let flag = finished.clone();
        let handle = std::thread::Builder::new()
            .name(format!("ember-relay-{}", stream.label()))
            .spawn(move || {
                let mut buf = [0u8; CHUNK_SIZE];
                loop {
                    if flag.load(Ordering::Acquire) {
                        break;
                    }
                    match reader.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => {
                            let text = String::from_utf8_lossy(&buf[..n]).into_owned();
                            let msg = ControllerMsg::Output { epoch, stream, text };
                            if tx.send(msg).is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            debug!(stream = stream.label(), %err, "output relay read failed");
                            break;
                        }
                    }
                }
                debug!(stream = stream.label(), "output relay finished");
            })
            .expect("failed to spawn output relay thread");
        Self {
            handle: Some(handle),
            finished,
        }
    }

    /// Ask the relay to stop after its current read.
    pub fn finish(&self) {
        self.finished.store(true, Ordering::Release);
    }
}

impl Drop for OutputRelay {
    fn drop(&mut self) {
        self.finish();
        // The thread exits on EOF or flag check; do not block session
        // teardown on a reader stuck in a syscall.
        drop(self.handle.take());
    }
}
