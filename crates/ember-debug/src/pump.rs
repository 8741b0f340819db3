//! Event pump - bridges the target's blocking event queue into the
//! controller mailbox.
//!
//! The pump owns the only blocking `remove()` loop in the system. It never
//! interprets events beyond spotting session death; every set is forwarded
//! for the controller to handle, including the class-prepare sets whose
//! registration and resume happen on the controller thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use ember_wire::{EventQueue, WireEvent};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error};

use crate::controller::ControllerMsg;

/// The worker thread reading the target-runtime event queue.
pub(crate) struct EventPump {
    handle: Option<JoinHandle<()>>,
    finished: Arc<AtomicBool>,
}

impl EventPump {
    /// Spawn the pump over a machine's event queue. Every message it sends
    /// carries the session `epoch` so the controller can spot stale markers.
    pub fn spawn(queue: Arc<dyn EventQueue>, tx: UnboundedSender<ControllerMsg>, epoch: u64) -> Self {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();
        let handle = std::thread::Builder::new()
            .name("ember-event-pump".to_string())
            .spawn(move || {
                loop {
                    if flag.load(Ordering::Acquire) {
                        break;
                    }
                    match queue.remove() {
                        Ok(set) => {
                            let ends_session = set.events().iter().any(|e| {
                                matches!(e, WireEvent::VmDeath | WireEvent::VmDisconnect)
                            });
                            if tx.send(ControllerMsg::Events { epoch, set }).is_err() {
                                break;
                            }
                            if ends_session {
                                break;
                            }
                        }
                        Err(err) if err.is_disconnect() => {
                            let _ = tx.send(ControllerMsg::PumpDisconnected { epoch });
                            break;
                        }
                        Err(err) => {
                            // Fail closed: the controller observes the
                            // disconnect marker and tears the session down.
                            error!(%err, "event pump failed");
                            let _ = tx.send(ControllerMsg::PumpDisconnected { epoch });
                            break;
                        }
                    }
                }
                flag.store(true, Ordering::Release);
                debug!("event pump finished");
            })
            .expect("failed to spawn event pump thread");
        Self {
            handle: Some(handle),
            finished,
        }
    }

    /// Mark the pump finished; it stops before its next blocking read. A
    /// pump parked inside `remove()` exits when the disposed connection
    /// reports the disconnect.
    pub fn finish(&self) {
        self.finished.store(true, Ordering::Release);
    }
}

impl Drop for EventPump {
    fn drop(&mut self) {
        self.finish();
        drop(self.handle.take());
    }
}
