//! Debug controller - the single-consumer mailbox actor that owns the
//! session slot.
//!
//! Requests and target events arrive as messages on one channel and are
//! processed on one dedicated thread, so every mutation of the breakpoint
//! registry, the session, and the identity cache is serialized. The workers
//! a session spawns (event pump, output relays) only send messages here.
//!
//! Worker messages carry the epoch of the session that produced them; a
//! marker from a disposed session arriving after its replacement started is
//! recognized as stale and dropped instead of tearing the new session down.

use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;

use ember_wire::{
    Connector, EventSet, StepDepth, ThreadId, ThreadReference, WireError, WireEvent,
    WireLocation, WireValue,
};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::breakpoints::BreakpointRegistry;
use crate::config::DebugConfig;
use crate::marshal;
use crate::protocol::{
    BacktraceInfo, Breakpoint, DebugEvent, DebugLocation, DebugRequest, DebugResponse,
    DebugValue, SourcePosition, StackFrameInfo, StackLocal,
};
use crate::relay::OutputStream;
use crate::session::TargetSession;
use crate::source_map::SourceMap;

// ── Mailbox ──────────────────────────────────────────────────────────────────

/// Everything the controller thread consumes.
pub(crate) enum ControllerMsg {
    /// A client request with its reply slot.
    Request {
        request: DebugRequest,
        reply: oneshot::Sender<DebugResponse>,
    },
    /// An event set forwarded by the pump.
    Events { epoch: u64, set: Box<dyn EventSet> },
    /// The pump's event queue reported the connection gone.
    PumpDisconnected { epoch: u64 },
    /// A chunk of target output from a relay.
    Output {
        epoch: u64,
        stream: OutputStream,
        text: String,
    },
    /// Dispose the session and stop the controller.
    Shutdown,
}

// ── Controller state ─────────────────────────────────────────────────────────

enum SessionState {
    NoSession,
    Active(TargetSession),
}

/// The debug controller. Construct with [`DebugController::spawn`]; interact
/// through the returned [`ControllerHandle`].
pub struct DebugController {
    config: DebugConfig,
    connector: Arc<dyn Connector>,
    source_map: SourceMap,
    breakpoints: BreakpointRegistry,
    state: SessionState,
    /// Bumped for every new session; stale worker messages carry older values.
    epoch: u64,
    events: mpsc::UnboundedSender<DebugEvent>,
    tx: mpsc::UnboundedSender<ControllerMsg>,
}

/// Client-side handle to a running controller.
///
/// Dropping the handle asks the controller to shut down without waiting;
/// [`ControllerHandle::shutdown`] waits for the thread to exit.
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<ControllerMsg>,
    join: Option<JoinHandle<()>>,
}

impl ControllerHandle {
    /// Send a request and await its reply.
    ///
    /// Returns the generic failure reply if the controller is gone.
    pub async fn request(&self, request: DebugRequest) -> DebugResponse {
        let (reply, rx) = oneshot::channel();
        if self
            .tx
            .send(ControllerMsg::Request { request, reply })
            .is_err()
        {
            return DebugResponse::ack(false);
        }
        rx.await.unwrap_or(DebugResponse::Ack { success: false })
    }

    /// Blocking variant of [`ControllerHandle::request`] for synchronous
    /// callers. Must not be called from an async context.
    pub fn blocking_request(&self, request: DebugRequest) -> DebugResponse {
        let (reply, rx) = oneshot::channel();
        if self
            .tx
            .send(ControllerMsg::Request { request, reply })
            .is_err()
        {
            return DebugResponse::ack(false);
        }
        rx.blocking_recv()
            .unwrap_or(DebugResponse::Ack { success: false })
    }

    /// Returns `true` while the controller thread is accepting messages.
    pub fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Dispose any session, stop the controller, and wait for its thread.
    pub fn shutdown(mut self) {
        let _ = self.tx.send(ControllerMsg::Shutdown);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for ControllerHandle {
    fn drop(&mut self) {
        let _ = self.tx.send(ControllerMsg::Shutdown);
    }
}

// ── Controller loop ──────────────────────────────────────────────────────────

impl DebugController {
    /// Start a controller on its own thread.
    ///
    /// `events` is the broadcaster the controller emits [`DebugEvent`]s to
    /// for the lifetime of the controller.
    pub fn spawn(
        config: DebugConfig,
        connector: Arc<dyn Connector>,
        events: mpsc::UnboundedSender<DebugEvent>,
    ) -> ControllerHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let source_map = SourceMap::from_config(&config);
        let controller = DebugController {
            config,
            connector,
            source_map,
            breakpoints: BreakpointRegistry::new(),
            state: SessionState::NoSession,
            epoch: 0,
            events,
            tx: tx.clone(),
        };
        let join = std::thread::Builder::new()
            .name("ember-debug-controller".to_string())
            .spawn(move || controller.run(rx))
            .expect("failed to spawn controller thread");
        ControllerHandle {
            tx,
            join: Some(join),
        }
    }

    fn run(mut self, mut rx: mpsc::UnboundedReceiver<ControllerMsg>) {
        while let Some(msg) = rx.blocking_recv() {
            match msg {
                ControllerMsg::Request { request, reply } => {
                    let response = self.handle_request(request);
                    let _ = reply.send(response);
                }
                ControllerMsg::Events { epoch, set } => {
                    if epoch == self.epoch {
                        self.handle_event_set(set);
                    } else {
                        debug!(epoch, current = self.epoch, "dropping stale event set");
                    }
                }
                ControllerMsg::PumpDisconnected { epoch } => {
                    if epoch == self.epoch {
                        self.disconnect("event queue closed");
                    }
                }
                ControllerMsg::Output { epoch, stream, text } => {
                    if epoch == self.epoch {
                        debug!(?stream, bytes = text.len(), "target output");
                        self.emit(DebugEvent::Output { text });
                    }
                }
                ControllerMsg::Shutdown => {
                    self.disconnect("controller shutdown");
                    break;
                }
            }
        }
        debug!("controller stopped");
    }

    // ── Requests ────────────────────────────────────────────────────────────

    fn handle_request(&mut self, request: DebugRequest) -> DebugResponse {
        match request {
            DebugRequest::Start { command } => {
                self.disconnect("replaced by new launch");
                self.epoch += 1;
                match TargetSession::launch(
                    &self.config,
                    &self.connector,
                    &command,
                    &self.tx,
                    self.epoch,
                ) {
                    Ok(session) => {
                        self.state = SessionState::Active(session);
                        self.retry_pending();
                        DebugResponse::Ok
                    }
                    Err(err) => {
                        warn!(%err, "launch failed");
                        DebugResponse::error(1, err.to_string())
                    }
                }
            }
            DebugRequest::Attach { host, port } => {
                self.disconnect("replaced by new attach");
                self.epoch += 1;
                match TargetSession::attach(&self.connector, &host, port, &self.tx, self.epoch) {
                    Ok(session) => {
                        self.state = SessionState::Active(session);
                        self.retry_pending();
                        DebugResponse::Ok
                    }
                    Err(err) => {
                        warn!(%err, "attach failed");
                        DebugResponse::error(1, err.to_string())
                    }
                }
            }
            DebugRequest::Stop => {
                if matches!(self.state, SessionState::NoSession) {
                    return DebugResponse::ack(false);
                }
                self.disconnect("stopped by client");
                DebugResponse::ack(true)
            }
            DebugRequest::ActiveVm => {
                DebugResponse::ack(matches!(self.state, SessionState::Active(_)))
            }

            DebugRequest::SetBreakpoint { file, line } => {
                let bp = Breakpoint::new(self.source_map.resolve_or_raw(&file), line);
                let installed = match &mut self.state {
                    SessionState::Active(session) => session.set_breakpoint(&bp.file, bp.line),
                    SessionState::NoSession => false,
                };
                if installed {
                    self.breakpoints.add_active(bp);
                } else {
                    self.breakpoints.add_pending(bp);
                    self.emit(DebugEvent::Background {
                        text: "Location not loaded. Set pending breakpoint.".to_string(),
                    });
                }
                DebugResponse::Ok
            }
            DebugRequest::ClearBreakpoint { file, line } => {
                let bp = Breakpoint::new(self.source_map.resolve_or_raw(&file), line);
                self.breakpoints.remove(&bp);
                if let SessionState::Active(session) = &self.state {
                    session.clear_breakpoints(std::slice::from_ref(&bp));
                }
                DebugResponse::Ok
            }
            DebugRequest::ClearAllBreakpoints => {
                self.breakpoints.clear();
                if let SessionState::Active(session) = &self.state {
                    session.clear_all_breakpoints();
                }
                DebugResponse::Ok
            }
            DebugRequest::ListBreakpoints => {
                let (active, pending) = self.breakpoints.list();
                DebugResponse::Breakpoints { active, pending }
            }

            // Both forms resume the whole machine; there is no per-thread
            // resume primitive.
            DebugRequest::Run | DebugRequest::Continue { .. } => {
                let result = match &self.state {
                    SessionState::Active(session) => session.resume(),
                    SessionState::NoSession => return DebugResponse::ack(false),
                };
                match result {
                    Ok(()) => DebugResponse::ack(true),
                    Err(err) => self.fail(err),
                }
            }
            DebugRequest::Next { thread_id } => self.handle_step(thread_id, StepDepth::Over),
            DebugRequest::Step { thread_id } => self.handle_step(thread_id, StepDepth::Into),
            DebugRequest::StepOut { thread_id } => self.handle_step(thread_id, StepDepth::Out),

            DebugRequest::LocateName { thread_id, name } => {
                let outcome = {
                    let SessionState::Active(session) = &mut self.state else {
                        return DebugResponse::ack(false);
                    };
                    locate_name(session, thread_id, &name)
                };
                match outcome {
                    Ok(location) => DebugResponse::Location { location },
                    Err(err) => self.fail(err),
                }
            }
            DebugRequest::Value { location } => {
                let outcome = {
                    let SessionState::Active(session) = &mut self.state else {
                        return DebugResponse::ack(false);
                    };
                    read_value(session, &location)
                };
                match outcome {
                    Ok(value) => DebugResponse::Value { value },
                    Err(err) => self.fail(err),
                }
            }
            DebugRequest::ToString {
                thread_id,
                location,
            } => {
                let outcome = {
                    let SessionState::Active(session) = &mut self.state else {
                        return DebugResponse::ack(false);
                    };
                    render_to_string(session, thread_id, &location)
                };
                match outcome {
                    Ok(text) => DebugResponse::Text { text },
                    Err(err) => self.fail(err),
                }
            }
            DebugRequest::SetValue { location, text } => match location {
                DebugLocation::Slot {
                    thread_id,
                    frame,
                    offset,
                } => {
                    let outcome = {
                        let SessionState::Active(session) = &mut self.state else {
                            return DebugResponse::ack(false);
                        };
                        write_slot(session, thread_id, frame, offset, &text)
                    };
                    match outcome {
                        Ok(success) => DebugResponse::ack(success),
                        Err(err) => self.fail(err),
                    }
                }
                other => {
                    warn!(location = ?other, "set-value supports stack slots only");
                    DebugResponse::ack(false)
                }
            },
            DebugRequest::Backtrace {
                thread_id,
                start,
                count,
            } => {
                let outcome = {
                    let SessionState::Active(session) = &mut self.state else {
                        return DebugResponse::ack(false);
                    };
                    build_backtrace(session, &self.source_map, thread_id, start, count)
                };
                match outcome {
                    Ok(Some(backtrace)) => DebugResponse::Backtrace { backtrace },
                    Ok(None) => DebugResponse::ack(false),
                    Err(err) => self.fail(err),
                }
            }
        }
    }

    fn handle_step(&mut self, thread_id: ThreadId, depth: StepDepth) -> DebugResponse {
        let outcome = {
            let SessionState::Active(session) = &mut self.state else {
                return DebugResponse::ack(false);
            };
            match session.thread_by_id(thread_id) {
                Ok(Some(thread)) => session.step(&thread, depth).map(|()| true),
                Ok(None) => {
                    warn!(thread_id, "step requested for unknown thread");
                    Ok(false)
                }
                Err(err) => Err(err),
            }
        };
        match outcome {
            Ok(success) => DebugResponse::ack(success),
            Err(err) => self.fail(err),
        }
    }

    // Re-install every pending breakpoint whose class is already loaded.
    // Launch-mode sessions have no classes yet, so this only bites for
    // attach mode and for breakpoints set between sessions.
    fn retry_pending(&mut self) {
        for bp in self.breakpoints.pending() {
            let installed = {
                let SessionState::Active(session) = &mut self.state else {
                    return;
                };
                session.set_breakpoint(&bp.file, bp.line)
            };
            if installed {
                self.breakpoints.promote(&bp);
            }
        }
    }

    // ── Target events ───────────────────────────────────────────────────────

    fn handle_event_set(&mut self, set: Box<dyn EventSet>) {
        if matches!(self.state, SessionState::NoSession) {
            return;
        }
        let events = set.events();
        // Sets that suspended the target for the user stay suspended; the
        // client decides when to resume.
        let user_facing = events.iter().any(|e| {
            matches!(
                e,
                WireEvent::Breakpoint { .. } | WireEvent::Step { .. } | WireEvent::Exception { .. }
            )
        });
        let mut machine_resumed = false;
        let mut session_ended = false;

        for event in events {
            match event {
                WireEvent::VmStart => {
                    machine_resumed = true;
                    let outcome = {
                        let SessionState::Active(session) = &mut self.state else {
                            continue;
                        };
                        session.init_location_map().and_then(|()| session.resume())
                    };
                    match outcome {
                        Ok(()) => self.emit(DebugEvent::VmStart),
                        Err(err) if err.is_disconnect() => {
                            self.disconnect("target disconnected during startup");
                            session_ended = true;
                        }
                        Err(err) => warn!(%err, "vm start handling failed"),
                    }
                }
                WireEvent::VmDeath => {
                    self.disconnect("target terminated");
                    session_ended = true;
                }
                WireEvent::VmDisconnect => {
                    self.disconnect("target disconnected");
                    session_ended = true;
                }
                WireEvent::ClassPrepare { class } => {
                    let retry = {
                        let SessionState::Active(session) = &mut self.state else {
                            continue;
                        };
                        match session.register_class(class) {
                            Some(key) => self.breakpoints.pending_for(&key),
                            None => Vec::new(),
                        }
                    };
                    for bp in retry {
                        let installed = {
                            let SessionState::Active(session) = &mut self.state else {
                                break;
                            };
                            session.set_breakpoint(&bp.file, bp.line)
                        };
                        if installed {
                            info!(breakpoint = %bp, "pending breakpoint resolved");
                            self.breakpoints.promote(&bp);
                        }
                    }
                }
                WireEvent::Breakpoint { thread, location } => {
                    match self.event_position(&location) {
                        Some(position) => self.emit(DebugEvent::Break {
                            thread_id: thread.unique_id(),
                            thread_name: thread.name(),
                            file: position.file,
                            line: position.line,
                        }),
                        None => {
                            warn!(%location, "breakpoint event without a resolvable position");
                        }
                    }
                }
                WireEvent::Step { thread, location } => match self.event_position(&location) {
                    Some(position) => self.emit(DebugEvent::Step {
                        thread_id: thread.unique_id(),
                        thread_name: thread.name(),
                        file: position.file,
                        line: position.line,
                    }),
                    None => {
                        warn!(%location, "step event without a resolvable position");
                    }
                },
                WireEvent::Exception {
                    thread,
                    exception,
                    catch_location,
                } => {
                    let exception_id = {
                        let SessionState::Active(session) = &mut self.state else {
                            continue;
                        };
                        session
                            .objects()
                            .remember(&WireValue::Object(exception))
                            .unwrap_or(-1)
                    };
                    let position = catch_location
                        .as_ref()
                        .and_then(|loc| self.event_position(loc));
                    self.emit(DebugEvent::Exception {
                        exception_id,
                        thread_id: thread.unique_id(),
                        thread_name: thread.name(),
                        file: position.as_ref().map(|p| p.file.clone()),
                        line: position.map(|p| p.line),
                    });
                }
                WireEvent::ThreadStart { thread } => {
                    self.emit(DebugEvent::ThreadStart {
                        thread_id: thread.unique_id(),
                    });
                }
                WireEvent::ThreadDeath { thread } => {
                    self.emit(DebugEvent::ThreadDeath {
                        thread_id: thread.unique_id(),
                    });
                }
            }
        }

        if !user_facing && !machine_resumed && !session_ended {
            if let Err(err) = set.resume() {
                if err.is_disconnect() {
                    self.disconnect("target disconnected on resume");
                }
            }
        }
    }

    // Resolve a wire position to a project source position; `None` when the
    // class has no usable source information.
    fn event_position(&self, location: &WireLocation) -> Option<SourcePosition> {
        let name = location.source_name.as_deref()?;
        let line = location.line?;
        Some(SourcePosition {
            file: self.source_map.resolve_or_raw(Path::new(name)),
            line,
        })
    }

    // ── Session teardown ────────────────────────────────────────────────────

    /// End any active session: demote its breakpoints, dispose the
    /// connection, and announce the disconnect. No-op in `NoSession`.
    fn disconnect(&mut self, reason: &str) {
        let state = std::mem::replace(&mut self.state, SessionState::NoSession);
        if let SessionState::Active(mut session) = state {
            info!(reason, "debug session ended");
            self.breakpoints.demote_all();
            session.dispose();
            self.emit(DebugEvent::Disconnect);
        }
    }

    // Convert a wire error into the generic failure reply, ending the
    // session first when the error is a disconnect.
    fn fail(&mut self, err: WireError) -> DebugResponse {
        if err.is_disconnect() {
            self.disconnect("target disconnected during request");
        } else {
            warn!(%err, "request failed");
        }
        DebugResponse::ack(false)
    }

    fn emit(&self, event: DebugEvent) {
        let _ = self.events.send(event);
    }
}

// ── Inspection helpers ───────────────────────────────────────────────────────
//
// Free functions so the borrow of the session stays local to each request
// arm; all of them propagate only wire errors (the disconnect path) and fold
// everything else into their "not found" result.

fn locate_name(
    session: &mut TargetSession,
    thread_id: ThreadId,
    name: &str,
) -> Result<Option<DebugLocation>, WireError> {
    let Some(thread) = session.thread_by_id(thread_id)? else {
        warn!(thread_id, "locate-name for unknown thread");
        return Ok(None);
    };
    if name == "this" {
        let frame = thread.frame(0)?;
        let Some(this) = frame.this_object() else {
            return Ok(None);
        };
        let object_id = this.unique_id();
        session.objects().remember(&WireValue::Object(this));
        return Ok(Some(DebugLocation::Reference { object_id }));
    }

    // Visible variables, innermost frame outward; first match wins.
    let frames = thread.frame_count()?;
    for index in 0..frames {
        let frame = thread.frame(index)?;
        let Ok(variables) = frame.visible_variables() else {
            continue;
        };
        if let Some(offset) = variables.iter().position(|v| v.name == name) {
            return Ok(Some(DebugLocation::Slot {
                thread_id,
                frame: index as u32,
                offset: offset as u32,
            }));
        }
    }

    // Fields of the top frame's `this`, walking the superclass chain.
    let frame = thread.frame(0)?;
    let Some(this) = frame.this_object() else {
        return Ok(None);
    };
    let mut class = Some(this.reference_type());
    while let Some(current) = class {
        if current.fields().iter().any(|f| f.name == name) {
            let object_id = this.unique_id();
            session.objects().remember(&WireValue::Object(this));
            return Ok(Some(DebugLocation::Field {
                object_id,
                name: name.to_string(),
            }));
        }
        class = current.superclass();
    }
    Ok(None)
}

fn read_value(
    session: &mut TargetSession,
    location: &DebugLocation,
) -> Result<Option<DebugValue>, WireError> {
    let Some(value) = resolve_location(session, location)? else {
        return Ok(None);
    };
    Ok(Some(marshal::marshal(&value, session.objects())))
}

// Dereference a debug location to the wire value behind it. Resolution
// failures (stale ids, missing fields, out-of-range indexes) are `None`.
fn resolve_location(
    session: &mut TargetSession,
    location: &DebugLocation,
) -> Result<Option<WireValue>, WireError> {
    match location {
        DebugLocation::Reference { object_id } => Ok(session.objects().lookup(*object_id)),
        DebugLocation::Field { object_id, name } => {
            let Some(value) = session.objects().lookup(*object_id) else {
                return Ok(None);
            };
            let Some(object) = value.as_object() else {
                return Ok(None);
            };
            if let Some(field) = object.get_field(name) {
                return Ok(Some(field));
            }
            // Not an instance field; try statics up the declaring chain.
            let mut class = Some(object.reference_type());
            while let Some(current) = class {
                if let Some(field) = current.get_static(name) {
                    return Ok(Some(field));
                }
                class = current.superclass();
            }
            Ok(None)
        }
        DebugLocation::Element { object_id, index } => {
            let Some(value) = session.objects().lookup(*object_id) else {
                return Ok(None);
            };
            match value {
                WireValue::Array(array) if (*index as usize) < array.length() => {
                    Ok(array.get_values(*index as usize, 1)?.into_iter().next())
                }
                _ => Ok(None),
            }
        }
        DebugLocation::Slot {
            thread_id,
            frame,
            offset,
        } => {
            let Some(thread) = session.thread_by_id(*thread_id)? else {
                return Ok(None);
            };
            if *frame as usize >= thread.frame_count()? {
                return Ok(None);
            }
            let frame = thread.frame(*frame as usize)?;
            let Ok(variables) = frame.visible_variables() else {
                return Ok(None);
            };
            let Some(variable) = variables.get(*offset as usize) else {
                return Ok(None);
            };
            frame.get_value(variable).map(Some)
        }
    }
}

fn render_to_string(
    session: &mut TargetSession,
    thread_id: ThreadId,
    location: &DebugLocation,
) -> Result<Option<String>, WireError> {
    let Some(value) = resolve_location(session, location)? else {
        return Ok(None);
    };
    session.objects().remember(&value);
    match &value {
        WireValue::Array(array) => {
            let len = array.length();
            let suffix = if len == 1 { "" } else { "s" };
            Ok(Some(format!("<array of {len} element{suffix}>")))
        }
        WireValue::String(string) => Ok(Some(string.value())),
        WireValue::Object(object) => {
            if !session.vm().can_be_modified() {
                info!("read-only target; toString not invoked");
                return Ok(None);
            }
            let Some(thread) = session.thread_by_id(thread_id)? else {
                warn!(thread_id, "toString requested for unknown thread");
                return Ok(None);
            };
            match object.invoke_method(&thread, "toString", &[], true) {
                Ok(WireValue::String(result)) => Ok(Some(result.value())),
                Ok(other) => Ok(Some(marshal::summary(&other))),
                Err(err) if err.is_disconnect() => Err(err),
                Err(err) => {
                    warn!(%err, "toString invocation failed");
                    Ok(None)
                }
            }
        }
        other => Ok(Some(marshal::summary(other))),
    }
}

fn write_slot(
    session: &mut TargetSession,
    thread_id: ThreadId,
    frame_index: u32,
    offset: u32,
    text: &str,
) -> Result<bool, WireError> {
    let Some(thread) = session.thread_by_id(thread_id)? else {
        warn!(thread_id, "set-value for unknown thread");
        return Ok(false);
    };
    if frame_index as usize >= thread.frame_count()? {
        return Ok(false);
    }
    let frame = thread.frame(frame_index as usize)?;
    let Ok(variables) = frame.visible_variables() else {
        return Ok(false);
    };
    let Some(variable) = variables.get(offset as usize) else {
        return Ok(false);
    };
    let value = match marshal::parse_value(session.vm(), &variable.type_name, text) {
        Ok(value) => value,
        Err(err) if err.is_disconnect() => return Err(err),
        Err(err) => {
            warn!(%err, "could not parse value text");
            return Ok(false);
        }
    };
    match frame.set_value(variable, value) {
        Ok(()) => Ok(true),
        Err(err) if err.is_disconnect() => Err(err),
        Err(err) => {
            warn!(%err, "could not write stack slot");
            Ok(false)
        }
    }
}

fn build_backtrace(
    session: &mut TargetSession,
    source_map: &SourceMap,
    thread_id: ThreadId,
    start: u32,
    count: i32,
) -> Result<Option<BacktraceInfo>, WireError> {
    let Some(thread) = session.thread_by_id(thread_id)? else {
        warn!(thread_id, "backtrace for unknown thread");
        return Ok(None);
    };
    let total = thread.frame_count()?;
    let start = start as usize;
    let end = if count < 0 {
        total
    } else {
        total.min(start.saturating_add(count as usize))
    };
    let mut frames = Vec::new();
    for index in start..end {
        frames.push(render_frame(session, source_map, &thread, index)?);
    }
    Ok(Some(BacktraceInfo {
        frames,
        thread_id,
        thread_name: thread.name(),
    }))
}

// Best-effort frame rendering: any per-field failure substitutes a sentinel
// instead of failing the whole frame. Disconnects still propagate.
fn render_frame(
    session: &mut TargetSession,
    source_map: &SourceMap,
    thread: &Arc<dyn ThreadReference>,
    index: usize,
) -> Result<StackFrameInfo, WireError> {
    let frame = match thread.frame(index) {
        Ok(frame) => frame,
        Err(err) if err.is_disconnect() => return Err(err),
        Err(_) => return Ok(sentinel_frame(index)),
    };

    let (class_name, method_name, source) = match frame.location() {
        Ok(location) => {
            let source = location.source_name.as_deref().and_then(|name| {
                location.line.map(|line| SourcePosition {
                    file: source_map.resolve_or_raw(Path::new(name)),
                    line,
                })
            });
            (location.type_name, location.method_name, source)
        }
        Err(err) if err.is_disconnect() => return Err(err),
        Err(_) => ("Class".to_string(), "Method".to_string(), None),
    };

    let locals = match frame.visible_variables() {
        Ok(variables) => {
            let mut locals = Vec::with_capacity(variables.len());
            for (i, variable) in variables.iter().enumerate() {
                let summary = match frame.get_value(variable) {
                    Ok(value) => {
                        session.objects().remember(&value);
                        marshal::summary(&value)
                    }
                    Err(err) if err.is_disconnect() => return Err(err),
                    Err(_) => marshal::UNREADABLE.to_string(),
                };
                locals.push(StackLocal {
                    index: i as i32,
                    name: variable.name.clone(),
                    summary,
                    type_name: variable.type_name.clone(),
                });
            }
            locals
        }
        Err(err) if err.is_disconnect() => return Err(err),
        Err(_) => Vec::new(),
    };

    let num_args = match frame.argument_values() {
        Ok(args) => args.len() as u32,
        Err(err) if err.is_disconnect() => return Err(err),
        Err(_) => 0,
    };

    let this_object_id = match frame.this_object() {
        Some(this) => {
            let value = WireValue::Object(this);
            session.objects().remember(&value).unwrap_or(-1)
        }
        None => -1,
    };

    Ok(StackFrameInfo {
        index: index as u32,
        locals,
        num_args,
        class_name,
        method_name,
        source,
        this_object_id,
    })
}

fn sentinel_frame(index: usize) -> StackFrameInfo {
    StackFrameInfo {
        index: index as u32,
        locals: Vec::new(),
        num_args: 0,
        class_name: "Class".to_string(),
        method_name: "Method".to_string(),
        source: None,
        this_object_id: -1,
    }
}
