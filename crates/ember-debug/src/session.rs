//! Target session - the live connection to a target machine.
//!
//! Owns the wire handle, the event pump, the output relays (launch mode
//! only), the location resolver, and the identity cache. All methods run on
//! the controller thread; the workers the session spawns communicate with
//! the controller exclusively through its mailbox.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ember_wire::{
    Connector, LaunchOptions, ReferenceType, StepDepth, StepStride, SuspendPolicy,
    ThreadId, ThreadReference, VirtualMachine, WireError, WireLocation,
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::config::DebugConfig;
use crate::controller::ControllerMsg;
use crate::locations::LocationResolver;
use crate::objects::ObjectRegistry;
use crate::protocol::Breakpoint;
use crate::pump::EventPump;
use crate::relay::{OutputRelay, OutputStream};
use crate::source_map::short_name;

/// One live debug session. At most one exists per controller.
pub(crate) struct TargetSession {
    vm: Arc<dyn VirtualMachine>,
    resolver: LocationResolver,
    objects: ObjectRegistry,
    pump: EventPump,
    relays: Vec<OutputRelay>,
    shutdown: Arc<AtomicBool>,
}

impl TargetSession {
    /// Launch a new target process, suspended so breakpoints can be
    /// installed before user code runs, and spawn its output relays.
    pub fn launch(
        config: &DebugConfig,
        connector: &Arc<dyn Connector>,
        command: &str,
        tx: &UnboundedSender<ControllerMsg>,
        epoch: u64,
    ) -> Result<Self, WireError> {
        let options = LaunchOptions {
            command: command.to_string(),
            classpath: config.classpath.clone(),
            vm_args: config.vm_args.clone(),
            suspend: true,
        };
        let vm = connector.launch(&options)?;
        let mut session = Self::from_vm(vm, tx, epoch)?;
        if let Some(stdout) = session.vm.take_stdout() {
            session.relays.push(OutputRelay::spawn(
                OutputStream::Stdout,
                stdout,
                tx.clone(),
                session.shutdown.clone(),
                epoch,
            ));
        }
        if let Some(stderr) = session.vm.take_stderr() {
            session.relays.push(OutputRelay::spawn(
                OutputStream::Stderr,
                stderr,
                tx.clone(),
                session.shutdown.clone(),
                epoch,
            ));
        }
        info!(command, "launched debug target");
        Ok(session)
    }

    /// Attach to a running target. No output relays; the location map is
    /// seeded eagerly because the target's classes are already loaded, and
    /// the resume is a no-op if the remote is already running.
    pub fn attach(
        connector: &Arc<dyn Connector>,
        host: &str,
        port: u16,
        tx: &UnboundedSender<ControllerMsg>,
        epoch: u64,
    ) -> Result<Self, WireError> {
        let vm = connector.attach(host, port)?;
        let mut session = Self::from_vm(vm, tx, epoch)?;
        session.init_location_map()?;
        session.vm.resume()?;
        info!(host, port, "attached to debug target");
        Ok(session)
    }

    // Standing event requests plus the pump; shared by both modes.
    fn from_vm(
        vm: Arc<dyn VirtualMachine>,
        tx: &UnboundedSender<ControllerMsg>,
        epoch: u64,
    ) -> Result<Self, WireError> {
        let manager = vm.request_manager();
        manager.create_class_prepare(SuspendPolicy::All).enable();
        manager.create_thread_start(SuspendPolicy::None).enable();
        manager.create_thread_death(SuspendPolicy::None).enable();
        manager
            .create_exception(false, true, SuspendPolicy::All)
            .enable();
        let pump = EventPump::spawn(vm.event_queue(), tx.clone(), epoch);
        Ok(Self {
            vm,
            resolver: LocationResolver::new(),
            objects: ObjectRegistry::new(),
            pump,
            relays: Vec::new(),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Register every currently loaded class with the location resolver.
    pub fn init_location_map(&mut self) -> Result<(), WireError> {
        for class in self.vm.all_classes()? {
            self.resolver.register(class);
        }
        Ok(())
    }

    /// Register one newly prepared class. Returns the file key it landed
    /// under, if it has source information.
    pub fn register_class(&mut self, class: Arc<dyn ReferenceType>) -> Option<String> {
        self.resolver.register(class)
    }

    /// Install a breakpoint at every concrete location for `file:line`.
    ///
    /// Returns `true` iff at least one wire request was installed.
    pub fn set_breakpoint(&mut self, file: &Path, line: u32) -> bool {
        let locations = self.resolver.locations(file, line);
        let manager = self.vm.request_manager();
        let mut installed = false;
        for location in &locations {
            let request = manager.create_breakpoint(location, SuspendPolicy::All);
            request.enable();
            installed = true;
        }
        if installed {
            debug!(file = %file.display(), line, requests = locations.len(), "breakpoint installed");
        }
        installed
    }

    /// Disable every wire request whose resolved position matches one of the
    /// given breakpoints.
    pub fn clear_breakpoints(&self, breakpoints: &[Breakpoint]) {
        for request in self.vm.request_manager().breakpoint_requests() {
            let Some(location) = request.location() else {
                continue;
            };
            if breakpoints.iter().any(|bp| location_matches(&location, bp)) {
                request.disable();
            }
        }
    }

    /// Disable every breakpoint request in the target.
    pub fn clear_all_breakpoints(&self) {
        for request in self.vm.request_manager().breakpoint_requests() {
            request.disable();
        }
    }

    /// Replace any outstanding step with a fresh line-step for the thread,
    /// then resume. Only one step request ever exists at a time.
    pub fn step(
        &self,
        thread: &Arc<dyn ThreadReference>,
        depth: StepDepth,
    ) -> Result<(), WireError> {
        let manager = self.vm.request_manager();
        manager.delete_step_requests();
        let request = manager.create_step(thread, StepStride::Line, depth, SuspendPolicy::All);
        request.set_count_filter(1);
        request.enable();
        self.vm.resume()
    }

    /// Resume the whole target.
    pub fn resume(&self) -> Result<(), WireError> {
        self.vm.resume()
    }

    /// Find a live thread by target id.
    pub fn thread_by_id(
        &self,
        id: ThreadId,
    ) -> Result<Option<Arc<dyn ThreadReference>>, WireError> {
        Ok(self
            .vm
            .all_threads()?
            .into_iter()
            .find(|t| t.unique_id() == id))
    }

    pub fn vm(&self) -> &Arc<dyn VirtualMachine> {
        &self.vm
    }

    pub fn objects(&mut self) -> &mut ObjectRegistry {
        &mut self.objects
    }

    /// Tear the session down: stop the workers, drop cached handles, and
    /// release the connection. Safe on an already-disconnected target.
    pub fn dispose(&mut self) {
        self.pump.finish();
        self.shutdown.store(true, Ordering::Release);
        for relay in &self.relays {
            relay.finish();
        }
        self.objects.clear();
        self.vm.dispose();
        debug!("session disposed");
    }
}

impl std::fmt::Debug for TargetSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetSession")
            .field("resolver", &self.resolver)
            .field("objects", &self.objects)
            .field("relays", &self.relays.len())
            .finish()
    }
}

// A wire request position matches a breakpoint when the short source name
// and line agree.
fn location_matches(location: &WireLocation, bp: &Breakpoint) -> bool {
    location.line == Some(bp.line)
        && location.source_name.as_deref() == Some(short_name(&bp.file).as_str())
}
