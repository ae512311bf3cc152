//! Main engine orchestrator.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, error, info, instrument, warn};

use mfcapture_ipc::{
    ActiveCapture, CaptureConfig, EngineCommand, EngineEvent, EngineState, StopReason,
};

use crate::backend::CaptureBackend;
use crate::controller::Controller;
use crate::error::EngineError;

/// How long the loop waits for a command before running periodic checks.
pub const COMMAND_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How often the device list is refreshed while capturing.
pub const DEVICE_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Reported when finalizing the output fails.
pub const STOP_ERROR_MESSAGE: &str = "Error stopping capture - file might be corrupt";

/// The capture engine.
pub struct Engine<B: CaptureBackend> {
    command_rx: Receiver<EngineCommand>,
    event_tx: Sender<EngineEvent>,
    backend: B,
    controller: Controller,
    state: EngineState,
    max_duration: Option<Duration>,
    capture_started: Option<Instant>,
    device_check_interval: Duration,
    last_device_check: Instant,
}

impl<B: CaptureBackend> Engine<B> {
    /// Create a new engine.
    pub fn new(
        command_rx: Receiver<EngineCommand>,
        event_tx: Sender<EngineEvent>,
        backend: B,
        config: CaptureConfig,
    ) -> Self {
        Self {
            command_rx,
            event_tx,
            backend,
            controller: Controller::new(&config),
            state: EngineState::Idle,
            max_duration: config.max_duration,
            capture_started: None,
            device_check_interval: DEVICE_CHECK_INTERVAL,
            last_device_check: Instant::now(),
        }
    }

    pub fn with_device_check_interval(mut self, interval: Duration) -> Self {
        self.device_check_interval = interval;
        self
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Run the engine (blocking).
    #[instrument(name = "engine_run", skip(self))]
    pub fn run(&mut self) {
        info!("Engine starting");
        self.send_event(EngineEvent::Ready);
        self.send_event(EngineEvent::OutputPath(self.controller.output_path().to_string()));

        self.refresh_devices();
        if self.controller.devices().is_empty() {
            self.send_error(true, EngineError::NoDevices.to_string());
        }
        self.send_controls();

        loop {
            match self.command_rx.recv_timeout(COMMAND_POLL_INTERVAL) {
                Ok(command) => {
                    if !self.handle_command(command) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    info!("Command channel disconnected, shutting down");
                    self.stop_capture(StopReason::Shutdown);
                    break;
                }
            }
            self.tick();
        }

        info!("Engine stopped");
    }

    /// Handle a command. Returns false if engine should stop.
    fn handle_command(&mut self, command: EngineCommand) -> bool {
        debug!(?command, "Handling command");

        match command {
            EngineCommand::RefreshDevices => {
                if !self.settings_locked("refresh devices") {
                    self.refresh_devices();
                    self.send_controls();
                }
            }
            EngineCommand::SelectMediaKind(kind) => {
                if !self.settings_locked("change media kind") && self.controller.set_kind(kind) {
                    self.selection_changed();
                }
            }
            EngineCommand::SelectContainer(slot) => {
                if !self.settings_locked("change container") && self.controller.set_slot(slot) {
                    self.selection_changed();
                }
            }
            EngineCommand::SetOutputPath(path) => {
                if !self.settings_locked("change output path") {
                    self.controller.set_output_path(path);
                    self.send_event(EngineEvent::OutputPath(
                        self.controller.output_path().to_string(),
                    ));
                }
            }
            EngineCommand::SelectDevice(index) => {
                if !self.settings_locked("change device") {
                    match self.controller.select_device(index) {
                        Ok(()) => self.send_devices(),
                        Err(e) => self.send_error(true, e.to_string()),
                    }
                }
            }
            EngineCommand::StartCapture => self.start_capture(),
            EngineCommand::StopCapture => self.stop_capture(StopReason::UserRequested),
            EngineCommand::ToggleCapture => {
                if self.state.is_capturing() {
                    self.stop_capture(StopReason::UserRequested);
                } else {
                    self.start_capture();
                }
            }
            EngineCommand::GetState => self.send_state(),
            EngineCommand::Shutdown => {
                self.stop_capture(StopReason::Shutdown);
                self.send_event(EngineEvent::Shutdown);
                return false;
            }
        }

        true
    }

    /// Periodic work between commands.
    fn tick(&mut self) {
        if !self.state.is_capturing() {
            return;
        }

        if let Some(failure) = self.backend.poll_failure() {
            error!(%failure, "Capture failed");
            self.stop_capture(StopReason::CaptureError {
                message: failure.to_string(),
            });
            return;
        }

        if let (Some(max), Some(started)) = (self.max_duration, self.capture_started) {
            if started.elapsed() >= max {
                self.stop_capture(StopReason::DurationElapsed);
                return;
            }
        }

        if self.last_device_check.elapsed() >= self.device_check_interval {
            self.last_device_check = Instant::now();
            self.check_device_lost();
        }
    }

    /// Start capturing the selected device.
    #[instrument(name = "start_capture", skip(self))]
    fn start_capture(&mut self) {
        if self.state.is_capturing() {
            debug!("Already capturing, ignoring start command");
            return;
        }

        let request = match self.controller.request() {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Nothing to capture");
                self.enter_error(e.to_string());
                return;
            }
        };

        info!(
            device = %request.device.name,
            path = %request.output_path,
            format = %request.params.format,
            "Starting capture"
        );

        match self.backend.start(&request) {
            Ok(()) => {
                self.controller.set_capturing(true);
                self.capture_started = Some(Instant::now());
                self.last_device_check = Instant::now();

                self.transition_to(EngineState::Capturing {
                    session: ActiveCapture {
                        device_name: request.device.name,
                        kind: request.device.kind,
                        format: request.params.format,
                        output_path: request.output_path,
                    },
                });
                self.send_controls();
            }
            Err(e) => {
                error!(error = %e, "Capture start failed");
                self.enter_error(e.to_string());
            }
        }
    }

    /// Stop the current capture, finalize its file and re-list the devices.
    #[instrument(name = "stop_capture", skip(self))]
    fn stop_capture(&mut self, reason: StopReason) {
        let path = match &self.state {
            EngineState::Capturing { session } => session.output_path.clone(),
            _ => {
                debug!("Not capturing, ignoring stop command");
                return;
            }
        };

        info!(?reason, "Stopping capture");
        self.transition_to(EngineState::Stopping {
            reason: reason.clone(),
        });

        if let Err(e) = self.backend.stop() {
            error!(error = %e, "Failed to finalize capture");
            self.send_error(true, STOP_ERROR_MESSAGE.to_string());
        }
        self.controller.set_capturing(false);
        self.capture_started = None;

        if reason == StopReason::DeviceLost {
            self.send_event(EngineEvent::DeviceLost);
        }
        let shutting_down = reason == StopReason::Shutdown;
        self.send_event(EngineEvent::CaptureFinished { path, reason });

        if !shutting_down {
            self.refresh_devices();
        }
        self.transition_to(EngineState::Idle);
        self.send_controls();
        info!("Capture stopped");
    }

    /// Re-enumerate and stop if the device being recorded has gone.
    fn check_device_lost(&mut self) {
        let kind = self.controller.kind();
        let devices = match self.backend.enumerate(kind) {
            Ok(devices) => devices,
            Err(e) => {
                warn!(error = %e, "Device check failed");
                return;
            }
        };

        let removed: Vec<String> = self
            .controller
            .devices()
            .iter()
            .filter_map(|d| d.symbolic_link.clone())
            .filter(|link| !devices.iter().any(|d| d.matches_link(link)))
            .collect();
        let changed = !removed.is_empty() || devices.len() != self.controller.devices().len();

        self.controller.set_devices(kind, devices);
        if changed {
            self.send_devices();
        }

        if removed.iter().any(|link| self.backend.is_device_lost(link)) {
            warn!("Capture device removed");
            self.stop_capture(StopReason::DeviceLost);
        }
    }

    fn refresh_devices(&mut self) {
        let kind = self.controller.kind();
        match self.backend.enumerate(kind) {
            Ok(devices) => self.controller.set_devices(kind, devices),
            Err(e) => {
                error!(error = %e, %kind, "Device enumeration failed");
                self.controller.set_devices(kind, Vec::new());
                self.send_error(true, e.to_string());
            }
        }
        self.send_devices();
    }

    fn selection_changed(&mut self) {
        self.send_event(EngineEvent::OutputPath(self.controller.output_path().to_string()));
        self.refresh_devices();
        self.send_controls();
    }

    fn settings_locked(&self, what: &str) -> bool {
        let locked = self.state.is_capturing();
        if locked {
            warn!("Cannot {what} while capturing");
        }
        locked
    }

    fn enter_error(&mut self, message: String) {
        self.transition_to(EngineState::Error {
            message,
            recoverable: true,
        });
        self.send_controls();
    }

    fn send_devices(&self) {
        self.send_event(EngineEvent::Devices {
            kind: self.controller.kind(),
            devices: self.controller.devices().to_vec(),
            selected: self.controller.selected(),
        });
    }

    fn send_controls(&self) {
        self.send_event(EngineEvent::Controls(self.controller.controls()));
    }

    fn send_error(&self, recoverable: bool, message: String) {
        self.send_event(EngineEvent::Error {
            recoverable,
            message,
        });
    }

    fn send_state(&self) {
        let state = self.state.clone();
        self.send_event(EngineEvent::StateChanged {
            previous: Box::new(state.clone()),
            current: Box::new(state),
        });
    }

    fn transition_to(&mut self, new_state: EngineState) {
        let previous = std::mem::replace(&mut self.state, new_state.clone());

        debug!(
            previous = %previous.name(),
            current = %new_state.name(),
            "State transition"
        );

        self.send_event(EngineEvent::StateChanged {
            previous: Box::new(previous),
            current: Box::new(new_state),
        });
    }

    fn send_event(&self, event: EngineEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            warn!("Failed to send event: {}", e);
        }
    }
}

impl<B: CaptureBackend> Drop for Engine<B> {
    fn drop(&mut self) {
        if self.backend.is_capturing() {
            if let Err(e) = self.backend.stop() {
                warn!(error = %e, "Failed to stop capture on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use mfcapture_capture::{is_active_link, CaptureFailure};
    use mfcapture_ipc::{
        command_channel, event_channel, ContainerSlot, DeviceInfo, MediaKind, OutputFormat,
    };

    use super::*;
    use crate::backend::CaptureRequest;
    use crate::EngineResult;

    #[derive(Default)]
    struct FakeState {
        audio: Vec<DeviceInfo>,
        video: Vec<DeviceInfo>,
        enumerated: Vec<MediaKind>,
        active: Option<CaptureRequest>,
        started: Vec<CaptureRequest>,
        stops: usize,
        fail_start: bool,
        fail_stop: bool,
        failures: VecDeque<CaptureFailure>,
        vanish_while_capturing: bool,
    }

    #[derive(Clone, Default)]
    struct FakeBackend(Arc<Mutex<FakeState>>);

    impl FakeBackend {
        fn with_devices(audio: &[&str], video: &[&str]) -> Self {
            let backend = Self::default();
            {
                let mut state = backend.0.lock();
                state.audio = devices(MediaKind::Audio, audio);
                state.video = devices(MediaKind::Video, video);
            }
            backend
        }
    }

    fn devices(kind: MediaKind, names: &[&str]) -> Vec<DeviceInfo> {
        names
            .iter()
            .enumerate()
            .map(|(index, name)| DeviceInfo {
                index,
                name: name.to_string(),
                symbolic_link: Some(format!(r"\\?\{kind}#{name}")),
                kind,
            })
            .collect()
    }

    impl CaptureBackend for FakeBackend {
        fn enumerate(&mut self, kind: MediaKind) -> EngineResult<Vec<DeviceInfo>> {
            let mut state = self.0.lock();
            state.enumerated.push(kind);
            if state.active.is_some() && state.vanish_while_capturing {
                return Ok(Vec::new());
            }
            Ok(match kind {
                MediaKind::Audio => state.audio.clone(),
                MediaKind::Video => state.video.clone(),
            })
        }

        fn start(&mut self, request: &CaptureRequest) -> EngineResult<()> {
            let mut state = self.0.lock();
            if state.fail_start {
                return Err(EngineError::DeviceUnavailable {
                    name: request.device.name.clone(),
                });
            }
            state.active = Some(request.clone());
            state.started.push(request.clone());
            Ok(())
        }

        fn stop(&mut self) -> EngineResult<()> {
            let mut state = self.0.lock();
            if state.active.take().is_some() {
                state.stops += 1;
            }
            if state.fail_stop {
                return Err(EngineError::NoDevices);
            }
            Ok(())
        }

        fn is_capturing(&self) -> bool {
            self.0.lock().active.is_some()
        }

        fn is_device_lost(&self, removed_link: &str) -> bool {
            let state = self.0.lock();
            let active = state.active.as_ref();
            is_active_link(
                active.is_some(),
                active.and_then(|request| request.device.symbolic_link.as_deref()),
                removed_link,
            )
        }

        fn poll_failure(&mut self) -> Option<CaptureFailure> {
            let mut state = self.0.lock();
            if state.active.is_some() {
                state.failures.pop_front()
            } else {
                None
            }
        }
    }

    fn run_with(
        backend: &FakeBackend,
        config: CaptureConfig,
        device_check: Duration,
        commands: Vec<EngineCommand>,
    ) -> Vec<EngineEvent> {
        let (command_tx, command_rx) = command_channel();
        let (event_tx, event_rx) = event_channel();
        for command in commands {
            command_tx.send(command).unwrap();
        }
        command_tx.send(EngineCommand::Shutdown).unwrap();

        let mut engine = Engine::new(command_rx, event_tx, backend.clone(), config)
            .with_device_check_interval(device_check);
        engine.run();
        assert!(engine.state().is_idle() || engine.state().is_error());

        event_rx.try_iter().collect()
    }

    fn run(backend: &FakeBackend, commands: Vec<EngineCommand>) -> Vec<EngineEvent> {
        run_with(backend, CaptureConfig::default(), DEVICE_CHECK_INTERVAL, commands)
    }

    fn state_names(events: &[EngineEvent]) -> Vec<&'static str> {
        events
            .iter()
            .filter_map(|event| match event {
                EngineEvent::StateChanged { current, .. } => Some(current.name()),
                _ => None,
            })
            .collect()
    }

    fn finished(events: &[EngineEvent]) -> Vec<(String, StopReason)> {
        events
            .iter()
            .filter_map(|event| match event {
                EngineEvent::CaptureFinished { path, reason } => {
                    Some((path.clone(), reason.clone()))
                }
                _ => None,
            })
            .collect()
    }

    fn errors(events: &[EngineEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|event| match event {
                EngineEvent::Error { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_start_and_stop_capture() {
        let backend = FakeBackend::with_devices(&["Microphone"], &[]);
        let events = run(
            &backend,
            vec![EngineCommand::StartCapture, EngineCommand::StopCapture],
        );

        assert!(matches!(events.first(), Some(EngineEvent::Ready)));
        assert!(matches!(events.last(), Some(EngineEvent::Shutdown)));
        assert_eq!(state_names(&events), vec!["Capturing", "Stopping", "Idle"]);
        assert_eq!(
            finished(&events),
            vec![("capture.wma".to_string(), StopReason::UserRequested)]
        );

        let state = backend.0.lock();
        assert_eq!(state.started.len(), 1);
        assert_eq!(state.started[0].params.format, OutputFormat::Wma);
        assert_eq!(state.started[0].device.name, "Microphone");
        assert_eq!(state.stops, 1);
    }

    #[test]
    fn test_no_devices_reported() {
        let backend = FakeBackend::default();
        let events = run(&backend, vec![EngineCommand::StartCapture]);

        assert!(errors(&events).contains(&"Could not find any capture devices.".to_string()));
        assert_eq!(state_names(&events), vec!["Error"]);
        assert!(backend.0.lock().started.is_empty());
    }

    #[test]
    fn test_start_is_idempotent() {
        let backend = FakeBackend::with_devices(&["Microphone"], &[]);
        let events = run(
            &backend,
            vec![EngineCommand::StartCapture, EngineCommand::StartCapture],
        );

        assert_eq!(backend.0.lock().started.len(), 1);
        // Shutdown stops the running capture.
        assert_eq!(
            finished(&events),
            vec![("capture.wma".to_string(), StopReason::Shutdown)]
        );
    }

    #[test]
    fn test_selection_locked_while_capturing() {
        let backend = FakeBackend::with_devices(&["Microphone"], &["Camera"]);
        let events = run(
            &backend,
            vec![
                EngineCommand::StartCapture,
                EngineCommand::SelectMediaKind(MediaKind::Video),
                EngineCommand::SetOutputPath("elsewhere.wma".into()),
                EngineCommand::StopCapture,
                EngineCommand::StartCapture,
            ],
        );

        let state = backend.0.lock();
        assert_eq!(state.started.len(), 2);
        assert!(state.started.iter().all(|r| r.device.kind == MediaKind::Audio));
        assert!(state.started.iter().all(|r| r.output_path == "capture.wma"));
        assert!(!state.enumerated.contains(&MediaKind::Video));
        drop(state);

        assert!(!events
            .iter()
            .any(|e| matches!(e, EngineEvent::OutputPath(p) if p == "elsewhere.wma")));
    }

    #[test]
    fn test_kind_and_container_change() {
        let backend = FakeBackend::with_devices(&["Microphone"], &["Camera", "Capture Card"]);
        let events = run(
            &backend,
            vec![
                EngineCommand::SelectMediaKind(MediaKind::Video),
                EngineCommand::SelectContainer(ContainerSlot::Secondary),
                EngineCommand::SelectDevice(1),
                EngineCommand::StartCapture,
            ],
        );

        let paths: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::OutputPath(p) => Some(p.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(paths, vec!["capture.wma", "capture.mp4", "capture.wmv"]);

        let state = backend.0.lock();
        assert!(state.enumerated.contains(&MediaKind::Video));
        let request = &state.started[0];
        assert_eq!(request.device.name, "Capture Card");
        assert_eq!(request.params.format, OutputFormat::Wmv);
        assert_eq!(request.output_path, "capture.wmv");
    }

    #[test]
    fn test_invalid_device_index_reported() {
        let backend = FakeBackend::with_devices(&["Microphone"], &[]);
        let events = run(&backend, vec![EngineCommand::SelectDevice(4)]);
        assert!(errors(&events).contains(&"Invalid device index 4 (have 1)".to_string()));
    }

    #[test]
    fn test_toggle_capture() {
        let backend = FakeBackend::with_devices(&["Microphone"], &[]);
        let events = run(
            &backend,
            vec![EngineCommand::ToggleCapture, EngineCommand::ToggleCapture],
        );
        assert_eq!(
            finished(&events),
            vec![("capture.wma".to_string(), StopReason::UserRequested)]
        );
    }

    #[test]
    fn test_start_failure_enters_error_state() {
        let backend = FakeBackend::with_devices(&["Microphone"], &[]);
        backend.0.lock().fail_start = true;
        let events = run(&backend, vec![EngineCommand::StartCapture]);

        assert_eq!(state_names(&events), vec!["Error"]);
        let last_controls = events.iter().rev().find_map(|e| match e {
            EngineEvent::Controls(c) => Some(c.clone()),
            _ => None,
        });
        assert_eq!(last_controls.unwrap().capture_label, "Start Capture");
    }

    #[test]
    fn test_stop_failure_reports_corrupt_file() {
        let backend = FakeBackend::with_devices(&["Microphone"], &[]);
        backend.0.lock().fail_stop = true;
        let events = run(
            &backend,
            vec![EngineCommand::StartCapture, EngineCommand::StopCapture],
        );

        assert!(errors(&events).contains(&STOP_ERROR_MESSAGE.to_string()));
        assert_eq!(state_names(&events), vec!["Capturing", "Stopping", "Idle"]);
    }

    #[test]
    fn test_async_failure_stops_capture() {
        let backend = FakeBackend::with_devices(&["Microphone"], &[]);
        backend.0.lock().failures.push_back(CaptureFailure {
            code: 0xC00D_36B4,
            message: "The data specified for the media type is invalid".into(),
        });
        let events = run(&backend, vec![EngineCommand::StartCapture]);

        let ended = finished(&events);
        assert_eq!(ended.len(), 1);
        match &ended[0].1 {
            StopReason::CaptureError { message } => assert!(message.contains("0xC00D36B4")),
            other => panic!("unexpected reason {other:?}"),
        }
    }

    #[test]
    fn test_max_duration_stops_capture() {
        let backend = FakeBackend::with_devices(&["Microphone"], &[]);
        let config = CaptureConfig {
            max_duration: Some(Duration::ZERO),
            ..Default::default()
        };
        let events = run_with(
            &backend,
            config,
            DEVICE_CHECK_INTERVAL,
            vec![EngineCommand::StartCapture],
        );

        assert_eq!(
            finished(&events),
            vec![("capture.wma".to_string(), StopReason::DurationElapsed)]
        );
    }

    #[test]
    fn test_device_removal_stops_capture() {
        let backend = FakeBackend::with_devices(&["Microphone", "Headset"], &[]);
        backend.0.lock().vanish_while_capturing = true;
        let events = run_with(
            &backend,
            CaptureConfig::default(),
            Duration::ZERO,
            vec![EngineCommand::StartCapture],
        );

        assert!(events.iter().any(|e| matches!(e, EngineEvent::DeviceLost)));
        assert_eq!(
            finished(&events),
            vec![("capture.wma".to_string(), StopReason::DeviceLost)]
        );
        assert_eq!(backend.0.lock().stops, 1);
    }
}
