//! Capture selection state and control availability.
//!
//! The controller holds what a front end lets the user pick: media kind,
//! container, device and output file. It has no Media Foundation
//! dependency so the selection rules can be tested anywhere.

use std::path::Path;

use tracing::debug;

use mfcapture_ipc::{
    CaptureConfig, ContainerSlot, ControlState, DeviceInfo, EncodingParameters, MediaKind,
    OutputFormat,
};

use crate::backend::CaptureRequest;
use crate::error::EngineError;
use crate::EngineResult;

/// File stem used when the output path is empty.
const FALLBACK_STEM: &str = "capture";

/// Replace the extension of `path` with `extension`.
///
/// An empty path becomes `capture.<extension>`.
pub fn rename_extension(path: &str, extension: &str) -> String {
    if path.trim().is_empty() {
        return format!("{FALLBACK_STEM}.{extension}");
    }
    Path::new(path)
        .with_extension(extension)
        .to_string_lossy()
        .into_owned()
}

/// Selection state behind the capture controls.
#[derive(Debug, Clone)]
pub struct Controller {
    kind: MediaKind,
    slot: ContainerSlot,
    bitrate: u32,
    output_path: String,
    devices: Vec<DeviceInfo>,
    devices_kind: MediaKind,
    selected: Option<usize>,
    /// Last selection per kind, indexed by `kind_slot`.
    remembered: [usize; 2],
    capturing: bool,
}

fn kind_slot(kind: MediaKind) -> usize {
    match kind {
        MediaKind::Audio => 0,
        MediaKind::Video => 1,
    }
}

impl Controller {
    /// Controller for `config`. The output path is renamed to match the
    /// configured format immediately.
    pub fn new(config: &CaptureConfig) -> Self {
        let format = OutputFormat::for_selection(config.kind, config.slot);
        let mut remembered = [0; 2];
        if let Some(index) = config.device_index {
            remembered[kind_slot(config.kind)] = index;
        }

        Self {
            kind: config.kind,
            slot: config.slot,
            bitrate: config.bitrate,
            output_path: rename_extension(&config.output_path, format.extension()),
            devices: Vec::new(),
            devices_kind: config.kind,
            selected: None,
            remembered,
            capturing: false,
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn slot(&self) -> ContainerSlot {
        self.slot
    }

    pub fn format(&self) -> OutputFormat {
        OutputFormat::for_selection(self.kind, self.slot)
    }

    pub fn output_path(&self) -> &str {
        &self.output_path
    }

    pub fn devices(&self) -> &[DeviceInfo] {
        &self.devices
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_device(&self) -> Option<&DeviceInfo> {
        self.selected.and_then(|index| self.devices.get(index))
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    pub fn set_capturing(&mut self, capturing: bool) {
        self.capturing = capturing;
    }

    /// Switch media kind. Returns whether anything changed.
    pub fn set_kind(&mut self, kind: MediaKind) -> bool {
        if kind == self.kind {
            return false;
        }
        self.remember_selection();
        self.kind = kind;
        self.apply_extension();
        true
    }

    /// Switch container. Returns whether anything changed.
    pub fn set_slot(&mut self, slot: ContainerSlot) -> bool {
        if slot == self.slot {
            return false;
        }
        self.remember_selection();
        self.slot = slot;
        self.apply_extension();
        true
    }

    /// Use `path` verbatim as the output file.
    pub fn set_output_path(&mut self, path: String) {
        self.output_path = path;
    }

    /// Replace the device list and restore the last selection for `kind`.
    pub fn set_devices(&mut self, kind: MediaKind, devices: Vec<DeviceInfo>) {
        let remembered = self.remembered[kind_slot(kind)];
        self.selected = match devices.len() {
            0 => None,
            len if remembered < len => Some(remembered),
            _ => Some(0),
        };
        self.devices = devices;
        self.devices_kind = kind;
        debug!(%kind, count = self.devices.len(), selected = ?self.selected, "Device list updated");
    }

    pub fn select_device(&mut self, index: usize) -> EngineResult<()> {
        if index >= self.devices.len() {
            return Err(EngineError::InvalidDevice {
                index,
                count: self.devices.len(),
            });
        }
        self.selected = Some(index);
        self.remembered[kind_slot(self.devices_kind)] = index;
        Ok(())
    }

    /// Encoder parameters for the current selection.
    pub fn encoding_parameters(&self) -> EncodingParameters {
        EncodingParameters {
            format: self.format(),
            bitrate: self.bitrate,
        }
    }

    /// Everything a backend needs to start recording the selected device.
    pub fn request(&self) -> EngineResult<CaptureRequest> {
        if self.devices.is_empty() || self.devices_kind != self.kind {
            return Err(EngineError::NoDevices);
        }
        let device = self.selected_device().ok_or(EngineError::InvalidDevice {
            index: self.selected.unwrap_or_default(),
            count: self.devices.len(),
        })?;

        Ok(CaptureRequest {
            device: device.clone(),
            output_path: self.output_path.clone(),
            params: self.encoding_parameters(),
        })
    }

    pub fn controls(&self) -> ControlState {
        let has_devices = !self.devices.is_empty();
        let labels = [ContainerSlot::Primary, ContainerSlot::Secondary]
            .map(|slot| OutputFormat::for_selection(self.kind, slot).label().to_string());
        let [primary, secondary] = labels;

        ControlState {
            capture_label: if self.capturing {
                "Stop Capture".to_string()
            } else {
                "Start Capture".to_string()
            },
            capture_enabled: self.capturing || has_devices,
            device_list_enabled: !self.capturing && has_devices,
            container_enabled: !self.capturing,
            media_kind_enabled: !self.capturing,
            output_path_enabled: !self.capturing,
            container_labels: (primary, secondary),
        }
    }

    fn remember_selection(&mut self) {
        if let Some(index) = self.selected {
            self.remembered[kind_slot(self.devices_kind)] = index;
        }
    }

    fn apply_extension(&mut self) {
        self.output_path = rename_extension(&self.output_path, self.format().extension());
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(&CaptureConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices(kind: MediaKind, names: &[&str]) -> Vec<DeviceInfo> {
        names
            .iter()
            .enumerate()
            .map(|(index, name)| DeviceInfo {
                index,
                name: name.to_string(),
                symbolic_link: Some(format!("link-{name}")),
                kind,
            })
            .collect()
    }

    #[test]
    fn test_default_output_follows_format() {
        let controller = Controller::default();
        assert_eq!(controller.format(), OutputFormat::Wma);
        assert_eq!(controller.output_path(), "capture.wma");
    }

    #[test]
    fn test_rename_extension() {
        assert_eq!(rename_extension("capture.mp4", "wma"), "capture.wma");
        assert_eq!(rename_extension("take", "mp3"), "take.mp3");
        assert_eq!(rename_extension("", "wmv"), "capture.wmv");
        assert_eq!(
            rename_extension("out/session.one.wma", "mp4"),
            "out/session.one.mp4"
        );
    }

    #[test]
    fn test_kind_and_slot_rename_output() {
        let mut controller = Controller::default();

        assert!(controller.set_slot(ContainerSlot::Secondary));
        assert_eq!(controller.output_path(), "capture.mp3");

        assert!(controller.set_kind(MediaKind::Video));
        assert_eq!(controller.format(), OutputFormat::Wmv);
        assert_eq!(controller.output_path(), "capture.wmv");

        assert!(!controller.set_kind(MediaKind::Video));
        assert!(controller.set_slot(ContainerSlot::Primary));
        assert_eq!(controller.output_path(), "capture.mp4");
    }

    #[test]
    fn test_user_path_kept_verbatim() {
        let mut controller = Controller::default();
        controller.set_output_path("notes.audio".to_string());
        assert_eq!(controller.output_path(), "notes.audio");
        let err = controller.request().unwrap_err();
        assert_eq!(err.to_string(), "Could not find any capture devices.");
    }

    #[test]
    fn test_selection_remembered_per_kind() {
        let mut controller = Controller::default();
        controller.set_devices(MediaKind::Audio, devices(MediaKind::Audio, &["a", "b", "c"]));
        assert_eq!(controller.selected(), Some(0));
        controller.select_device(2).unwrap();

        controller.set_kind(MediaKind::Video);
        controller.set_devices(MediaKind::Video, devices(MediaKind::Video, &["cam"]));
        assert_eq!(controller.selected(), Some(0));

        controller.set_kind(MediaKind::Audio);
        controller.set_devices(MediaKind::Audio, devices(MediaKind::Audio, &["a", "b", "c"]));
        assert_eq!(controller.selected(), Some(2));

        // Remembered index no longer exists.
        controller.set_devices(MediaKind::Audio, devices(MediaKind::Audio, &["a"]));
        assert_eq!(controller.selected(), Some(0));

        controller.set_devices(MediaKind::Audio, Vec::new());
        assert_eq!(controller.selected(), None);
    }

    #[test]
    fn test_select_device_rejects_out_of_range() {
        let mut controller = Controller::default();
        controller.set_devices(MediaKind::Audio, devices(MediaKind::Audio, &["a"]));
        assert!(matches!(
            controller.select_device(1),
            Err(EngineError::InvalidDevice { index: 1, count: 1 })
        ));
        assert_eq!(controller.selected(), Some(0));
    }

    #[test]
    fn test_request_uses_selection() {
        let mut controller = Controller::default();
        controller.set_devices(MediaKind::Audio, devices(MediaKind::Audio, &["a", "b"]));
        controller.select_device(1).unwrap();

        let request = controller.request().unwrap();
        assert_eq!(request.device.name, "b");
        assert_eq!(request.output_path, "capture.wma");
        assert_eq!(request.params.format, OutputFormat::Wma);
        assert_eq!(request.params.bitrate, 240_000);

        // Switching kind invalidates the listed devices until re-enumerated.
        controller.set_kind(MediaKind::Video);
        assert!(matches!(controller.request(), Err(EngineError::NoDevices)));
    }

    #[test]
    fn test_controls() {
        let mut controller = Controller::default();
        let idle_empty = controller.controls();
        assert_eq!(idle_empty.capture_label, "Start Capture");
        assert!(!idle_empty.capture_enabled);
        assert!(!idle_empty.device_list_enabled);
        assert!(idle_empty.container_enabled);
        assert_eq!(
            idle_empty.container_labels,
            ("WMA".to_string(), "MP3".to_string())
        );

        controller.set_devices(MediaKind::Audio, devices(MediaKind::Audio, &["a"]));
        let idle = controller.controls();
        assert!(idle.capture_enabled);
        assert!(idle.device_list_enabled);

        controller.set_capturing(true);
        let capturing = controller.controls();
        assert_eq!(capturing.capture_label, "Stop Capture");
        assert!(capturing.capture_enabled);
        assert!(!capturing.device_list_enabled);
        assert!(!capturing.container_enabled);
        assert!(!capturing.media_kind_enabled);
        assert!(!capturing.output_path_enabled);

        controller.set_capturing(false);
        controller.set_kind(MediaKind::Video);
        assert_eq!(
            controller.controls().container_labels,
            ("MP4".to_string(), "WMV".to_string())
        );
    }
}
