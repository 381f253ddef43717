//! USB lifecycle events
//!
//! Alternate-setting changes, sampling-frequency requests and bus resets
//! arrive in the USB stack's control handler. They are queued here and
//! consumed by the task that owns the stream state machine.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_usb::control::{OutResponse, Recipient, Request, RequestType};
use embassy_usb::types::InterfaceNumber;
use embassy_usb::Handler;

use crate::config::{DEFAULT_SAMPLE_RATE, STREAM_EVENT_DEPTH};
use crate::hal::timer::SampleTimers;
use crate::stream::{Activation, StreamControl};
use crate::types::{Direction, SampleRate};

/// Lifecycle callback from the USB stack
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "embedded", derive(defmt::Format))]
pub enum StreamEvent {
    /// Streaming alternate setting selected
    Activate(Direction, u32),
    /// Zero-bandwidth alternate setting selected
    Deactivate(Direction),
    /// Host wrote the sampling frequency control
    RateChange(Direction, u32),
    /// USB bus reset
    BusReset,
}

/// Events waiting for the stream task
pub static STREAM_EVENTS: Channel<CriticalSectionRawMutex, StreamEvent, STREAM_EVENT_DEPTH> =
    Channel::new();

/// Last sampling frequency the host requested per direction
static REQUESTED_HZ: [AtomicU32; 2] = [
    AtomicU32::new(DEFAULT_SAMPLE_RATE.as_hz()),
    AtomicU32::new(DEFAULT_SAMPLE_RATE.as_hz()),
];

/// Sampling frequency to activate a direction with
#[must_use]
pub fn requested_rate(direction: Direction) -> u32 {
    REQUESTED_HZ[direction.index()].load(Ordering::Relaxed)
}

/// Record a sampling frequency request and forward it
pub fn request_rate(direction: Direction, hz: u32) {
    let previous = REQUESTED_HZ[direction.index()].swap(hz, Ordering::Relaxed);
    if previous != hz {
        post(StreamEvent::RateChange(direction, hz));
    }
}

/// Queue an event without blocking the caller
pub fn post(event: StreamEvent) {
    if STREAM_EVENTS.try_send(event).is_err() {
        warn!("usb: stream event queue full, dropped {}", event);
    }
}

const SET_CUR: u8 = 0x01;
const SAMPLING_FREQ_CONTROL: u8 = 0x01;

/// Control handler for the microphone interface and the bus state
pub struct UsbEvents {
    capture_interface: InterfaceNumber,
    capture_endpoint: u8,
}

impl UsbEvents {
    /// Watch the capture streaming interface and its isochronous endpoint
    #[must_use]
    pub const fn new(capture_interface: InterfaceNumber, capture_endpoint: u8) -> Self {
        Self {
            capture_interface,
            capture_endpoint,
        }
    }
}

impl Handler for UsbEvents {
    fn reset(&mut self) {
        post(StreamEvent::BusReset);
    }

    fn set_alternate_setting(&mut self, iface: InterfaceNumber, alternate_setting: u8) {
        if iface != self.capture_interface {
            return;
        }
        let event = if alternate_setting == 0 {
            StreamEvent::Deactivate(Direction::Capture)
        } else {
            StreamEvent::Activate(Direction::Capture, requested_rate(Direction::Capture))
        };
        post(event);
    }

    fn control_out(&mut self, req: Request, data: &[u8]) -> Option<OutResponse> {
        if req.request_type != RequestType::Class
            || req.recipient != Recipient::Endpoint
            || req.request != SET_CUR
            || (req.value >> 8) as u8 != SAMPLING_FREQ_CONTROL
            || req.index as u8 != self.capture_endpoint
        {
            return None;
        }

        let Some(rate) = SampleRate::from_freq_control(data) else {
            warn!("usb: unsupported capture sampling frequency {=[u8]:x}", data);
            return Some(OutResponse::Rejected);
        };
        request_rate(Direction::Capture, rate.as_hz());
        Some(OutResponse::Accepted)
    }
}

/// Run the stream state machine on queued lifecycle events
#[embassy_executor::task]
pub async fn stream_task(mut control: StreamControl<'static, SampleTimers<'static>>) {
    loop {
        let event = STREAM_EVENTS.receive().await;
        debug!("usb: {}", event);

        let result = match event {
            StreamEvent::Activate(direction, hz) => {
                control.on_interface_activate(direction, hz).map(|activation| {
                    if activation == Activation::Deferred {
                        info!("usb: {} waits for the output converter", direction);
                    }
                })
            }
            StreamEvent::Deactivate(direction) => {
                control.on_interface_deactivate(direction);
                Ok(())
            }
            StreamEvent::RateChange(direction, hz) => control.on_rate_change_request(direction, hz),
            StreamEvent::BusReset => {
                control.on_bus_reset();
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!("usb: {} rejected: {}", event, e);
        }
    }
}
