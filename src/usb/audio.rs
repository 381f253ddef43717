//! USB audio streaming tasks
//!
//! Moves packets between the isochronous endpoints and the sample queues,
//! sends the clock feedback and forwards the speaker's volume control to
//! the settings task.

use embassy_stm32::peripherals::USB;
use embassy_stm32::usb::Driver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_usb::class::uac1;
use embassy_usb::class::uac1::speaker;
use embassy_usb::driver::{Endpoint, EndpointError, EndpointIn};
use embassy_usb::UsbDevice;

use crate::audio::feedback::{CapturePacer, FeedbackController, FeedbackRefresh};
use crate::audio::shared::AudioShared;
use crate::audio::transfer::{read_packet, write_packet};
use crate::config::{FRAME_BOUNDARY_DEPTH, MAX_PACKET_BYTES};
use crate::types::{Direction, FeedbackFormat, FeedbackValue, SampleRate, Volume};
use crate::usb::events::{post, request_rate, requested_rate, StreamEvent};

/// USB driver of the STM32F302 full-speed device peripheral
pub type UsbDriver = Driver<'static, USB>;

/// Master clock counter latched by the TIM2 handler at each frame boundary
pub static FRAME_BOUNDARIES: Channel<CriticalSectionRawMutex, u32, FRAME_BOUNDARY_DEPTH> =
    Channel::new();

/// Feedback values computed at the frame boundary
pub static FEEDBACK_SIGNAL: Signal<CriticalSectionRawMutex, FeedbackValue> = Signal::new();

/// Speaker volume (kept as is while muted) and mute set by the host
pub static VOLUME_SIGNAL: Signal<CriticalSectionRawMutex, (Option<Volume>, bool)> = Signal::new();

/// Rates advertised on both streaming interfaces
pub static SAMPLE_RATES_HZ: [u32; SampleRate::ALL.len()] = sample_rates_hz();

const fn sample_rates_hz() -> [u32; SampleRate::ALL.len()] {
    let mut rates = [0; SampleRate::ALL.len()];
    let mut i = 0;
    while i < rates.len() {
        rates[i] = SampleRate::ALL[i].as_hz();
        i += 1;
    }
    rates
}

/// Speaker channel layout (mono)
pub static SPEAKER_CHANNELS: [uac1::Channel; 1] = [uac1::Channel::LeftFront];

impl From<FeedbackRefresh> for uac1::FeedbackRefresh {
    fn from(refresh: FeedbackRefresh) -> Self {
        match refresh {
            FeedbackRefresh::Period1Frame | FeedbackRefresh::Period2Frames => Self::Period2Frames,
            FeedbackRefresh::Period4Frames => Self::Period4Frames,
            FeedbackRefresh::Period8Frames => Self::Period8Frames,
            FeedbackRefresh::Period16Frames => Self::Period16Frames,
            FeedbackRefresh::Period32Frames => Self::Period32Frames,
        }
    }
}

struct Disconnected {}

impl From<EndpointError> for Disconnected {
    fn from(val: EndpointError) -> Self {
        match val {
            EndpointError::BufferOverflow => warn!("usb: audio buffer overflow"),
            EndpointError::Disabled => {}
        }
        Disconnected {}
    }
}

async fn speaker_handler(
    stream: &mut speaker::Stream<'static, UsbDriver>,
    shared: &AudioShared,
) -> Result<(), Disconnected> {
    let mut data = [0u8; MAX_PACKET_BYTES];
    loop {
        let len = stream.read_packet(&mut data).await?;
        if shared.playback.is_active() {
            write_packet(&shared.playback_queue, &data[..len]);
        }
    }
}

/// Host → radio isochronous stream
#[embassy_executor::task]
pub async fn speaker_task(mut stream: speaker::Stream<'static, UsbDriver>, shared: &'static AudioShared) {
    loop {
        stream.wait_connection().await;
        post(StreamEvent::Activate(Direction::Playback, requested_rate(Direction::Playback)));
        _ = speaker_handler(&mut stream, shared).await;
        post(StreamEvent::Deactivate(Direction::Playback));
    }
}

async fn feedback_handler(feedback: &mut speaker::Feedback<'static, UsbDriver>) -> Result<(), Disconnected> {
    loop {
        let value = FEEDBACK_SIGNAL.wait().await;
        feedback.write_packet(&value.to_bytes()).await?;
    }
}

/// Runs the feedback controller on latched frame boundaries
///
/// Spawned on the interrupt executor above USB priority, so the sample
/// ticks preempt it and it never runs inside a critical section.
#[embassy_executor::task]
pub async fn frame_task(mut controller: FeedbackController<'static>) {
    loop {
        let counter = FRAME_BOUNDARIES.receive().await;
        if let Some(value) = controller.on_frame_boundary(counter) {
            FEEDBACK_SIGNAL.signal(value);
        }
    }
}

/// Sends feedback messages to the host
#[embassy_executor::task]
pub async fn feedback_task(mut feedback: speaker::Feedback<'static, UsbDriver>, shared: &'static AudioShared) {
    loop {
        feedback.wait_connection().await;
        // Full-speed UAC1 hosts expect 10.14 in three bytes
        shared.feedback.set_format(FeedbackFormat::Q10_14);
        shared.feedback.request_reset();
        FEEDBACK_SIGNAL.reset();
        _ = feedback_handler(&mut feedback).await;
    }
}

async fn microphone_handler(
    endpoint: &mut <UsbDriver as embassy_usb::driver::Driver<'static>>::EndpointIn,
    shared: &AudioShared,
) -> Result<(), Disconnected> {
    let mut pacer = CapturePacer::new(shared);
    let mut data = [0u8; MAX_PACKET_BYTES];
    loop {
        let len = if shared.capture.is_active() {
            let samples = pacer.next_packet_len();
            read_packet(&shared.capture_queue, &mut data, samples)
        } else {
            0
        };
        endpoint.write(&data[..len]).await?;
    }
}

/// Radio → host isochronous stream
#[embassy_executor::task]
pub async fn microphone_task(
    mut endpoint: <UsbDriver as embassy_usb::driver::Driver<'static>>::EndpointIn,
    shared: &'static AudioShared,
) {
    loop {
        endpoint.wait_enabled().await;
        _ = microphone_handler(&mut endpoint, shared).await;
    }
}

/// Speaker feature unit and sampling frequency
#[embassy_executor::task]
pub async fn control_task(control_monitor: speaker::ControlMonitor<'static>) {
    loop {
        control_monitor.changed().await;

        request_rate(Direction::Playback, control_monitor.sample_rate_hz());

        let Some(volume) = control_monitor.volume(SPEAKER_CHANNELS[0]) else {
            continue;
        };
        let update = match volume {
            speaker::Volume::Muted => (None, true),
            speaker::Volume::DeciBel(db) => (Some(Volume::from_uac((db * 256.0) as i16)), false),
        };
        VOLUME_SIGNAL.signal(update);
    }
}

/// Run the USB device
#[embassy_executor::task]
pub async fn usb_task(mut usb_device: UsbDevice<'static, UsbDriver>) {
    usb_device.run().await;
}
