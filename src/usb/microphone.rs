//! UAC1 microphone function
//!
//! The radio's receive audio as a mono 16-bit USB audio source. The
//! speaker side comes from `embassy-usb`; this function adds the
//! matching audio control and streaming interfaces for the IN direction.

use embassy_usb::driver::{Driver, Endpoint, EndpointType};
use embassy_usb::descriptor::{SynchronizationType, UsageType};
use embassy_usb::types::InterfaceNumber;
use embassy_usb::Builder;

use crate::config::MAX_PACKET_BYTES;
use crate::types::SampleRate;

const USB_AUDIO_CLASS: u8 = 0x01;
const AUDIO_CONTROL: u8 = 0x01;
const AUDIO_STREAMING: u8 = 0x02;
const PROTOCOL_NONE: u8 = 0x00;

const CS_INTERFACE: u8 = 0x24;
const CS_ENDPOINT: u8 = 0x25;

const HEADER: u8 = 0x01;
const INPUT_TERMINAL: u8 = 0x02;
const OUTPUT_TERMINAL: u8 = 0x03;
const AS_GENERAL: u8 = 0x01;
const FORMAT_TYPE: u8 = 0x02;
const EP_GENERAL: u8 = 0x01;

const TERMINAL_RADIO_RECEIVER: u16 = 0x0710;
const TERMINAL_USB_STREAMING: u16 = 0x0101;
const INPUT_TERMINAL_ID: u8 = 1;
const OUTPUT_TERMINAL_ID: u8 = 2;

const FORMAT_PCM: u16 = 0x0001;
const FORMAT_TYPE_I: u8 = 0x01;

/// Class-specific AC descriptors: header, input and output terminal
const AC_TOTAL_LENGTH: u16 = 9 + 12 + 9;

/// Microphone endpoint and the identifiers the control handler needs
pub struct Microphone<'d, D: Driver<'d>> {
    /// Isochronous IN endpoint carrying capture packets
    pub endpoint: D::EndpointIn,
    /// Streaming interface (alternate setting 1 = active)
    pub interface: InterfaceNumber,
    /// Endpoint address, target of sampling frequency requests
    pub endpoint_address: u8,
}

impl<'d, D: Driver<'d>> Microphone<'d, D> {
    /// Add the microphone function to the device
    pub fn new(builder: &mut Builder<'d, D>) -> Self {
        let mut func = builder.function(USB_AUDIO_CLASS, AUDIO_CONTROL, PROTOCOL_NONE);

        // Audio control
        let mut control = func.interface();
        let streaming_interface = control.interface_number().0 + 1;
        let mut alt = control.alt_setting(USB_AUDIO_CLASS, AUDIO_CONTROL, PROTOCOL_NONE, None);

        let total = AC_TOTAL_LENGTH.to_le_bytes();
        alt.descriptor(
            CS_INTERFACE,
            &[HEADER, 0x00, 0x01, total[0], total[1], 1, streaming_interface],
        );
        let input_type = TERMINAL_RADIO_RECEIVER.to_le_bytes();
        alt.descriptor(
            CS_INTERFACE,
            &[
                INPUT_TERMINAL,
                INPUT_TERMINAL_ID,
                input_type[0],
                input_type[1],
                0x00, // bAssocTerminal
                0x01, // bNrChannels
                0x00,
                0x00, // wChannelConfig: mono
                0x00, // iChannelNames
                0x00, // iTerminal
            ],
        );
        let output_type = TERMINAL_USB_STREAMING.to_le_bytes();
        alt.descriptor(
            CS_INTERFACE,
            &[
                OUTPUT_TERMINAL,
                OUTPUT_TERMINAL_ID,
                output_type[0],
                output_type[1],
                0x00, // bAssocTerminal
                INPUT_TERMINAL_ID,
                0x00, // iTerminal
            ],
        );
        drop(control);

        // Audio streaming, zero bandwidth and active
        let mut streaming = func.interface();
        let interface = streaming.interface_number();
        streaming.alt_setting(USB_AUDIO_CLASS, AUDIO_STREAMING, PROTOCOL_NONE, None);
        let mut alt = streaming.alt_setting(USB_AUDIO_CLASS, AUDIO_STREAMING, PROTOCOL_NONE, None);

        let tag = FORMAT_PCM.to_le_bytes();
        alt.descriptor(CS_INTERFACE, &[AS_GENERAL, OUTPUT_TERMINAL_ID, 0x01, tag[0], tag[1]]);

        let mut format: heapless::Vec<u8, { 6 + 3 * SampleRate::ALL.len() }> = heapless::Vec::new();
        let _ = format.extend_from_slice(&[
            FORMAT_TYPE,
            FORMAT_TYPE_I,
            0x01, // bNrChannels
            0x02, // bSubframeSize
            16,   // bBitResolution
            SampleRate::ALL.len() as u8,
        ]);
        for rate in SampleRate::ALL {
            let hz = rate.as_hz().to_le_bytes();
            let _ = format.extend_from_slice(&hz[..3]);
        }
        alt.descriptor(CS_INTERFACE, &format);

        let endpoint = alt.alloc_endpoint_in(EndpointType::Isochronous, MAX_PACKET_BYTES as u16, 1);
        let endpoint_address = endpoint.info().addr.into();
        alt.endpoint_descriptor(
            endpoint.info(),
            SynchronizationType::Asynchronous,
            UsageType::DataEndpoint,
            &[0x00, 0x00], // bRefresh, bSynchAddress
        );
        // Sampling frequency control, no lock delay
        alt.descriptor(CS_ENDPOINT, &[EP_GENERAL, 0x01, 0x00, 0x00, 0x00]);

        Self {
            endpoint,
            interface,
            endpoint_address,
        }
    }
}
