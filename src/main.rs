//! USB Radio Interface Main Application
//!
//! Entry point for the STM32F302-based radio interface firmware.
//! Initializes hardware, installs the sample-tick and frame interrupts
//! and spawns the USB and settings tasks.

#![no_std]
#![no_main]

use core::cell::RefCell;

use defmt::{info, unwrap, warn};
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_futures::select::{select, Either};
use embassy_stm32::adc::{self, Adc};
use embassy_stm32::dac::DacCh1;
use embassy_stm32::dma::NoDma;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_stm32::peripherals::DAC1;
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::low_level::Timer as LowLevelTimer;
use embassy_stm32::{bind_interrupts, peripherals, usb};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Timer;
use embassy_usb::class::uac1;
use embassy_usb::class::uac1::speaker::{self, Speaker};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use usb_radio_audio::hal::adc::AudioAdc;
use usb_radio_audio::hal::dac::AudioDac;
use usb_radio_audio::hal::gpio::{Frontend, GainSelector, LevelSwitch, SignalOutputs};
use usb_radio_audio::hal::timer::{acknowledge, latch_frame, FrameCounter, SampleTimers};
use usb_radio_audio::prelude::*;
use usb_radio_audio::router::SignalWatcher;
use usb_radio_audio::settings::{self, RegisterBank};
use usb_radio_audio::usb::audio::{
    self as usb_audio, FRAME_BOUNDARIES, SAMPLE_RATES_HZ, SPEAKER_CHANNELS, VOLUME_SIGNAL,
};
use usb_radio_audio::usb::events::{self, UsbEvents};
use usb_radio_audio::usb::microphone::Microphone;

bind_interrupts!(struct Irqs {
    USB_LP_CAN_RX0 => usb::InterruptHandler<peripherals::USB>;
    ADC1_2 => adc::InterruptHandler<peripherals::ADC1>;
});

static SHARED: AudioShared = AudioShared::new();

static CAPTURE: Mutex<CriticalSectionRawMutex, RefCell<Option<CapturePath<'static, AudioAdc<'static>>>>> =
    Mutex::new(RefCell::new(None));
static PLAYBACK: Mutex<CriticalSectionRawMutex, RefCell<Option<PlaybackPath<'static, AudioDac<'static, DAC1>>>>> =
    Mutex::new(RefCell::new(None));

/// Runs the feedback controller between the sample ticks and USB
static FRAME_EXECUTOR: InterruptExecutor = InterruptExecutor::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("USB Radio Interface v{}", env!("CARGO_PKG_VERSION"));

    let mut config = embassy_stm32::Config::default();
    {
        // 8 MHz crystal, 72 MHz system clock, 48 MHz USB
        use embassy_stm32::rcc::*;
        config.rcc.hse = Some(Hse {
            freq: Hertz(8_000_000),
            mode: HseMode::Oscillator,
        });
        config.rcc.pll = Some(Pll {
            src: PllSource::HSE,
            prediv: PllPreDiv::DIV1,
            mul: PllMul::MUL9,
        });
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV2;
        config.rcc.apb2_pre = APBPrescaler::DIV1;
        config.rcc.mux.usbsw = mux::Usbsw::PLL1_P_DIV_1_5;
    }
    let p = embassy_stm32::init(config);
    info!("Peripherals initialized");

    // Converters and tick handlers
    let adc = AudioAdc::new(Adc::new(p.ADC1, Irqs));
    let dac = AudioDac::new(DacCh1::new(p.DAC1, NoDma, p.PA4));
    CAPTURE.lock(|c| c.borrow_mut().replace(CapturePath::new(&SHARED, adc)));
    PLAYBACK.lock(|c| c.borrow_mut().replace(PlaybackPath::new(&SHARED, dac)));

    // Sample timers start at the default rate with both streams inactive
    let timers = SampleTimers::new(LowLevelTimer::new(p.TIM3), LowLevelTimer::new(p.TIM6));
    let control = StreamControl::new(&SHARED, timers);

    // USB device
    static CONFIG_DESCRIPTOR: StaticCell<[u8; 512]> = StaticCell::new();
    static BOS_DESCRIPTOR: StaticCell<[u8; 32]> = StaticCell::new();
    static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();
    static SPEAKER_STATE: StaticCell<speaker::State> = StaticCell::new();
    static EVENTS: StaticCell<UsbEvents> = StaticCell::new();

    let driver = usb::Driver::new(p.USB, Irqs, p.PA12, p.PA11);

    let mut usb_config = embassy_usb::Config::new(USB_VID, USB_PID);
    usb_config.manufacturer = Some("Radio Interface Project");
    usb_config.product = Some("USB Radio Interface");
    usb_config.device_class = 0xEF;
    usb_config.device_sub_class = 0x02;
    usb_config.device_protocol = 0x01;
    usb_config.composite_with_iads = true;

    let mut builder = embassy_usb::Builder::new(
        driver,
        usb_config,
        CONFIG_DESCRIPTOR.init([0; 512]),
        BOS_DESCRIPTOR.init([0; 32]),
        &mut [],
        CONTROL_BUF.init([0; 64]),
    );

    let (stream, feedback, control_monitor) = Speaker::new(
        &mut builder,
        SPEAKER_STATE.init(speaker::State::new()),
        MAX_PACKET_BYTES as u16,
        uac1::SampleWidth::Width2Byte,
        &SAMPLE_RATES_HZ,
        &SPEAKER_CHANNELS,
        FEEDBACK_REFRESH.into(),
    );
    let microphone = Microphone::new(&mut builder);
    builder.handler(EVENTS.init(UsbEvents::new(microphone.interface, microphone.endpoint_address)));
    let usb_device = builder.build();

    // Feedback controller above USB priority, below the sample ticks
    interrupt::FPU.set_priority(Priority::P1);
    let frame_spawner = FRAME_EXECUTOR.start(interrupt::FPU);
    unwrap!(frame_spawner.spawn(usb_audio::frame_task(FeedbackController::new(
        &SHARED,
        FEEDBACK_REFRESH
    ))));

    static FRAME_COUNTER: StaticCell<FrameCounter<'static>> = StaticCell::new();
    FRAME_COUNTER.init(FrameCounter::new(LowLevelTimer::new(p.TIM2)));

    // Sample ticks preempt everything, the frame boundary preempts USB
    interrupt::TIM3.set_priority(Priority::P0);
    interrupt::TIM6_DAC.set_priority(Priority::P0);
    interrupt::TIM2.set_priority(Priority::P1);
    interrupt::USB_LP_CAN_RX0.set_priority(Priority::P2);
    unsafe {
        interrupt::TIM3.enable();
        interrupt::TIM6_DAC.enable();
        interrupt::TIM2.enable();
    }

    // Front-end and signal outputs
    let frontend = Frontend::new(
        GainSelector::new(
            Output::new(p.PB0, Level::Low, Speed::Low),
            Output::new(p.PB1, Level::Low, Speed::Low),
            Output::new(p.PB2, Level::Low, Speed::Low),
        ),
        LevelSwitch::new(Output::new(p.PB10, Level::Low, Speed::Low)),
    );
    let outputs = SignalOutputs::new(
        Output::new(p.PB12, Level::Low, Speed::Low),
        Output::new(p.PB13, Level::Low, Speed::Low),
    );

    unwrap!(spawner.spawn(usb_audio::usb_task(usb_device)));
    unwrap!(spawner.spawn(usb_audio::speaker_task(stream, &SHARED)));
    unwrap!(spawner.spawn(usb_audio::feedback_task(feedback, &SHARED)));
    unwrap!(spawner.spawn(usb_audio::microphone_task(microphone.endpoint, &SHARED)));
    unwrap!(spawner.spawn(usb_audio::control_task(control_monitor)));
    unwrap!(spawner.spawn(events::stream_task(control)));
    unwrap!(spawner.spawn(settings_task(frontend, outputs)));

    info!("Tasks spawned");
}

/// Register store, front-end and detection outputs
#[embassy_executor::task]
async fn settings_task(mut frontend: Frontend<'static>, mut outputs: SignalOutputs<'static>) {
    let mut bank = RegisterBank::new();
    let mut watcher = SignalWatcher::new();

    if let Err(e) = settings::apply(&bank, &SHARED, &mut frontend) {
        warn!("settings: defaults rejected: {}", e);
    }

    loop {
        let poll = Timer::after_millis(SETTINGS_POLL_MS);
        if let Either::First((volume, muted)) = select(VOLUME_SIGNAL.wait(), poll).await {
            let written = volume
                .map_or(Ok(()), |v| bank.write(RegisterId::TxVolume, v.attenuation()))
                .and_then(|()| bank.write(RegisterId::TxMute, u32::from(muted)));
            if let Err(e) = written.and_then(|()| settings::apply(&bank, &SHARED, &mut frontend)) {
                warn!("settings: {}", e);
            }
        }

        settings::publish_diagnostics(&SHARED, &mut bank);
        if let Some(state) = watcher.poll(&SHARED.signals) {
            info!("signals: {}", state);
            outputs.apply(state);
        }
    }
}

#[interrupt]
fn TIM3() {
    acknowledge(Direction::Capture);
    CAPTURE.lock(|c| {
        if let Some(path) = c.borrow_mut().as_mut() {
            path.tick();
        }
    });
}

#[interrupt]
fn TIM6_DAC() {
    acknowledge(Direction::Playback);
    PLAYBACK.lock(|c| {
        if let Some(path) = c.borrow_mut().as_mut() {
            path.tick();
        }
    });
}

#[interrupt]
fn TIM2() {
    if let Some(counter) = latch_frame() {
        // A dropped boundary widens the next window and is caught as implausible
        _ = FRAME_BOUNDARIES.try_send(counter);
    }
}

#[interrupt]
unsafe fn FPU() {
    FRAME_EXECUTOR.on_interrupt();
}
