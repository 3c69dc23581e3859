#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
use embassy_time::{Duration, Ticker};
use esp_hal::clock::CpuClock;
use esp_hal::timer::timg::TimerGroup;
use log::{info, warn};
use static_cell::StaticCell;

use loudwatch_core::driver::run;
use loudwatch_core::io::{MailboxSource, SampleMailbox, SampleSender, SecondsCounter};
use loudwatch_core::{DetectorConfig, ReferenceDetector, Reporter};
use loudwatch_firmware::hardware::{AdcSampler, LedIndicator, SAMPLE_RATE_HZ, UartSink};

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

static SAMPLES: SampleMailbox = SampleMailbox::new();
static SECONDS: SecondsCounter = SecondsCounter::new();

/// Reads the microphone at a fixed rate and hands each sample to the driver.
#[embassy_executor::task]
async fn sample_task(mut sampler: AdcSampler, sender: SampleSender<'static>) {
    let mut ticker = Ticker::every(Duration::from_hz(SAMPLE_RATE_HZ));
    let mut dropped: u32 = 0;

    loop {
        ticker.next().await;

        // The driver still owns the previous sample: drop this one and keep
        // acquisition on schedule
        if sender.try_send(sampler.read()).is_err() {
            dropped = dropped.wrapping_add(1);
            if dropped % 1024 == 1 {
                warn!("Detector falling behind, {} samples dropped", dropped);
            }
        }
    }
}

/// Advances the seconds clock read by the detector.
#[embassy_executor::task]
async fn seconds_task() {
    let mut ticker = Ticker::every(Duration::from_secs(1));
    loop {
        ticker.next().await;
        SECONDS.tick();
    }
}

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");

    let sampler = AdcSampler::new(peripherals.ADC1, peripherals.GPIO1);
    let mut reporter = Reporter::new(UartSink::new(peripherals.UART1, peripherals.GPIO17));
    let mut led = LedIndicator::new(peripherals.GPIO2);

    // Detection state lives in a static to keep the history ring off the stack
    static DETECTOR: StaticCell<ReferenceDetector> = StaticCell::new();
    let detector = DETECTOR.init(
        ReferenceDetector::new(DetectorConfig::reference())
            .expect("Reference detector configuration is invalid"),
    );

    spawner.spawn(seconds_task().expect("Seconds task already spawned"));
    spawner.spawn(sample_task(sampler, SAMPLES.sender()).expect("Sample task already spawned"));

    info!("Listening at {} Hz", SAMPLE_RATE_HZ);

    let mut source = MailboxSource::new(SAMPLES.receiver());
    match run(detector, &mut source, &SECONDS, &mut led, &mut reporter).await {
        Ok(never) | Err(never) => match never {},
    }
}
