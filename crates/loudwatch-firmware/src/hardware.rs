//! Peripheral setup and the hardware-backed detector collaborators
//!
//! Pin assignments match the loudwatch carrier board: microphone amplifier
//! on GPIO1 (ADC1 channel 0), Bluetooth modem on UART1 TX (GPIO17), and the
//! detection LED on GPIO2.

use embedded_io::ErrorKind;
use esp_hal::Async;
use esp_hal::Blocking;
use esp_hal::analog::adc::{Adc, AdcConfig, AdcPin, Attenuation};
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::peripherals::{ADC1, GPIO1, GPIO2, GPIO17, UART1};
use esp_hal::uart::{Config as UartConfig, Uart};
use log::info;

use loudwatch_core::Sample;
use loudwatch_core::io::Indicator;

/// ADC sampling rate driving the detection cycle.
pub const SAMPLE_RATE_HZ: u64 = 8_000;

/// Baud rate of the Bluetooth modem link.
pub const MODEM_BAUD: u32 = 115_200;

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

/// One-shot reader for the microphone channel.
pub struct AdcSampler {
    adc: Adc<'static, ADC1<'static>, Blocking>,
    pin: AdcPin<GPIO1<'static>, ADC1<'static>>,
}

impl AdcSampler {
    /// Configure ADC1 for the full 0..3.1 V input swing on GPIO1.
    pub fn new(adc1: ADC1<'static>, mic: GPIO1<'static>) -> Self {
        let mut config = AdcConfig::new();
        let pin = config.enable_pin(mic, Attenuation::_11dB);
        let adc = Adc::new(adc1, config);

        info!("Microphone ADC ready on GPIO1");
        Self { adc, pin }
    }

    /// Take one 12-bit conversion, spinning until the result is ready.
    pub fn read(&mut self) -> Sample {
        loop {
            if let Ok(value) = self.adc.read_oneshot(&mut self.pin) {
                return value;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Output channel
// ---------------------------------------------------------------------------

/// Transmit side of the modem UART as an [`embedded_io_async::Write`].
pub struct UartSink {
    uart: Uart<'static, Async>,
}

impl UartSink {
    pub fn new(uart1: UART1<'static>, tx: GPIO17<'static>) -> Self {
        let uart = Uart::new(uart1, UartConfig::default().with_baudrate(MODEM_BAUD))
            .expect("Failed to configure modem UART")
            .with_tx(tx)
            .into_async();

        info!("Modem UART ready at {} baud", MODEM_BAUD);
        Self { uart }
    }
}

impl embedded_io::ErrorType for UartSink {
    type Error = ErrorKind;
}

impl embedded_io_async::Write for UartSink {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, ErrorKind> {
        self.uart.write_async(buf).await.map_err(|_| ErrorKind::Other)
    }

    async fn flush(&mut self) -> Result<(), ErrorKind> {
        self.uart.flush_async().await.map_err(|_| ErrorKind::Other)
    }
}

// ---------------------------------------------------------------------------
// Indicator
// ---------------------------------------------------------------------------

/// Detection LED, lit for the cycle that emits an event.
pub struct LedIndicator {
    led: Output<'static>,
}

impl LedIndicator {
    pub fn new(pin: GPIO2<'static>) -> Self {
        Self {
            led: Output::new(pin, Level::Low, OutputConfig::default()),
        }
    }
}

impl Indicator for LedIndicator {
    fn set_active(&mut self, active: bool) {
        if active {
            self.led.set_high();
        } else {
            self.led.set_low();
        }
    }
}
