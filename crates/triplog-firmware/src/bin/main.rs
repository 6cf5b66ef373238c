#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use esp_hal::uart::{Config as UartConfig, Uart};
use rtt_target::rprintln;

use triplog_firmware::config::{GPS_BAUD, SD_FREQ_KHZ};
use triplog_firmware::{control, gps, pulse, sd};

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    rprintln!("Embassy initialized!");

    // GPS receiver on UART1.
    let uart_config = UartConfig::default().with_baudrate(GPS_BAUD);
    let gps_uart = Uart::new(peripherals.UART1, uart_config)
        .unwrap()
        .with_rx(peripherals.GPIO3)
        .with_tx(peripherals.GPIO4)
        .into_async();
    let (gps_rx, _gps_tx) = gps_uart.split();

    // SD card on SPI2.
    let spi_bus = Spi::new(
        peripherals.SPI2,
        SpiConfig::default().with_frequency(Rate::from_khz(SD_FREQ_KHZ)),
    )
    .unwrap()
    .with_sck(peripherals.GPIO7)
    .with_mosi(peripherals.GPIO8)
    .with_miso(peripherals.GPIO6);
    let sd_cs = Output::new(peripherals.GPIO9, Level::High, OutputConfig::default());
    let spi_device = ExclusiveDevice::new_no_delay(spi_bus, sd_cs).unwrap();
    let medium = sd::init_sd_medium(spi_device);

    // Operator button (active-low) and the pulse sensor input.
    let button = Input::new(
        peripherals.GPIO5,
        InputConfig::default().with_pull(Pull::Up),
    );
    let pulse_pin = Input::new(
        peripherals.GPIO10,
        InputConfig::default().with_pull(Pull::Up),
    );

    spawner.must_spawn(gps::gps_task(gps_rx));
    spawner.must_spawn(pulse::pulse_task(pulse_pin));
    spawner.must_spawn(control::control_task(medium, button));

    rprintln!("All tasks spawned");
    loop {
        Timer::after(Duration::from_secs(60)).await;
    }
}
