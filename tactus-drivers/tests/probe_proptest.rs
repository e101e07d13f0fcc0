//! Property tests for probing and key handling through the whole driver.

use proptest::prelude::*;
use tactus_core::config::DriverConfig;
use tactus_core::traits::{BrailleDriver, ReadOutcome};
use tactus_drivers::baum::BaumDriver;
use tactus_hal::mock::{MockClock, MockTransport};
use tactus_hal::{Clock, TransportKind};

const ESC: u8 = 0x1B;

fn display(noise: &[u8], cells: u8) -> (MockTransport, MockClock) {
    let clock = MockClock::new();
    let mut mock = MockTransport::new(TransportKind::Serial, clock.clone());
    mock.push_inbound(noise);
    mock.respond_once(&[ESC, 0x01], &[ESC, 0x01, cells]);
    (mock, clock)
}

fn config(params: &str) -> DriverConfig {
    DriverConfig::from_strings("serial:/dev/ttyS0", params).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Line noise without an escape byte never changes what the probe finds.
    #[test]
    fn noise_does_not_change_probe(
        noise in proptest::collection::vec(any::<u8>().prop_filter("no escape", |b| *b != ESC), 0..64),
        cells in 1u8..=84,
    ) {
        let (mock, clock) = display(&noise, cells);
        let driver = BaumDriver::construct(mock, clock, &config("")).unwrap();
        prop_assert_eq!(driver.text_columns(), cells);
    }

    /// Silent displays are given up on within retries x timeout.
    #[test]
    fn probe_time_is_bounded(retries in 1u8..6, timeout in 1u32..500) {
        let clock = MockClock::new();
        let mock = MockTransport::new(TransportKind::Bluetooth, clock.clone());
        let params = format!("probe_retries={},probe_timeout_ms={}", retries, timeout);
        let config = config(&params);

        prop_assert!(BaumDriver::construct(mock, clock.clone(), &config).is_err());
        prop_assert!(clock.now_ms() <= config.parameters.probe_budget_ms());
    }

    /// Pressing and releasing any set of top keys yields exactly one command.
    #[test]
    fn one_command_per_chord(keys in 1u8..64) {
        let (mock, clock) = display(&[], 40);
        let mut driver = BaumDriver::construct(mock, clock, &config("")).unwrap();
        driver.transport_mut().push_inbound(&[ESC, 0x24, keys, ESC, 0x24, 0x00]);

        let first = driver.read_command().unwrap();
        prop_assert!(matches!(first, ReadOutcome::Command(_)));
        prop_assert_eq!(driver.read_command().unwrap(), ReadOutcome::Pending { retry_after_ms: None });
    }
}
