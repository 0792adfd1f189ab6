//! Property-based tests for `adb devices -l` parsing

use droidlink_core::models::ConnectionKind;
use droidlink_core::parser::parse_device_list;
use proptest::prelude::*;

/// Generates a USB serial or a `host:port` identifier
fn arb_identifier() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[A-Z0-9]{6,14}").unwrap(),
        (1u8..255, 0u8..255, 1u16..65535).prop_map(|(a, b, port)| format!("10.{a}.{b}.1:{port}")),
        prop::string::string_regex("emulator-55[0-9]{2}").unwrap(),
    ]
}

/// Generates a device state as printed by the bridge
fn arb_state() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("device"),
        Just("offline"),
        Just("unauthorized"),
        Just("recovery"),
        Just("authorizing"),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Only rows in the `device` state are reported, in order
    #[test]
    fn only_ready_rows_are_reported(
        rows in prop::collection::vec((arb_identifier(), arb_state()), 0..8),
    ) {
        let mut output = String::from("List of devices attached\n");
        for (id, state) in &rows {
            output.push_str(&format!("{id}\t{state} product:x model:Y transport_id:1\n"));
        }

        let expected: Vec<&str> = rows
            .iter()
            .filter(|(_, state)| *state == "device")
            .map(|(id, _)| id.as_str())
            .collect();
        let devices = parse_device_list(&output);
        let ids: Vec<&str> = devices.iter().map(|d| d.id.as_str()).collect();

        prop_assert_eq!(ids, expected);
        prop_assert!(devices.iter().all(|d| d.connected));
    }

    /// Identifiers containing a colon are network devices
    #[test]
    fn connection_kind_follows_identifier(id in arb_identifier()) {
        let output = format!("List of devices attached\n{id}\tdevice\n");
        let devices = parse_device_list(&output);

        prop_assert_eq!(devices.len(), 1);
        let expected = if id.contains(':') {
            ConnectionKind::Network
        } else {
            ConnectionKind::Usb
        };
        prop_assert_eq!(devices[0].connection, expected);
        prop_assert_eq!(devices[0].port.is_some(), id.contains(':'));
    }

    /// The header line is never taken for a device
    #[test]
    fn header_is_skipped(state in arb_state()) {
        let output = format!("List of devices attached {state}\n");
        prop_assert!(parse_device_list(&output).is_empty());
    }
}
