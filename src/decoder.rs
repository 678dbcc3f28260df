use log::debug;

use crate::classify::Metric;
use crate::clock::Clock;
use crate::error::LengthError;
use crate::layout::{self, FieldDescriptor, FieldName, PayloadLayout, PayloadVersion};
use crate::reading::{BeaconReading, DecodedFields, DecodedReading, EnvironmentState};

/// Decode one uplink payload. The length selects the layout; nothing is
/// decoded if it is not supported.
pub fn decode(bytes: &[u8], clock: &impl Clock) -> Result<DecodedReading, LengthError> {
    let layout = layout::resolve(bytes)?;
    let fields = decode_fields(bytes, layout);
    let total_signals = Metric::TotalSignals.value(fields.wifi_count, fields.ble_count);
    let crowd_level = layout.policy.classify(fields.wifi_count, fields.ble_count);

    debug!(
        "Decoded {} byte payload ({:?}): {:?}, total {} -> {} ({} policy)",
        bytes.len(),
        layout.version,
        fields,
        total_signals,
        crowd_level.as_str(),
        layout.policy.name
    );

    Ok(DecodedReading {
        version: layout.version,
        wifi_count: fields.wifi_count,
        ble_count: fields.ble_count,
        beacon: fields.beacon,
        environment_state: fields.environment_state,
        total_signals,
        crowd_level,
        observed_at: clock.now(),
    })
}

/// `bytes.len()` must equal `layout.length`; `layout::resolve` guarantees it.
fn decode_fields(bytes: &[u8], layout: &PayloadLayout) -> DecodedFields {
    layout
        .fields
        .iter()
        .fold(DecodedFields::default(), |mut fields, descriptor| {
            let raw = &bytes[descriptor.offset..descriptor.end()];
            match descriptor.name {
                FieldName::WifiCount => fields.wifi_count = u16::from_be_bytes([raw[0], raw[1]]),
                FieldName::BleCount => fields.ble_count = u16::from_be_bytes([raw[0], raw[1]]),
                FieldName::Beacon => fields.beacon = Some(BeaconReading::from_raw(raw[0])),
                FieldName::EnvironmentState => {
                    fields.environment_state = Some(EnvironmentState::from_raw(raw[0]))
                }
            }
            fields
        })
}

/// Encode `fields` with the smallest layout that carries all of them.
pub fn encode(fields: &DecodedFields) -> Vec<u8> {
    let layout = layout::layout_for(PayloadVersion::for_fields(fields));
    let mut bytes = vec![0u8; layout.length];
    for descriptor in layout.fields {
        write_field(&mut bytes, descriptor, fields);
    }
    bytes
}

fn write_field(bytes: &mut [u8], descriptor: &FieldDescriptor, fields: &DecodedFields) {
    let out = &mut bytes[descriptor.offset..descriptor.end()];
    match descriptor.name {
        FieldName::WifiCount => out.copy_from_slice(&fields.wifi_count.to_be_bytes()),
        FieldName::BleCount => out.copy_from_slice(&fields.ble_count.to_be_bytes()),
        FieldName::Beacon => {
            out[0] = fields.beacon.map(|b| b.raw()).unwrap_or_default();
        }
        FieldName::EnvironmentState => {
            out[0] = fields.environment_state.map(|e| e.raw()).unwrap_or_default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::CrowdLevel;
    use crate::clock::FixedClock;
    use chrono::{TimeZone as _, Utc};
    use proptest::prelude::*;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap())
    }

    #[test]
    fn test_decode_counts_payload() {
        let reading = decode(&[0x00, 0x08, 0x00, 0x0C], &clock()).unwrap();
        assert_eq!(reading.version, PayloadVersion::Counts);
        assert_eq!(reading.wifi_count, 8);
        assert_eq!(reading.ble_count, 12);
        assert_eq!(reading.total_signals, 20);
        assert_eq!(reading.crowd_level, CrowdLevel::Crowded);
        assert_eq!(reading.beacon, None);
        assert_eq!(reading.environment_state, None);
        assert_eq!(reading.observed_at, clock().0);
    }

    #[test]
    fn test_decode_environment_payload() {
        let reading = decode(&[0x00, 0x08, 0x00, 0x0C, 0x50, 0x01], &clock()).unwrap();
        assert_eq!(reading.wifi_count, 8);
        assert_eq!(reading.ble_count, 12);
        assert_eq!(reading.beacon_detected(), Some(true));
        assert_eq!(reading.beacon_rssi(), Some(Some(-80)));
        assert_eq!(reading.environment_state, Some(EnvironmentState::Mobile));
        assert_eq!(reading.total_signals, 20);
        // classified on ble_count alone
        assert_eq!(reading.crowd_level, CrowdLevel::Calm);
    }

    #[test]
    fn test_decode_beacon_payload() {
        let reading = decode(&[0x01, 0x00, 0x00, 0x01, 0x00], &clock()).unwrap();
        assert_eq!(reading.wifi_count, 256);
        assert_eq!(reading.ble_count, 1);
        assert_eq!(reading.beacon, Some(BeaconReading::NotDetected));
        assert_eq!(reading.beacon_rssi(), Some(None));
        assert_eq!(reading.environment_state, None);
        assert_eq!(reading.crowd_level, CrowdLevel::Crowded);

        let reading = decode(&[0, 0, 0, 0, 0xFF], &clock()).unwrap();
        assert_eq!(reading.beacon_rssi(), Some(Some(-255)));
    }

    #[test]
    fn test_environment_fallback_to_static() {
        let reading = decode(&[0, 0, 0, 0, 0, 0x02], &clock()).unwrap();
        assert_eq!(reading.environment_state, Some(EnvironmentState::Static));
        let reading = decode(&[0, 0, 0, 0, 0, 0x00], &clock()).unwrap();
        assert_eq!(reading.environment_state, Some(EnvironmentState::Static));
    }

    #[test]
    fn test_counts_are_unsigned() {
        let reading = decode(&[0xFF, 0xFF, 0x80, 0x00], &clock()).unwrap();
        assert_eq!(reading.wifi_count, 65535);
        assert_eq!(reading.ble_count, 32768);
        assert_eq!(reading.total_signals, 98303);
    }

    #[test]
    fn test_classification_boundaries_by_version() {
        let level = |bytes: &[u8]| decode(bytes, &clock()).unwrap().crowd_level;
        assert_eq!(level(&[0, 2, 0, 2]), CrowdLevel::Calm);
        assert_eq!(level(&[0, 2, 0, 3]), CrowdLevel::Moderate);
        assert_eq!(level(&[0, 10, 0, 9, 0]), CrowdLevel::Moderate);
        assert_eq!(level(&[0, 10, 0, 10, 0]), CrowdLevel::Crowded);
        assert_eq!(level(&[0, 90, 0, 19, 0, 0]), CrowdLevel::Calm);
        assert_eq!(level(&[0, 0, 0, 20, 0, 0]), CrowdLevel::Moderate);
        assert_eq!(level(&[0, 0, 0, 79, 0, 0]), CrowdLevel::Moderate);
        assert_eq!(level(&[0, 0, 0, 80, 0, 0]), CrowdLevel::Crowded);
    }

    #[test]
    fn test_every_layout_fills_its_fields() {
        for len in crate::layout::SUPPORTED_LENGTHS {
            let bytes = vec![0xFF; len];
            let reading = decode(&bytes, &clock()).unwrap();
            assert_eq!(reading.wifi_count, u16::MAX);
            assert_eq!(reading.ble_count, u16::MAX);
            assert_eq!(reading.beacon.is_some(), len >= 5);
            assert_eq!(reading.environment_state.is_some(), len == 6);
        }
    }

    #[test]
    fn test_total_matches_metric() {
        let reading = decode(&[0xFF, 0xFF, 0xFF, 0xFF], &clock()).unwrap();
        assert_eq!(
            reading.total_signals,
            Metric::TotalSignals.value(u16::MAX, u16::MAX)
        );
    }

    #[test]
    fn test_encode_picks_smallest_layout() {
        let mut fields = DecodedFields {
            wifi_count: 8,
            ble_count: 12,
            ..Default::default()
        };
        assert_eq!(encode(&fields), vec![0x00, 0x08, 0x00, 0x0C]);

        fields.environment_state = Some(EnvironmentState::Mobile);
        assert_eq!(encode(&fields), vec![0x00, 0x08, 0x00, 0x0C, 0x00, 0x01]);

        fields.beacon = BeaconReading::from_rssi(-80);
        assert_eq!(encode(&fields), vec![0x00, 0x08, 0x00, 0x0C, 0x50, 0x01]);
    }

    fn arb_fields() -> impl Strategy<Value = DecodedFields> {
        (
            any::<u16>(),
            any::<u16>(),
            prop::option::of(any::<u8>().prop_map(BeaconReading::from_raw)),
            prop::option::of(prop_oneof![
                Just(EnvironmentState::Static),
                Just(EnvironmentState::Mobile)
            ]),
        )
            .prop_map(|(wifi_count, ble_count, beacon, environment_state)| {
                // an environment byte always comes with a beacon byte
                let beacon = match (beacon, environment_state) {
                    (None, Some(_)) => Some(BeaconReading::NotDetected),
                    (beacon, _) => beacon,
                };
                DecodedFields {
                    wifi_count,
                    ble_count,
                    beacon,
                    environment_state,
                }
            })
    }

    proptest! {
        #[test]
        fn prop_total_is_sum_of_counters(bytes in prop::collection::vec(any::<u8>(), 4..=6)) {
            let reading = decode(&bytes, &clock()).unwrap();
            prop_assert_eq!(
                reading.total_signals,
                u32::from(reading.wifi_count) + u32::from(reading.ble_count)
            );
            prop_assert_eq!(reading.beacon_rssi().flatten().is_some(), reading.beacon_detected() == Some(true));
        }

        #[test]
        fn prop_unsupported_lengths_rejected(
            bytes in prop::collection::vec(any::<u8>(), 0..64)
                .prop_filter("supported length", |b| !(4..=6).contains(&b.len()))
        ) {
            prop_assert_eq!(decode(&bytes, &clock()), Err(LengthError { actual: bytes.len() }));
        }

        #[test]
        fn prop_encode_then_decode(fields in arb_fields()) {
            let reading = decode(&encode(&fields), &clock()).unwrap();
            prop_assert_eq!(reading.fields(), fields);
        }

        #[test]
        fn prop_decode_then_encode(bytes in prop::collection::vec(any::<u8>(), 4..=6)) {
            let reading = decode(&bytes, &clock()).unwrap();
            // environment bytes other than 0/1 collapse to STATIC
            let mut expected = bytes.clone();
            if let Some(env) = expected.get_mut(5) {
                *env = u8::from(*env == 1);
            }
            prop_assert_eq!(encode(&reading.fields()), expected);
        }
    }
}
