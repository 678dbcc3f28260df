//! Response shapes for the two kinds of callers: network servers expect a
//! `{data, warnings, errors}` object, dashboards a flat list of
//! `{field, value}` records.

use log::debug;
use serde::ser::SerializeMap as _;
use serde::Serializer;
use serde_derive::{Deserialize, Serialize};

use crate::classify::DASHBOARD_POLICY;
use crate::clock::{Clock, SystemClock};
use crate::decoder;
use crate::reading::DecodedReading;

/// Uplink as handed over by the network server.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct UplinkInput {
    pub bytes: Vec<u8>,
    #[serde(rename = "fPort", default)]
    pub f_port: u8,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UplinkResult {
    #[serde(serialize_with = "serialize_data")]
    pub data: Option<DecodedReading>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

fn serialize_data<S: Serializer>(
    data: &Option<DecodedReading>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match data {
        Some(reading) => serde::Serialize::serialize(reading, serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}

pub fn decode_uplink(input: &UplinkInput) -> UplinkResult {
    decode_uplink_with_clock(input, &SystemClock)
}

pub fn decode_uplink_with_clock(input: &UplinkInput, clock: &impl Clock) -> UplinkResult {
    debug!("Uplink on port {} ({} bytes)", input.f_port, input.bytes.len());
    match decoder::decode(&input.bytes, clock) {
        Ok(reading) => UplinkResult {
            data: Some(reading),
            warnings: vec![],
            errors: vec![],
        },
        Err(err) => UplinkResult {
            data: None,
            warnings: vec![],
            errors: vec![err.to_string()],
        },
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Unsigned(u32),
    Signed(i16),
    Bool(bool),
    Text(String),
    Null,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FieldRecord {
    pub field: &'static str,
    pub value: FieldValue,
}

impl FieldRecord {
    fn new(field: &'static str, value: FieldValue) -> Self {
        FieldRecord { field, value }
    }
}

pub fn decode_field_list(payload: &[u8], port: u8) -> Vec<FieldRecord> {
    decode_field_list_with_clock(payload, port, &SystemClock)
}

pub fn decode_field_list_with_clock(
    payload: &[u8],
    port: u8,
    clock: &impl Clock,
) -> Vec<FieldRecord> {
    debug!("Field list for port {} ({} bytes)", port, payload.len());
    let reading = match decoder::decode(payload, clock) {
        Ok(reading) => reading,
        Err(err) => return vec![FieldRecord::new("ERROR", FieldValue::Text(err.to_string()))],
    };

    let crowd_status = DASHBOARD_POLICY.classify(reading.wifi_count, reading.ble_count);
    let mut records = vec![
        FieldRecord::new("WIFI_COUNT", FieldValue::Unsigned(reading.wifi_count.into())),
        FieldRecord::new("BLE_COUNT", FieldValue::Unsigned(reading.ble_count.into())),
        FieldRecord::new("TOTAL_SIGNALS", FieldValue::Unsigned(reading.total_signals)),
        FieldRecord::new(
            "CROWD_STATUS",
            FieldValue::Text(crowd_status.as_str().to_string()),
        ),
    ];
    if let Some(beacon) = reading.beacon {
        records.push(FieldRecord::new(
            "BEACON_DETECTED",
            FieldValue::Bool(beacon.detected()),
        ));
        records.push(FieldRecord::new(
            "BEACON_RSSI",
            beacon.rssi().map_or(FieldValue::Null, FieldValue::Signed),
        ));
    }
    if let Some(state) = reading.environment_state {
        records.push(FieldRecord::new(
            "ENVIRONMENT_STATE",
            FieldValue::Text(state.as_str().to_string()),
        ));
    }
    records
}
