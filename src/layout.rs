//! Payload layouts, selected by the total length of the uplink.
//!
//! ```text
//! offset  width  field
//! 0       2      wifi_count         (u16, big-endian)
//! 2       2      ble_count          (u16, big-endian)
//! 4       1      beacon RSSI        (magnitude, 0 = no beacon)   len >= 5
//! 5       1      environment state  (1 = mobile, else static)    len == 6
//! ```

use log::warn;

use crate::classify::{BLE_POLICY, COUNTS_POLICY, ClassificationPolicy};
use crate::error::LengthError;
use crate::reading::DecodedFields;

pub const SUPPORTED_LENGTHS: [usize; 3] = [4, 5, 6];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Uint16Be,
    SignedMagnitudeUint8,
    EnumUint8,
}

impl FieldKind {
    pub fn width(&self) -> usize {
        match self {
            FieldKind::Uint16Be => 2,
            FieldKind::SignedMagnitudeUint8 | FieldKind::EnumUint8 => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldName {
    WifiCount,
    BleCount,
    Beacon,
    EnvironmentState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: FieldName,
    pub offset: usize,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn end(&self) -> usize {
        self.offset + self.kind.width()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadVersion {
    /// Wi-Fi and BLE counters only.
    Counts,
    /// Counters plus the beacon RSSI byte.
    Beacon,
    /// Counters, beacon and environment state.
    Environment,
}

impl PayloadVersion {
    /// Smallest version able to carry every field that is set.
    pub fn for_fields(fields: &DecodedFields) -> Self {
        if fields.environment_state.is_some() {
            PayloadVersion::Environment
        } else if fields.beacon.is_some() {
            PayloadVersion::Beacon
        } else {
            PayloadVersion::Counts
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct PayloadLayout {
    pub version: PayloadVersion,
    pub length: usize,
    pub fields: &'static [FieldDescriptor],
    pub policy: ClassificationPolicy,
}

const WIFI_COUNT: FieldDescriptor = FieldDescriptor {
    name: FieldName::WifiCount,
    offset: 0,
    kind: FieldKind::Uint16Be,
};

const BLE_COUNT: FieldDescriptor = FieldDescriptor {
    name: FieldName::BleCount,
    offset: 2,
    kind: FieldKind::Uint16Be,
};

const BEACON: FieldDescriptor = FieldDescriptor {
    name: FieldName::Beacon,
    offset: 4,
    kind: FieldKind::SignedMagnitudeUint8,
};

const ENVIRONMENT_STATE: FieldDescriptor = FieldDescriptor {
    name: FieldName::EnvironmentState,
    offset: 5,
    kind: FieldKind::EnumUint8,
};

static LAYOUTS: [PayloadLayout; 3] = [
    PayloadLayout {
        version: PayloadVersion::Counts,
        length: 4,
        fields: &[WIFI_COUNT, BLE_COUNT],
        policy: COUNTS_POLICY,
    },
    PayloadLayout {
        version: PayloadVersion::Beacon,
        length: 5,
        fields: &[WIFI_COUNT, BLE_COUNT, BEACON],
        policy: COUNTS_POLICY,
    },
    PayloadLayout {
        version: PayloadVersion::Environment,
        length: 6,
        fields: &[WIFI_COUNT, BLE_COUNT, BEACON, ENVIRONMENT_STATE],
        policy: BLE_POLICY,
    },
];

pub fn resolve(bytes: &[u8]) -> Result<&'static PayloadLayout, LengthError> {
    LAYOUTS
        .iter()
        .find(|layout| layout.length == bytes.len())
        .ok_or_else(|| {
            warn!("Rejecting {} byte payload", bytes.len());
            LengthError {
                actual: bytes.len(),
            }
        })
}

pub fn layout_for(version: PayloadVersion) -> &'static PayloadLayout {
    match version {
        PayloadVersion::Counts => &LAYOUTS[0],
        PayloadVersion::Beacon => &LAYOUTS[1],
        PayloadVersion::Environment => &LAYOUTS[2],
    }
}
