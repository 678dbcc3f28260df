use std::num::NonZeroU8;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serializer;
use serde_derive::Serialize;

use crate::classify::CrowdLevel;
use crate::error::ParseEnvironmentError;
use crate::layout::PayloadVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeaconReading {
    NotDetected,
    /// RSSI magnitude as sent on the wire, i.e. `-dBm`.
    Detected(NonZeroU8),
}

impl BeaconReading {
    pub fn from_raw(raw: u8) -> Self {
        match NonZeroU8::new(raw) {
            Some(magnitude) => BeaconReading::Detected(magnitude),
            None => BeaconReading::NotDetected,
        }
    }

    /// Accepts -255..=-1 dBm, or 0 for "no beacon".
    pub fn from_rssi(dbm: i16) -> Option<Self> {
        if dbm > 0 {
            return None;
        }
        u8::try_from(-dbm).ok().map(BeaconReading::from_raw)
    }

    pub fn raw(&self) -> u8 {
        match self {
            BeaconReading::NotDetected => 0,
            BeaconReading::Detected(magnitude) => magnitude.get(),
        }
    }

    pub fn detected(&self) -> bool {
        matches!(self, BeaconReading::Detected(_))
    }

    pub fn rssi(&self) -> Option<i16> {
        match self {
            BeaconReading::NotDetected => None,
            BeaconReading::Detected(magnitude) => Some(-i16::from(magnitude.get())),
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum EnvironmentState {
    Static,
    Mobile,
}

impl EnvironmentState {
    /// Only 1 means mobile; every other byte is treated as static.
    pub fn from_raw(raw: u8) -> Self {
        if raw == 1 {
            EnvironmentState::Mobile
        } else {
            EnvironmentState::Static
        }
    }

    pub fn raw(&self) -> u8 {
        match self {
            EnvironmentState::Static => 0,
            EnvironmentState::Mobile => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentState::Static => "STATIC",
            EnvironmentState::Mobile => "MOBILE",
        }
    }
}

impl FromStr for EnvironmentState {
    type Err = ParseEnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "static" => Ok(EnvironmentState::Static),
            "mobile" => Ok(EnvironmentState::Mobile),
            _ => Err(ParseEnvironmentError(s.to_string())),
        }
    }
}

/// Raw field values carried by a payload, before any derived metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodedFields {
    pub wifi_count: u16,
    pub ble_count: u16,
    pub beacon: Option<BeaconReading>,
    pub environment_state: Option<EnvironmentState>,
}

/// One decoded uplink. Built once per call and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedReading {
    pub version: PayloadVersion,
    pub wifi_count: u16,
    pub ble_count: u16,
    pub beacon: Option<BeaconReading>,
    pub environment_state: Option<EnvironmentState>,
    pub total_signals: u32,
    pub crowd_level: CrowdLevel,
    pub observed_at: DateTime<Utc>,
}

impl DecodedReading {
    pub fn fields(&self) -> DecodedFields {
        DecodedFields {
            wifi_count: self.wifi_count,
            ble_count: self.ble_count,
            beacon: self.beacon,
            environment_state: self.environment_state,
        }
    }

    pub fn beacon_detected(&self) -> Option<bool> {
        self.beacon.map(|b| b.detected())
    }

    /// `None` when the layout has no beacon byte, `Some(None)` when it has
    /// one but nothing was heard.
    pub fn beacon_rssi(&self) -> Option<Option<i16>> {
        self.beacon.map(|b| b.rssi())
    }
}

#[derive(Serialize)]
struct ReadingMessage {
    wifi_count: u16,
    ble_count: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    beacon_detected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    beacon_rssi: Option<Option<i16>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    environment_state: Option<EnvironmentState>,
    total_signals: u32,
    crowd_level: u8,
    crowd_text: &'static str,
    timestamp: String,
}

impl serde::Serialize for DecodedReading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let message = ReadingMessage {
            wifi_count: self.wifi_count,
            ble_count: self.ble_count,
            beacon_detected: self.beacon_detected(),
            beacon_rssi: self.beacon_rssi(),
            environment_state: self.environment_state,
            total_signals: self.total_signals,
            crowd_level: self.crowd_level.ordinal(),
            crowd_text: self.crowd_level.as_str(),
            timestamp: self.observed_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        serde::Serialize::serialize(&message, serializer)
    }
}
