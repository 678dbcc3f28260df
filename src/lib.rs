//! Decoder for RoomGuard occupancy uplinks.
//!
//! A RoomGuard device counts nearby Wi-Fi and BLE devices and reports them in
//! a 4, 5 or 6 byte big-endian payload, optionally followed by the RSSI of a
//! tracked beacon and whether the device itself is moving. The payload length
//! selects the layout.
//!
//! ```
//! use roomguard_decoder::{UplinkInput, decode_uplink};
//!
//! let result = decode_uplink(&UplinkInput {
//!     bytes: vec![0x00, 0x08, 0x00, 0x0C],
//!     f_port: 1,
//! });
//! let data = result.data.unwrap();
//! assert_eq!(data.total_signals, 20);
//! assert_eq!(data.crowd_level.as_str(), "CROWDED");
//! ```

pub mod classify;
pub mod clock;
pub mod decoder;
pub mod error;
pub mod layout;
pub mod output;
pub mod reading;

pub use classify::{ClassificationPolicy, CrowdLevel, Metric};
pub use clock::{Clock, FixedClock, SystemClock};
pub use decoder::{decode, encode};
pub use error::{LengthError, ParseEnvironmentError};
pub use layout::{PayloadLayout, PayloadVersion};
pub use output::{
    FieldRecord, FieldValue, UplinkInput, UplinkResult, decode_field_list,
    decode_field_list_with_clock, decode_uplink, decode_uplink_with_clock,
};
pub use reading::{BeaconReading, DecodedFields, DecodedReading, EnvironmentState};
