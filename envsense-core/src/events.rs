//! Discovery Events Delivered by the Scanning Collaborator
//!
//! ## Overview
//!
//! The radio subsystem is external to this crate. Its contract is a stream
//! of [`BeaconEvent`]s - one per received advertisement - carrying the
//! device identifier, the received signal strength, the capture timestamp,
//! and the advertised payload elements the aggregation core consumes.
//!
//! ## Memory Model
//!
//! Events cross an ISR-to-task boundary through a fixed-capacity ring
//! (see [`queue`](crate::queue)), so they are sized for by-value transport:
//!
//! - Identifier strings are stored inline (no heap, no lifetimes).
//! - Payload bytes are stored inline up to the BLE advertising PDU limit of
//!   31 bytes.
//! - The whole event stays under half a kilobyte; a 64-slot queue of them
//!   costs about 22 KB of static RAM.
//!
//! Elements the core has no use for (names, flags, appearance, ...) are
//! expected to be filtered out by the radio glue before the event is built.

use heapless::Vec;

use crate::time::Ticks;

/// Maximum length of a device identifier string.
///
/// Sized for the textual form of a Bluetooth LE address including its type
/// suffix, e.g. `E8:5B:5B:11:22:33 (random)`.
pub const DEVICE_ID_MAX_LEN: usize = 29;

/// Maximum length of a printed service UUID (16-bit UUIDs print as 4 hex
/// digits; headroom for longer forms).
pub const SERVICE_UUID_MAX_LEN: usize = 8;

/// Maximum payload bytes carried per advertised element (BLE legacy
/// advertising PDU data limit).
pub const ADV_DATA_MAX_LEN: usize = 31;

/// Maximum advertised elements carried per event.
pub const MAX_ADV_ELEMENTS: usize = 6;

/// Inline device identifier string.
///
/// Equality is exact string match; two identifiers are the same device
/// within a window if and only if their text is identical.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId {
    len: u8,
    data: [u8; DEVICE_ID_MAX_LEN],
}

impl DeviceId {
    /// Create from a string slice. Returns `None` if it does not fit.
    pub fn new(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() > DEVICE_ID_MAX_LEN {
            return None;
        }

        let mut data = [0u8; DEVICE_ID_MAX_LEN];
        data[..bytes.len()].copy_from_slice(bytes);

        Some(Self {
            len: bytes.len() as u8,
            data,
        })
    }

    /// Get as string slice.
    pub fn as_str(&self) -> &str {
        // Only valid UTF-8 is stored by new(), so this never panics
        core::str::from_utf8(&self.data[..self.len as usize])
            .expect("DeviceId contains invalid UTF-8")
    }
}

impl core::fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

/// Inline printed service UUID.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceUuid {
    len: u8,
    data: [u8; SERVICE_UUID_MAX_LEN],
}

impl ServiceUuid {
    /// Create from a string slice. Returns `None` if it does not fit.
    pub fn new(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() > SERVICE_UUID_MAX_LEN {
            return None;
        }

        let mut data = [0u8; SERVICE_UUID_MAX_LEN];
        data[..bytes.len()].copy_from_slice(bytes);

        Some(Self {
            len: bytes.len() as u8,
            data,
        })
    }

    /// Printed form of a 16-bit UUID: four lowercase hex digits.
    pub fn from_u16(value: u16) -> Self {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut data = [0u8; SERVICE_UUID_MAX_LEN];
        data[0] = HEX[(value >> 12) as usize & 0xf];
        data[1] = HEX[(value >> 8) as usize & 0xf];
        data[2] = HEX[(value >> 4) as usize & 0xf];
        data[3] = HEX[(value & 0xf) as usize];
        Self { len: 4, data }
    }

    /// Get as string slice.
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.data[..self.len as usize])
            .expect("ServiceUuid contains invalid UTF-8")
    }
}

impl core::fmt::Debug for ServiceUuid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

/// One advertised payload element, pre-filtered to the types the core
/// aggregates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvElement {
    /// Advertised transmit power level, raw byte as received.
    TxPower(u8),
    /// Manufacturer-specific data; only its length is aggregated.
    ManufacturerData(Vec<u8, ADV_DATA_MAX_LEN>),
    /// Raw little-endian list of 16-bit service UUIDs.
    ServiceUuids16(Vec<u8, ADV_DATA_MAX_LEN>),
}

/// One discovery callback's worth of data.
#[derive(Debug, Clone)]
pub struct BeaconEvent {
    /// Sending device.
    pub device: DeviceId,
    /// Received signal strength in dBm.
    pub rssi: i8,
    /// Capture timestamp (hardware counter value).
    pub timestamp: Ticks,
    /// Advertised elements, in payload order.
    pub elements: Vec<AdvElement, MAX_ADV_ELEMENTS>,
}

impl BeaconEvent {
    /// Create an event with no advertised elements.
    pub fn new(device: DeviceId, rssi: i8, timestamp: Ticks) -> Self {
        Self {
            device,
            rssi,
            timestamp,
            elements: Vec::new(),
        }
    }

    /// Append an advertised element; hands the element back when all
    /// per-event slots are taken.
    pub fn push_element(&mut self, element: AdvElement) -> Result<(), AdvElement> {
        self.elements.push(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_size() {
        // Events are queued by value; keep them well under 512 bytes
        assert!(core::mem::size_of::<BeaconEvent>() <= 512);
    }

    #[test]
    fn device_id_round_trip() {
        let id = DeviceId::new("E8:5B:5B:11:22:33 (random)").unwrap();
        assert_eq!(id.as_str(), "E8:5B:5B:11:22:33 (random)");

        // Too long
        assert!(DeviceId::new("0123456789:0123456789:0123456789").is_none());
    }

    #[test]
    fn device_id_equality_is_exact() {
        let a = DeviceId::new("AA:BB").unwrap();
        let b = DeviceId::new("AA:BB").unwrap();
        let c = DeviceId::new("AA:BC").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn uuid_from_u16_prints_lowercase_hex() {
        assert_eq!(ServiceUuid::from_u16(0x0af0).as_str(), "0af0");
        assert_eq!(ServiceUuid::from_u16(0xFE9F).as_str(), "fe9f");
        assert_eq!(ServiceUuid::from_u16(0x0001).as_str(), "0001");
    }

    #[test]
    fn element_capacity() {
        let mut event = BeaconEvent::new(DeviceId::new("AA").unwrap(), -40, 0);
        for _ in 0..MAX_ADV_ELEMENTS {
            assert!(event.push_element(AdvElement::TxPower(4)).is_ok());
        }
        assert!(event.push_element(AdvElement::TxPower(4)).is_err());
    }
}
