//! ANT+ Device Profiles
//!
//! Data page codecs. Common pages shared by every ANT+ profile live here,
//! the Bicycle Power pages live in [`power`].

pub mod power;

use super::{Payload, PowerError, PowerResult, PAYLOAD_LEN};

/// Common manufacturer information page number (Page 80)
pub const PAGE_MANUFACTURER_INFO: u8 = 0x50;

/// Common product information page number (Page 81)
pub const PAGE_PRODUCT_INFO: u8 = 0x51;

/// Filler for reserved bytes
const RESERVED: u8 = 0xFF;

/// Common trait for ANT+ profile data pages
pub trait AntProfilePage {
    /// Page number carried in byte 0
    const PAGE_NUMBER: u8;

    /// Parse raw payload into this page type
    fn parse(data: &[u8]) -> Option<Self>
    where
        Self: Sized;

    /// Get the page number
    fn page_number(&self) -> u8 {
        Self::PAGE_NUMBER
    }

    /// Parse with an explanation of why the payload was rejected.
    fn try_parse(data: &[u8]) -> PowerResult<Self>
    where
        Self: Sized,
    {
        ensure_page(data, Self::PAGE_NUMBER)?;
        Self::parse(data).ok_or(PowerError::UnexpectedPage {
            expected: Self::PAGE_NUMBER,
            actual: data[0],
        })
    }
}

/// Pages a virtual sensor can transmit
pub trait EncodablePage: AntProfilePage {
    /// Serialize this page into a broadcast payload
    fn encode(&self) -> Payload;
}

/// Check that `data` is a full payload carrying page `page`.
pub(crate) fn ensure_page(data: &[u8], page: u8) -> PowerResult<()> {
    if data.len() < PAYLOAD_LEN {
        return Err(PowerError::PayloadTooShort {
            expected: PAYLOAD_LEN,
            actual: data.len(),
        });
    }
    if data[0] != page {
        return Err(PowerError::UnexpectedPage {
            expected: page,
            actual: data[0],
        });
    }
    Ok(())
}

/// Little-endian u16 at `offset`.
///
/// A missing high byte reads as zero so that fields straddling the end of
/// the payload still decode.
pub(crate) fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    let lo = data.get(offset).copied().unwrap_or(0);
    let hi = data.get(offset + 1).copied().unwrap_or(0);
    u16::from_le_bytes([lo, hi])
}

/// Common manufacturer information page (Page 80)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManufacturerInfo {
    pub hw_revision: u8,
    pub manufacturer_id: u16,
    pub model_number: u16,
}

impl AntProfilePage for ManufacturerInfo {
    const PAGE_NUMBER: u8 = PAGE_MANUFACTURER_INFO;

    fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < PAYLOAD_LEN || data[0] != PAGE_MANUFACTURER_INFO {
            return None;
        }

        Some(Self {
            hw_revision: data[3],
            manufacturer_id: u16::from_le_bytes([data[4], data[5]]),
            model_number: u16::from_le_bytes([data[6], data[7]]),
        })
    }
}

impl EncodablePage for ManufacturerInfo {
    fn encode(&self) -> Payload {
        let [mfr_lo, mfr_hi] = self.manufacturer_id.to_le_bytes();
        let [model_lo, model_hi] = self.model_number.to_le_bytes();
        [
            PAGE_MANUFACTURER_INFO,
            RESERVED,
            RESERVED,
            self.hw_revision,
            mfr_lo,
            mfr_hi,
            model_lo,
            model_hi,
        ]
    }
}

/// Product information page (Page 81)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInfo {
    /// 0xFF when not used
    pub sw_revision_supplemental: u8,
    /// Software revision times ten (1.1 => 11)
    pub sw_revision_main: u8,
    pub serial_number: u32,
}

impl ProductInfo {
    /// Build from a decimal software revision such as `1.1`.
    pub fn from_revision(sw_revision: f32, serial_number: u32) -> Self {
        Self {
            sw_revision_supplemental: RESERVED,
            sw_revision_main: (sw_revision * 10.0).round().clamp(0.0, 254.0) as u8,
            serial_number,
        }
    }
}

impl AntProfilePage for ProductInfo {
    const PAGE_NUMBER: u8 = PAGE_PRODUCT_INFO;

    fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < PAYLOAD_LEN || data[0] != PAGE_PRODUCT_INFO {
            return None;
        }

        Some(Self {
            sw_revision_supplemental: data[2],
            sw_revision_main: data[3],
            serial_number: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
        })
    }
}

impl EncodablePage for ProductInfo {
    fn encode(&self) -> Payload {
        let serial = self.serial_number.to_le_bytes();
        [
            PAGE_PRODUCT_INFO,
            RESERVED,
            self.sw_revision_supplemental,
            self.sw_revision_main,
            serial[0],
            serial[1],
            serial[2],
            serial[3],
        ]
    }
}
