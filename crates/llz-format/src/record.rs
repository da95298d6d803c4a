//! LLZ record codec
//!
//! [`Record`] holds values in physical units. [`RawRecord`] holds the scaled
//! integers exactly as stored on disk and reads/writes them with `binrw`
//! according to a [`RecordLayout`] and the file's byte order.
//!
//! | Field       | Stored as | Scale      |
//! |-------------|-----------|------------|
//! | uncertainty | i32       | 10_000     |
//! | latitude    | i32       | 10_000_000 |
//! | longitude   | i32       | 10_000_000 |
//! | depth       | i32       | 10_000     |

use crate::endian::ByteOrder;
use crate::error::{FormatError, Result};
use crate::layout::{RecordLayout, StatusWidth};
use binrw::{BinRead, BinResult, BinWrite};
use std::io::{Cursor, Read, Seek, Write};

/// Scale applied to uncertainty values
pub const UNCERTAINTY_SCALE: f64 = 10_000.0;

/// Scale applied to latitude and longitude
pub const POSITION_SCALE: f64 = 10_000_000.0;

/// Scale applied to depth values
pub const DEPTH_SCALE: f64 = 10_000.0;

/// Status bits shared by all eras
pub mod status {
    /// Point has been manually marked invalid
    pub const MANUALLY_INVALID: u32 = 0x0001;
    /// Point has been automatically marked invalid
    pub const FILTER_INVALID: u32 = 0x0002;
    /// Mask for either kind of invalidity
    pub const INVALID: u32 = MANUALLY_INVALID | FILTER_INVALID;
}

/// POSIX timestamp stored with each record when the time flag is set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Timestamp {
    /// Seconds since 1970-01-01 UTC
    pub seconds: i32,
    /// Nanoseconds of the second
    pub nanoseconds: i32,
}

impl Timestamp {
    /// Create a timestamp
    pub const fn new(seconds: i32, nanoseconds: i32) -> Self {
        Self {
            seconds,
            nanoseconds,
        }
    }
}

/// One point in physical units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Record {
    /// Time of the observation, present when the file carries time
    pub time: Option<Timestamp>,
    /// Vertical uncertainty, present when the file carries uncertainty
    pub uncertainty: Option<f64>,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Depth, positive below the surface
    pub depth: f64,
    /// Status bits, see [`status`]
    pub status: u32,
}

impl Record {
    /// Create a record without time or uncertainty
    pub const fn new(latitude: f64, longitude: f64, depth: f64) -> Self {
        Self {
            time: None,
            uncertainty: None,
            latitude,
            longitude,
            depth,
            status: 0,
        }
    }

    /// Attach a timestamp
    #[must_use]
    pub const fn with_time(mut self, time: Timestamp) -> Self {
        self.time = Some(time);
        self
    }

    /// Attach an uncertainty
    #[must_use]
    pub const fn with_uncertainty(mut self, uncertainty: f64) -> Self {
        self.uncertainty = Some(uncertainty);
        self
    }

    /// Set the status bits
    #[must_use]
    pub const fn with_status(mut self, status: u32) -> Self {
        self.status = status;
        self
    }

    /// Whether either invalid bit is set
    pub const fn is_invalid(&self) -> bool {
        self.status & status::INVALID != 0
    }

    /// Whether the point was manually marked invalid
    pub const fn is_manually_invalid(&self) -> bool {
        self.status & status::MANUALLY_INVALID != 0
    }

    /// Whether the point was marked invalid by a filter
    pub const fn is_filter_invalid(&self) -> bool {
        self.status & status::FILTER_INVALID != 0
    }
}

/// Round to the nearest fixed-point step, halves away from zero
fn scale(value: f64, factor: f64) -> i32 {
    // `as` saturates out-of-range values and maps NaN to 0
    (value * factor).round() as i32
}

/// A record as stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RawRecord {
    /// Time seconds
    pub seconds: i32,
    /// Time nanoseconds
    pub nanoseconds: i32,
    /// Uncertainty x 10_000
    pub uncertainty: i32,
    /// Latitude x 10_000_000
    pub latitude: i32,
    /// Longitude x 10_000_000
    pub longitude: i32,
    /// Depth x 10_000
    pub depth: i32,
    /// Status at its stored width
    pub status: u32,
}

impl RawRecord {
    /// Scale a record for the given layout
    ///
    /// Fields the layout does not carry are zeroed and the status is
    /// truncated to the stored width.
    pub fn encode(record: &Record, layout: &RecordLayout) -> Self {
        let time = record
            .time
            .filter(|_| layout.has_time)
            .unwrap_or_default();
        let uncertainty = record
            .uncertainty
            .filter(|_| layout.has_uncertainty)
            .map_or(0, |u| scale(u, UNCERTAINTY_SCALE));
        let status = match layout.status {
            StatusWidth::U16 => u32::from(record.status as u16),
            StatusWidth::U32 => record.status,
        };

        Self {
            seconds: time.seconds,
            nanoseconds: time.nanoseconds,
            uncertainty,
            latitude: scale(record.latitude, POSITION_SCALE),
            longitude: scale(record.longitude, POSITION_SCALE),
            depth: scale(record.depth, DEPTH_SCALE),
            status,
        }
    }

    /// Convert back to physical units
    pub fn decode(&self, layout: &RecordLayout) -> Record {
        Record {
            time: layout
                .has_time
                .then(|| Timestamp::new(self.seconds, self.nanoseconds)),
            uncertainty: layout
                .has_uncertainty
                .then(|| f64::from(self.uncertainty) / UNCERTAINTY_SCALE),
            latitude: f64::from(self.latitude) / POSITION_SCALE,
            longitude: f64::from(self.longitude) / POSITION_SCALE,
            depth: f64::from(self.depth) / DEPTH_SCALE,
            status: self.status,
        }
    }

    /// Parse one record from a buffer of at least `layout.stride()` bytes
    pub fn from_bytes(data: &[u8], layout: &RecordLayout, order: ByteOrder) -> Result<Self> {
        if data.len() < layout.stride() {
            return Err(FormatError::TruncatedRecord {
                expected: layout.stride(),
                actual: data.len(),
            });
        }
        let mut cursor = Cursor::new(data);
        Ok(Self::read_options(&mut cursor, order.endian(), *layout)?)
    }

    /// Serialize to exactly `layout.stride()` bytes
    pub fn to_bytes(&self, layout: &RecordLayout, order: ByteOrder) -> Result<Vec<u8>> {
        let mut buffer = Vec::with_capacity(layout.stride());
        self.write_options(&mut Cursor::new(&mut buffer), order.endian(), *layout)?;
        Ok(buffer)
    }
}

impl BinRead for RawRecord {
    type Args<'a> = RecordLayout;

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: binrw::Endian,
        layout: Self::Args<'_>,
    ) -> BinResult<Self> {
        let mut raw = Self::default();

        if layout.has_time {
            raw.seconds = i32::read_options(reader, endian, ())?;
            raw.nanoseconds = i32::read_options(reader, endian, ())?;
        }
        if layout.has_uncertainty {
            raw.uncertainty = i32::read_options(reader, endian, ())?;
        }

        raw.latitude = i32::read_options(reader, endian, ())?;
        raw.longitude = i32::read_options(reader, endian, ())?;
        raw.depth = i32::read_options(reader, endian, ())?;

        // Status is swapped at its stored width
        raw.status = match layout.status {
            StatusWidth::U16 => u32::from(u16::read_options(reader, endian, ())?),
            StatusWidth::U32 => u32::read_options(reader, endian, ())?,
        };

        Ok(raw)
    }
}

impl BinWrite for RawRecord {
    type Args<'a> = RecordLayout;

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        endian: binrw::Endian,
        layout: Self::Args<'_>,
    ) -> BinResult<()> {
        if layout.has_time {
            self.seconds.write_options(writer, endian, ())?;
            self.nanoseconds.write_options(writer, endian, ())?;
        }
        if layout.has_uncertainty {
            self.uncertainty.write_options(writer, endian, ())?;
        }

        self.latitude.write_options(writer, endian, ())?;
        self.longitude.write_options(writer, endian, ())?;
        self.depth.write_options(writer, endian, ())?;

        match layout.status {
            StatusWidth::U16 => (self.status as u16).write_options(writer, endian, ())?,
            StatusWidth::U32 => self.status.write_options(writer, endian, ())?,
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::version::FormatVersion;
    use proptest::prelude::*;

    fn all_layouts() -> Vec<RecordLayout> {
        let mut layouts = Vec::new();
        for major in [1, 2, 3, 4] {
            for time in [false, true] {
                for uncertainty in [false, true] {
                    layouts.push(RecordLayout::resolve(
                        FormatVersion::new(major, 0),
                        time,
                        uncertainty,
                    ));
                }
            }
        }
        layouts
    }

    #[test]
    fn test_scaling_precision() {
        let layout = RecordLayout::resolve(FormatVersion::current(), false, false);
        let record = Record::new(45.123_456_7, -122.987_654_3, 123.4567);
        let decoded = RawRecord::encode(&record, &layout).decode(&layout);

        assert!((decoded.latitude - 45.123_456_7).abs() <= 1e-7);
        assert!((decoded.longitude + 122.987_654_3).abs() <= 1e-7);
        assert!((decoded.depth - 123.4567).abs() <= 1e-4);
    }

    #[test]
    fn test_rounding_is_nearest() {
        let layout = RecordLayout::resolve(FormatVersion::current(), false, true);
        let record = Record::new(0.000_000_06, -0.000_000_06, -0.000_07).with_uncertainty(0.000_04);
        let raw = RawRecord::encode(&record, &layout);

        assert_eq!(raw.latitude, 1);
        assert_eq!(raw.longitude, -1);
        assert_eq!(raw.depth, -1);
        assert_eq!(raw.uncertainty, 0);
    }

    #[test]
    fn test_absent_fields_are_dropped() {
        let layout = RecordLayout::resolve(FormatVersion::new(1, 0), true, true);
        let record = Record::new(1.0, 2.0, 3.0)
            .with_time(Timestamp::new(1_700_000_000, 5))
            .with_uncertainty(0.25);
        let raw = RawRecord::encode(&record, &layout);

        assert_eq!(raw.seconds, 0);
        assert_eq!(raw.uncertainty, 0);
        let decoded = raw.decode(&layout);
        assert_eq!(decoded.time, None);
        assert_eq!(decoded.uncertainty, None);
    }

    #[test]
    fn test_status_truncated_to_16_bits() {
        let v4 = RecordLayout::resolve(FormatVersion::current(), false, false);
        let v3 = RecordLayout::resolve(FormatVersion::new(3, 0), false, false);
        let record = Record::new(0.0, 0.0, 0.0).with_status(0x0003_8001);

        assert_eq!(RawRecord::encode(&record, &v4).status, 0x8001);
        assert_eq!(RawRecord::encode(&record, &v3).status, 0x0003_8001);
    }

    #[test]
    fn test_field_order_on_disk() {
        let layout = RecordLayout::resolve(FormatVersion::current(), true, true);
        let raw = RawRecord {
            seconds: 1,
            nanoseconds: 2,
            uncertainty: 3,
            latitude: 4,
            longitude: 5,
            depth: 6,
            status: 7,
        };
        let bytes = raw.to_bytes(&layout, ByteOrder::Big).unwrap();

        assert_eq!(
            bytes,
            vec![
                0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 4, 0, 0, 0, 5, 0, 0, 0, 6, 0, 7
            ]
        );
    }

    #[test]
    fn test_v1_layout_bytes() {
        let layout = RecordLayout::resolve(FormatVersion::new(1, 0), false, false);
        let raw = RawRecord {
            latitude: -1,
            longitude: 0x0102_0304,
            depth: 0,
            status: 0x0000_0002,
            ..RawRecord::default()
        };
        let bytes = raw.to_bytes(&layout, ByteOrder::Little).unwrap();

        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[0..4], &[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&bytes[4..8], &[4, 3, 2, 1]);
        assert_eq!(&bytes[12..16], &[2, 0, 0, 0]);
    }

    #[test]
    fn test_byte_order_independent_values() {
        let layout = RecordLayout::resolve(FormatVersion::current(), true, false);
        let record = Record::new(-33.856_784, 151.215_297, 12.5)
            .with_time(Timestamp::new(1_262_304_000, 500))
            .with_status(status::FILTER_INVALID);
        let raw = RawRecord::encode(&record, &layout);

        let big = raw.to_bytes(&layout, ByteOrder::Big).unwrap();
        let little = raw.to_bytes(&layout, ByteOrder::Little).unwrap();
        assert_ne!(big, little);

        let from_big = RawRecord::from_bytes(&big, &layout, ByteOrder::Big).unwrap();
        let from_little = RawRecord::from_bytes(&little, &layout, ByteOrder::Little).unwrap();
        assert_eq!(from_big, from_little);
        assert_eq!(from_big.decode(&layout), from_little.decode(&layout));
        assert!(from_big.decode(&layout).is_filter_invalid());
    }

    #[test]
    fn test_truncated_buffer() {
        let layout = RecordLayout::resolve(FormatVersion::current(), true, true);
        assert!(matches!(
            RawRecord::from_bytes(&[0u8; 10], &layout, ByteOrder::Little),
            Err(FormatError::TruncatedRecord {
                expected: 26,
                actual: 10
            })
        ));
    }

    #[test]
    fn test_status_helpers() {
        let record = Record::new(0.0, 0.0, 0.0).with_status(status::MANUALLY_INVALID);
        assert!(record.is_invalid());
        assert!(record.is_manually_invalid());
        assert!(!record.is_filter_invalid());
        assert!(!Record::new(0.0, 0.0, 0.0).is_invalid());
    }

    fn raw_for(layout: RecordLayout) -> impl Strategy<Value = RawRecord> {
        (
            any::<i32>(),
            any::<i32>(),
            any::<i32>(),
            any::<i32>(),
            any::<i32>(),
            any::<i32>(),
            any::<u32>(),
        )
            .prop_map(move |(s, ns, u, lat, lon, dep, stat)| RawRecord {
                seconds: if layout.has_time { s } else { 0 },
                nanoseconds: if layout.has_time { ns } else { 0 },
                uncertainty: if layout.has_uncertainty { u } else { 0 },
                latitude: lat,
                longitude: lon,
                depth: dep,
                status: match layout.status {
                    StatusWidth::U16 => stat & 0xFFFF,
                    StatusWidth::U32 => stat,
                },
            })
    }

    fn layout_and_raw() -> impl Strategy<Value = (RecordLayout, RawRecord)> {
        proptest::sample::select(all_layouts())
            .prop_flat_map(|layout| (Just(layout), raw_for(layout)))
    }

    proptest! {
        /// Decoding then re-encoding a stored record reproduces it exactly
        #[test]
        fn raw_records_survive_decode(
            (layout, raw) in layout_and_raw(),
            big in any::<bool>(),
        ) {
            let order = if big { ByteOrder::Big } else { ByteOrder::Little };
            let bytes = raw.to_bytes(&layout, order).map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(bytes.len(), layout.stride());

            let parsed = RawRecord::from_bytes(&bytes, &layout, order).map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(parsed, raw);

            let reencoded = RawRecord::encode(&parsed.decode(&layout), &layout);
            prop_assert_eq!(reencoded, raw);
        }
    }

    #[test]
    fn test_extreme_values_survive_decode() {
        for layout in all_layouts() {
            for value in [0, 1, -1, i32::MAX, i32::MIN] {
                let raw = RawRecord {
                    seconds: if layout.has_time { value } else { 0 },
                    nanoseconds: if layout.has_time { value } else { 0 },
                    uncertainty: if layout.has_uncertainty { value } else { 0 },
                    latitude: value,
                    longitude: value,
                    depth: value,
                    status: match layout.status {
                        StatusWidth::U16 => u32::from(u16::MAX),
                        StatusWidth::U32 => u32::MAX,
                    },
                };
                assert_eq!(RawRecord::encode(&raw.decode(&layout), &layout), raw);
            }
        }
    }
}
