//! The JSON channel-descriptor document carried by header frames.
//!
//! ```json
//! {
//!   "htype": "bsr_m-1.1",
//!   "channels": [
//!     { "name": "SINEG01-DBPM340:X1", "backend": "sf-databuffer",
//!       "type": "float64", "encoding": "little" },
//!     { "name": "SARES11-SPEC125-M1:FPICTURE", "backend": "sf-imagebuffer",
//!       "type": "uint16", "shape": [2560, 2160], "compression": "bitshuffle_lz4" }
//!   ]
//! }
//! ```
//!
//! `shape` on the wire lists the fastest-varying dimension first; the
//! descriptors produced here list the slowest first.

use serde::{Deserialize, Serialize};

use crate::channel::{shape_element_count, ChannelDescriptor, Compression};
use crate::element::ElementKind;
use crate::error::TypeError;
use idread_wire::ByteOrder;

/// Top-level header document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub htype: Option<String>,
    #[serde(default)]
    pub channels: Vec<ChannelEntry>,
}

/// One channel entry as it appears on the wire.
///
/// Every attribute except `name` is optional; defaults are applied in
/// [`to_descriptor`](Self::to_descriptor). Unknown attributes are ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,
}

impl ChannelEntry {
    /// Apply the defaulting rules and build a decode descriptor.
    ///
    /// # Errors
    ///
    /// - [`TypeError::UnsupportedDataType`] for non-numeric types.
    /// - [`TypeError::UnsupportedCompression`] for unknown compressions.
    /// - [`TypeError::InvalidShape`] if a dimension overflows `usize`.
    /// - [`TypeError::ShapeOverflow`] if the element count overflows `usize`.
    pub fn to_descriptor(&self) -> Result<ChannelDescriptor, TypeError> {
        let kind = ElementKind::from_type_name(self.type_name.as_deref())?;
        let compression = Compression::from_name(self.compression.as_deref())?;

        let shape = match &self.shape {
            Some(dims) => dims
                .iter()
                .rev()
                .map(|&d| usize::try_from(d).map_err(|_| TypeError::InvalidShape { dimension: d }))
                .collect::<Result<Vec<_>, _>>()?,
            None => vec![1],
        };
        if shape_element_count(&shape).is_none() {
            return Err(TypeError::ShapeOverflow { shape });
        }

        Ok(
            ChannelDescriptor::new(&self.name, self.backend.clone().unwrap_or_default(), kind)
                .with_shape(shape)
                .with_byte_order(ByteOrder::from_encoding(self.encoding.as_deref()))
                .with_compression(compression),
        )
    }

    /// The wire entry that decodes back to `descriptor`.
    #[must_use]
    pub fn from_descriptor(descriptor: &ChannelDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            backend: Some(descriptor.backend.clone()),
            type_name: Some(descriptor.kind.name().to_owned()),
            encoding: Some(descriptor.byte_order.encoding_name().to_owned()),
            shape: if descriptor.is_scalar() {
                None
            } else {
                Some(descriptor.shape.iter().rev().map(|&d| d as u64).collect())
            },
            compression: descriptor.compression.name().map(str::to_owned),
        }
    }
}

impl DataHeader {
    /// Parse a header document.
    ///
    /// # Errors
    ///
    /// [`TypeError::Json`] if the text is not a valid header document.
    pub fn from_json(text: &str) -> Result<Self, TypeError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize to compact JSON.
    ///
    /// # Errors
    ///
    /// [`TypeError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, TypeError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Descriptors in header order.
    ///
    /// # Errors
    ///
    /// The first channel that fails [`ChannelEntry::to_descriptor`] aborts
    /// the whole list.
    pub fn descriptors(&self) -> Result<Vec<ChannelDescriptor>, TypeError> {
        self.channels.iter().map(ChannelEntry::to_descriptor).collect()
    }

    /// Build a header document describing `channels`.
    #[must_use]
    pub fn from_descriptors(channels: &[ChannelDescriptor]) -> Self {
        Self {
            htype: Some(HTYPE.to_owned()),
            channels: channels.iter().map(ChannelEntry::from_descriptor).collect(),
        }
    }
}

/// Header type tag written by this crate's producers.
pub const HTYPE: &str = "bsr_m-1.1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_for_minimal_channel() {
        let header = DataHeader::from_json(r#"{"channels":[{"name":"A","backend":"b"}]}"#).unwrap();
        let channels = header.descriptors().unwrap();
        assert_eq!(channels.len(), 1);
        let a = &channels[0];
        assert_eq!(a.kind, ElementKind::Float64);
        assert_eq!(a.shape, vec![1]);
        assert_eq!(a.byte_order, ByteOrder::Little);
        assert_eq!(a.compression, Compression::None);
    }

    #[test]
    fn shape_is_reversed() {
        let header = DataHeader::from_json(
            r#"{"channels":[{"name":"IMG","backend":"b","type":"uint8","shape":[640,480]}]}"#,
        )
        .unwrap();
        let channels = header.descriptors().unwrap();
        assert_eq!(channels[0].shape, vec![480, 640]);
    }

    #[test]
    fn overflowing_shape_fails_header() {
        let header = DataHeader::from_json(
            r#"{"channels":[{"name":"I","backend":"b","type":"uint8","shape":[4294967296,4294967296]}]}"#,
        )
        .unwrap();
        assert!(matches!(
            header.descriptors(),
            Err(TypeError::ShapeOverflow { .. })
        ));
    }

    #[test]
    fn big_endian_and_compression() {
        let header = DataHeader::from_json(
            r#"{"channels":[{"name":"W","backend":"b","type":"int32","encoding":"big","shape":[16],"compression":"bitshuffle_lz4"}]}"#,
        )
        .unwrap();
        let w = &header.descriptors().unwrap()[0];
        assert_eq!(w.byte_order, ByteOrder::Big);
        assert_eq!(w.compression, Compression::BitshuffleLz4);
        assert_eq!(w.kind, ElementKind::Int32);
    }

    #[test]
    fn string_channel_fails_whole_header() {
        let header = DataHeader::from_json(
            r#"{"channels":[{"name":"ok","backend":"b"},{"name":"s","backend":"b","type":"string"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            header.descriptors(),
            Err(TypeError::UnsupportedDataType { .. })
        ));
    }

    #[test]
    fn unknown_attributes_are_ignored() {
        let header = DataHeader::from_json(
            r#"{"htype":"bsr_m-1.1","channels":[{"name":"A","backend":"b","modulo":1,"offset":0}]}"#,
        )
        .unwrap();
        assert_eq!(header.htype.as_deref(), Some("bsr_m-1.1"));
        assert_eq!(header.descriptors().unwrap()[0].name, "A");
    }

    #[test]
    fn descriptors_roundtrip_through_json() {
        let channels = vec![
            ChannelDescriptor::new("X", "sf-databuffer", ElementKind::Float64),
            ChannelDescriptor::new("IMG", "sf-imagebuffer", ElementKind::UInt16)
                .with_shape(vec![3, 5])
                .with_byte_order(ByteOrder::Big)
                .with_compression(Compression::BitshuffleLz4),
        ];
        let json = DataHeader::from_descriptors(&channels).to_json().unwrap();
        let decoded = DataHeader::from_json(&json).unwrap().descriptors().unwrap();
        assert_eq!(decoded, channels);
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            DataHeader::from_json("{\"channels\": ["),
            Err(TypeError::Json(_))
        ));
    }
}
