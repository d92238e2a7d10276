//! Integration test: encode → decode → collect
//!
//! Streams produced by the encoder are decoded straight into each
//! collector, and the collector output is checked against what was sent.

use idread_collect::{
    ContainerReader, DatasetCollector, DatasetOptions, DictionaryCollector, FieldSelection,
    MappingCollector,
};
use idread_decoder::decode;
use idread_encoder::StreamEncoder;
use idread_types::{Array, ChannelDescriptor, Compression, ElementKind, Elements, EventData, Scalar};

fn two_channel_stream(pulses: i64) -> Vec<u8> {
    let channels = [
        ChannelDescriptor::new("SCALAR", "sf-databuffer", ElementKind::Float64),
        ChannelDescriptor::new("WAVE", "sf-databuffer", ElementKind::UInt16)
            .with_shape(vec![4])
            .with_compression(Compression::BitshuffleLz4),
    ];
    let mut encoder = StreamEncoder::new();
    encoder.write_header(&channels).expect("header should encode");
    for pulse in 0..pulses {
        let wave = Array::flat(Elements::UInt16(
            (0..4).map(|i| u16::try_from(pulse % 1000).unwrap() + i).collect(),
        ));
        #[allow(clippy::cast_precision_loss)]
        let scalar = EventData::new(Scalar::Float64(pulse as f64 / 2.0)).with_pulse_id(pulse);
        let wave = if pulse % 7 == 3 {
            None
        } else {
            Some(EventData::new(wave).with_pulse_id(pulse))
        };
        encoder
            .write_values(&[Some(scalar), wave])
            .expect("values should encode");
    }
    encoder.into_bytes()
}

// ── Dataset ────────────────────────────────────────────────────────────

/// 1500 rows with the default chunk of 1000 rows: the files grow to two
/// chunks while writing and are trimmed to 1500 rows on finalize.
#[test]
fn dataset_compacts_past_chunk_boundary() {
    let stream = two_channel_stream(1500);
    let dir = tempfile::tempdir().unwrap();
    let collector = DatasetCollector::create(dir.path(), DatasetOptions::default()).unwrap();

    let decoded = decode(stream.as_slice(), collector).expect("decode should succeed");
    assert_eq!(decoded.report.events, 3000);

    let manifest = decoded.output;
    let scalar = manifest.dataset("/SCALAR/data").unwrap();
    assert_eq!(scalar.rows, 1500);
    let size = std::fs::metadata(dir.path().join(&scalar.file)).unwrap().len();
    assert_eq!(size, 1500 * 8);

    let nulls = (0..1500).filter(|p| p % 7 == 3).count() as u64;
    assert_eq!(manifest.dataset("/WAVE/data").unwrap().rows, 1500 - nulls);

    let reader = ContainerReader::open(dir.path()).unwrap();
    let waves = reader.read_array("/WAVE/data").unwrap();
    assert_eq!(waves.shape()[1], 4);
    assert_eq!(waves.elements().get(3), Some(Scalar::UInt16(3)));
}

#[test]
fn compressed_dataset_reads_back() {
    let stream = two_channel_stream(250);
    let dir = tempfile::tempdir().unwrap();
    let options = DatasetOptions {
        chunk_rows: 64,
        compress: true,
        ..DatasetOptions::default()
    };
    let collector = DatasetCollector::create(dir.path(), options).unwrap();
    decode(stream.as_slice(), collector).expect("decode should succeed");

    let reader = ContainerReader::open(dir.path()).unwrap();
    let pulses = reader.read("/SCALAR/pulse_id").unwrap();
    assert_eq!(pulses, Elements::Int64((0..250).collect()));
}

#[test]
fn container_in_use_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let _held = DatasetCollector::create(dir.path(), DatasetOptions::default()).unwrap();
    assert!(DatasetCollector::create(dir.path(), DatasetOptions::default()).is_err());
}

// ── Dictionary / mapping ───────────────────────────────────────────────

#[test]
fn dictionary_groups_each_channel() {
    let stream = two_channel_stream(10);
    let decoded = decode(stream.as_slice(), DictionaryCollector::default()).unwrap();
    let groups = decoded.output;
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].channel.name, "SCALAR");
    assert_eq!(groups[0].data.len(), 10);
    assert_eq!(groups[1].data.len(), 10);
    assert!(groups[1].data[3].value.is_none());
}

#[test]
fn mapping_rounds_follow_the_header() {
    let stream = two_channel_stream(5);
    let collector = MappingCollector::from_header(FieldSelection::default());
    let rounds = decode(stream.as_slice(), collector).unwrap().output;
    assert_eq!(rounds.len(), 5);
    assert!(rounds[3][1].is_none());
    let first = rounds[0][0].as_ref().unwrap();
    assert_eq!(first.channel, "SCALAR");
    assert_eq!(first.record.pulse_id, Some(0));
}
