//! Collectors driven by real decodes: dataset container sizing, mapping
//! rounds, and field selection.

use idread_collect::{
    ChannelStats, CollectError, ContainerReader, DatasetCollector, DatasetOptions, EventField,
    FieldSelection, MappingCollector,
};
use idread_decoder::{DecodeError, DecodeErrorKind, decode};
use idread_encoder::StreamEncoder;
use idread_tests::{BACKEND, mixed_stream, scalar_stream};
use idread_types::{Array, ChannelDescriptor, ElementKind, Elements, EventData, Scalar};

// ── Dataset container ─────────────────────────────────────────────────────────

#[test]
fn fifteen_hundred_scalars_compact_to_fifteen_hundred_rows() {
    let values: Vec<f64> = (0..1500).map(f64::from).collect();
    let stream = scalar_stream("SCALAR:F64", &values);
    let dir = tempfile::tempdir().unwrap();

    let collector = DatasetCollector::create(dir.path(), DatasetOptions::default()).unwrap();
    let manifest = decode(stream.as_slice(), collector).unwrap().output;

    for field in ["data", "pulse_id", "timestamp", "ioc_timestamp", "status", "severity"] {
        let info = manifest
            .dataset(&format!("/SCALAR:F64/{field}"))
            .unwrap_or_else(|| panic!("missing dataset {field}"));
        assert_eq!(info.rows, 1500, "{field}");
        let on_disk = std::fs::metadata(dir.path().join(&info.file)).unwrap().len();
        assert_eq!(on_disk, 1500 * info.kind.size() as u64, "{field}");
    }

    let reader = ContainerReader::open(dir.path()).unwrap();
    assert_eq!(reader.read("/SCALAR:F64/data").unwrap(), Elements::Float64(values));
}

#[test]
fn severity_dataset_holds_severity() {
    let mut encoder = StreamEncoder::new();
    encoder
        .write_header(&[ChannelDescriptor::new("A", BACKEND, ElementKind::Int8)])
        .unwrap();
    for i in 0..3i8 {
        encoder
            .write_values(&[Some(EventData::new(Scalar::Int8(i)).with_alarm(10 + i, 20 + i))])
            .unwrap();
    }
    let dir = tempfile::tempdir().unwrap();
    let collector = DatasetCollector::create(dir.path(), DatasetOptions::default()).unwrap();
    decode(encoder.as_bytes(), collector).unwrap();

    let reader = ContainerReader::open(dir.path()).unwrap();
    assert_eq!(reader.read("/A/status").unwrap(), Elements::Int8(vec![10, 11, 12]));
    assert_eq!(reader.read("/A/severity").unwrap(), Elements::Int8(vec![20, 21, 22]));
}

#[test]
fn failed_decode_leaves_container_unreadable() {
    let mut stream = mixed_stream(5);
    stream.truncate(stream.len() - 1);
    let dir = tempfile::tempdir().unwrap();
    let collector = DatasetCollector::create(dir.path(), DatasetOptions::default()).unwrap();
    assert!(decode(stream.as_slice(), collector).is_err());
    assert!(ContainerReader::open(dir.path()).is_err());
}

#[test]
fn waveform_length_change_aborts_conversion() {
    let wave = ChannelDescriptor::new("WAVE", BACKEND, ElementKind::UInt8).with_shape(vec![8]);
    let mut encoder = StreamEncoder::new();
    encoder
        .write_header(&[wave])
        .unwrap()
        .write_values(&[Some(EventData::new(Array::flat(Elements::UInt8(vec![1, 2, 3]))))])
        .unwrap()
        .write_values(&[Some(EventData::new(Array::flat(Elements::UInt8(vec![4, 5]))))])
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let collector = DatasetCollector::create(dir.path(), DatasetOptions::default()).unwrap();
    let err = decode(encoder.as_bytes(), collector).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::Collector);
    let DecodeError::Collector(source) = err else {
        panic!("expected a collector error");
    };
    assert!(matches!(
        source.downcast_ref::<CollectError>(),
        Some(CollectError::RowShapeMismatch { expected, actual, .. })
            if expected == &[3] && actual == &[2]
    ));
    assert!(ContainerReader::open(dir.path()).is_err());
}

#[test]
fn compressed_container_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let options = DatasetOptions {
        compress: true,
        chunk_rows: 16,
        ..DatasetOptions::default()
    };
    let collector = DatasetCollector::create(dir.path(), options).unwrap();
    decode(mixed_stream(40).as_slice(), collector).unwrap();

    let reader = ContainerReader::open(dir.path()).unwrap();
    let image = reader.read_array("/IMAGE:U8/data").unwrap();
    assert_eq!(image.shape(), &[40, 4, 6]);
    let wave = reader.read_array("/WAVE:U16/data").unwrap();
    assert_eq!(wave.shape(), &[32, 64]);
}

// ── Mapping ───────────────────────────────────────────────────────────────────

#[test]
fn mapping_two_channels_three_rounds() {
    let channels = [
        ChannelDescriptor::new("A", BACKEND, ElementKind::Float64),
        ChannelDescriptor::new("B", BACKEND, ElementKind::Float64),
    ];
    let mut encoder = StreamEncoder::new();
    encoder.write_header(&channels).unwrap();
    for pulse in 1..=3i64 {
        let a = EventData::new(Scalar::Float64(0.5)).with_pulse_id(pulse);
        let b = (pulse != 2).then(|| EventData::new(Scalar::Float64(1.5)).with_pulse_id(pulse));
        encoder.write_values(&[Some(a), b]).unwrap();
    }

    let collector = MappingCollector::new(2, FieldSelection::default()).unwrap();
    let rounds = decode(encoder.as_bytes(), collector).unwrap().output;
    assert_eq!(rounds.len(), 3);
    assert!(rounds.iter().all(|round| round.len() == 2));
    assert!(rounds[1][0].is_some());
    assert!(rounds[1][1].is_none());
    let last = rounds[2][1].as_ref().unwrap();
    assert_eq!((last.channel.as_str(), last.record.pulse_id), ("B", Some(3)));
}

// ── Statistics ────────────────────────────────────────────────────────────────

#[test]
fn channel_stats_over_mixed_stream() {
    let summaries = decode(mixed_stream(20).as_slice(), ChannelStats::new())
        .unwrap()
        .output;
    assert_eq!(summaries.len(), 4);
    let wave = &summaries[2];
    assert_eq!(wave.channel, "WAVE:U16");
    assert_eq!((wave.events, wave.null_events), (20, 4));
    assert_eq!((wave.first_pulse_id, wave.last_pulse_id), (Some(0), Some(18)));
}

#[test]
fn field_selection_parses_every_key() {
    let selection: FieldSelection = "value,time,pulseId,status,severity,timeRaw"
        .parse()
        .unwrap();
    assert_eq!(selection, FieldSelection::all());
    assert!(
        "value,pulse"
            .parse::<FieldSelection>()
            .is_err()
    );
    assert_eq!(
        FieldSelection::empty().with(EventField::Time).iter().collect::<Vec<_>>(),
        [EventField::Time]
    );
}
