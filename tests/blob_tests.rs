use dotnet_binder::{
    blob::{BlobHeader, BlobStream, BlobStreamWriter},
    error::BlobError,
    BinderError,
};

#[test]
fn stream_round_trip_preserves_order() {
    let records: Vec<(u32, u32, Vec<u8>)> = (0..16u32)
        .map(|i| {
            let id = 1000 - i * 7;
            let payload = (0..i * 4).map(|b| (b as u8) ^ (i as u8)).collect();
            (id, i << 8, payload)
        })
        .collect();

    let mut writer = BlobStreamWriter::new();
    for (id, flags, payload) in &records {
        writer.push(*id, *flags, payload).unwrap();
    }
    let bytes = writer.finish();
    let expected_len: usize = records
        .iter()
        .map(|(_, _, p)| BlobHeader::SIZE + p.len())
        .sum();
    assert_eq!(bytes.len(), expected_len);

    let parsed: Vec<_> = BlobStream::new(&bytes)
        .map(|blob| {
            let blob = blob.unwrap();
            (blob.id(), blob.flags(), blob.payload.to_vec())
        })
        .collect();
    assert_eq!(parsed, records);
}

#[test]
fn find_by_id() {
    let mut writer = BlobStreamWriter::new();
    writer
        .push(1, 0, &[1, 1, 1, 1])
        .unwrap()
        .push(2, 0, &[])
        .unwrap()
        .push_padded(3, 5, b"abc")
        .unwrap();
    let bytes = writer.finish();
    let stream = BlobStream::new(&bytes);

    let blob = stream.find(3).unwrap().unwrap();
    assert_eq!(blob.payload, b"abc\0");
    assert_eq!(blob.flags(), 5);
    assert!(stream.find(2).unwrap().unwrap().payload.is_empty());
    assert!(stream.find(4).unwrap().is_none());
}

#[test]
fn duplicate_ids_are_rejected() {
    let mut writer = BlobStreamWriter::new();
    writer.push(42, 0, &[0; 8]).unwrap();
    let err = writer.push(42, 1, &[0; 4]).unwrap_err();
    assert_eq!(err, BlobError::DuplicateId(42));
    assert_eq!(
        BinderError::from(err).to_string(),
        "Blob stream error: Duplicate blob id 42"
    );
    assert_eq!(writer.len(), 1);
}

#[test]
fn corrupt_tail_stops_iteration() {
    let mut writer = BlobStreamWriter::new();
    writer.push(1, 0, &[0; 4]).unwrap();
    let mut bytes = writer.finish();
    bytes.extend_from_slice(&[0xff; 6]);

    let mut stream = BlobStream::new(&bytes);
    assert_eq!(stream.next().unwrap().unwrap().id(), 1);
    assert_eq!(
        stream.next(),
        Some(Err(BlobError::TruncatedHeader { offset: 16 }))
    );
    assert_eq!(stream.next(), None);
    assert!(BlobStream::new(&bytes).find(7).is_err());
}
