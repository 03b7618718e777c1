use crate::drivers::vn100::{
    error::VnError,
    event::Event,
    packet::{build_binary, crc16, parse_binary, parse_vnqmr, Codec, CompositeData},
    registers,
};

fn sample_data() -> CompositeData {
    CompositeData {
        ypr: Some([90.0, -45.0, 10.5]),
        quaternion: None,
        angular_rate: [0.1, -0.2, 0.3],
        acceleration: [0.0, 0.0, -9.81],
        magnetic: Some([0.2, 0.0, 0.4]),
        temperature: Some(21.5),
        pressure: Some(101.3),
        sync_in_count: Some(1337),
    }
}

#[test]
fn test_crc16_of_packet_is_zero() {
    let packet = build_binary(&sample_data());
    assert_eq!(crc16(&packet[1..]), 0);
}

#[test]
fn test_binary_roundtrip() {
    let data = sample_data();
    let packet = build_binary(&data);
    let parsed = parse_binary(&packet).unwrap();
    assert_eq!(parsed, data);
}

#[test]
fn test_binary_corrupt_crc() {
    let mut packet = build_binary(&sample_data());
    let last = packet.len() - 1;
    packet[last] ^= 0xFF;
    assert!(matches!(
        parse_binary(&packet),
        Err(VnError::InvalidChecksum)
    ));
}

#[test]
fn test_binary_corrupt_payload() {
    let mut packet = build_binary(&sample_data());
    packet[10] ^= 0x01;
    assert!(matches!(
        parse_binary(&packet),
        Err(VnError::InvalidChecksum)
    ));
}

#[test]
fn test_binary_truncated() {
    let packet = build_binary(&sample_data());
    assert!(parse_binary(&packet[..packet.len() - 1]).is_err());
}

#[test]
fn test_parse_vnqmr() {
    let body = "VNQMR,0.0,0.0,0.7071,0.7071,0.2,0.0,0.4,0.0,0.0,-9.81,0.1,-0.2,0.3";
    let line = registers::frame(body);
    let data = parse_vnqmr(&line).unwrap();
    assert_eq!(data.quaternion, Some([0.0, 0.0, 0.7071, 0.7071]));
    assert_eq!(data.magnetic, Some([0.2, 0.0, 0.4]));
    assert_eq!(data.acceleration, [0.0, 0.0, -9.81]);
    assert_eq!(data.angular_rate, [0.1, -0.2, 0.3]);
    assert_eq!(data.ypr, None);
    assert_eq!(data.temperature, None);
}

#[test]
fn test_parse_vnqmr_with_sync_count() {
    // With serial count enabled the sensor appends the sync-out count
    let body = "VNQMR,0.0,0.0,0.0,1.0,0.0,0.0,0.0,0.0,0.0,-9.81,0.0,0.0,0.0,42";
    let line = registers::frame(body);
    let data = parse_vnqmr(&line).unwrap();
    assert_eq!(data.sync_in_count, Some(42));
    assert_eq!(data.acceleration, [0.0, 0.0, -9.81]);
}

#[test]
fn test_parse_vnqmr_wrong_field_count() {
    let line = registers::frame("VNQMR,1.0,2.0");
    assert!(matches!(
        parse_vnqmr(&line),
        Err(VnError::MalformedResponse(_))
    ));
}

#[test]
fn test_codec_resync_on_garbage() {
    let data = sample_data();
    let packet = build_binary(&data);

    let mut codec = Codec::new();
    codec.push(&[0x00, 0x13, 0x37]); // line noise
    codec.push(&packet);

    let event = codec.next_event().unwrap();
    let Event::Composite(parsed) = event else {
        panic!("expected composite event, got {event:?}");
    };
    assert_eq!(parsed, data);
    assert!(codec.next_event().is_none());
}

#[test]
fn test_codec_partial_packet() {
    let packet = build_binary(&sample_data());
    let (head, tail) = packet.split_at(20);

    let mut codec = Codec::new();
    codec.push(head);
    assert!(codec.next_event().is_none());
    codec.push(tail);
    assert!(matches!(codec.next_event(), Some(Event::Composite(_))));
}

#[test]
fn test_codec_multiple_packets() {
    let packet = build_binary(&sample_data());
    let mut codec = Codec::new();
    codec.push(&packet);
    codec.push(&packet);

    assert!(matches!(codec.next_event(), Some(Event::Composite(_))));
    assert!(matches!(codec.next_event(), Some(Event::Composite(_))));
    assert!(codec.next_event().is_none());
}

#[test]
fn test_codec_bad_packet_does_not_stall() {
    let mut packet = build_binary(&sample_data());
    packet[30] ^= 0x01;
    let good = build_binary(&sample_data());

    let mut codec = Codec::new();
    codec.push(&packet);
    codec.push(&good);

    assert!(matches!(codec.next_event(), Some(Event::BadPacket)));
    assert!(matches!(codec.next_event(), Some(Event::Composite(_))));
}

#[test]
fn test_codec_stray_delimiter_does_not_stall_binary_stream() {
    // A lone `$` in a binary stream never sees a newline. Once the scan
    // limit is exceeded it must be dropped so the packets behind it are
    // still decoded.
    let data = sample_data();
    let packet = build_binary(&data);

    let mut codec = Codec::new();
    codec.push(b"$");
    for _ in 0..5 {
        codec.push(&packet);
    }

    let mut decoded = 0;
    while let Some(event) = codec.next_event() {
        let Event::Composite(parsed) = event else {
            panic!("expected composite event, got {event:?}");
        };
        assert_eq!(parsed, data);
        decoded += 1;
    }
    assert_eq!(decoded, 5);
}

#[test]
fn test_codec_ascii_sentence() {
    let body = "VNQMR,0.0,0.0,0.0,1.0,0.0,0.0,0.0,0.0,0.0,-9.81,0.0,0.0,0.0";
    let mut codec = Codec::new();
    codec.push(registers::frame(body).as_bytes());

    let Some(Event::Composite(data)) = codec.next_event() else {
        panic!("expected composite event");
    };
    assert_eq!(data.quaternion, Some([0.0, 0.0, 0.0, 1.0]));
}
