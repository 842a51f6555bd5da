//! Header properties over arbitrary field values.

use arqsim_proto::{Command, HEADER_SIZE, SegmentHeader, sequence_number};
use bytes::BytesMut;
use proptest::prelude::*;

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        Just(Command::Push),
        Just(Command::Ack),
        Just(Command::WindowAsk),
        Just(Command::WindowTell),
    ]
}

proptest! {
    #[test]
    fn prop_sn_visible_at_offset(conv: u32, sn: u32, ts: u32, una: u32, cmd in command()) {
        let mut header = SegmentHeader::new(conv, cmd);
        header.set_sn(sn);
        header.set_ts(ts);
        header.set_una(una);

        let mut buf = BytesMut::new();
        header.encode(&mut buf);
        buf.extend_from_slice(&[0xFF; 8]);

        // PROPERTY: the harness-side reader never needs to parse the header
        prop_assert_eq!(buf.len(), HEADER_SIZE + 8);
        prop_assert_eq!(sequence_number(&buf), Some(sn));
    }

    #[test]
    fn prop_decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        match SegmentHeader::decode(&bytes) {
            Ok((_, rest)) => prop_assert_eq!(rest.len(), bytes.len() - HEADER_SIZE),
            Err(_) => prop_assert!(bytes.len() < HEADER_SIZE),
        }
    }
}
