use alloc::{string::String, vec, vec::Vec};
use std::io::Cursor;

use quickcheck::QuickCheck;
use rstest::rstest;
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::{
    Date, Integer, ReadState, SliceReader, StreamReader, Timestamp, Token, TokenKind, Writer,
};

fn encode(build: impl FnOnce(&mut Writer<Vec<u8>>)) -> Vec<u8> {
    let mut writer = Writer::new(Vec::new());
    build(&mut writer);
    writer.into_inner()
}

#[test]
fn mismatch_in_array_closes_it() {
    // [1, "two", 3, 4]
    let bytes = encode(|w| {
        w.write_start_array().unwrap();
        w.write_value(1).unwrap();
        w.write_value("two").unwrap();
        w.write_value(3).unwrap();
        w.write_value(4).unwrap();
        w.write_end_array().unwrap();
    });
    let mut reader = SliceReader::new(&bytes);
    assert_eq!(reader.advance().unwrap(), Some(Token::StartArray));
    assert_eq!(reader.read_as_integer().unwrap(), Some(Integer::from(1u8)));
    assert_eq!(reader.read_as_boolean().unwrap(), None);
    assert_eq!(reader.token_kind(), Some(TokenKind::EndArray));
    assert_eq!(reader.state(), ReadState::Complete);
    assert_eq!(reader.byte_offset(), bytes.len());
    assert_eq!(reader.advance().unwrap(), None);
}

#[test]
fn mismatch_skips_nested_containers() {
    // [[true, {"k": [1]}], 7]
    let bytes = [0x92, 0x92, 0xc3, 0x81, 0xa1, b'k', 0x91, 0x01, 0x07];
    let mut reader = SliceReader::new(&bytes);
    reader.advance().unwrap();
    reader.advance().unwrap();
    assert_eq!(reader.read_as_string().unwrap(), None);
    assert_eq!(reader.token_kind(), Some(TokenKind::EndArray));
    assert_eq!(reader.depth(), 1);
    assert_eq!(reader.read_as_i64().unwrap(), Some(7));
    assert_eq!(reader.advance().unwrap(), Some(Token::EndArray));
}

#[test]
fn top_level_mismatch_completes() {
    let bytes = [0x92, 0x01, 0x02];
    let mut reader = SliceReader::new(&bytes);
    assert_eq!(reader.read_as_f64().unwrap(), None);
    assert_eq!(reader.state(), ReadState::Complete);
    assert_eq!(reader.byte_offset(), 3);
}

#[test]
fn nil_is_consumed_as_absent() {
    let bytes = [0x92, 0xc0, 0x05];
    let mut reader = SliceReader::new(&bytes);
    reader.advance().unwrap();
    assert_eq!(reader.read_as_i32().unwrap(), None);
    assert_eq!(reader.token_kind(), Some(TokenKind::Null));
    assert_eq!(reader.state(), ReadState::PostValue);
    assert_eq!(reader.read_as_i32().unwrap(), Some(5));
}

#[test]
fn exhaustion_emits_end_token() {
    let bytes = [0x91, 0x05];
    let mut reader = SliceReader::new(&bytes);
    reader.advance().unwrap();
    assert_eq!(reader.read_as_i32().unwrap(), Some(5));
    assert_eq!(reader.read_as_i32().unwrap(), None);
    assert_eq!(reader.token_kind(), Some(TokenKind::EndArray));
    assert_eq!(reader.state(), ReadState::Complete);
    assert_eq!(reader.read_as_i32().unwrap(), None);
}

#[rstest]
#[case::fits(&[0xce, 0x7f, 0xff, 0xff, 0xff], Some(i32::MAX))]
#[case::too_large(&[0xce, 0x80, 0x00, 0x00, 0x00], None)]
#[case::too_small(&[0xd3, 0xff, 0xff, 0xff, 0xff, 0x7f, 0xff, 0xff, 0xff], None)]
#[case::float(&[0xca, 0x3f, 0xc0, 0x00, 0x00], None)]
fn read_as_i32_range(#[case] bytes: &[u8], #[case] expected: Option<i32>) {
    let mut reader = SliceReader::new(bytes);
    assert_eq!(reader.read_as_i32().unwrap(), expected);
    assert_eq!(reader.byte_offset(), bytes.len());
}

#[rstest]
#[case::fixint(&[0x07], Some(7.0))]
#[case::negative(&[0xd1, 0xff, 0x00], Some(-256.0))]
#[case::float32(&[0xca, 0x3f, 0xc0, 0x00, 0x00], Some(1.5))]
#[case::string(&[0xa1, b'1'], None)]
fn read_as_f64_cascade(#[case] bytes: &[u8], #[case] expected: Option<f64>) {
    assert_eq!(SliceReader::new(bytes).read_as_f64().unwrap(), expected);
}

#[test]
fn read_as_bytes_and_boolean() {
    let bytes = [0x92, 0xc4, 0x01, 0xaa, 0xc2];
    let mut reader = SliceReader::new(&bytes);
    reader.advance().unwrap();
    assert_eq!(reader.read_as_bytes().unwrap(), Some(vec![0xaa]));
    assert_eq!(reader.read_as_boolean().unwrap(), Some(false));
    assert_eq!(reader.advance().unwrap(), Some(Token::EndArray));
}

#[test]
fn read_as_string_reads_keys() {
    // {"a": "b"}
    let bytes = [0x81, 0xa1, b'a', 0xa1, b'b'];
    let mut reader = SliceReader::new(&bytes);
    reader.advance().unwrap();
    assert_eq!(reader.read_as_string().unwrap().as_deref(), Some("a"));
    assert_eq!(reader.token_kind(), Some(TokenKind::PropertyName));
    assert_eq!(reader.state(), ReadState::Property);
    assert_eq!(reader.read_as_string().unwrap().as_deref(), Some("b"));
    assert_eq!(reader.token_kind(), Some(TokenKind::String));
    assert_eq!(reader.advance().unwrap(), Some(Token::EndObject));
}

#[test]
fn dates_from_extension_and_text() {
    // 2024-02-29T12:30:00.25Z
    let when = OffsetDateTime::from_unix_timestamp_nanos(1_709_209_800_250_000_000).unwrap();
    let bytes = encode(|w| {
        w.write_start_array().unwrap();
        w.write_value(when).unwrap();
        w.write_value("2024-02-29T14:30:00.25+02:00").unwrap();
        w.write_value("not a date").unwrap();
        w.write_end_array().unwrap();
    });
    let expected = Timestamp::from(when);

    let mut reader = SliceReader::new(&bytes);
    reader.advance().unwrap();
    assert_eq!(reader.read_as_date().unwrap(), Some(expected));
    assert_eq!(reader.read_as_date().unwrap(), Some(expected));
    assert_eq!(reader.read_as_date().unwrap(), None);
    assert_eq!(reader.state(), ReadState::Complete);

    let mut reader = StreamReader::new(Cursor::new(bytes.clone()));
    reader.advance().unwrap();
    assert_eq!(reader.read_as_date().unwrap(), Some(expected));
    assert_eq!(
        reader.read_as_date_with_offset().unwrap(),
        Some(Date::with_offset(expected, 120))
    );
}

#[test]
fn date_with_offset_pair() {
    let offset = UtcOffset::from_hms(-5, -30, 0).unwrap();
    let when = OffsetDateTime::UNIX_EPOCH.to_offset(offset) + Duration::seconds(90);
    let bytes = encode(|w| w.write_value(when).unwrap());
    // Local clock time 1969-12-31T18:31:30 is -19_710 s: timestamp96.
    assert_eq!(
        bytes,
        [
            0x92, 0xc7, 0x0c, 0xff, 0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xb3, 0x02,
            0xd1, 0xfe, 0xb6,
        ]
    );

    let mut reader = SliceReader::new(&bytes);
    assert_eq!(
        reader.read_as_date_with_offset().unwrap(),
        Some(Date::with_offset(Timestamp { seconds: 90, nanos: 0 }, -330))
    );
    assert_eq!(reader.byte_offset(), bytes.len());

    // A plain read sees the pair as an array.
    let mut reader = SliceReader::new(&bytes);
    assert_eq!(reader.read_as_date().unwrap(), None);
    assert_eq!(reader.byte_offset(), bytes.len());
}

#[test]
fn date_pair_with_wrong_shape_is_skipped() {
    // [[1, 2], 3]: the inner pair is not a date
    let bytes = [0x92, 0x92, 0x01, 0x02, 0x03];
    let mut reader = SliceReader::new(&bytes);
    reader.advance().unwrap();
    assert_eq!(reader.read_as_date_with_offset().unwrap(), None);
    assert_eq!(reader.state(), ReadState::Complete);
    assert_eq!(reader.byte_offset(), bytes.len());
}

#[test]
fn timestamp_extension_token() {
    let bytes = [0xd6, 0xff, 0x00, 0x00, 0x00, 0x3c];
    let tokens: Vec<Token> = SliceReader::new(&bytes).map(Result::unwrap).collect();
    assert_eq!(
        tokens,
        vec![Token::Date(Date::utc(Timestamp { seconds: 60, nanos: 0 }))]
    );
}

/// Property: interleaving generic advances with demand reads across a map
/// never desynchronizes the key/value phase.
#[test]
fn alternating_reads_keep_phase_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(entries: Vec<(String, i64)>, choices: Vec<bool>) -> bool {
        let bytes = encode(|w| {
            w.write_start_object().unwrap();
            for (key, value) in &entries {
                w.write_property_name(key.as_str()).unwrap();
                w.write_value(*value).unwrap();
            }
            w.write_end_object().unwrap();
        });
        let mut choices = choices.into_iter().cycle();
        let mut pick = move || choices.next().unwrap_or(false);

        let mut reader = SliceReader::new(&bytes);
        if reader.advance().unwrap() != Some(Token::StartObject) {
            return false;
        }
        for (key, value) in &entries {
            let got_key = if pick() {
                reader.read_as_string().unwrap()
            } else {
                match reader.advance().unwrap() {
                    Some(Token::PropertyName(k)) => Some(k),
                    _ => None,
                }
            };
            if got_key.as_ref() != Some(key) || reader.state() != ReadState::Property {
                return false;
            }
            let got_value = if pick() {
                reader.read_as_i64().unwrap()
            } else {
                match reader.advance().unwrap() {
                    Some(Token::Integer(i)) => i.as_i64(),
                    _ => None,
                }
            };
            if got_value != Some(*value) {
                return false;
            }
        }
        reader.advance().unwrap() == Some(Token::EndObject)
            && reader.state() == ReadState::Complete
    }

    #[cfg(not(miri))]
    let tests = if is_ci::cached() { 10_000 } else { 1_000 };
    #[cfg(miri)]
    let tests = 10;

    QuickCheck::new()
        .tests(tests)
        .quickcheck(prop as fn(Vec<(String, i64)>, Vec<bool>) -> bool);
}

#[test]
fn key_phase_demand_for_other_type_closes_map() {
    let bytes = [0x91, 0x81, 0xa1, b'k', 0x01];
    let mut reader = SliceReader::new(&bytes);
    reader.advance().unwrap();
    reader.advance().unwrap();
    assert_eq!(reader.read_as_integer().unwrap(), None);
    assert_eq!(reader.token_kind(), Some(TokenKind::EndObject));
    assert_eq!(reader.advance().unwrap(), Some(Token::EndArray));
}
