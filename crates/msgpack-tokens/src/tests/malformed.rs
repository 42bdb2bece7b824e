use alloc::vec::Vec;
use std::io::Cursor;

use rstest::rstest;

use crate::{ErrorSource, MalformedError, ReadState, SliceReader, StreamReader, Token};

/// Reads until the first error and returns it with the tokens before it.
fn first_error<I>(reader: I) -> (Vec<Token>, crate::ReaderError)
where
    I: Iterator<Item = Result<Token, crate::ReaderError>>,
{
    let mut tokens = Vec::new();
    for item in reader {
        match item {
            Ok(token) => tokens.push(token),
            Err(err) => return (tokens, err),
        }
    }
    panic!("expected an error after {tokens:?}");
}

#[rstest]
#[case::never_used_marker(&[0xc1], MalformedError::InvalidMarker(0xc1), 0)]
#[case::truncated_uint16(&[0xcd, 0x01], MalformedError::Truncated, 1)]
#[case::truncated_string(&[0xa3, b'a'], MalformedError::Truncated, 1)]
#[case::truncated_array(&[0x92, 0x01], MalformedError::Truncated, 2)]
#[case::truncated_map_value(&[0x81, 0xa1, b'k'], MalformedError::Truncated, 3)]
#[case::invalid_utf8(&[0xa2, 0xff, 0xfe], MalformedError::InvalidUtf8, 1)]
#[case::integer_key(&[0x81, 0x01, 0x02], MalformedError::NonStringKey(0x01), 1)]
#[case::binary_key(&[0x81, 0xc4, 0x00, 0x02], MalformedError::NonStringKey(0xc4), 1)]
#[case::unknown_extension(&[0xd4, 0x05, 0x00], MalformedError::UnsupportedExtension(5), 0)]
#[case::timestamp_bad_length(&[0xd5, 0xff, 0x00, 0x00], MalformedError::InvalidTimestampLength(2), 2)]
#[case::timestamp_bad_nanos(
    &[0xc7, 0x0c, 0xff, 0x3b, 0x9a, 0xca, 0x00, 0, 0, 0, 0, 0, 0, 0, 0],
    MalformedError::InvalidTimestampNanos(1_000_000_000),
    3
)]
fn malformed_input(
    #[case] bytes: &[u8],
    #[case] expected: MalformedError,
    #[case] position: usize,
) {
    let (_, err) = first_error(SliceReader::new(bytes));
    assert_eq!(err.as_malformed(), Some(expected));
    assert_eq!(err.position(), position);

    let (_, err) = first_error(StreamReader::new(Cursor::new(bytes.to_vec())));
    assert_eq!(err.as_malformed(), Some(expected));
}

#[test]
fn error_is_terminal() {
    let mut reader = SliceReader::new(&[0x91, 0xc1]);
    assert_eq!(reader.advance().unwrap(), Some(Token::StartArray));
    let err = reader.advance().unwrap_err();
    assert_eq!(*err.kind(), ErrorSource::Malformed(MalformedError::InvalidMarker(0xc1)));
    assert_eq!(reader.state(), ReadState::Error);
    assert_eq!(reader.next(), None);
}

#[test]
fn huge_length_prefix_does_not_allocate() {
    // bin32 claiming 4 GiB with two bytes present
    let bytes = [0xc6, 0xff, 0xff, 0xff, 0xff, 0x00, 0x01];
    let (_, err) = first_error(SliceReader::new(&bytes));
    assert_eq!(err.as_malformed(), Some(MalformedError::Truncated));

    let (_, err) = first_error(StreamReader::new(Cursor::new(bytes.to_vec())));
    assert_eq!(err.as_malformed(), Some(MalformedError::Truncated));
    assert_eq!(err.position(), 7);
}

#[test]
fn tokens_before_error_are_delivered() {
    // [1, 2, <truncated int32>]
    let (tokens, err) = first_error(SliceReader::new(&[0x93, 0x01, 0x02, 0xd2, 0x00]));
    assert_eq!(tokens.len(), 3);
    assert_eq!(err.as_malformed(), Some(MalformedError::Truncated));
}
