#![no_main]
use std::io::Cursor;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use msgpack_tokens::{
    ReaderError, ReaderOptions, SliceReader, StreamReader, Token, Writer,
};

#[derive(Debug, Arbitrary)]
struct Input {
    multiple: bool,
    max_depth: Option<u8>,
    /// Demand read to issue before each advance, by index.
    demands: Vec<u8>,
    data: Vec<u8>,
}

/// Runs the same sequence of calls against any reader and records what
/// each returned.
fn drive<S: msgpack_tokens::ByteSource>(
    reader: &mut msgpack_tokens::Reader<S>,
    demands: &[u8],
) -> Vec<Result<String, Option<msgpack_tokens::MalformedError>>> {
    let mut log = Vec::new();
    let mut demands = demands.iter();
    loop {
        let step: Result<Option<String>, ReaderError> = match demands.next().map(|d| d % 9) {
            Some(0) => reader.read_as_integer().map(|v| Some(format!("{v:?}"))),
            Some(1) => reader.read_as_i32().map(|v| Some(format!("{v:?}"))),
            Some(2) => reader.read_as_i64().map(|v| Some(format!("{v:?}"))),
            Some(3) => reader.read_as_f64().map(|v| Some(format!("{v:?}"))),
            Some(4) => reader.read_as_string().map(|v| Some(format!("{v:?}"))),
            Some(5) => reader.read_as_bytes().map(|v| Some(format!("{v:?}"))),
            Some(6) => reader.read_as_boolean().map(|v| Some(format!("{v:?}"))),
            Some(7) => reader.read_as_date_with_offset().map(|v| Some(format!("{v:?}"))),
            _ => reader.advance().map(|t| t.map(|t| t.to_string())),
        };
        match step {
            Ok(Some(entry)) => log.push(Ok(entry)),
            Ok(None) if !demands.as_slice().is_empty() => log.push(Ok("-".to_string())),
            Ok(None) => return log,
            Err(err) => {
                log.push(Err(err.as_malformed()));
                return log;
            }
        }
    }
}

fuzz_target!(|input: Input| {
    let options = ReaderOptions {
        allow_multiple_values: input.multiple,
        max_depth: input.max_depth.map(usize::from),
        ..Default::default()
    };

    // Both transports must behave identically.
    let mut slice = SliceReader::with_options(&input.data, options);
    let mut stream = StreamReader::with_options(Cursor::new(input.data.as_slice()), options);
    assert_eq!(
        drive(&mut slice, &input.demands),
        drive(&mut stream, &input.demands)
    );

    // Any complete token stream must survive a write/read round trip.
    let tokens: Result<Vec<Token>, ReaderError> =
        SliceReader::with_options(&input.data, options).collect();
    if let Ok(tokens) = tokens {
        let mut writer = Writer::new(Vec::new());
        for token in tokens.iter().cloned() {
            if writer.write_token(token).is_err() {
                return;
            }
        }
        if writer.depth() != 0 {
            return;
        }
        let bytes = writer.into_inner();
        let reread: Vec<String> = SliceReader::with_options(
            &bytes,
            ReaderOptions {
                allow_multiple_values: true,
                ..Default::default()
            },
        )
        .map(|t| t.expect("writer output must be readable").to_string())
        .collect();
        // Compared as text so NaN payloads match.
        let original: Vec<String> = tokens.iter().map(ToString::to_string).collect();
        assert_eq!(original, reread);
    }
});
