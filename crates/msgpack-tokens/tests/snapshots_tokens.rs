#![expect(missing_docs)]

use core::fmt::Write as _;
use std::io::Cursor;

use msgpack_tokens::{SliceReader, StreamReader, Timestamp, Token, Writer};

fn sample_document() -> Vec<u8> {
    let mut writer = Writer::new(Vec::new());
    writer.write_start_object().unwrap();
    writer.write_property_name("name").unwrap();
    writer.write_value("demo").unwrap();
    writer.write_property_name("tags").unwrap();
    writer.write_start_array().unwrap();
    writer.write_value("a").unwrap();
    writer.write_value("b").unwrap();
    writer.write_end_array().unwrap();
    writer.write_property_name("count").unwrap();
    writer.write_value(-3).unwrap();
    writer.write_property_name("ratio").unwrap();
    writer.write_value(0.5).unwrap();
    writer.write_property_name("blob").unwrap();
    writer.write_value(&[0xde_u8, 0xad][..]).unwrap();
    writer.write_property_name("when").unwrap();
    writer
        .write_value(Timestamp {
            seconds: 1,
            nanos: 0,
        })
        .unwrap();
    writer.write_property_name("empty").unwrap();
    writer.write_start_object().unwrap();
    writer.write_end_object().unwrap();
    writer.write_property_name("none").unwrap();
    writer.write_null().unwrap();
    writer.write_end_object().unwrap();
    writer.into_inner()
}

fn render_tokens<I: Iterator<Item = Result<Token, msgpack_tokens::ReaderError>>>(
    reader: I,
) -> String {
    let mut out = String::new();
    for token in reader {
        writeln!(out, "{}", token.expect("reader error")).unwrap();
    }
    out
}

fn render_hex(bytes: &[u8]) -> String {
    let mut out = String::new();
    for line in bytes.chunks(16) {
        let hex: Vec<String> = line.iter().map(|b| format!("{b:02x}")).collect();
        writeln!(out, "{}", hex.join(" ")).unwrap();
    }
    out
}

#[test]
fn snapshot_writer_bytes() {
    insta::assert_snapshot!(render_hex(&sample_document()), @r"
    88 a4 6e 61 6d 65 a4 64 65 6d 6f a4 74 61 67 73
    92 a1 61 a1 62 a5 63 6f 75 6e 74 fd a5 72 61 74
    69 6f cb 3f e0 00 00 00 00 00 00 a4 62 6c 6f 62
    c4 02 de ad a4 77 68 65 6e d6 ff 00 00 00 01 a5
    65 6d 70 74 79 80 a4 6e 6f 6e 65 c0
    ");
}

#[test]
fn snapshot_reader_tokens() {
    let bytes = sample_document();
    let from_slice = render_tokens(SliceReader::new(&bytes));
    let from_stream = render_tokens(StreamReader::new(Cursor::new(bytes.clone())));
    assert_eq!(from_slice, from_stream);

    insta::assert_snapshot!(from_slice, @r#"
    StartObject
    PropertyName("name")
    String("demo")
    PropertyName("tags")
    StartArray
    String("a")
    String("b")
    EndArray
    PropertyName("count")
    Integer(-3)
    PropertyName("ratio")
    Float(0.5)
    PropertyName("blob")
    Binary(dead)
    PropertyName("when")
    Date(1.000000000)
    PropertyName("empty")
    StartObject
    EndObject
    PropertyName("none")
    Null
    EndObject
    "#);
}

#[test]
fn snapshot_demand_reads() {
    // {"id": 7, "tags": ["x", 1], "next": "y"}
    let mut writer = Writer::new(Vec::new());
    writer.write_start_object().unwrap();
    writer.write_property_name("id").unwrap();
    writer.write_value(7).unwrap();
    writer.write_property_name("tags").unwrap();
    writer.write_start_array().unwrap();
    writer.write_value("x").unwrap();
    writer.write_value(1).unwrap();
    writer.write_end_array().unwrap();
    writer.write_property_name("next").unwrap();
    writer.write_value("y").unwrap();
    writer.write_end_object().unwrap();
    let bytes = writer.into_inner();

    let mut reader = SliceReader::new(&bytes);
    let mut out = String::new();
    macro_rules! step {
        ($call:expr) => {{
            let result = $call;
            writeln!(
                out,
                "{:?} -> {:?} {:?} depth={}",
                result,
                reader.token_kind(),
                reader.state(),
                reader.depth()
            )
            .unwrap();
        }};
    }
    step!(reader.advance().unwrap().map(|t| t.to_string()));
    step!(reader.read_as_string().unwrap());
    step!(reader.read_as_i32().unwrap());
    step!(reader.read_as_string().unwrap());
    step!(reader.advance().unwrap().map(|t| t.to_string()));
    step!(reader.read_as_string().unwrap());
    step!(reader.read_as_string().unwrap());
    step!(reader.read_as_string().unwrap());
    step!(reader.read_as_string().unwrap());
    step!(reader.read_as_string().unwrap());

    insta::assert_snapshot!(out, @r#"
    Some("StartObject") -> Some(StartObject) ObjectStart depth=1
    Some("id") -> Some(PropertyName) Property depth=1
    Some(7) -> Some(Integer) PostValue depth=1
    Some("tags") -> Some(PropertyName) Property depth=1
    Some("StartArray") -> Some(StartArray) ArrayStart depth=2
    Some("x") -> Some(String) PostValue depth=2
    None -> Some(EndArray) PostValue depth=1
    Some("next") -> Some(PropertyName) Property depth=1
    Some("y") -> Some(String) PostValue depth=1
    None -> Some(EndObject) Complete depth=0
    "#);
}
