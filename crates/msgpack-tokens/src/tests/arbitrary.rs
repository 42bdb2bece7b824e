use alloc::{string::String, vec::Vec};

use quickcheck::{Arbitrary, Gen};

use crate::{Date, Integer, Timestamp, Value};

impl Arbitrary for Value {
    fn arbitrary(g: &mut Gen) -> Self {
        fn gen_scalar(g: &mut Gen) -> Value {
            match usize::arbitrary(g) % 7 {
                0 => Value::Nil,
                1 => Value::Boolean(bool::arbitrary(g)),
                2 => {
                    if bool::arbitrary(g) {
                        Value::Integer(Integer::from(u64::arbitrary(g)))
                    } else {
                        Value::Integer(Integer::from(i64::arbitrary(g)))
                    }
                }
                3 => {
                    let mut value = f64::arbitrary(g);
                    while value.is_nan() {
                        value = f64::arbitrary(g);
                    }
                    Value::Float(value)
                }
                4 => Value::String(String::arbitrary(g)),
                5 => Value::Binary(Vec::<u8>::arbitrary(g)),
                _ => {
                    let nanos = u32::arbitrary(g) % 1_000_000_000;
                    Value::Date(Date::utc(Timestamp {
                        seconds: i64::arbitrary(g),
                        nanos,
                    }))
                }
            }
        }

        fn gen_val(g: &mut Gen, depth: usize) -> Value {
            if depth == 0 {
                return gen_scalar(g);
            }
            match usize::arbitrary(g) % 3 {
                0 => gen_scalar(g),
                1 => {
                    let len = usize::arbitrary(g) % 4;
                    Value::Array((0..len).map(|_| gen_val(g, depth - 1)).collect())
                }
                _ => {
                    let len = usize::arbitrary(g) % 4;
                    Value::Map(
                        (0..len)
                            .map(|_| (String::arbitrary(g), gen_val(g, depth - 1)))
                            .collect(),
                    )
                }
            }
        }

        let depth = usize::arbitrary(g) % 4;
        gen_val(g, depth)
    }
}
