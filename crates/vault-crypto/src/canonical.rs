use serde_json::Value;

use crate::hasher::HasherError;

/// Write `value` as compact JSON with object keys in lexicographic byte
/// order at every nesting level.
///
/// Scalars are written exactly as `serde_json` writes them, so strings use
/// its escaping rules and numbers its shortest round-trip formatting.
pub fn canonical_json(value: &Value) -> Result<Vec<u8>, HasherError> {
    let mut out = Vec::with_capacity(256);
    write_value(value, &mut out)?;
    Ok(out)
}

fn write_value(value: &Value, out: &mut Vec<u8>) -> Result<(), HasherError> {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
            out.push(b'{');
            for (i, (key, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_string(key, out)?;
                out.push(b':');
                write_value(val, out)?;
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(item, out)?;
            }
            out.push(b']');
        }
        Value::String(s) => write_string(s, out)?,
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
        Value::Number(n) => out.extend_from_slice(n.to_string().as_bytes()),
    }
    Ok(())
}

fn write_string(s: &str, out: &mut Vec<u8>) -> Result<(), HasherError> {
    serde_json::to_writer(&mut *out, s).map_err(|e| HasherError::Serialization(e.to_string()))
}
