use apache_avro::{Schema, types::Value};
use kbridge::errors::BridgeError;

pub(crate) fn avro_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Int(i) | Value::Date(i) | Value::TimeMillis(i) => serde_json::json!(i),
        Value::Long(l)
        | Value::TimeMicros(l)
        | Value::TimestampMillis(l)
        | Value::TimestampMicros(l)
        | Value::TimestampNanos(l)
        | Value::LocalTimestampMillis(l)
        | Value::LocalTimestampMicros(l)
        | Value::LocalTimestampNanos(l) => serde_json::json!(l),
        Value::Float(f) => serde_json::json!(f),
        Value::Double(d) => serde_json::json!(d),
        // Avro JSON 编码：每个字节对应一个码位
        Value::Bytes(b) | Value::Fixed(_, b) => {
            serde_json::Value::String(b.iter().map(|&c| c as char).collect())
        }
        Value::String(s) | Value::Enum(_, s) => serde_json::Value::String(s.clone()),
        Value::Union(_, inner) => avro_to_json(inner),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(avro_to_json).collect()),
        Value::Map(entries) => serde_json::Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), avro_to_json(v)))
                .collect(),
        ),
        Value::Record(fields) => serde_json::Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), avro_to_json(v)))
                .collect(),
        ),
        Value::Uuid(u) => serde_json::Value::String(u.to_string()),
        Value::BigDecimal(d) => serde_json::Value::String(d.to_string()),
        other => serde_json::Value::String(format!("{other:?}")),
    }
}

pub(crate) fn json_to_avro(
    value: &serde_json::Value,
    schema: &Schema,
) -> Result<Value, BridgeError> {
    match (value, schema) {
        (value, Schema::Union(union)) => {
            for (idx, variant) in union.variants().iter().enumerate() {
                if let Ok(v) = json_to_avro(value, variant) {
                    if v.validate(variant) {
                        return Ok(Value::Union(idx as u32, Box::new(v)));
                    }
                }
            }
            Err(BridgeError::Codec(format!("无法匹配联合类型：{value}")))
        }
        (serde_json::Value::Null, _) => Ok(Value::Null),
        (serde_json::Value::Bool(b), _) => Ok(Value::Boolean(*b)),
        (serde_json::Value::Number(n), Schema::Int) => n
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .map(Value::Int)
            .ok_or_else(|| BridgeError::Codec(format!("{n} 不是 int"))),
        (serde_json::Value::Number(n), Schema::Long) => n
            .as_i64()
            .map(Value::Long)
            .ok_or_else(|| BridgeError::Codec(format!("{n} 不是 long"))),
        (serde_json::Value::Number(n), Schema::Float) => {
            Ok(Value::Float(n.as_f64().unwrap_or(0.0) as f32))
        }
        (serde_json::Value::Number(n), Schema::Double) => {
            Ok(Value::Double(n.as_f64().unwrap_or(0.0)))
        }
        (serde_json::Value::Number(n), _) => match n.as_i64() {
            Some(i) => Ok(Value::Long(i)),
            None => Ok(Value::Double(n.as_f64().unwrap_or(0.0))),
        },
        (serde_json::Value::String(s), Schema::Bytes) => {
            Ok(Value::Bytes(s.chars().map(|c| c as u8).collect()))
        }
        (serde_json::Value::String(s), _) => Ok(Value::String(s.clone())),
        (serde_json::Value::Array(items), Schema::Array(inner)) => Ok(Value::Array(
            items
                .iter()
                .map(|item| json_to_avro(item, &inner.items))
                .collect::<Result<_, _>>()?,
        )),
        (serde_json::Value::Object(map), Schema::Record(record)) => {
            let mut fields = Vec::with_capacity(record.fields.len());
            for field in &record.fields {
                let v = map.get(&field.name).unwrap_or(&serde_json::Value::Null);
                fields.push((field.name.clone(), json_to_avro(v, &field.schema)?));
            }
            Ok(Value::Record(fields))
        }
        (value, _) => Err(BridgeError::Codec(format!("无法转换成 Avro：{value}"))),
    }
}
