use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime, TimeDelta};
use rust_decimal::Decimal;
use uuid::Uuid;

use datacast_api::descriptor::{CompositeSpec, FieldSpec, PrimitiveKind, TypeDescriptor};
use datacast_api::error::ErrorKind;
use datacast_api::value::{Record, Value};
use datacast_engine::coerce;

fn prim(kind: PrimitiveKind) -> TypeDescriptor {
    TypeDescriptor::Primitive(kind)
}

/// One already-typed value and one raw input per kind.
fn samples() -> Vec<(PrimitiveKind, Value, Value)> {
    let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
    let datetime = date.and_hms_opt(10, 30, 0).unwrap();
    let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
    vec![
        (PrimitiveKind::Identifier, Value::Uuid(id), Value::from(id.to_string())),
        (PrimitiveKind::Date, Value::Date(date), Value::from("05/01/2024")),
        (PrimitiveKind::DateTime, Value::DateTime(datetime), Value::from("2024-01-05T10:30:00Z")),
        (
            PrimitiveKind::Time,
            Value::Time(NaiveTime::from_hms_opt(23, 59, 1).unwrap()),
            Value::from("1:02:03.5"),
        ),
        (PrimitiveKind::Duration, Value::Duration(TimeDelta::minutes(90)), Value::from("-0:0:1")),
        (PrimitiveKind::Integer, Value::Int(-12), Value::from("42")),
        (PrimitiveKind::Float, Value::Float(0.25), Value::from("1e-3")),
        (PrimitiveKind::Decimal, Value::Decimal(Decimal::new(1050, 2)), Value::from("3.140")),
        (PrimitiveKind::Boolean, Value::Bool(true), Value::from("Off")),
        (
            PrimitiveKind::Object,
            Value::List(vec![Value::Int(1), Value::from("a")]),
            Value::from(r#"{"k": [true, null]}"#),
        ),
        (PrimitiveKind::Text, Value::from("hello"), Value::Int(17)),
        (PrimitiveKind::Bytes, Value::Bytes(vec![0, 159, 255]), Value::from("bytes")),
    ]
}

#[test]
fn typed_values_are_returned_unchanged() {
    for (kind, typed, _) in samples() {
        assert_eq!(coerce(&prim(kind), &typed, None).unwrap(), typed, "{kind}");
    }
}

#[test]
fn coercion_is_idempotent() {
    for (kind, _, raw) in samples() {
        let once = coerce(&prim(kind), &raw, None).unwrap();
        let twice = coerce(&prim(kind), &once, None).unwrap();
        assert_eq!(once, twice, "{kind}");
    }
}

#[test]
fn boolean_vocabulary() {
    let d = prim(PrimitiveKind::Boolean);
    assert_eq!(coerce(&d, &Value::from("YES"), None).unwrap(), Value::Bool(true));
    assert_eq!(coerce(&d, &Value::from("0"), None).unwrap(), Value::Bool(false));
    let err = coerce(&d, &Value::from("maybe"), None).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidPrimitive);
    assert_eq!(err.target, "Boolean");
    assert_eq!(err.value, Value::from("maybe"));
}

#[test]
fn date_from_text_and_bytes() {
    let d = prim(PrimitiveKind::Date);
    let expected = Value::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    assert_eq!(coerce(&d, &Value::from("2024-01-05"), None).unwrap(), expected);
    assert_eq!(coerce(&d, &Value::Bytes(b"2024-01-05".to_vec()), None).unwrap(), expected);
}

#[test]
fn negative_duration() {
    let d = prim(PrimitiveKind::Duration);
    let span = TimeDelta::hours(1) + TimeDelta::minutes(2) + TimeDelta::milliseconds(3250);
    assert_eq!(
        coerce(&d, &Value::from("-01:02:03.250000"), None).unwrap(),
        Value::Duration(-span)
    );
}

#[test]
fn optional_passthrough() {
    let d = TypeDescriptor::optional(prim(PrimitiveKind::Integer));
    assert_eq!(coerce(&d, &Value::Null, None).unwrap(), Value::Null);
    assert_eq!(coerce(&d, &Value::from("42"), None).unwrap(), Value::Int(42));
}

#[test]
fn sequence_of_composites() {
    let point = CompositeSpec::new(
        "Point",
        vec![
            FieldSpec::new("x", prim(PrimitiveKind::Integer)),
            FieldSpec::new("y", prim(PrimitiveKind::Integer)),
        ],
    );
    let d = TypeDescriptor::sequence_of(TypeDescriptor::composite(point));
    let raw = Value::from(serde_json::json!([{"x": 1, "y": 2}, {"x": 3, "y": 4}]));

    let expected = [(1, 2), (3, 4)]
        .into_iter()
        .map(|(x, y)| {
            Value::Record(Record::new(
                "Point",
                vec![("x".to_string(), Value::Int(x)), ("y".to_string(), Value::Int(y))],
            ))
        })
        .collect::<Vec<_>>();
    assert_eq!(coerce(&d, &raw, None).unwrap(), Value::List(expected));
}

#[test]
fn sequence_error_reports_index_and_field() {
    let point = CompositeSpec::new(
        "Point",
        vec![
            FieldSpec::new("x", prim(PrimitiveKind::Integer)),
            FieldSpec::new("y", prim(PrimitiveKind::Integer)),
        ],
    );
    let d = TypeDescriptor::sequence_of(TypeDescriptor::composite(point));
    let raw = Value::from(serde_json::json!([{"x": 1, "y": 2}, {"x": 3, "y": "four"}]));
    let err = coerce(&d, &raw, None).unwrap_err();
    assert_eq!(err.path_string(), "[1].y");
    assert_eq!(err.composite.as_deref(), Some("Point"));
    assert!(err.to_string().contains("at [1].y"));
}

#[test]
fn unclassified_values_pass_through_untouched() {
    let raw = Value::from(serde_json::json!({"nested": [1, "two", {"three": 3.5}]}));
    assert_eq!(coerce(&TypeDescriptor::Any, &raw, None).unwrap(), raw);

    let mapping = TypeDescriptor::mapping_of(prim(PrimitiveKind::Integer));
    assert_eq!(coerce(&mapping, &Value::from("opaque"), None).unwrap(), Value::from("opaque"));
}

#[test]
fn object_round_trip() {
    let structure = serde_json::json!({
        "name": "widget",
        "tags": ["a", "b"],
        "dims": {"w": 2, "h": 1.5},
        "active": false,
        "parent": null
    });
    let text = serde_json::to_string(&structure).unwrap();
    let decoded = coerce(&prim(PrimitiveKind::Object), &Value::from(text), None).unwrap();
    assert_eq!(decoded, Value::from(structure.clone()));
    assert_eq!(decoded.to_json(), structure);
}

#[test]
fn mapping_errors_report_key() {
    let d = TypeDescriptor::mapping_of(prim(PrimitiveKind::Decimal));
    let raw = Value::from(BTreeMap::from([
        ("eur".to_string(), "1.10"),
        ("usd".to_string(), "n/a"),
    ]));
    let err = coerce(&d, &raw, None).unwrap_err();
    assert_eq!(err.path_string(), "[\"usd\"]");

    let ok = Value::from(BTreeMap::from([("eur".to_string(), "1.10")]));
    let expected = Value::from(BTreeMap::from([(
        "eur".to_string(),
        Decimal::from_str("1.10").unwrap(),
    )]));
    assert_eq!(coerce(&d, &ok, None).unwrap(), expected);
}
