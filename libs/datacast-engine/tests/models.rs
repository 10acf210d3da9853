use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use datacast_api::Model;
use datacast_api::config::CoercionOptions;
use datacast_api::declare::{Blob, DeclaredType, FieldDecl, RecordDecl};
use datacast_api::descriptor::TypeDescriptor;
use datacast_api::error::{ConversionError, ErrorKind};
use datacast_api::value::Value;
use datacast_engine::{parse, parse_with, resolve, resolve_declared};

fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn upper(raw: &Value, _: &CoercionOptions) -> Result<Value, ConversionError> {
    raw.as_str()
        .map(|s| Value::Text(s.to_uppercase()))
        .ok_or_else(|| ConversionError::invalid_primitive("code must be text"))
}

#[derive(Debug, Model)]
#[model(name = "User")]
struct User {
    id: Uuid,

    #[field(alias = "emailAddress")]
    email_address: String,

    #[field(default = "epoch")]
    created_at: NaiveDateTime,

    #[field(default)]
    friends: Vec<i64>,

    #[field(encoder = "upper")]
    code: String,

    nickname: Option<String>,
}

fn no_children() -> Vec<Value> {
    Vec::new()
}

#[derive(Debug, PartialEq, Model)]
struct Node {
    value: i64,
    #[field(default = "no_children")]
    children: Vec<Node>,
}

#[derive(Debug, Model)]
struct Reading {
    sensor: String,
    values: HashMap<String, f64>,
    raw: Option<Blob>,
    extra: Value,
}

#[derive(Debug, Model)]
struct Counter {
    name: String,
    #[field(default)]
    hits: u64,
    #[field(default)]
    tags: HashMap<String, String>,
    #[field(default)]
    payload: Blob,
}

const ID: &str = "67e55044-10b1-426f-9247-bb680e5fe0c8";

#[test]
fn derived_model_from_json() {
    let raw = Value::from(serde_json::json!({
        "id": ID,
        "emailAddress": "ada@example.com",
        "friends": ["2", 3],
        "code": "ab-1"
    }));
    let user: User = parse(raw).unwrap();
    assert_eq!(user.id, Uuid::parse_str(ID).unwrap());
    assert_eq!(user.email_address, "ada@example.com");
    assert_eq!(user.created_at, epoch());
    assert_eq!(user.friends, vec![2, 3]);
    assert_eq!(user.code, "AB-1");
    assert_eq!(user.nickname, None);
}

#[test]
fn field_name_is_used_when_alias_is_absent() {
    let raw = Value::from(serde_json::json!({
        "id": ID,
        "email_address": "grace@example.com",
        "created_at": "2021-06-01 08:00:00",
        "code": "x"
    }));
    let user: User = parse(raw).unwrap();
    assert_eq!(user.email_address, "grace@example.com");
    assert!(user.friends.is_empty());
    assert_eq!(
        user.created_at,
        NaiveDate::from_ymd_opt(2021, 6, 1).unwrap().and_hms_opt(8, 0, 0).unwrap()
    );
}

#[test]
fn missing_required_field_is_reported() {
    let raw = Value::from(serde_json::json!({"id": ID, "code": "x"}));
    let err = parse::<User>(raw).unwrap_err();
    assert_eq!(err.kind, ErrorKind::CompositeConstruction);
    assert_eq!(err.composite.as_deref(), Some("User"));
    assert_eq!(err.path_string(), "email_address");
}

#[test]
fn self_referential_model() {
    let raw = Value::from(serde_json::json!({
        "value": "1",
        "children": [{"value": 2}, {"value": 3, "children": [{"value": "4"}]}]
    }));
    let tree: Node = parse(raw).unwrap();
    let leaf = |value| Node {
        value,
        children: vec![],
    };
    assert_eq!(
        tree,
        Node {
            value: 1,
            children: vec![
                leaf(2),
                Node {
                    value: 3,
                    children: vec![leaf(4)],
                },
            ],
        }
    );
}

#[test]
fn self_referential_error_path() {
    let raw = Value::from(serde_json::json!({
        "value": 1,
        "children": [{"value": 2}, {"value": 3, "children": [{"value": "x"}]}]
    }));
    let err = parse::<Node>(raw).unwrap_err();
    assert_eq!(err.path_string(), "children[1].children[0].value");
    assert_eq!(err.composite.as_deref(), Some("Node"));
}

#[test]
fn resolved_model_is_shared() {
    let first = resolve::<Node>();
    let second = resolve::<Node>();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(first.to_string(), "Node");
}

#[test]
fn containers_bytes_and_any() {
    let raw = Value::from(serde_json::json!({
        "sensor": "t1",
        "values": {"min": "1.5", "max": 3},
        "raw": [1, 2, 255],
        "extra": {"anything": [true]}
    }));
    let reading: Reading = parse(raw).unwrap();
    assert_eq!(reading.sensor, "t1");
    assert_eq!(reading.values["min"], 1.5);
    assert_eq!(reading.values["max"], 3.0);
    assert_eq!(reading.raw, Some(Blob(vec![1, 2, 255])));
    assert_eq!(reading.extra, Value::from(serde_json::json!({"anything": [true]})));
}

#[test]
fn lenient_options_only_relax_lenient_kinds() {
    let descriptor = resolve_declared(&DeclaredType::Record(RecordDecl::named(
        "Sample",
        vec![
            FieldDecl::new("reading", DeclaredType::class("float")),
            FieldDecl::new("count", DeclaredType::class("int")),
        ],
    )));
    let TypeDescriptor::Composite(spec) = &descriptor else {
        panic!("expected composite");
    };
    let raw = Value::from(serde_json::json!({"reading": "n/a", "count": "2"}));

    let lenient = datacast_engine::Coercer::new().options(CoercionOptions::lenient());
    let built = lenient.construct(spec, &raw).unwrap();
    let record = built.as_record().unwrap();
    assert_eq!(record.get("reading"), Some(&Value::Null));
    assert_eq!(record.get("count"), Some(&Value::Int(2)));

    let bad_count = Value::from(serde_json::json!({"reading": 1.0, "count": "two"}));
    assert!(lenient.construct(spec, &bad_count).is_err());
    assert!(datacast_engine::construct(spec, &raw).is_err());
}

#[test]
fn parse_with_extra_date_format() {
    let options = CoercionOptions::strict().with_date_format("%Y.%j");
    let date: NaiveDate = parse_with(Value::from("2024.036"), options).unwrap();
    assert_eq!(date, NaiveDate::from_ymd_opt(2024, 2, 5).unwrap());
    assert!(parse::<NaiveDate>(Value::from("2024.036")).is_err());
}

#[test]
fn union_declarations_try_each_variant() {
    let declared = DeclaredType::Union(vec![
        DeclaredType::class("int"),
        DeclaredType::class("date"),
        DeclaredType::None,
    ]);
    let descriptor = resolve_declared(&declared);
    assert_eq!(descriptor.to_string(), "Optional[Union[Integer, Date]]");
    let coerce = |raw: Value| datacast_engine::coerce(&descriptor, &raw, None);
    assert_eq!(coerce(Value::from("7")).unwrap(), Value::Int(7));
    assert_eq!(
        coerce(Value::from("2024-02-05")).unwrap(),
        Value::Date(NaiveDate::from_ymd_opt(2024, 2, 5).unwrap())
    );
    assert_eq!(coerce(Value::Null).unwrap(), Value::Null);
    let err = coerce(Value::from("soon")).unwrap_err();
    assert_eq!(err.target, "Union[Integer, Date]");
}

#[test]
fn trait_defaults_for_wide_and_keyed_fields() {
    let counter: Counter = parse(Value::from(serde_json::json!({"name": "home"}))).unwrap();
    assert_eq!(counter.name, "home");
    assert_eq!(counter.hits, 0);
    assert!(counter.tags.is_empty());
    assert_eq!(counter.payload, Blob::default());

    let raw = Value::from(serde_json::json!({
        "name": "api",
        "hits": "12",
        "tags": {"env": "prod"},
        "payload": "ok"
    }));
    let counter: Counter = parse(raw).unwrap();
    assert_eq!(counter.hits, 12);
    assert_eq!(counter.tags["env"], "prod");
    assert_eq!(counter.payload, Blob(b"ok".to_vec()));
}
