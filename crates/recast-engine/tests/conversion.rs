//! End-to-end conversion tests: YAML catalogs, overrides, annotations,
//! sequences, and batch execution working together.

use chrono::{TimeZone, Utc};
use recast_core::{Record, SchemaCatalog, Value};
use recast_engine::{
    BatchOptions, BatchScheduler, ConversionContext, ConversionEngine, ConvertError, Direction,
};
use std::sync::Arc;
use uuid::Uuid;

const WIRE_CATALOG: &str = r#"
version: 1
records:
  - name: WireOrder
    fields:
      - name: order_id
        type: int64
      - name: customer
        type: string
      - name: labels
        type:
          type: list
          element: string
        optional: true
      - name: flags
        type:
          type: list
          element: string
        optional: true
      - name: codes
        type:
          type: list
          element: int64
        optional: true
      - name: placed_at
        type: wire_timestamp
        optional: true
      - name: shipping
        type:
          type: record
          name: WireAddress
        optional: true
      - name: token
        type: string
        optional: true

  - name: WireAddress
    fields:
      - name: street
        type: string
      - name: zip
        type: string
"#;

const DOMAIN_CATALOG: &str = r#"
version: 1
records:
  - name: Order
    fields:
      - name: order_id
        type: int32
      - name: customer
        type: string
      - name: tags
        type:
          type: list
          element: string
        optional: true
        maps_to: labels
      - name: codes
        type:
          type: list
          element: int32
        optional: true
      - name: placed_at
        type: timestamp
        optional: true
      - name: shipping
        type:
          type: record
          name: Address
        optional: true
      - name: token
        type: uuid
        optional: true

  - name: Address
    fields:
      - name: street
        type: string
      - name: zip
        type: string
"#;

fn build_engine() -> ConversionEngine {
    let wire = Arc::new(SchemaCatalog::from_yaml(WIRE_CATALOG).unwrap());
    let domain = Arc::new(SchemaCatalog::from_yaml(DOMAIN_CATALOG).unwrap());
    wire.validate().unwrap();
    domain.validate().unwrap();
    ConversionEngine::new(Arc::new(ConversionContext::new(wire, domain)))
}

fn wire_order(id: i64) -> Record {
    Record::builder("WireOrder")
        .field("order_id", Value::Int64(id))
        .field("customer", Value::String("acme".into()))
        .build()
}

#[test]
fn full_conversion_with_annotation_timestamp_and_nested_record() {
    let engine = build_engine();
    let placed = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
    let token = Uuid::new_v4();

    let mut src = wire_order(7);
    src.set(
        "labels",
        Value::List(vec![
            Value::String("new".into()),
            Value::String("rush".into()),
        ]),
    );
    src.set(
        "placed_at",
        Value::WireTimestamp {
            seconds: placed.timestamp(),
            nanos: 0,
        },
    );
    src.set(
        "shipping",
        Value::Record(
            Record::builder("WireAddress")
                .field("street", Value::String("1 Main St".into()))
                .field("zip", Value::String("99999".into()))
                .build(),
        ),
    );
    src.set("token", Value::String(token.to_string()));

    let mut dst = Value::Record(Record::new("Order"));
    engine
        .convert(Direction::WireToDomain, &Value::Record(src), &mut dst)
        .unwrap();

    let order = dst.as_record().unwrap();
    assert_eq!(order.get("order_id"), Some(&Value::Int32(7)));
    assert_eq!(order.get("customer"), Some(&Value::String("acme".into())));
    // "labels" landed in "tags" via the maps_to annotation.
    assert_eq!(
        order.get("tags"),
        Some(&Value::List(vec![
            Value::String("new".into()),
            Value::String("rush".into()),
        ]))
    );
    assert_eq!(order.get("placed_at"), Some(&Value::Timestamp(placed)));
    assert_eq!(order.get("token"), Some(&Value::Uuid(token)));

    let shipping = order.get("shipping").unwrap().as_record().unwrap();
    assert_eq!(shipping.type_name, "Address");
    assert_eq!(shipping.get("street"), Some(&Value::String("1 Main St".into())));
}

#[test]
fn round_trip_preserves_overlapping_fields() {
    let engine = build_engine();
    let placed = Utc.with_ymd_and_hms(2024, 11, 30, 8, 0, 0).unwrap();

    let mut src = wire_order(321);
    src.set(
        "labels",
        Value::List(vec![Value::String("a".into()), Value::String("b".into())]),
    );
    src.set(
        "placed_at",
        Value::WireTimestamp {
            seconds: placed.timestamp(),
            nanos: 250_000_000,
        },
    );
    let src = Value::Record(src);

    let mut domain = Value::Record(Record::new("Order"));
    engine
        .convert(Direction::WireToDomain, &src, &mut domain)
        .unwrap();

    let mut back = Value::Record(Record::new("WireOrder"));
    engine
        .convert(Direction::DomainToWire, &domain, &mut back)
        .unwrap();

    let rec = back.as_record().unwrap();
    assert_eq!(rec.get("order_id"), Some(&Value::Int64(321)));
    assert_eq!(rec.get("customer"), Some(&Value::String("acme".into())));
    assert_eq!(
        rec.get("labels"),
        Some(&Value::List(vec![
            Value::String("a".into()),
            Value::String("b".into()),
        ]))
    );
    assert_eq!(
        rec.get("placed_at"),
        Some(&Value::WireTimestamp {
            seconds: placed.timestamp(),
            nanos: 250_000_000,
        })
    );
}

#[test]
fn absent_and_empty_sequences_are_distinct() {
    let engine = build_engine();

    // Absent source list: destination stays unset.
    let mut dst = Value::Record(Record::new("Order"));
    engine
        .convert(
            Direction::WireToDomain,
            &Value::Record(wire_order(1)),
            &mut dst,
        )
        .unwrap();
    assert!(!dst.as_record().unwrap().has("tags"));

    // Explicitly empty source list: destination gets an allocated empty
    // list.
    let mut src = wire_order(2);
    src.set("labels", Value::List(vec![]));
    let mut dst = Value::Record(Record::new("Order"));
    engine
        .convert(Direction::WireToDomain, &Value::Record(src), &mut dst)
        .unwrap();
    assert_eq!(
        dst.as_record().unwrap().get("tags"),
        Some(&Value::List(vec![]))
    );
}

#[test]
fn sequence_element_failure_names_field_and_index() {
    let engine = build_engine();

    // codes narrows int64 -> int32 element-wise; element[1] is a string
    // with no applicable rule.
    let mut src = wire_order(3);
    src.set(
        "codes",
        Value::List(vec![
            Value::Int64(10),
            Value::String("oops".into()),
            Value::Int64(30),
        ]),
    );
    let mut dst = Value::Record(Record::new("Order"));

    let err = engine
        .convert(Direction::WireToDomain, &Value::Record(src), &mut dst)
        .unwrap_err();

    match &err {
        ConvertError::Field { field, source } => {
            assert_eq!(field, "codes");
            assert!(matches!(**source, ConvertError::Element { index: 1, .. }));
        }
        other => panic!("expected a field error, got: {other}"),
    }
    // The field failed atomically: no partial list landed in the
    // destination.
    assert!(!dst.as_record().unwrap().has("codes"));
}

#[test]
fn override_wins_over_annotation() {
    let wire = Arc::new(SchemaCatalog::from_yaml(WIRE_CATALOG).unwrap());
    let domain = Arc::new(SchemaCatalog::from_yaml(DOMAIN_CATALOG).unwrap());

    let mut src = wire_order(4);
    src.set(
        "labels",
        Value::List(vec![Value::String("from-labels".into())]),
    );
    src.set("flags", Value::List(vec![Value::String("from-flags".into())]));
    let src = Value::Record(src);

    // Without the override, the annotation routes labels -> tags.
    let plain = ConversionEngine::new(Arc::new(ConversionContext::new(
        wire.clone(),
        domain.clone(),
    )));
    let mut dst = Value::Record(Record::new("Order"));
    plain.convert(Direction::WireToDomain, &src, &mut dst).unwrap();
    assert_eq!(
        dst.as_record().unwrap().get("tags"),
        Some(&Value::List(vec![Value::String("from-labels".into())]))
    );

    // With an override registered before warm-up, flags -> tags wins over
    // the annotation: the same source populates the destination
    // differently.
    let ctx = ConversionContext::new(wire, domain);
    ctx.register_override("flags", "tags");
    let overridden = ConversionEngine::new(Arc::new(ctx));

    let mut dst = Value::Record(Record::new("Order"));
    overridden
        .convert(Direction::WireToDomain, &src, &mut dst)
        .unwrap();
    assert_eq!(
        dst.as_record().unwrap().get("tags"),
        Some(&Value::List(vec![Value::String("from-flags".into())]))
    );
}

#[tokio::test]
async fn batch_conversion_end_to_end() {
    let engine = Arc::new(build_engine());
    let scheduler = BatchScheduler::new(engine);

    let items = Value::List(
        (0..57)
            .map(|i| {
                let mut order = wire_order(i);
                if i % 2 == 0 {
                    order.set(
                        "labels",
                        Value::List(vec![Value::String(format!("batch-{i}"))]),
                    );
                }
                Value::Record(order)
            })
            .collect(),
    );

    let outcome = scheduler
        .execute(
            Direction::WireToDomain,
            "Order",
            &items,
            &BatchOptions::new(10, 3),
        )
        .await
        .unwrap();

    assert_eq!(outcome.results.len(), 57);
    assert_eq!(outcome.succeeded, 57);
    for (i, item) in outcome.results.iter().enumerate() {
        assert_eq!(item.index, i);
        let order = item.result.as_ref().unwrap().as_record().unwrap();
        assert_eq!(order.get("order_id"), Some(&Value::Int32(i as i32)));
        assert_eq!(order.has("tags"), i % 2 == 0);
    }
}
