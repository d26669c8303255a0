//! Integration test: binding seed data into nested model graphs.
//!
//! Covers construction from plain maps, JSON text and other instances,
//! assignment of nested models and collections, self-referential trees,
//! and the serialize/create round trip.

use serde_json::json;
use typebind_model::{
    Collection, FieldDescriptor, FieldValue, Model, ModelError, ModelType, SchemaBuilder,
    SchemaError,
};

fn test_model() -> ModelType {
    SchemaBuilder::new("TestModel")
        .field("name", FieldDescriptor::string())
        .field("age", FieldDescriptor::number().min(1.0).max(120.0))
        .build()
        .unwrap()
}

fn model_type(child: &ModelType) -> ModelType {
    SchemaBuilder::new("ModelType")
        .field("id", FieldDescriptor::number())
        .field("child", FieldDescriptor::model(child))
        .build()
        .unwrap()
}

fn text(model: &Model, field: &str) -> String {
    model
        .get(field)
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn number(model: &Model, field: &str) -> Option<i64> {
    model.get(field).and_then(|v| v.as_i64())
}

#[test]
fn test_construct_simple_model() {
    let m = test_model().create(json!({"name": "Gerald", "age": 2})).unwrap();
    assert_eq!(text(&m, "name"), "Gerald");
    assert_eq!(number(&m, "age"), Some(2));
    assert!(m.validate());
}

#[test]
fn test_construct_with_model_instance_adopts_it() {
    let child_type = test_model();
    let child = child_type.create(json!({"name": "Gerald", "age": 2})).unwrap();
    let m = model_type(&child_type)
        .create(vec![("id", FieldValue::from(1)), ("child", FieldValue::from(&child))])
        .unwrap();

    let held = m.get_model("child").unwrap();
    assert!(held.ptr_eq(&child));
    assert_eq!(text(&held, "name"), "Gerald");
    assert_eq!(number(&held, "age"), Some(2));

    child.set("age", 3);
    assert_eq!(number(&m.get_model("child").unwrap(), "age"), Some(3));
}

#[test]
fn test_construct_with_collection_instance_adopts_it() {
    let item = test_model();
    let group = SchemaBuilder::new("Group")
        .field("members", FieldDescriptor::collection(&item))
        .build()
        .unwrap();
    let members = Collection::new(&item)
        .seeded(vec![
            item.create(json!({"name": "Gerald", "age": 2})).unwrap(),
            item.create(json!({"name": "Hudson", "age": 5})).unwrap(),
        ])
        .unwrap();

    let g = group.create(vec![("members", FieldValue::from(&members))]).unwrap();
    assert!(g.get_collection("members").unwrap().ptr_eq(&members));
    assert_eq!(g.serialize()["members"][1], json!({"name": "Hudson", "age": 5}));
}

#[test]
fn test_construct_from_model_seed_with_nested_instance() {
    let child_type = test_model();
    let parent_type = model_type(&child_type);
    let child = child_type.create(json!({"name": "Gerald", "age": 2})).unwrap();
    let source = parent_type.instance();
    source.set("id", 1);
    source.set("child", &child);

    let m = parent_type.create(&source).unwrap();
    assert!(!m.ptr_eq(&source));
    assert!(m.get_model("child").unwrap().ptr_eq(&child));
}

#[test]
fn test_set_model_with_collection_property() {
    let child_item = SchemaBuilder::new("ChildItemType")
        .field("name", FieldDescriptor::string())
        .build()
        .unwrap();
    let child_type = SchemaBuilder::new("ChildType")
        .field("name", FieldDescriptor::string())
        .field("children", FieldDescriptor::collection(&child_item))
        .build()
        .unwrap();
    let parent = model_type(&child_type).create(json!({"id": 1})).unwrap();

    let children = Collection::new(&child_item);
    let child = child_type
        .create(json!({"name": "child name"}))
        .unwrap();
    child.set("children", &children);
    for name in ["child item 1", "child item 2", "child item 3"] {
        children
            .add(child_item.create(json!({"name": name})).unwrap())
            .unwrap();
    }

    parent.set("child", &child);

    let held = parent.get_model("child").unwrap();
    assert_eq!(text(&held, "name"), "child name");
    assert_eq!(held.get_collection("children").unwrap().len(), 3);
}

#[test]
fn test_construct_with_plain_child_map() {
    let m = model_type(&test_model())
        .create(json!({"id": 1, "child": {"name": "Gerald", "age": 2}}))
        .unwrap();
    let child = m.get_model("child").unwrap();
    assert_eq!(child.type_tag(), "TestModel");
    assert_eq!(text(&child, "name"), "Gerald");
    assert_eq!(number(&child, "age"), Some(2));
}

#[test]
fn test_set_with_plain_child_map() {
    let m = model_type(&test_model()).create(json!({"id": 1})).unwrap();
    m.set("child", json!({"name": "Gerald", "age": 2}));
    let child = m.get_model("child").unwrap();
    assert_eq!(child.type_tag(), "TestModel");
    assert_eq!(number(&child, "age"), Some(2));
}

#[test]
fn test_construct_with_child_json_text() {
    let m = model_type(&test_model())
        .create(json!({"id": 1, "child": r#"{ "name":"Gerald", "age": "2" }"#}))
        .unwrap();
    let child = m.get_model("child").unwrap();
    assert_eq!(text(&child, "name"), "Gerald");
    assert_eq!(child.get("age").unwrap().to_json(), json!(2));
}

#[test]
fn test_construct_from_nested_json_text() {
    let json = r#"{"id":"1", "child":{"name":"Gerald", "age":"2"}}"#;
    let m = model_type(&test_model()).create(json).unwrap();

    assert_eq!(m.get("id").unwrap().to_json(), json!(1));
    let child = m.get_model("child").unwrap();
    assert_eq!(child.type_tag(), "TestModel");
    assert_eq!(text(&child, "name"), "Gerald");
    assert_eq!(child.get("age").unwrap().to_json(), json!(2));
}

#[test]
fn test_self_referential_tree() {
    let node = SchemaBuilder::new("ModelType")
        .field("name", FieldDescriptor::string())
        .field("children", FieldDescriptor::collection_of_self())
        .build()
        .unwrap();

    let json = r#"{
        "name": "level1",
        "children": [
            {"name": "Gerald"},
            {"name": "Hudson"},
            {"name": "Jamie"}
        ]
    }"#;
    let m = node.create(json).unwrap();

    assert_eq!(text(&m, "name"), "level1");
    let children = m.get_collection("children").unwrap();
    assert_eq!(children.len(), 3);
    let first = children.at(0).unwrap().into_model().unwrap();
    assert!(first.model_type().ptr_eq(&node));
    assert_eq!(first.type_tag(), "ModelType");
    assert_eq!(text(&first, "name"), "Gerald");
    assert_eq!(first.get_collection("children").unwrap().len(), 0);
}

#[test]
fn test_self_referential_tree_grows_by_add() {
    let node = SchemaBuilder::new("Node")
        .field("name", FieldDescriptor::string())
        .field("children", FieldDescriptor::collection_of_self())
        .build()
        .unwrap();
    let root = node.instance();
    let children = root.get_collection("children").unwrap();
    for i in 0..5 {
        children.add(json!({"name": format!("n{i}")})).unwrap();
    }
    assert_eq!(children.len(), 5);
    children.for_each(|child| {
        assert!(child.as_model().unwrap().model_type().ptr_eq(&node));
    });
    assert!(children.at(5).is_err());
}

#[test]
fn test_required_string_default() {
    let err = SchemaBuilder::new("Account")
        .field("email", FieldDescriptor::string().required())
        .field("age", FieldDescriptor::number())
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidDefault { ref field, .. } if field == "email"));

    let ty = SchemaBuilder::new("Account")
        .field("email", FieldDescriptor::string().required().default_text("nobody@example.com"))
        .field("age", FieldDescriptor::number())
        .build()
        .unwrap();
    let fresh = ty.instance();
    assert!(fresh.is_valid());
    let again = ty.create(fresh.serialize()).unwrap();
    assert_eq!(again, fresh);

    again.set("email", "");
    assert_eq!(again.error("email").as_deref(), Some("email is required"));
}

#[test]
fn test_numeric_bounds() {
    let ty = test_model();
    assert!(ty.create(json!({"age": 2})).is_ok());

    for (age, message) in [
        (0, "value cannot be less than 1"),
        (121, "value cannot be greater than 120"),
    ] {
        match ty.create(json!({"age": age})) {
            Err(ModelError::Construction { field, message: m, .. }) => {
                assert_eq!(field, "age");
                assert_eq!(m, message);
            }
            other => panic!("expected construction error, got {other:?}"),
        }

        let m = ty.instance();
        m.set("age", age);
        assert_eq!(m.error("age").as_deref(), Some(message));
        assert!(!m.is_valid());
    }
}

#[test]
fn test_serialize_roundtrip_with_nested_tree() {
    let item = SchemaBuilder::new("Item")
        .field("sku", FieldDescriptor::string())
        .field("qty", FieldDescriptor::number())
        .build()
        .unwrap();
    let order = SchemaBuilder::new("Order")
        .field("id", FieldDescriptor::number().key())
        .field("placed", FieldDescriptor::datetime())
        .field("paid", FieldDescriptor::boolean())
        .field("meta", FieldDescriptor::object())
        .field("tags", FieldDescriptor::array())
        .field("customer", FieldDescriptor::model(&test_model()))
        .field("items", FieldDescriptor::collection(&item))
        .build()
        .unwrap();

    let m = order
        .create(json!({
            "id": 42,
            "placed": "2026-02-03T04:05:06.789+02:00",
            "paid": "true",
            "meta": "{\"channel\":\"web\"}",
            "tags": ["rush"],
            "customer": {"name": "Gerald", "age": 40},
            "items": [{"sku": "A-1", "qty": 2}, {"sku": "B-7", "qty": "3"}],
        }))
        .unwrap();

    let data = m.serialize();
    assert_eq!(
        data,
        json!({
            "id": 42,
            "placed": "2026-02-03T02:05:06.789Z",
            "paid": true,
            "meta": {"channel": "web"},
            "tags": ["rush"],
            "customer": {"name": "Gerald", "age": 40},
            "items": [{"sku": "A-1", "qty": 2}, {"sku": "B-7", "qty": 3}],
        })
    );

    let again = order.create(data).unwrap();
    assert_eq!(again, m);
    assert_eq!(again.key(), Some(FieldValue::from(42)));
}

#[test]
fn test_extended_schema_overrides_and_adds_fields() {
    let base = test_model();
    let employee = SchemaBuilder::extend(&base, "Employee")
        .field("age", FieldDescriptor::number().min(16.0).max(70.0))
        .field("badge", FieldDescriptor::number().key())
        .build()
        .unwrap();

    let err = employee.create(json!({"name": "Gerald", "age": 2})).unwrap_err();
    assert!(matches!(err, ModelError::Construction { ref message, .. } if message == "value cannot be less than 16"));

    let m = employee.create(json!({"name": "Hudson", "age": 30, "badge": 7})).unwrap();
    assert_eq!(m.field_names(), vec!["name", "age", "badge"]);
    assert_eq!(m.key(), Some(FieldValue::from(7)));
}
