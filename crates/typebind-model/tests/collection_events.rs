//! Integration test: change propagation from models through collections.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use typebind_model::{
    Collection, CollectionEvent, FieldDescriptor, FieldValue, Model, ModelEvent, ModelType,
    Notifier, SchemaBuilder, TypeRegistry,
};

fn task_type() -> ModelType {
    SchemaBuilder::new("Task")
        .field("id", FieldDescriptor::number().key())
        .field("title", FieldDescriptor::string().required().default_text("untitled"))
        .field("done", FieldDescriptor::boolean())
        .build()
        .unwrap()
}

fn record(collection: &Collection) -> Rc<RefCell<Vec<CollectionEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    collection.on(move |event| sink.borrow_mut().push(event.clone()));
    log
}

fn id_of(item: &FieldValue) -> Option<i64> {
    item.as_model().and_then(Model::key).and_then(|k| k.as_i64())
}

#[test]
fn test_mutating_added_model_bubbles_same_instance() {
    let ty = task_type();
    let tasks = Collection::new(&ty);
    let task = ty.create(json!({"id": 1, "title": "write"})).unwrap();
    let log = record(&tasks);

    tasks.add(&task).unwrap();
    task.set("done", true);

    let log = log.borrow();
    assert_eq!(log.len(), 2);
    assert!(matches!(&log[0], CollectionEvent::Add(FieldValue::Model(m)) if m.ptr_eq(&task)));
    assert!(matches!(&log[1], CollectionEvent::Update(m) if m.ptr_eq(&task)));
}

#[test]
fn test_validation_errors_do_not_bubble_as_updates() {
    let ty = task_type();
    let tasks = Collection::new(&ty).seeded(json!([{"id": 1, "title": "a"}])).unwrap();
    let task = tasks.at(0).unwrap().into_model().unwrap();

    let collection_log = record(&tasks);
    let model_log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&model_log);
    task.on(move |e| sink.borrow_mut().push(e.clone()));

    task.set("title", "");

    assert_eq!(model_log.borrow().len(), 2);
    assert!(matches!(
        &model_log.borrow()[1],
        ModelEvent::ValidationError { field, message } if field == "title" && message == "title is required"
    ));
    assert_eq!(collection_log.borrow().len(), 1);
}

#[test]
fn test_handler_may_add_to_collection_during_update() {
    let ty = task_type();
    let tasks = Collection::new(&ty);
    tasks.add(json!({"id": 1, "title": "a"})).unwrap();

    let handle = tasks.clone();
    let spawned = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&spawned);
    tasks.on(move |event| {
        if let CollectionEvent::Update(m) = event {
            if m.get("done").and_then(|d| d.as_bool()) == Some(true) && *counter.borrow() == 0 {
                *counter.borrow_mut() += 1;
                handle.add(json!({"id": 2, "title": "follow-up"})).unwrap();
            }
        }
    });

    tasks.at(0).unwrap().into_model().unwrap().set("done", true);

    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks.map(id_of), vec![Some(1), Some(2)]);
}

#[test]
fn test_remove_first_match_and_unsubscribe() {
    let tasks = Collection::new(&task_type())
        .seeded(json!([
            {"id": 1, "title": "a"},
            {"id": 2, "title": "b"},
            {"id": 3, "title": "c"},
        ]))
        .unwrap();
    let second = tasks.at(1).unwrap().into_model().unwrap();

    let removed = tasks.remove(|item| id_of(item).is_some_and(|id| id >= 2)).unwrap();
    assert!(removed.as_model().unwrap().ptr_eq(&second));
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks.map(id_of), vec![Some(1), Some(3)]);

    let log = record(&tasks);
    second.set("done", true);
    assert!(log.borrow().is_empty());
}

#[test]
fn test_remove_on_empty_collection() {
    let tasks = Collection::new(&task_type());
    let log = record(&tasks);
    assert!(tasks.remove(|_| true).is_none());
    assert_eq!(tasks.len(), 0);
    assert!(log.borrow().is_empty());
}

#[test]
fn test_nested_collection_merge_keeps_identity_and_subscribers() {
    let task = task_type();
    let project = SchemaBuilder::new("Project")
        .field("name", FieldDescriptor::string())
        .field("tasks", FieldDescriptor::collection(&task))
        .build()
        .unwrap();
    let p = project
        .create(json!({"name": "launch", "tasks": [{"id": 1, "title": "a"}]}))
        .unwrap();
    let tasks = p.get_collection("tasks").unwrap();
    let log = record(&tasks);

    p.set("tasks", r#"[{"id": 5, "title": "x"}, {"id": 6, "title": "y"}]"#);

    let after = p.get_collection("tasks").unwrap();
    assert!(after.ptr_eq(&tasks));
    assert_eq!(after.map(id_of), vec![Some(5), Some(6)]);
    let log = log.borrow();
    assert!(matches!(log[0], CollectionEvent::Remove(_)));
    assert_eq!(log.iter().filter(|e| matches!(e, CollectionEvent::Add(_))).count(), 2);
}

#[test]
fn test_collection_by_registered_name() {
    let mut registry = TypeRegistry::new();
    SchemaBuilder::new("Task")
        .field("title", FieldDescriptor::string())
        .register(&mut registry)
        .unwrap();

    let tasks = Collection::from_registry(&registry, "Task")
        .unwrap()
        .seeded(r#"[{"title": "a"}, {"title": "b"}]"#)
        .unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks.serialize(), json!([{"title": "a"}, {"title": "b"}]));
}
