use serde_json::{json, Value};
use std::collections::HashSet;
use taskstore_core::db::open_db_in_memory;
use taskstore_core::{
    RecordStore, SqliteRecordStore, Task, TaskPayload, TaskService, TaskServiceError,
    TASK_COLLECTION,
};

fn payload(value: Value) -> TaskPayload {
    value.as_object().cloned().unwrap()
}

fn assert_not_found<T: std::fmt::Debug>(result: Result<T, TaskServiceError>, expected_id: &str) {
    match result {
        Err(TaskServiceError::NotFound(id)) => assert_eq!(id, expected_id),
        other => panic!("expected NotFound({expected_id}), got {other:?}"),
    }
}

#[test]
fn full_lifecycle_of_one_task() {
    let conn = open_db_in_memory().unwrap();
    let service = TaskService::new(SqliteRecordStore::new(&conn));

    let created = service.create(payload(json!({"title": "buy milk"}))).unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(created.fields, payload(json!({"title": "buy milk"})));

    let fetched = service.find_one(&created.id).unwrap();
    assert_eq!(fetched, created);

    let updated = service
        .update(&created.id, payload(json!({"title": "buy oat milk"})))
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.field("title"), Some(&json!("buy oat milk")));

    let removed = service.remove(&created.id).unwrap();
    assert_eq!(removed, updated);

    assert_not_found(service.find_one(&created.id), &created.id);
}

#[test]
fn create_keeps_every_payload_field_and_assigns_fresh_ids() {
    let conn = open_db_in_memory().unwrap();
    let service = TaskService::new(SqliteRecordStore::new(&conn));

    let fields = payload(json!({
        "title": "file taxes",
        "done": false,
        "priority": 3,
        "labels": ["home", "money"],
        "meta": {"source": "import"}
    }));
    let first = service.create(fields.clone()).unwrap();
    let second = service.create(fields.clone()).unwrap();

    assert_eq!(first.fields, fields);
    assert_ne!(first.id, second.id);
}

#[test]
fn create_ignores_caller_supplied_id() {
    let conn = open_db_in_memory().unwrap();
    let service = TaskService::new(SqliteRecordStore::new(&conn));

    let created = service
        .create(payload(json!({"id": "t1", "title": "forged"})))
        .unwrap();

    assert_ne!(created.id, "t1");
    assert!(created.field("id").is_none());
    assert_not_found(service.find_one("t1"), "t1");
}

#[test]
fn find_all_returns_exactly_the_created_tasks() {
    let conn = open_db_in_memory().unwrap();
    let service = TaskService::new(SqliteRecordStore::new(&conn));
    assert!(service.find_all().unwrap().is_empty());

    let created: HashSet<String> = ["a", "b", "c"]
        .iter()
        .map(|title| service.create(payload(json!({"title": title}))).unwrap().id)
        .collect();

    let listed: Vec<Task> = service.find_all().unwrap();
    assert_eq!(listed.len(), 3);
    let listed_ids: HashSet<String> = listed.into_iter().map(|task| task.id).collect();
    assert_eq!(listed_ids, created);
}

#[test]
fn find_all_only_sees_task_collection() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::new(&conn);
    store
        .insert("projects", &payload(json!({"name": "other"})))
        .unwrap();

    let service = TaskService::new(SqliteRecordStore::new(&conn));
    service.create(payload(json!({"title": "only me"}))).unwrap();

    let listed = service.find_all().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].field("title"), Some(&json!("only me")));
}

#[test]
fn find_one_never_inserted_id_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = TaskService::new(SqliteRecordStore::new(&conn));

    let err = service.find_one("missing-id").unwrap_err();
    assert_eq!(err.to_string(), "Task with ID missing-id not found");
    assert_not_found(service.find_one("missing-id"), "missing-id");
}

#[test]
fn update_merges_patch_and_keeps_untouched_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = TaskService::new(SqliteRecordStore::new(&conn));

    let created = service
        .create(payload(json!({"title": "draft", "done": false})))
        .unwrap();
    let updated = service
        .update(&created.id, payload(json!({"done": true, "id": "other"})))
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(
        updated.fields,
        payload(json!({"title": "draft", "done": true}))
    );
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(service.find_one(&created.id).unwrap(), updated);
}

#[test]
fn update_missing_id_is_not_found_and_creates_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = TaskService::new(SqliteRecordStore::new(&conn));

    assert_not_found(
        service.update("ghost", payload(json!({"title": "x"}))),
        "ghost",
    );
    assert!(service.find_all().unwrap().is_empty());
}

#[test]
fn remove_missing_or_already_removed_id_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = TaskService::new(SqliteRecordStore::new(&conn));

    assert_not_found(service.remove("ghost"), "ghost");

    let created = service.create(payload(json!({"title": "once"}))).unwrap();
    service.remove(&created.id).unwrap();
    assert_not_found(service.remove(&created.id), &created.id);
    assert_not_found(
        service.update(&created.id, payload(json!({"title": "again"}))),
        &created.id,
    );
}

#[test]
fn tasks_are_stored_in_task_collection() {
    let conn = open_db_in_memory().unwrap();
    let service = TaskService::new(SqliteRecordStore::new(&conn));
    let created = service.create(payload(json!({"title": "x"}))).unwrap();

    let store = SqliteRecordStore::new(&conn);
    let record = store
        .find_by_key(TASK_COLLECTION, &created.id)
        .unwrap()
        .unwrap();
    assert_eq!(record.data, created.fields);
}
