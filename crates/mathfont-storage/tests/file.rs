use mathfont_storage::{FileStorage, StorageArea, StorageError, StorageMap};
use serde_json::{json, Value};

fn map(value: Value) -> StorageMap {
    value.as_object().cloned().expect("object")
}

#[tokio::test]
async fn missing_file_reads_as_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = FileStorage::new(dir.path().join("local.json"));
    assert!(storage.get_all().await.expect("get_all").is_empty());
    assert!(!storage.path().exists());
}

#[tokio::test]
async fn writes_survive_a_new_instance() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("local.json");

    let storage = FileStorage::new(&path);
    storage
        .set(map(json!({ "mathFontFamily": "STIX Two Math", "mathFontScale": 150 })))
        .await
        .expect("set");
    assert!(path.exists());
    assert!(!path.with_extension("json.tmp").exists());

    let reopened = FileStorage::new(&path);
    assert_eq!(
        Value::Object(reopened.get_all().await.expect("get_all")),
        json!({ "mathFontFamily": "STIX Two Math", "mathFontScale": 150 })
    );
}

#[tokio::test]
async fn set_notifies_subscribers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = FileStorage::new(dir.path().join("local.json"));
    let mut rx = storage.subscribe();

    storage.set(map(json!({ "mathFontImportant": false }))).await.expect("set");

    let change = rx.recv().await.expect("notification");
    let important = change.get("mathFontImportant").expect("change");
    assert_eq!(important.old_value, None);
    assert_eq!(important.new_value, Some(json!(false)));
}

#[tokio::test]
async fn clear_leaves_an_empty_object() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("local.json");
    let storage = FileStorage::new(&path);
    storage.set(map(json!({ "a": 1 }))).await.expect("set");
    storage.clear().await.expect("clear");

    let contents = std::fs::read_to_string(&path).expect("read");
    assert_eq!(serde_json::from_str::<Value>(&contents).expect("json"), json!({}));
}

#[tokio::test]
async fn non_object_file_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("local.json");
    std::fs::write(&path, "[1, 2, 3]").expect("write");

    let storage = FileStorage::new(&path);
    let err = storage.get_all().await.expect_err("array is not a storage area");
    assert!(matches!(err, StorageError::NotAnObject { .. }));
}
