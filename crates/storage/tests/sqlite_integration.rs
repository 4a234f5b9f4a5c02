use storage::repository::{KeyValueStore, Storage};
use storage::sqlite::SqliteRepository;

#[tokio::test]
async fn sqlite_roundtrip_reads_back_written_value() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert_eq!(repo.read("progress:jp").await.unwrap(), None);

    repo.write("progress:jp", r#"{"lastLessonCompleted":1}"#)
        .await
        .unwrap();
    let fetched = repo.read("progress:jp").await.expect("read");
    assert_eq!(fetched.as_deref(), Some(r#"{"lastLessonCompleted":1}"#));
}

#[tokio::test]
async fn sqlite_write_overwrites_existing_key() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_overwrite?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.write("funnel-completed:jp", "false").await.unwrap();
    repo.write("funnel-completed:jp", "true").await.unwrap();
    assert_eq!(
        repo.read("funnel-completed:jp").await.unwrap().as_deref(),
        Some("true")
    );

    assert_eq!(repo.entry_count().await.unwrap(), 1);
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.write("k", "v").await.unwrap();
    repo.migrate().await.expect("second migrate");
    assert_eq!(repo.schema_version().await.unwrap(), 1);
    assert_eq!(repo.read("k").await.unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn sqlite_rejects_empty_key() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_empty?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    assert!(repo.write("", "v").await.is_err());
}

#[tokio::test]
async fn storage_sqlite_uses_kv_table() {
    let storage = Storage::sqlite("sqlite:file:memdb_kv_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage.kv.write("flag:sound-warning-seen", "true").await.unwrap();
    assert_eq!(
        storage.kv.read("flag:sound-warning-seen").await.unwrap().as_deref(),
        Some("true")
    );
}
