//! Discovery, upload and locate behavior against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use resilink_common::{ContainerName, Error};
use resilink_storage::{parse_storage_key, MemoryObjectStore, ObjectStore, ResourceLocator};

fn candidates(names: &[&str]) -> Vec<ContainerName> {
    names
        .iter()
        .map(|name| ContainerName::new(*name).unwrap())
        .collect()
}

#[tokio::test]
async fn test_empty_listing_stops_search() {
    let store = Arc::new(MemoryObjectStore::new());
    // "A" does not exist, so every path errors; "B" exists and is empty.
    store.create_container("B").await;
    let locator = ResourceLocator::new(store.clone(), Vec::new(), Vec::new());

    let location = locator
        .discover(&candidates(&["A", "B"]), &ResourceLocator::default_paths())
        .await
        .unwrap();

    assert_eq!(location.container, "B");
    assert_eq!(location.sub_path, "");
    assert!(location.entries.is_empty());

    let probes = store.probes().await;
    assert_eq!(
        probes,
        vec![
            ("A".to_string(), String::new()),
            ("A".to_string(), String::new()),
            ("A".to_string(), "/".to_string()),
            ("B".to_string(), String::new()),
        ]
    );
    assert!(!probes.contains(&("B".to_string(), "/".to_string())));
}

#[tokio::test]
async fn test_explicit_empty_path_adopted_before_slash() {
    let store = Arc::new(MemoryObjectStore::new());
    store.create_container("B").await;
    store.fail_listing("B", "", "unreachable").await;
    let locator = ResourceLocator::new(store.clone(), Vec::new(), Vec::new());

    let location = locator
        .discover(
            &candidates(&["B"]),
            &[Some(String::new()), Some("/".to_string()), Some("other".to_string())],
        )
        .await
        .unwrap();

    assert_eq!(location.sub_path, "/");
    assert_eq!(store.probes().await.len(), 2);
}

#[tokio::test]
async fn test_populated_container_yields_entries() {
    let store = Arc::new(MemoryObjectStore::new());
    store.create_container("A").await;
    for name in ["one.txt", "two.txt", "three.txt"] {
        store
            .put_object("A", name, name.as_bytes().to_vec())
            .await
            .unwrap();
    }
    let locator = ResourceLocator::new(store.clone(), Vec::new(), Vec::new());

    let location = locator.discover(&candidates(&["A"]), &[None]).await.unwrap();

    assert_eq!(location.entries.len(), 3);
    for entry in &location.entries {
        assert!(!entry.public_locator.is_empty());
        assert!(entry.public_locator.ends_with(&entry.name));
    }
    assert!(location.entry("two.txt").is_some());
}

#[tokio::test]
async fn test_all_candidates_fail_carries_last_error() {
    let store = Arc::new(MemoryObjectStore::new());
    store.create_container("B").await;
    store.fail_listing("B", "", "permission denied").await;
    let locator = ResourceLocator::new(store, Vec::new(), Vec::new());

    let err = locator
        .discover(&candidates(&["A", "B"]), &[Some(String::new())])
        .await
        .unwrap_err();

    match err {
        Error::NoLocationFound { last_error } => {
            assert_eq!(last_error.as_deref(), Some("permission denied"))
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_refresh_follows_environment_changes() {
    let store = Arc::new(MemoryObjectStore::new());
    store.create_container("learm").await;
    let locator = ResourceLocator::new(
        store.clone(),
        candidates(&["learn", "learm"]),
        ResourceLocator::default_paths(),
    );

    assert_eq!(locator.refresh().await.unwrap().container, "learm");
    assert_eq!(locator.selected().await.unwrap().container, "learm");

    store.create_container("learn").await;
    assert_eq!(locator.refresh().await.unwrap().container, "learn");
    assert_eq!(locator.selected().await.unwrap().container, "learn");
}

#[tokio::test]
async fn test_upload_lists_generated_key() {
    let store = Arc::new(MemoryObjectStore::new());
    store.create_container("learn").await;
    let locator = ResourceLocator::new(
        store.clone(),
        candidates(&["learn"]),
        ResourceLocator::default_paths(),
    );
    locator.refresh().await.unwrap();

    let first = locator.upload("notes.txt", b"one".to_vec()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2)).await;
    let second = locator.upload("notes.txt", b"two".to_vec()).await.unwrap();

    let location = locator.refresh().await.unwrap();
    assert!(location.entry(&first.name).is_some());
    assert!(location.entry(&second.name).is_some());
    assert_eq!(location.entry(&second.name).unwrap(), &second);

    let (first_ts, first_name) = parse_storage_key(&first.name).unwrap();
    let (second_ts, second_name) = parse_storage_key(&second.name).unwrap();
    assert_eq!(first_name, "notes.txt");
    assert_eq!(second_name, "notes.txt");
    assert!(first_ts <= second_ts);

    assert_eq!(store.object("learn", &first.name).await, Some(b"one".to_vec()));
}

#[tokio::test]
async fn test_upload_failure_is_verbatim() {
    let store = Arc::new(MemoryObjectStore::new());
    // Selection defaults to "missing", which was never created.
    let locator = ResourceLocator::new(store, candidates(&["missing"]), ResourceLocator::default_paths());

    let err = locator.upload("a.txt", vec![1]).await.unwrap_err();
    match err {
        Error::UploadFailed(message) => assert_eq!(message, "Bucket not found"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_locate_uses_selected_container() {
    let store = Arc::new(MemoryObjectStore::new());
    store.create_container("learm").await;
    let locator = ResourceLocator::new(
        store,
        candidates(&["learn", "learm"]),
        ResourceLocator::default_paths(),
    );

    assert_eq!(
        locator.locate("x.txt").await.unwrap().public_locator,
        "memory://learn/x.txt"
    );
    locator.refresh().await.unwrap();
    assert_eq!(
        locator.locate("x.txt").await.unwrap().public_locator,
        "memory://learm/x.txt"
    );
}
