use std::sync::Arc;

use anyhow::Result;
use blob_resource::mock::MemoryStorageService;
use blob_resource::{BlobResource, ResourceError};
use futures::StreamExt;
use time::macros::datetime;

fn resource(service: &MemoryStorageService, location: &str) -> BlobResource {
    BlobResource::new(Arc::new(service.clone()), location).expect("well-formed location")
}

fn writable(
    service: &MemoryStorageService,
    location: &str,
    content_type: Option<&str>,
) -> BlobResource {
    BlobResource::with_options(
        Arc::new(service.clone()),
        location,
        true,
        content_type.map(str::to_string),
    )
    .expect("well-formed location")
}

#[tokio::test]
async fn reads_existing_blob_content() -> Result<()> {
    let service = MemoryStorageService::new();
    service.put_blob(
        "data",
        "reports/2024.csv",
        b"a,b\n1,2\n",
        datetime!(2024-03-01 12:00:00 UTC),
    );

    let resource = resource(&service, "blob://data/reports/2024.csv");
    assert!(resource.exists().await);

    let content = resource.open_read().await?.bytes().await?;
    assert_eq!(&content[..], b"a,b\n1,2\n");
    assert_eq!(resource.content_length().await?, 8);
    assert_eq!(resource.filename(), "2024.csv");
    Ok(())
}

#[tokio::test]
async fn reader_streams_chunks_in_order() -> Result<()> {
    let service = MemoryStorageService::new();
    let payload = vec![7u8; 10_000];
    service.put_blob("data", "big.bin", &payload, datetime!(2024-03-01 12:00:00 UTC));

    let mut reader = resource(&service, "blob://data/big.bin").open_read().await?;
    let mut drained = Vec::new();
    while let Some(chunk) = reader.next().await {
        drained.extend_from_slice(&chunk?);
    }
    assert_eq!(drained, payload);
    Ok(())
}

#[tokio::test]
async fn strict_write_on_missing_blob_fails_without_side_effects() -> Result<()> {
    let service = MemoryStorageService::new();
    service.put_container("data");

    let resource = resource(&service, "blob://data/new.txt");
    let err = resource.open_write().await.unwrap_err();
    assert!(matches!(err, ResourceError::NotFound { .. }));
    assert_eq!(service.create_count(), 0);
    assert!(service.blob_content("data", "new.txt").is_none());
    Ok(())
}

#[tokio::test]
async fn auto_create_write_provisions_the_container_once() -> Result<()> {
    let service = MemoryStorageService::new();
    assert!(!service.container_exists("staging"));

    let resource = writable(&service, "blob://staging/x/y.json", Some("application/json"));
    let mut writer = resource.open_write().await?;
    assert!(service.container_exists("staging"));
    assert!(service.blob_content("staging", "x/y.json").is_none());

    writer.write(b"{\"k\":1}")?;
    assert!(service.blob_content("staging", "x/y.json").is_none());
    writer.close().await?;

    assert_eq!(service.create_count(), 1);
    assert_eq!(
        service.blob_content_type("staging", "x/y.json").as_deref(),
        Some("application/json")
    );

    let content = resource.open_read().await?.bytes().await?;
    assert_eq!(&content[..], b"{\"k\":1}");
    assert_eq!(resource.content_length().await?, 7);
    Ok(())
}

#[tokio::test]
async fn overwriting_an_existing_blob_needs_no_auto_create() -> Result<()> {
    let service = MemoryStorageService::new();
    service.put_blob("data", "notes.txt", b"old", datetime!(2024-03-01 12:00:00 UTC));

    let resource = resource(&service, "blob://data/notes.txt");
    let mut writer = resource.open_write().await?;
    writer.write(b"new content")?;
    writer.close().await?;

    assert_eq!(
        service.blob_content("data", "notes.txt").as_deref(),
        Some(b"new content".as_slice())
    );
    assert_eq!(
        service.blob_content_type("data", "notes.txt").as_deref(),
        Some("text/plain")
    );
    Ok(())
}

#[tokio::test]
async fn losing_the_container_creation_race_is_success() -> Result<()> {
    let service = MemoryStorageService::new();
    service.fail_next_create_with_already_exists();

    let resource = writable(&service, "blob://racy/data.bin", None);
    let mut writer = resource.open_write().await?;
    writer.write(b"payload")?;
    writer.close().await?;

    assert_eq!(service.create_count(), 0);
    assert_eq!(
        service.blob_content("racy", "data.bin").as_deref(),
        Some(b"payload".as_slice())
    );
    Ok(())
}

#[tokio::test]
async fn malformed_locations_are_rejected_at_construction() {
    let service: Arc<MemoryStorageService> = Arc::new(MemoryStorageService::new());
    for location in ["blob://only-container", "blob://c/", "http://c/n"] {
        let err = BlobResource::new(service.clone(), location).unwrap_err();
        assert!(
            matches!(err, ResourceError::MalformedLocation { .. }),
            "expected malformed location for {location}"
        );
    }
}

#[tokio::test]
async fn content_type_precedence() -> Result<()> {
    let service = MemoryStorageService::new();

    let explicit = writable(&service, "blob://c/notes.txt", Some("application/json"));
    assert_eq!(explicit.content_type(), "application/json");

    let empty_explicit = writable(&service, "blob://c/notes.txt", Some(""));
    assert_eq!(empty_explicit.content_type(), "text/plain");

    let derived = resource(&service, "blob://c/file.unknownext");
    assert_eq!(derived.content_type(), "application/octet-stream");
    Ok(())
}

#[tokio::test]
async fn existence_is_total() -> Result<()> {
    let service = MemoryStorageService::new();

    let no_container = resource(&service, "blob://missing/thing.txt");
    assert!(!no_container.exists().await);

    service.put_container("data");
    let no_blob = resource(&service, "blob://data/thing.txt");
    assert!(!no_blob.exists().await);

    service.put_blob("data", "thing.txt", b"x", datetime!(2024-03-01 12:00:00 UTC));
    let present = resource(&service, "blob://data/thing.txt");
    assert!(present.exists().await);

    service.set_outage(true);
    assert!(!present.exists().await);
    service.set_outage(false);
    assert!(present.exists().await);
    Ok(())
}

#[tokio::test]
async fn read_distinguishes_absence_from_transport_failure() -> Result<()> {
    let service = MemoryStorageService::new();
    service.put_container("data");

    let resource = resource(&service, "blob://data/missing.csv");
    let err = resource.open_read().await.unwrap_err();
    assert!(matches!(err, ResourceError::NotFound { .. }));

    service.set_outage(true);
    let err = resource.open_read().await.unwrap_err();
    assert!(matches!(err, ResourceError::Storage { .. }));
    Ok(())
}

#[tokio::test]
async fn properties_report_size_and_epoch_seconds() -> Result<()> {
    let service = MemoryStorageService::new();
    let stamp = datetime!(2024-05-20 10:00:00 UTC);
    service.put_blob("data", "reports/2024.csv", b"a,b\n1,2\n", stamp);

    let resource = resource(&service, "blob://data/reports/2024.csv");
    assert_eq!(resource.content_length().await?, 8);
    assert_eq!(resource.last_modified().await?, stamp.unix_timestamp());
    Ok(())
}

#[tokio::test]
async fn properties_on_missing_blob_are_a_storage_error() -> Result<()> {
    let service = MemoryStorageService::new();
    let resource = resource(&service, "blob://data/missing.bin");
    let err = resource.content_length().await.unwrap_err();
    assert!(matches!(err, ResourceError::Storage { .. }));
    Ok(())
}

#[tokio::test]
async fn url_names_the_blob_at_the_endpoint() -> Result<()> {
    let service = MemoryStorageService::new();
    let resource = resource(&service, "blob://data/reports/2024.csv");
    assert_eq!(
        resource.url()?.as_str(),
        "https://testaccount.blob.core.windows.net/data/reports/2024.csv"
    );
    Ok(())
}

#[tokio::test]
async fn description_embeds_container_and_blob() {
    let service = MemoryStorageService::new();
    let resource = resource(&service, "blob://data/reports/2024.csv");
    assert_eq!(
        resource.description(),
        "Azure storage account blob resource [container='data', blob='reports/2024.csv']"
    );
}

#[tokio::test]
async fn relative_appends_verbatim_and_inherits_auto_create() -> Result<()> {
    let service = MemoryStorageService::new();
    let parent = writable(&service, "blob://c/a/b", None);

    let child = parent.relative("c.txt")?;
    assert_eq!(child.location(), "blob://c/a/b/c.txt");
    assert!(child.auto_create());
    assert_eq!(child.content_type(), "text/plain");
    assert_eq!(child.filename(), "c.txt");

    // No normalization: `..` stays a literal segment.
    let dotdot = parent.relative("..")?;
    assert_eq!(dotdot.location(), "blob://c/a/b/..");
    Ok(())
}

#[tokio::test]
async fn local_path_resolution_is_unsupported() {
    let service = MemoryStorageService::new();
    let resource = resource(&service, "blob://data/reports/2024.csv");
    let err = resource.as_file().unwrap_err();
    assert!(matches!(err, ResourceError::Unsupported { .. }));
}

#[tokio::test]
async fn writer_is_terminal_after_close() -> Result<()> {
    let service = MemoryStorageService::new();
    service.put_blob("data", "notes.txt", b"old", datetime!(2024-03-01 12:00:00 UTC));

    let resource = resource(&service, "blob://data/notes.txt");
    let mut writer = resource.open_write().await?;
    writer.write(b"fresh")?;
    writer.close().await?;

    assert!(writer.write(b"more").is_err());
    // A second close is a no-op and must not recommit.
    writer.close().await?;
    assert_eq!(
        service.blob_content("data", "notes.txt").as_deref(),
        Some(b"fresh".as_slice())
    );
    Ok(())
}

#[tokio::test]
async fn async_read_adapter_matches_blob_content() -> Result<()> {
    use tokio::io::AsyncReadExt;

    let service = MemoryStorageService::new();
    service.put_blob("data", "reports/2024.csv", b"a,b\n1,2\n", datetime!(2024-03-01 12:00:00 UTC));

    let reader = resource(&service, "blob://data/reports/2024.csv")
        .open_read()
        .await?;
    let mut buf = Vec::new();
    reader.into_async_read().read_to_end(&mut buf).await?;
    assert_eq!(&buf[..], b"a,b\n1,2\n");
    Ok(())
}
