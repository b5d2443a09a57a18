//! End-to-end tests over an in-process object store.

use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tilebundle::bundle::{
    bundle_id, decode_binary, encode_binary, Bundle, BundleError, EncodedPayload, TileEncoding,
    TileRecord,
};
use tilebundle::cache::MemoryCache;
use tilebundle::grid::{grid_size, to_coordinate, to_index, GridError};
use tilebundle::manifest::{ManifestConfig, ManifestError, DEFAULT_MANIFEST_PATH};
use tilebundle::preload::{plan_chunks, PreloadConfig};
use tilebundle::service::{ServiceConfig, ServiceError, TileAssetService};
use tilebundle::store::{
    CanonicalRequest, Credentials, HmacSha1Signer, ObjectStore, ReqwestObjectStore, StoreConfig,
    StoreError, StoreResponse,
};
use tilebundle::tile::TileError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const MANIFEST: &str = r#"# published map versions
latest: "v2"
mapversions:
  v1:
    name: 'Launch'
    path: ./tiles/v1/
    tilecount: 120
  v2:
    name: Current
    path: ./tiles/v2/
    tilecount: 64
"#;

/// Object store backed by a map, with call counting and failure injection.
#[derive(Default)]
struct FakeStore {
    objects: Mutex<HashMap<String, Bytes>>,
    failing: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl FakeStore {
    fn with_versions() -> Self {
        let store = Self::default();
        store.put(DEFAULT_MANIFEST_PATH, MANIFEST);
        for i in 0..120u32 {
            store.put(&format!("/tiles/v1/{}.png", i), format!("v1-{}", i));
        }
        for i in 0..64u32 {
            store.put(&format!("/tiles/v2/{}.png", i), format!("v2-{}", i));
        }
        store
    }

    fn put(&self, path: &str, body: impl Into<Bytes>) {
        self.objects.lock().insert(path.to_string(), body.into());
    }

    fn fail(&self, path: &str) {
        self.failing.lock().insert(path.to_string());
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ObjectStore for FakeStore {
    async fn signed_get(
        &self,
        path: &str,
        _query: &[(&str, &str)],
    ) -> Result<StoreResponse, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let path = path.to_string();
        if self.failing.lock().contains(&path) {
            return Err(StoreError::Remote { status: 503, path });
        }
        let body = self.objects.lock().get(&path).cloned();
        match body {
            Some(body) => Ok(StoreResponse::ok(body)),
            None => Err(StoreError::Remote { status: 404, path }),
        }
    }
}

fn service_config() -> ServiceConfig {
    ServiceConfig {
        store: StoreConfig::new("https://objects.example.com", "maps"),
        manifest: ManifestConfig::default(),
        bundle: Default::default(),
        preload: PreloadConfig {
            chunk_size: 25,
            concurrency: 3,
        },
        tile_extension: "png".to_string(),
        memory_cache_size: 16 * 1024 * 1024,
    }
}

fn service(store: Arc<FakeStore>) -> TileAssetService<FakeStore, MemoryCache> {
    let cache = Arc::new(MemoryCache::new(16 * 1024 * 1024));
    TileAssetService::new(store, cache, &service_config()).unwrap()
}

#[test]
fn grid_round_trip_for_every_index() {
    let size = grid_size(64).unwrap();
    for index in 0..64 {
        let (x, y) = to_coordinate(index, 64).unwrap();
        assert_eq!(to_index(x, y, size).unwrap(), index);
    }
}

#[test]
fn non_square_tile_count_is_invalid_grid() {
    assert_eq!(
        to_coordinate(0, 120),
        Err(GridError::InvalidGrid { tile_count: 120 })
    );
}

#[tokio::test]
async fn same_index_set_in_any_order_is_one_bundle() {
    let store = Arc::new(FakeStore::with_versions());
    let service = service(Arc::clone(&store));

    let first = service
        .build_bundle("v2", &[3, 1, 2], TileEncoding::Raw)
        .await
        .unwrap();
    let calls = store.calls();
    let second = service
        .build_bundle("v2", &[1, 2, 3], TileEncoding::Raw)
        .await
        .unwrap();

    assert_eq!(first.bundle_id, second.bundle_id);
    assert_eq!(first.bundle_id, bundle_id("v2", &[1, 2, 3]));
    assert_eq!(first.payload, second.payload);
    assert_eq!(store.calls(), calls, "second build must come from cache");
}

#[tokio::test]
async fn one_failing_tile_of_ten_is_dropped() {
    let store = Arc::new(FakeStore::with_versions());
    store.fail("/tiles/v2/6.png");
    let service = service(Arc::clone(&store));

    let indices: Vec<u32> = (0..10).collect();
    let encoded = service
        .build_bundle("v2", &indices, TileEncoding::Base64)
        .await
        .unwrap();

    assert_eq!(encoded.tile_count, 9);
    match encoded.payload {
        EncodedPayload::Text(tiles) => assert!(tiles.iter().all(|t| t.index != 6)),
        EncodedPayload::Binary(_) => panic!("expected text payload"),
    }
}

#[tokio::test]
async fn all_failing_tiles_is_empty() {
    let store = Arc::new(FakeStore::with_versions());
    for i in 0..10 {
        store.fail(&format!("/tiles/v2/{}.png", i));
    }
    let service = service(Arc::clone(&store));

    let indices: Vec<u32> = (0..10).collect();
    let err = service
        .build_bundle("v2", &indices, TileEncoding::Base64)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Bundle(BundleError::Empty { .. })
    ));

    // Nothing was cached, so a retry goes back to the store
    let calls = store.calls();
    let _ = service
        .build_bundle("v2", &indices, TileEncoding::Base64)
        .await;
    assert_eq!(store.calls(), calls + 10);
}

#[test]
fn frame_round_trip_with_empty_and_large_tiles() {
    let large: Vec<u8> = (0..4096u32).map(|i| (i * 7 % 256) as u8).collect();
    let bundle = Bundle::new(
        "v2",
        "ignored",
        vec![
            TileRecord::new(9, Bytes::from(large)),
            TileRecord::new(2, Bytes::new()),
        ],
        chrono::Utc::now(),
    );

    let frame = encode_binary(&bundle).unwrap();
    let decoded = decode_binary(&frame).unwrap();
    let rebuilt = Bundle::new(
        decoded.version,
        "ignored",
        decoded.tiles,
        bundle.created_at(),
    );

    assert_eq!(encode_binary(&rebuilt).unwrap(), frame);
    assert_eq!(rebuilt.indices(), vec![2, 9]);
}

#[tokio::test]
async fn chunk_plan_for_120_by_25() {
    let plans = plan_chunks("v1", 120, 25).unwrap();
    let sizes: Vec<usize> = plans.iter().map(|p| p.tile_indices.len()).collect();
    assert_eq!(sizes, vec![25, 25, 25, 25, 20]);

    let mut seen: Vec<u32> = plans.iter().flat_map(|p| p.tile_indices.clone()).collect();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), 120);

    let service = service(Arc::new(FakeStore::with_versions()));
    let report = service.preload_version("v1").await.unwrap();
    assert_eq!(report.total_chunks, 5);
    assert_eq!(report.completed, 5);
    assert_eq!(report.tiles_loaded, 120);
}

#[tokio::test]
async fn index_equal_to_tile_count_makes_no_network_call() {
    let store = Arc::new(FakeStore::with_versions());
    let service = service(Arc::clone(&store));
    service.get_manifest().await.unwrap();
    let calls = store.calls();

    let err = service.get_tile_bytes("v2", 64).await.unwrap_err();
    match err {
        ServiceError::Tile(TileError::OutOfRange {
            index, valid_range, ..
        }) => {
            assert_eq!(index, 64);
            assert_eq!(valid_range, 0..64);
        }
        other => panic!("expected OutOfRange, got {:?}", other),
    }

    let err = service
        .build_bundle("v2", &[1, 64], TileEncoding::Raw)
        .await
        .unwrap_err();
    assert!(err.is_client_error());
    assert_eq!(store.calls(), calls);
}

#[tokio::test]
async fn empty_versions_block_is_parse_error() {
    let store = Arc::new(FakeStore::default());
    store.put(DEFAULT_MANIFEST_PATH, "latest: v1\nmapversions:\n");
    let service = service(store);

    let err = service.get_manifest().await.unwrap_err();
    assert!(matches!(err, ServiceError::Manifest(ManifestError::Parse(_))));
}

#[tokio::test]
async fn manifest_refresh_picks_up_new_latest() {
    let store = Arc::new(FakeStore::with_versions());
    let service = service(Arc::clone(&store));
    assert_eq!(service.get_latest_version().await.unwrap(), "v2");

    store.put(
        DEFAULT_MANIFEST_PATH,
        MANIFEST.replace("latest: \"v2\"", "latest: v1"),
    );
    assert_eq!(service.get_latest_version().await.unwrap(), "v2");
    service.refresh_manifest().await.unwrap();
    assert_eq!(service.get_latest_version().await.unwrap(), "v1");
}

#[tokio::test]
async fn missing_credentials_fail_before_any_request() {
    let store = ReqwestObjectStore::new(StoreConfig::new("http://127.0.0.1:9", "maps")).unwrap();
    let err = store.signed_get("/mapversions.yml", &[]).await.unwrap_err();
    assert!(matches!(err, StoreError::Configuration(_)));
}

/// Accepts one connection, captures the request head and answers with `body`.
async fn serve_once(listener: TcpListener, status: &'static str, body: &'static str) -> String {
    let (mut socket, _) = listener.accept().await.unwrap();
    let mut buf = vec![0u8; 8192];
    let mut read = 0;
    loop {
        let n = socket.read(&mut buf[read..]).await.unwrap();
        read += n;
        if n == 0 || buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    socket.write_all(response.as_bytes()).await.unwrap();
    socket.shutdown().await.unwrap();
    String::from_utf8_lossy(&buf[..read]).to_string()
}

fn header<'a>(request: &'a str, name: &str) -> Option<&'a str> {
    request.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim())
    })
}

#[tokio::test]
async fn signed_get_sends_verifiable_authorization() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve_once(listener, "200 OK", "hello"));

    let credentials = Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI").unwrap();
    let store = ReqwestObjectStore::new(
        StoreConfig::new(format!("http://{}", addr), "maps")
            .with_credentials(credentials.clone())
            .with_timeout(Duration::from_secs(5)),
    )
    .unwrap();

    let response = store
        .signed_get("/tiles/v2/3.png", &[("prefix", "tiles/v2/")])
        .await
        .unwrap();
    assert_eq!(&response.body[..], b"hello");

    let request = server.await.unwrap();
    let request_line = request.lines().next().unwrap();
    assert!(request_line.starts_with("GET /maps/tiles/v2/3.png?prefix="));

    let date = header(&request, "date").unwrap();
    let query = request_line
        .split_whitespace()
        .nth(1)
        .and_then(|target| target.split_once('?'))
        .map(|(_, q)| q);
    let expected = HmacSha1Signer::new(credentials)
        .signature(&CanonicalRequest::get(date, "maps", "/tiles/v2/3.png", query))
        .unwrap();
    assert_eq!(
        header(&request, "authorization"),
        Some(format!("AWS AKIDEXAMPLE:{}", expected).as_str())
    );
}

#[tokio::test]
async fn non_success_status_is_remote_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve_once(listener, "403 Forbidden", ""));

    let store = ReqwestObjectStore::new(
        StoreConfig::new(format!("http://{}", addr), "maps")
            .with_credentials(Credentials::new("AKID", "secret").unwrap()),
    )
    .unwrap();

    let err = store.signed_get("/mapversions.yml", &[]).await.unwrap_err();
    assert_eq!(err.status(), Some(403));
    server.await.unwrap();
}
