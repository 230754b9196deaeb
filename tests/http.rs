use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct Created {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PointAverage {
    point: Created,
    average: f64,
    count: usize,
}

#[derive(Debug, Deserialize)]
struct Stats {
    points: Vec<PointAverage>,
    deleted: Vec<PointAverage>,
}

#[derive(Debug, Deserialize)]
struct TrashEntry {
    point: Created,
}

#[derive(Debug, Deserialize)]
struct Removed {
    removed: usize,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_dir() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("life_journal_http_{}_{}", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/categories")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_life_journal"))
        .env("PORT", port.to_string())
        .env("APP_DATA_DIR", unique_data_dir())
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn post_created(client: &Client, url: String, body: Value) -> Created {
    let response = client.post(url).json(&body).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn category_with_point(client: &Client, base: &str, name: &str) -> (Created, Created) {
    let category = post_created(
        client,
        format!("{base}/api/categories"),
        json!({ "name": format!("{name} area"), "color": "#4CAF50" }),
    )
    .await;
    let point = post_created(
        client,
        format!("{base}/api/points"),
        json!({ "name": name, "categoryId": category.id }),
    )
    .await;
    (category, point)
}

async fn stats(client: &Client, base: &str, start: &str, end: &str) -> Stats {
    client
        .get(format!("{base}/api/stats?period=custom&start={start}&end={end}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_ratings_drive_point_averages() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let base = &server.base_url;
    let client = Client::new();

    let (_, sleep_point) = category_with_point(&client, base, "Sleep").await;
    for (date, value) in [("2024-01-01", 7), ("2024-01-03", 9)] {
        post_created(
            &client,
            format!("{base}/api/ratings"),
            json!({ "date": date, "scores": [{ "pointId": sleep_point.id, "value": value }] }),
        )
        .await;
    }

    let before = stats(&client, base, "2024-01-01", "2024-01-03").await;
    let entry = before
        .points
        .iter()
        .find(|p| p.point.id == sleep_point.id)
        .expect("missing point");
    assert_eq!(entry.average, 8.0);
    assert_eq!(entry.count, 2);

    let removed: Removed = client
        .delete(format!("{base}/api/ratings/day/2024-01-01"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(removed.removed, 1);

    let after = stats(&client, base, "2024-01-01", "2024-01-03").await;
    let entry = after
        .points
        .iter()
        .find(|p| p.point.id == sleep_point.id)
        .expect("missing point");
    assert_eq!(entry.average, 9.0);
    assert_eq!(entry.count, 1);
}

#[tokio::test]
async fn http_out_of_range_rating_is_rejected() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let base = &server.base_url;
    let client = Client::new();

    let (_, point) = category_with_point(&client, base, "Mood").await;
    let response = client
        .post(format!("{base}/api/ratings"))
        .json(&json!({ "date": "2023-06-01", "scores": [{ "pointId": point.id, "value": 11 }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let ratings: Vec<Value> = client
        .get(format!("{base}/api/ratings?start=2023-06-01&end=2023-06-01"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(ratings.is_empty());
}

#[tokio::test]
async fn http_soft_delete_keeps_history_until_purged() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let base = &server.base_url;
    let client = Client::new();

    let (_, point) = category_with_point(&client, base, "Stretching").await;
    post_created(
        &client,
        format!("{base}/api/ratings"),
        json!({ "date": "2023-03-01", "scores": [{ "pointId": point.id, "value": 4 }] }),
    )
    .await;

    let response = client
        .delete(format!("{base}/api/points/{}", point.id))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let trash: Vec<TrashEntry> = client
        .get(format!("{base}/api/trash"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(trash.iter().any(|entry| entry.point.id == point.id));

    let history = stats(&client, base, "2030-01-01", "2030-01-02").await;
    let entry = history
        .deleted
        .iter()
        .find(|p| p.point.id == point.id)
        .expect("missing deleted point");
    assert_eq!(entry.average, 4.0);

    let response = client
        .post(format!("{base}/api/points/{}/restore", point.id))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    client
        .delete(format!("{base}/api/points/{}", point.id))
        .send()
        .await
        .unwrap();

    let purged: Removed = client
        .delete(format!("{base}/api/trash/{}", point.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(purged.removed, 1);

    let again: Removed = client
        .delete(format!("{base}/api/trash/{}", point.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(again.removed, 0);
}

#[tokio::test]
async fn http_unknown_ids_are_not_found() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let base = &server.base_url;
    let client = Client::new();

    let response = client
        .delete(format!("{base}/api/categories/does-not-exist"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .post(format!("{base}/api/points/does-not-exist/restore"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_export_import_is_idempotent() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let base = &server.base_url;
    let client = Client::new();

    category_with_point(&client, base, "Reading").await;

    let first: Value = client
        .get(format!("{base}/api/export"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let response = client
        .post(format!("{base}/api/import"))
        .json(&first)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let second: Value = client
        .get(format!("{base}/api/export"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    for key in ["categories", "points", "ratings", "deletedPoints"] {
        assert_eq!(first[key], second[key], "{key} changed");
    }
}
