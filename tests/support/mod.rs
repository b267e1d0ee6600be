// Boots one review server per test binary and hands out its base URL.
use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

use review_server::Settings;

static SERVER_URL: OnceLock<String> = OnceLock::new();
static SERVER_READY: OnceLock<()> = OnceLock::new();

pub const PASSWORD: &str = "integration-password";

// Seed data shared by every integration test in the binary.
const TEST_CONFIG: &str = r#"
[site]
url = "http://reviews.test/"

[[users]]
username = "alice"
password = "integration-password"

[[users]]
username = "bob"
password = "integration-password"

[[groups]]
name = "core"
display_name = "Core Team"
users = ["bob"]

[[repositories]]
id = 1
name = "trunk"
path = "/srv/trunk"

[[repositories.changesets]]
number = 500
summary = "Imported from changeset"
files = ["/trunk/lib.rs"]

[[review_requests]]
id = 1
submitter = "alice"
repository = 1
summary = "Seeded request"
public = false

[[review_requests.screenshots]]
id = 3
caption = "Before"
"#;

// Ensure the test server is running and return the shared base URL.
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let published_url = Arc::new(OnceLock::<String>::new());
        let published_url_thread = Arc::clone(&published_url);

        // The server runs on its own OS thread and runtime so it outlives each
        // `#[tokio::test]` runtime.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let settings = Settings::from_toml_str(TEST_CONFIG).expect("test config");
                // Ephemeral port avoids collisions with local services.
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_url_thread.set(format!("http://{addr}"));
                review_server::run(listener, settings)
                    .await
                    .expect("server failed");
            });
        });

        wait_for_server_url_and_readiness(published_url);
    });

    SERVER_URL
        .get()
        .expect("server url should be initialized")
        .as_str()
}

fn wait_for_server_url_and_readiness(published_url: Arc<OnceLock<String>>) {
    let base_url = loop {
        if let Some(url) = published_url.get() {
            break url.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let _ = SERVER_URL.set(base_url.clone());

    let addr = base_url
        .strip_prefix("http://")
        .expect("base url should use http://");

    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}
