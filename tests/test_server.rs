// Shared bootstrap for the card-table server used by integration tests

use std::net::SocketAddr;
use tokio::sync::OnceCell;

// Include the server app inline so tests and the standalone binary share it
include!("test_server_app.rs");

static TEST_SERVER: OnceCell<TestServerHandle> = OnceCell::const_new();

pub struct TestServerHandle {
    pub addr: SocketAddr,
    pub base_url: String,
}

/// Start the card-table server once for the whole test binary
pub async fn ensure_test_server() -> &'static TestServerHandle {
    TEST_SERVER
        .get_or_init(|| async {
            // Grab a free port, then release it for the server thread
            let std_listener = std::net::TcpListener::bind("127.0.0.1:0")
                .expect("Failed to bind card-table server");
            let addr = std_listener.local_addr().unwrap();
            let base_url = format!("http://{}", addr);
            drop(std_listener);

            // The server gets a dedicated thread with its own runtime so it
            // keeps serving across every test in the binary
            let server_thread = std::thread::spawn(move || {
                let runtime = tokio::runtime::Runtime::new()
                    .expect("Failed to create card-table runtime");

                runtime.block_on(async {
                    let listener = tokio::net::TcpListener::bind(addr)
                        .await
                        .expect("Failed to bind in server thread");
                    let app = create_app().await;
                    axum::serve(listener, app)
                        .await
                        .expect("Card-table server failed");
                });
            });

            // Poll with curl until the board actually answers over HTTP
            for attempt in 0..30 {
                tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

                let curl_check = std::process::Command::new("curl")
                    .args(["-s", "-I", "--max-time", "1", &base_url])
                    .output();

                if let Ok(output) = curl_check
                    && output.status.success()
                    && String::from_utf8_lossy(&output.stdout).contains("HTTP/1.1")
                {
                    eprintln!(
                        "Card-table server ready at {} after {} attempt(s)",
                        base_url,
                        attempt + 1
                    );
                    break;
                }

                if attempt == 29 {
                    panic!("Card-table server did not answer HTTP within 30 attempts");
                }
            }

            // Never joined: the thread serves until the test process exits
            drop(server_thread);

            TestServerHandle { addr, base_url }
        })
        .await
}
