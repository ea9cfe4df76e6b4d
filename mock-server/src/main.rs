use mock_server::{MockResponse, Recorder};
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let recorder = Recorder::default();
    // Optional JSON array of canned responses, served in order.
    if let Ok(path) = std::env::var("MOCK_RESPONSES") {
        let raw = std::fs::read_to_string(&path)?;
        let responses: Vec<MockResponse> = serde_json::from_str(&raw)?;
        info!(count = responses.len(), %path, "loaded canned responses");
        for response in responses {
            recorder.enqueue(response);
        }
    }

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "listening");
    mock_server::run(listener, recorder).await?;
    Ok(())
}
