#[tokio::main]
async fn main() {
    if let Err(err) = nm_api::run().await {
        eprintln!("nm-api failed to start: {err}");
        std::process::exit(1);
    }
}
