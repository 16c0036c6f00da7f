#[tokio::main]
async fn main() {
    if let Err(e) = counter_board::run().await {
        eprintln!("counter-board: {}", e);
        std::process::exit(1);
    }
}
