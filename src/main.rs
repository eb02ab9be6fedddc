#[tokio::main]
async fn main() {
    if let Err(e) = harms_lib::run().await {
        eprintln!("harms: {e}");
        std::process::exit(1);
    }
}
