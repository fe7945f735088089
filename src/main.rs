#[tokio::main]
async fn main() {
    studio_scheduler::run().await;
}
