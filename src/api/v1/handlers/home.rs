pub async fn home() -> &'static str {
    tracing::info!("endpoint hit: home");
    "Welcome to our Twitter page!"
}
