use mock_server::{init_tracing, Config};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let config = Config::from_env();
    init_tracing(&config.log_level);

    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    mock_server::run(listener).await
}
