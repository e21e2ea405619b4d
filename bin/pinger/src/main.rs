//! pinger binary.

#[tokio::main]
async fn main() -> eyre::Result<()> {
    pinger_node_commands::run().await
}
