//! Wire probe: asks a broker for cluster metadata and prints it as JSON.
//!
//! THORWIRE_BROKER (default 127.0.0.1:9092) selects the broker,
//! THORWIRE_TOPICS (comma-separated, default all topics) the topics, and
//! THORWIRE_CLIENT_ID the client id sent with the request.

use thorwire::protocol::{self, correlation_id_of, MetadataRequest, DEFAULT_CLIENT_ID};
use thorwire::{BrokerSocket, Endpoint, KafkaRequest, RequestHeader, SocketConfig};
use tracing_subscriber::EnvFilter;

fn parse_topics() -> Vec<String> {
    std::env::var("THORWIRE_TOPICS")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

async fn resolve(broker: &str) -> anyhow::Result<Endpoint> {
    let (host, port) = broker
        .rsplit_once(':')
        .ok_or_else(|| anyhow::anyhow!("THORWIRE_BROKER must be host:port, got {broker}"))?;
    Ok(Endpoint::resolve(host, port.parse()?).await?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("thorwire=info".parse()?))
        .init();

    let broker = std::env::var("THORWIRE_BROKER").unwrap_or_else(|_| "127.0.0.1:9092".to_string());
    let client_id =
        std::env::var("THORWIRE_CLIENT_ID").unwrap_or_else(|_| DEFAULT_CLIENT_ID.to_string());

    let endpoint = resolve(&broker).await?;
    let socket = BrokerSocket::with_observer(endpoint, SocketConfig::default(), |attempt| {
        tracing::info!(attempt, "connecting to broker");
    });

    let request = MetadataRequest::new(RequestHeader::new(1, client_id), parse_topics());
    socket.write_frame(&protocol::frame(&request)?).await?;
    let body = socket.read_frame().await?;
    let correlation_id = correlation_id_of(&body)?;
    if correlation_id != request.header.correlation_id {
        anyhow::bail!(
            "response correlation id {} does not match request {}",
            correlation_id,
            request.header.correlation_id
        );
    }

    let metadata = request.decode(&body)?;
    println!("{}", serde_json::to_string_pretty(&metadata)?);

    socket.dispose().await;
    Ok(())
}
