use super::{map_io_error, timeout_error, DnsTransport, TransportResponse};
use async_trait::async_trait;
use ferrous_forwarder_domain::DomainError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// DNS over TCP (RFC 1035 §4.2.2): one connection per query, each message
/// carried behind a 2-byte big-endian length prefix.
pub struct TcpTransport {
    server_addr: SocketAddr,
}

impl TcpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    async fn connect(&self) -> Result<TcpStream, DomainError> {
        let stream = TcpStream::connect(self.server_addr)
            .await
            .map_err(|e| map_io_error(self.server_addr, e))?;
        stream
            .set_nodelay(true)
            .map_err(|e| map_io_error(self.server_addr, e))?;
        Ok(stream)
    }
}

#[async_trait]
impl DnsTransport for TcpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        let server = self.server_addr;

        let exchange = async {
            let mut stream = self.connect().await?;

            send_with_length_prefix(&mut stream, message_bytes)
                .await
                .map_err(|e| map_io_error(server, e))?;
            debug!(
                server = %server,
                message_len = message_bytes.len(),
                "TCP query sent"
            );

            let response = read_with_length_prefix(&mut stream)
                .await
                .map_err(|e| map_io_error(server, e))?;
            debug!(
                server = %server,
                response_len = response.len(),
                "TCP response received"
            );
            Ok::<_, DomainError>(response)
        };

        let bytes = tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| timeout_error(server))??;

        Ok(TransportResponse {
            bytes,
            protocol_used: "TCP",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "TCP"
    }
}

pub async fn send_with_length_prefix<S>(
    stream: &mut S,
    message_bytes: &[u8],
) -> std::io::Result<()>
where
    S: AsyncWriteExt + Unpin,
{
    let length = u16::try_from(message_bytes.len()).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("DNS message of {} bytes exceeds TCP framing", message_bytes.len()),
        )
    })?;

    stream.write_all(&length.to_be_bytes()).await?;
    stream.write_all(message_bytes).await?;
    stream.flush().await
}

pub async fn read_with_length_prefix<S>(stream: &mut S) -> std::io::Result<Vec<u8>>
where
    S: AsyncReadExt + Unpin,
{
    let mut len_buf = [0u8; 2];
    stream.read_exact(&mut len_buf).await?;

    let response_len = u16::from_be_bytes(len_buf) as usize;

    let mut response = vec![0u8; response_len];
    stream.read_exact(&mut response).await?;
    Ok(response)
}
