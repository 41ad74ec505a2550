use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;

/// Bidirectional byte stream to the decision service.
pub trait Conduit: AsyncRead + AsyncWrite + Send + Unpin {}
impl<T> Conduit for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

/// Source of decision-service connections.
/// Sessions dial once per hand; the transport behind it is irrelevant to them.
#[async_trait::async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self) -> std::io::Result<Box<dyn Conduit>>;
}

/// Plain TCP connection to `host:port`.
#[derive(Debug, Clone)]
pub struct Tcp {
    addr: String,
}

impl Tcp {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            addr: format!("{}:{}", host, port),
        }
    }
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait::async_trait]
impl Dialer for Tcp {
    async fn dial(&self) -> std::io::Result<Box<dyn Conduit>> {
        let stream = tokio::net::TcpStream::connect(&self.addr).await?;
        stream.set_nodelay(true)?;
        Ok(Box::new(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tcp_dials_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let dialer = Tcp::new("127.0.0.1", port);
        let (dialed, accepted) = tokio::join!(dialer.dial(), listener.accept());
        assert!(dialed.is_ok());
        assert!(accepted.is_ok());
    }

    #[tokio::test]
    async fn tcp_reports_refusal() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        assert!(Tcp::new("127.0.0.1", port).dial().await.is_err());
    }
}
