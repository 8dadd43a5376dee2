#![allow(dead_code)]

use hickory_proto::op::Message;
use hickory_proto::rr::RecordType;
use hickory_proto::serialize::binary::BinEncodable;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::UdpSocket;
use tokio::sync::oneshot;

type Responder = Arc<dyn Fn(&Message) -> Option<Message> + Send + Sync>;

/// Loopback DNS server answering through a test-supplied closure.
///
/// Returning `None` from the closure drops the query, which is how tests
/// simulate an unresponsive server.
pub struct MockDnsServer {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<(String, RecordType)>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    pub async fn start<F>(responder: F) -> Result<Self, std::io::Error>
    where
        F: Fn(&Message) -> Option<Message> + Send + Sync + 'static,
    {
        let socket = UdpSocket::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = socket.local_addr()?;
        let responder: Responder = Arc::new(responder);
        let received = Arc::new(Mutex::new(Vec::new()));
        let log = received.clone();

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            let mut buf = vec![0u8; 512];

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        break;
                    }
                    result = socket.recv_from(&mut buf) => {
                        let Ok((len, peer)) = result else {
                            continue;
                        };
                        let Ok(query) = Message::from_vec(&buf[..len]) else {
                            continue;
                        };

                        if let Some(q) = query.queries().first() {
                            log.lock().unwrap().push((
                                q.name().to_utf8().trim_end_matches('.').to_string(),
                                q.query_type(),
                            ));
                        }

                        if let Some(response) = responder(&query) {
                            let bytes = response.to_vec().unwrap();
                            let _ = socket.send_to(&bytes, peer).await;
                        }
                    }
                }
            }
        });

        Ok(Self {
            addr,
            received,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Server that never answers.
    pub async fn silent() -> Result<Self, std::io::Error> {
        Self::start(|_| None).await
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Question name and type of every query received so far.
    pub fn received(&self) -> Vec<(String, RecordType)> {
        self.received.lock().unwrap().clone()
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
