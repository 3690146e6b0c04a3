//! Shared fakes and a programmable HTTP backend for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use patent_ledger::evaluation::{
    extract_cid, ContentId, EvaluationBackend, EvaluationReport, StorageUploader, UpstreamError,
};
use patent_ledger::ledger::{
    InMemoryLedger, LedgerClient, ProviderError, SigningIdentity, WalletProvider, WalletSession,
};
use patent_ledger::workflow::SubmissionController;

/// Wallet that hands out a fixed, address-only account.
pub struct FakeWallet {
    address: Address,
}

impl FakeWallet {
    pub fn new(address: Address) -> Arc<dyn WalletProvider> {
        Arc::new(Self { address })
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn request_account(&self) -> Result<SigningIdentity, ProviderError> {
        Ok(SigningIdentity::address_only(self.address))
    }
}

/// Wallet whose user declines every connection prompt.
pub struct DecliningWallet;

impl DecliningWallet {
    pub fn new() -> Arc<dyn WalletProvider> {
        Arc::new(Self)
    }
}

#[async_trait]
impl WalletProvider for DecliningWallet {
    async fn request_account(&self) -> Result<SigningIdentity, ProviderError> {
        Err(ProviderError::UserRejected("User rejected the request.".into()))
    }
}

/// Evaluator that returns a canned JSON report.
pub struct ScriptedEvaluator {
    response: Value,
}

impl ScriptedEvaluator {
    pub fn new(response: Value) -> Arc<dyn EvaluationBackend> {
        Arc::new(Self { response })
    }
}

#[async_trait]
impl EvaluationBackend for ScriptedEvaluator {
    async fn evaluate(&self, _: &str, _: Vec<u8>) -> Result<EvaluationReport, UpstreamError> {
        serde_json::from_value(self.response.clone()).map_err(|e| UpstreamError::Decode {
            service: "evaluator",
            message: e.to_string(),
        })
    }
}

/// Uploader that answers with a canned body, validated like the real ones.
pub struct ScriptedUploader {
    body: Value,
    calls: AtomicUsize,
}

impl ScriptedUploader {
    pub fn new(body: Value) -> Arc<Self> {
        Arc::new(Self {
            body,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageUploader for ScriptedUploader {
    async fn upload(&self, _: &EvaluationReport) -> Result<ContentId, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        extract_cid("storage", &self.body, "cid")
    }
}

/// A controller wired to `ledger`, connected as `address` when given.
pub fn controller(address: Option<Address>, ledger: &InMemoryLedger) -> SubmissionController {
    SubmissionController::new(
        WalletSession::new(address.map(FakeWallet::new)),
        LedgerClient::new(Arc::new(ledger.clone())),
    )
}

/// A request captured by the programmable backend.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: String,
    pub body: Vec<u8>,
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
}

fn content_length(headers: &str) -> usize {
    headers
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

async fn read_request(socket: &mut TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find_header_end(&buf) {
            break end;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let length = content_length(&head);
    while buf.len() < header_end + length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let (request_line, headers) = head.split_once("\r\n").unwrap_or((head.as_str(), ""));
    Some(CapturedRequest {
        request_line: request_line.to_string(),
        headers: headers.to_string(),
        body: buf[header_end..].to_vec(),
    })
}

/// Start a backend that answers every request with `status` and `body`.
///
/// Returns the bound address and a channel of captured requests.
pub async fn start_programmable_backend(
    status: u16,
    body: &'static str,
) -> (SocketAddr, mpsc::UnboundedReceiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let _ = tx.send(request);

                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            401 => "401 Unauthorized",
                            500 => "500 Internal Server Error",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, rx)
}
