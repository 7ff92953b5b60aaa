//! Mock Plaid API server for testing
//!
//! Simulates the three Plaid endpoints the aggregator uses, with the same
//! response structure as the real API:
//! - POST /accounts/get returns { accounts: [], item: { institution_id } }
//! - POST /institutions/get_by_id returns { institution: { institution_id, name } }
//! - POST /transactions/get returns { transactions: [...], total_transactions: N },
//!   honouring `options.count` and `options.offset`

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::NaiveDate;
use serde_json::{json, Value as JsonValue};

pub const MOCK_CLIENT_ID: &str = "test_client";
pub const MOCK_SECRET: &str = "test_secret";

/// A linked item served by the mock
#[derive(Debug, Clone)]
pub struct MockItem {
    pub access_token: String,
    pub institution_id: String,
    pub institution_name: String,
    /// (date, name, amount)
    pub transactions: Vec<(NaiveDate, String, f64)>,
}

impl MockItem {
    pub fn new(access_token: &str, institution_id: &str, institution_name: &str) -> Self {
        Self {
            access_token: access_token.to_string(),
            institution_id: institution_id.to_string(),
            institution_name: institution_name.to_string(),
            transactions: Vec::new(),
        }
    }

    pub fn with_transaction(mut self, date: NaiveDate, name: &str, amount: f64) -> Self {
        self.transactions.push((date, name.to_string(), amount));
        self
    }
}

/// Configuration for the mock
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    pub items: Vec<MockItem>,
    /// Respond to /transactions/get with a 500 API_ERROR
    pub fail_transactions: bool,
}

/// One request as received by the mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub body: JsonValue,
}

/// Mock Plaid server for testing
pub struct MockPlaidServer {
    port: u16,
    running: Arc<AtomicBool>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl MockPlaidServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let requests = Arc::new(Mutex::new(Vec::new()));

        // Non-blocking for graceful shutdown
        listener.set_nonblocking(true)?;

        let running_clone = running.clone();
        let requests_clone = requests.clone();
        let config = Arc::new(config);

        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let cfg = config.clone();
                        let log = requests_clone.clone();
                        thread::spawn(move || handle_connection(stream, &cfg, &log));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(10));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            requests,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockPlaidServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Read one HTTP request, returning (path, body)
fn read_request(stream: &mut TcpStream) -> Option<(String, String)> {
    stream.set_nonblocking(false).ok()?;

    let mut data = Vec::new();
    let mut buffer = [0; 4096];
    let header_end = loop {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buffer[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while data.len() < header_end + content_length {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..n]);
    }

    let path = head.split_whitespace().nth(1)?.to_string();
    let body = String::from_utf8_lossy(&data[header_end..]).to_string();
    Some((path, body))
}

fn handle_connection(
    mut stream: TcpStream,
    config: &MockConfig,
    log: &Mutex<Vec<RecordedRequest>>,
) {
    let Some((path, raw_body)) = read_request(&mut stream) else {
        return;
    };
    let body: JsonValue = serde_json::from_str(&raw_body).unwrap_or(JsonValue::Null);

    log.lock().unwrap().push(RecordedRequest {
        path: path.clone(),
        body: body.clone(),
    });

    if body["client_id"] != MOCK_CLIENT_ID || body["secret"] != MOCK_SECRET {
        send_error(
            &mut stream,
            400,
            "INVALID_INPUT",
            "INVALID_API_KEYS",
            "invalid client_id or secret provided",
        );
        return;
    }

    let find_item = |token: &JsonValue| {
        config
            .items
            .iter()
            .find(|i| token.as_str() == Some(i.access_token.as_str()))
    };

    match path.as_str() {
        "/accounts/get" => match find_item(&body["access_token"]) {
            Some(item) => send_json(
                &mut stream,
                200,
                &json!({
                    "accounts": [],
                    "item": {
                        "item_id": format!("item-{}", item.access_token),
                        "institution_id": item.institution_id,
                    },
                    "request_id": "mock"
                }),
            ),
            None => send_invalid_token(&mut stream),
        },
        "/institutions/get_by_id" => {
            let id = body["institution_id"].as_str().unwrap_or("");
            match config.items.iter().find(|i| i.institution_id == id) {
                Some(item) => send_json(
                    &mut stream,
                    200,
                    &json!({
                        "institution": {
                            "institution_id": item.institution_id,
                            "name": item.institution_name,
                            "country_codes": body["country_codes"],
                        },
                        "request_id": "mock"
                    }),
                ),
                None => send_error(
                    &mut stream,
                    400,
                    "INVALID_INPUT",
                    "INVALID_INSTITUTION",
                    "invalid institution_id provided",
                ),
            }
        }
        "/transactions/get" => {
            if config.fail_transactions {
                send_error(
                    &mut stream,
                    500,
                    "API_ERROR",
                    "INTERNAL_SERVER_ERROR",
                    "an unexpected error occurred",
                );
                return;
            }
            let Some(item) = find_item(&body["access_token"]) else {
                send_invalid_token(&mut stream);
                return;
            };

            let parse = |key: &str| {
                body[key]
                    .as_str()
                    .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            };
            let (Some(start), Some(end)) = (parse("start_date"), parse("end_date")) else {
                send_error(
                    &mut stream,
                    400,
                    "INVALID_REQUEST",
                    "INVALID_FIELD",
                    "start_date and end_date are required",
                );
                return;
            };

            let count = body["options"]["count"].as_u64().unwrap_or(100) as usize;
            let offset = body["options"]["offset"].as_u64().unwrap_or(0) as usize;

            let in_range: Vec<_> = item
                .transactions
                .iter()
                .filter(|(date, _, _)| *date >= start && *date <= end)
                .collect();

            let page: Vec<JsonValue> = in_range
                .iter()
                .skip(offset)
                .take(count)
                .map(|(date, name, amount)| {
                    json!({
                        "amount": amount,
                        "category": ["Transfer"],
                        "date": date.format("%Y-%m-%d").to_string(),
                        "location": { "city": null, "region": null },
                        "merchant_name": null,
                        "name": name,
                        "pending": false
                    })
                })
                .collect();

            send_json(
                &mut stream,
                200,
                &json!({
                    "accounts": [],
                    "transactions": page,
                    "total_transactions": in_range.len(),
                    "request_id": "mock"
                }),
            );
        }
        _ => send_error(&mut stream, 404, "INVALID_REQUEST", "NOT_FOUND", "unknown endpoint"),
    }
}

fn send_invalid_token(stream: &mut TcpStream) {
    send_error(
        stream,
        400,
        "INVALID_INPUT",
        "INVALID_ACCESS_TOKEN",
        "provided access token is in an invalid format",
    );
}

fn send_error(
    stream: &mut TcpStream,
    status: u16,
    error_type: &str,
    error_code: &str,
    message: &str,
) {
    send_json(
        stream,
        status,
        &json!({
            "error_type": error_type,
            "error_code": error_code,
            "error_message": message,
            "request_id": "mock"
        }),
    );
}

fn send_json(stream: &mut TcpStream, status: u16, body: &JsonValue) {
    let body = body.to_string();
    let status_text = match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        _ => "Internal Server Error",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::plaid::{PlaidClient, PlaidCredentials};
    use crate::domain::result::Error;
    use crate::ports::{FinancialDataApi, TransactionsGetRequest};
    use crate::services::{FetchOptions, TransactionAggregator};
    use std::time::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn client(server: &MockPlaidServer) -> PlaidClient {
        PlaidClient::new_with_base_url(
            PlaidCredentials::new(MOCK_CLIENT_ID, MOCK_SECRET),
            &server.base_url(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn two_banks() -> MockConfig {
        MockConfig {
            items: vec![
                MockItem::new("access-a", "ins_1", "Bank A")
                    .with_transaction(date(2024, 1, 3), "Coffee", 4.5)
                    .with_transaction(date(2024, 1, 1), "Rent", 1500.0)
                    .with_transaction(date(2024, 1, 7), "Paycheck", -2500.0),
                MockItem::new("access-b", "ins_2", "Bank B")
                    .with_transaction(date(2024, 1, 2), "Groceries", 82.17),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_accounts_and_institution_lookup() {
        let server = MockPlaidServer::start(two_banks()).unwrap();
        let client = client(&server);

        let accounts = client.accounts_get("access-b").unwrap();
        assert_eq!(accounts.item.institution_id.as_deref(), Some("ins_2"));

        let institution = client.institutions_get_by_id("ins_2", "US").unwrap();
        assert_eq!(institution.institution.name, "Bank B");

        let requests = server.requests();
        assert_eq!(requests[1].path, "/institutions/get_by_id");
        assert_eq!(requests[1].body["country_codes"], serde_json::json!(["US"]));
        assert_eq!(requests[1].body["client_id"], MOCK_CLIENT_ID);
    }

    #[test]
    fn test_transactions_paging() {
        let server = MockPlaidServer::start(two_banks()).unwrap();
        let client = client(&server);

        let page = client
            .transactions_get(&TransactionsGetRequest {
                access_token: "access-a".to_string(),
                start_date: date(2024, 1, 1),
                end_date: date(2024, 2, 1),
                count: Some(2),
                offset: Some(2),
            })
            .unwrap();

        assert_eq!(page.total_transactions, 3);
        assert_eq!(page.transactions.len(), 1);
        assert_eq!(page.transactions[0].name, "Paycheck");
        assert_eq!(page.transactions[0].amount, rust_decimal::Decimal::new(-2500, 0));
    }

    #[test]
    fn test_bad_credentials_are_authentication_errors() {
        let server = MockPlaidServer::start(two_banks()).unwrap();
        let client = PlaidClient::new_with_base_url(
            PlaidCredentials::new("wrong", "creds"),
            &server.base_url(),
            Duration::from_secs(5),
        )
        .unwrap();

        let result = client.accounts_get("access-a");
        assert!(matches!(result, Err(Error::Authentication(_))));
    }

    #[test]
    fn test_unknown_token_is_authentication_error() {
        let server = MockPlaidServer::start(two_banks()).unwrap();
        let result = client(&server).accounts_get("access-zzz");
        match result {
            Err(Error::Authentication(msg)) => assert!(msg.contains("INVALID_ACCESS_TOKEN")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_aggregator_end_to_end() {
        let server = MockPlaidServer::start(two_banks()).unwrap();

        let aggregator = TransactionAggregator::initialize(client(&server), "access-a access-b")
            .unwrap()
            .with_options(FetchOptions {
                page_size: Some(2),
                ..Default::default()
            });

        assert_eq!(aggregator.institutions(), vec!["Bank A", "Bank B"]);

        let transactions = aggregator.get_transactions("2024-01-01").unwrap();
        let names: Vec<_> = transactions.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Rent", "Groceries", "Coffee", "Paycheck"]);
        assert_eq!(transactions[1].institution, "Bank B");

        let offsets: Vec<_> = server
            .requests()
            .iter()
            .filter(|r| r.path == "/transactions/get")
            .map(|r| r.body["options"]["offset"].as_u64())
            .collect();
        // Bank A: first page, then offset 2; Bank B: single page
        assert_eq!(offsets, vec![None, Some(2), None]);
    }

    #[test]
    fn test_aggregator_propagates_page_failure() {
        let server = MockPlaidServer::start(MockConfig {
            fail_transactions: true,
            ..two_banks()
        })
        .unwrap();

        let aggregator =
            TransactionAggregator::initialize(client(&server), "access-a access-b").unwrap();
        let result = aggregator.get_transactions("2024-01-01");
        assert!(matches!(result, Err(Error::Api { status: 500, .. })));
    }
}
