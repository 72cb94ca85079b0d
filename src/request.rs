//! HTTP 傳輸層與已簽名請求通道。
//!
//! 所有回應在此被立即讀入記憶體，讓錯誤分類（CA 錯誤文件或
//! 原始傳輸失敗）與除錯都能拿到完整的原始內容。

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;

use crate::{
    account::Account,
    error::{AcmeError, ErrorDescription, Result},
    jws::Jws,
    nonce::NoncePool,
    payload::PayloadT,
    protection::ProtectedHeader,
};

const JOSE_CONTENT_TYPE: &str = "application/jose+json";
const REPLAY_NONCE: &str = "replay-nonce";

/// 定義 HTTP 傳輸的行為。
///
/// 簽名通道與目錄探索透過此 trait 發送請求，測試時可用
/// [`MockTransport`] 替換真實傳輸。
pub trait TransportT: fmt::Debug {
    /// 發送 GET 請求，可附帶 `Accept` 標頭。
    fn get(&self, url: &str, accept: Option<&str>) -> Result<HttpResponse>;
    /// 發送 HEAD 請求。
    fn head(&self, url: &str) -> Result<HttpResponse>;
    /// 以 `application/jose+json` 內容類型發送 JWS 信封，
    /// 可附帶 `Accept` 標頭。
    fn post_jose(&self, url: &str, body: &str, accept: Option<&str>) -> Result<HttpResponse>;
    /// 發送表單編碼的 POST 請求。
    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse>;
}

/// 已完整讀入的 HTTP 回應。
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    /// 狀態碼是否為 2xx。
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 取得標頭值，無法轉為字串時視同不存在。
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// 將回應內容解析為指定型別，解析失敗時以原始內容回報。
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|_| AcmeError::MalformedResponse(self.body.clone()))
    }

    /// 非 2xx 時轉換為對應錯誤：能解析成 CA 錯誤文件則回報
    /// `ErrorResponse`，否則以原始狀態與內容回報 `TransportFailure`。
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }

        match serde_json::from_str::<ErrorDescription>(&self.body) {
            Ok(desc) => Err(desc.into()),
            Err(_) => Err(AcmeError::TransportFailure {
                status: self.status,
                status_text: self.status_text,
                body: self.body,
            }),
        }
    }
}

/// 阻塞式 HTTP 客戶端的薄封裝。
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .unwrap_or_else(|_| Client::new());

        HttpClient { client }
    }
}

impl HttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn capture(response: reqwest::blocking::Response) -> Result<HttpResponse> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text()?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_owned(),
            headers,
            body,
        })
    }
}

impl TransportT for HttpClient {
    fn get(&self, url: &str, accept: Option<&str>) -> Result<HttpResponse> {
        log::debug!("GET {url}");
        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        let response = Self::capture(request.send()?)?;
        log::debug!("GET {url} -> {}", response.status);
        Ok(response)
    }

    fn head(&self, url: &str) -> Result<HttpResponse> {
        log::debug!("HEAD {url}");
        let response = Self::capture(self.client.head(url).send()?)?;
        log::debug!("HEAD {url} -> {}", response.status);
        Ok(response)
    }

    fn post_jose(&self, url: &str, body: &str, accept: Option<&str>) -> Result<HttpResponse> {
        log::debug!("POST {url}");
        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, JOSE_CONTENT_TYPE)
            .body(body.to_owned());
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        let response = Self::capture(request.send()?)?;
        log::debug!("POST {url} -> {}", response.status);
        Ok(response)
    }

    /// 表單編碼的 POST 請求，External Account Binding 憑證查詢用。
    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse> {
        log::debug!("POST {url} (form)");
        let response = Self::capture(self.client.post(url).form(form).send()?)?;
        log::debug!("POST {url} -> {}", response.status);
        Ok(response)
    }
}

/// 記錄模擬傳輸收到的一次請求。
#[derive(Debug, Clone)]
pub struct MockCall {
    pub method: &'static str,
    pub url: String,
    pub body: Option<String>,
}

/// 模擬 HTTP 傳輸，回傳預先排入的回應並記錄收到的請求，
/// 用於測試傳輸層行為。複製出的實例共享同一份狀態，
/// 方便在交出所有權後仍能檢視記錄。
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<MockState>,
}

#[derive(Debug, Default)]
struct MockState {
    head_nonce: Mutex<Option<String>>,
    responses: Mutex<VecDeque<HttpResponse>>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 設定 HEAD 回應攜帶的 `Replay-Nonce` 值。
    pub fn set_head_nonce(&self, nonce: impl Into<String>) {
        *self.state.head_nonce.lock() = Some(nonce.into());
    }

    /// 排入一個回應，GET 與 POST 請求依序取用。
    pub fn push_response(&self, status: u16, body: &str, header_pairs: &[(&str, &str)]) {
        let mut headers = HeaderMap::new();
        for (name, value) in header_pairs {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(name, value);
            }
        }
        self.state.responses.lock().push_back(HttpResponse {
            status,
            status_text: "Mock".to_owned(),
            headers,
            body: body.to_owned(),
        });
    }

    /// 目前為止記錄到的所有請求。
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.calls.lock().clone()
    }

    fn record(&self, method: &'static str, url: &str, body: Option<String>) {
        self.state.calls.lock().push(MockCall {
            method,
            url: url.to_owned(),
            body,
        });
    }

    fn pop_response(&self) -> HttpResponse {
        self.state
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| HttpResponse {
                status: 404,
                status_text: "Mock".to_owned(),
                headers: HeaderMap::new(),
                body: String::new(),
            })
    }
}

impl TransportT for MockTransport {
    fn get(&self, url: &str, _accept: Option<&str>) -> Result<HttpResponse> {
        self.record("GET", url, None);
        Ok(self.pop_response())
    }

    /// 回傳 200，並附上預先設定的 `Replay-Nonce` 標頭（若有）。
    fn head(&self, url: &str) -> Result<HttpResponse> {
        self.record("HEAD", url, None);
        let mut headers = HeaderMap::new();
        if let Some(nonce) = self.state.head_nonce.lock().as_deref() {
            if let Ok(value) = HeaderValue::from_str(nonce) {
                headers.insert(REPLAY_NONCE, value);
            }
        }
        Ok(HttpResponse {
            status: 200,
            status_text: "Mock".to_owned(),
            headers,
            body: String::new(),
        })
    }

    fn post_jose(&self, url: &str, body: &str, _accept: Option<&str>) -> Result<HttpResponse> {
        self.record("POST", url, Some(body.to_owned()));
        Ok(self.pop_response())
    }

    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse> {
        let body = form
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        self.record("POST", url, Some(body));
        Ok(self.pop_response())
    }
}

/// 已簽名請求通道。
///
/// 每個請求消耗一個 nonce：優先從池中取出，池為空時改呼叫
/// `newNonce` 端點；成功回應附帶的 `Replay-Nonce` 會放回池中。
pub struct Requester<'a> {
    pub http: &'a dyn TransportT,
    pub new_nonce_url: &'a str,
    pub nonce_pool: &'a NoncePool,
    pub account: &'a Account,
}

impl Requester<'_> {
    /// 取得一個可用的 nonce。
    fn nonce(&self) -> Result<String> {
        if let Some(nonce) = self.nonce_pool.take() {
            return Ok(nonce);
        }

        let response = self.http.head(self.new_nonce_url)?;
        match response.header(REPLAY_NONCE) {
            Some(nonce) => Ok(nonce.to_owned()),
            None => Err(AcmeError::MissingNonce),
        }
    }

    /// 簽出信封並發送，成功時回收回應附帶的 nonce。
    ///
    /// 取出的 nonce 不會放回池中，簽名或傳輸失敗時直接丟棄。
    /// 非 2xx 回應會被分類為 `ErrorResponse` 或 `TransportFailure`。
    fn send_signed(
        &self,
        url: &str,
        payload_b64: Option<String>,
        accept: Option<&str>,
    ) -> Result<HttpResponse> {
        let nonce = self.nonce()?;
        let jws = build_jws(self.account, nonce, url, payload_b64)?;
        let response = self.http.post_jose(url, &jws.to_json()?, accept)?;

        if response.is_success() {
            if let Some(nonce) = response.header(REPLAY_NONCE) {
                self.nonce_pool.put(nonce);
            }
        }

        response.error_for_status()
    }

    /// 以類型化載荷發送已簽名請求。
    pub fn post(&self, url: &str, payload: &impl PayloadT) -> Result<HttpResponse> {
        self.send_signed(url, Some(payload.to_base64url()?), None)
    }

    /// 發送空 payload 的 POST-as-GET 請求。
    pub fn post_as_get(&self, url: &str) -> Result<HttpResponse> {
        self.send_signed(url, None, None)
    }

    /// 發送附帶 `Accept` 標頭的 POST-as-GET 請求（憑證下載用）。
    pub fn post_as_get_accept(&self, url: &str, accept: &str) -> Result<HttpResponse> {
        self.send_signed(url, None, Some(accept))
    }
}

/// 建立一個已簽名的 JWS 信封。
///
/// 帳戶已有 URL 時以 `kid` 識別金鑰，否則內嵌完整公開 JWK
/// （僅發生在 `newAccount`）。
pub fn build_jws(
    account: &Account,
    nonce: String,
    url: &str,
    payload_b64: Option<String>,
) -> Result<Jws> {
    let key_pair = account.key_pair();
    let header = match account.account_url() {
        Some(kid) => ProtectedHeader::existing_account(key_pair.alg, nonce, url, kid),
        None => ProtectedHeader::new_account(key_pair.alg, nonce, url, key_pair.public_jwk()?),
    };

    Jws::sign(&header, payload_b64, key_pair)
}
