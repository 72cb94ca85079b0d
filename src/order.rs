//! 訂單工作流程：建立、快照刷新、最終化與憑證下載。

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    authorization::Authorization,
    ca::Ca,
    csr::{self, CreatedCsr, CsrFormat},
    error::{AcmeError, Result},
    key_pair::Algorithm,
    payload::{FinalizeOrderPayload, Identifier, NewOrderPayload},
};

const PEM_CHAIN_ACCEPT: &str = "application/pem-certificate-chain";

/// 訂單狀態。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Ready,
    Processing,
    Valid,
    Invalid,
}

/// CA 回應的訂單內容，不含訂單自身的 URL。
#[derive(Debug, Deserialize)]
struct OrderResponse {
    status: OrderStatus,
    expires: Option<String>,
    identifiers: Vec<Identifier>,
    authorizations: Vec<String>,
    finalize: String,
    certificate: Option<String>,
}

/// 一個訂單的不可變快照。
///
/// `restore` 與 `verify` 回傳新的快照，`finalize` 不就地更新狀態；
/// 呼叫端持有最新一份快照。
#[derive(Debug, Clone)]
pub struct Order {
    /// 訂單 URL，取自建立回應的 `Location` 標頭。
    pub url: String,
    pub status: OrderStatus,
    pub expires: Option<String>,
    pub identifiers: Vec<Identifier>,
    /// 授權 URL 列表，每個識別項一個。
    pub authorizations: Vec<String>,
    pub finalize_url: String,
    /// 憑證下載 URL，僅在訂單 `valid` 後出現。
    pub certificate_url: Option<String>,
}

impl Order {
    /// 向 `newOrder` 端點提交識別項並回傳訂單快照。
    ///
    /// 訂單 URL 取自 `Location` 標頭，缺席時回傳 `MissingOrderUrl`。
    pub fn create(ca: &Ca, domains: &[impl AsRef<str>]) -> Result<Self> {
        let new_order_url = ca.directory()?.new_order.clone();
        let payload = NewOrderPayload::new(domains);
        let response = ca.post(&new_order_url, &payload)?;

        let url = response
            .header("location")
            .ok_or(AcmeError::MissingOrderUrl)?
            .to_owned();

        Self::parse(url, &response.body)
    }

    /// 以 POST-as-GET 取得訂單的最新快照。
    pub fn restore(ca: &Ca, url: &str) -> Result<Self> {
        let response = ca.post_as_get(url)?;
        Self::parse(url.to_owned(), &response.body)
    }

    /// 重新取得快照以觀察狀態轉移。
    pub fn verify(&self, ca: &Ca) -> Result<Self> {
        Self::restore(ca, &self.url)
    }

    /// 解析訂單回應並驗證結構。
    ///
    /// 所有識別項的類型都必須是 `dns`，否則回傳 `MalformedResponse`。
    pub fn parse(url: String, body: &str) -> Result<Self> {
        let response: OrderResponse = serde_json::from_str(body)
            .map_err(|_| AcmeError::MalformedResponse(body.to_owned()))?;

        if response.identifiers.is_empty()
            || response.identifiers.iter().any(|i| i.type_ != "dns")
        {
            return Err(AcmeError::MalformedResponse(body.to_owned()));
        }

        Ok(Order {
            url,
            status: response.status,
            expires: response.expires,
            identifiers: response.identifiers,
            authorizations: response.authorizations,
            finalize_url: response.finalize,
            certificate_url: response.certificate,
        })
    }

    /// 訂單涵蓋的域名。
    pub fn domains(&self) -> Vec<&str> {
        self.identifiers.iter().map(|i| i.value.as_str()).collect()
    }

    /// 取得訂單所有授權的快照，任一授權失敗即整體失敗。
    pub fn authorizations(&self, ca: &Ca) -> Result<Vec<Authorization>> {
        self.authorizations
            .iter()
            .map(|url| Authorization::restore(ca, url))
            .collect()
    }

    /// 為訂單的域名產生金鑰與 PEM 格式的 CSR。
    pub fn csr(&self, alg: Algorithm) -> Result<CreatedCsr> {
        let domains = self.domains();
        match alg {
            Algorithm::Es256 => csr::create_ecdsa_csr(&domains, CsrFormat::Pem),
            Algorithm::Rs256 => csr::create_rsa_csr(&domains, CsrFormat::Pem),
        }
    }

    /// 提交 CSR 以最終化訂單。
    ///
    /// 接受 PEM 或已編碼為 URL-safe Base64 的 DER；PEM 會先轉換。
    /// 回傳 CA 的原始 JSON 回應，不更新快照。
    pub fn finalize(&self, ca: &Ca, csr: &str) -> Result<serde_json::Value> {
        let csr_b64url = if csr::is_pem(csr) {
            csr::convert_from_pem(csr, CsrFormat::Base64Url)?
        } else {
            csr.to_owned()
        };

        let payload = FinalizeOrderPayload::new(csr_b64url);
        let response = ca.post(&self.finalize_url, &payload)?;
        response.json()
    }

    /// 下載已簽發的憑證鏈（PEM 格式）。
    ///
    /// 未指定 `url` 時使用快照中的憑證 URL；兩者皆無時回傳
    /// `CertificateNotReady`。
    pub fn download_certificate(&self, ca: &Ca, url: Option<&str>) -> Result<String> {
        let url = url
            .or(self.certificate_url.as_deref())
            .ok_or(AcmeError::CertificateNotReady)?;

        let response = ca.post_as_get_accept(url, PEM_CHAIN_ACCEPT)?;
        Ok(response.body)
    }

    /// 過期時間，解析自 RFC 3339 格式的 `expires` 欄位。
    pub fn expired_at(&self) -> Result<Option<DateTime<Utc>>> {
        match &self.expires {
            Some(expires) => Ok(Some(
                DateTime::parse_from_rfc3339(expires)?.with_timezone(&Utc),
            )),
            None => Ok(None),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    pub fn is_ready(&self) -> bool {
        self.status == OrderStatus::Ready
    }

    pub fn is_processing(&self) -> bool {
        self.status == OrderStatus::Processing
    }

    pub fn is_valid(&self) -> bool {
        self.status == OrderStatus::Valid
    }

    pub fn is_invalid(&self) -> bool {
        self.status == OrderStatus::Invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PENDING_ORDER: &str = r#"{
        "status": "pending",
        "expires": "2026-09-01T00:00:00Z",
        "identifiers": [
            { "type": "dns", "value": "example.com" },
            { "type": "dns", "value": "www.example.com" }
        ],
        "authorizations": [
            "https://example.com/acme/authz/1",
            "https://example.com/acme/authz/2"
        ],
        "finalize": "https://example.com/acme/order/1/finalize"
    }"#;

    #[test]
    fn test_parse_pending_order() {
        let order = Order::parse("https://example.com/acme/order/1".to_owned(), PENDING_ORDER)
            .unwrap();
        assert!(order.is_pending());
        assert_eq!(order.domains(), vec!["example.com", "www.example.com"]);
        assert_eq!(order.authorizations.len(), 2);
        assert_eq!(
            order.finalize_url,
            "https://example.com/acme/order/1/finalize"
        );
        assert!(order.certificate_url.is_none());
    }

    #[test]
    fn test_parse_valid_order_with_certificate() {
        let body = r#"{
            "status": "valid",
            "expires": "2026-09-01T00:00:00Z",
            "identifiers": [{ "type": "dns", "value": "example.com" }],
            "authorizations": ["https://example.com/acme/authz/1"],
            "finalize": "https://example.com/acme/order/1/finalize",
            "certificate": "https://example.com/acme/cert/1"
        }"#;
        let order = Order::parse("https://example.com/acme/order/1".to_owned(), body).unwrap();
        assert!(order.is_valid());
        assert_eq!(
            order.certificate_url.as_deref(),
            Some("https://example.com/acme/cert/1")
        );
    }

    #[test]
    fn test_parse_rejects_non_dns_identifier() {
        let body = r#"{
            "status": "pending",
            "identifiers": [{ "type": "ip", "value": "192.0.2.1" }],
            "authorizations": ["https://example.com/acme/authz/1"],
            "finalize": "https://example.com/acme/order/1/finalize"
        }"#;
        assert!(matches!(
            Order::parse("u".to_owned(), body),
            Err(AcmeError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_missing_finalize() {
        let body = r#"{
            "status": "pending",
            "identifiers": [{ "type": "dns", "value": "example.com" }],
            "authorizations": []
        }"#;
        assert!(matches!(
            Order::parse("u".to_owned(), body),
            Err(AcmeError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_empty_identifiers() {
        let body = r#"{
            "status": "pending",
            "identifiers": [],
            "authorizations": [],
            "finalize": "https://example.com/f"
        }"#;
        assert!(matches!(
            Order::parse("u".to_owned(), body),
            Err(AcmeError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_expired_at_parses_rfc3339() {
        let order = Order::parse("u".to_owned(), PENDING_ORDER).unwrap();
        let expired_at = order.expired_at().unwrap().unwrap();
        assert_eq!(expired_at.to_rfc3339(), "2026-09-01T00:00:00+00:00");
    }

    #[test]
    fn test_expired_at_absent() {
        let body = r#"{
            "status": "ready",
            "identifiers": [{ "type": "dns", "value": "example.com" }],
            "authorizations": ["https://example.com/acme/authz/1"],
            "finalize": "https://example.com/f"
        }"#;
        let order = Order::parse("u".to_owned(), body).unwrap();
        assert!(order.expired_at().unwrap().is_none());
        assert!(order.is_ready());
    }
}
