//! ACME 請求載荷的型別與編碼。

use base64::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{error::Result, jws::Jws};

/// 定義所有請求載荷共用的編碼行為。
pub trait PayloadT: Serialize {
    /// 將載荷序列化為 JSON 字串。
    fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// 將載荷序列化後以 URL-safe Base64 編碼，作為 JWS 的 `payload` 欄位。
    fn to_base64url(&self) -> Result<String> {
        let json = self.to_json_string()?;
        Ok(BASE64_URL_SAFE_NO_PAD.encode(json.as_bytes()))
    }
}

/// 表示一個識別項，描述證書所涵蓋的主機名稱。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(rename = "type")]
    pub type_: String,
    pub value: String,
}

impl Identifier {
    /// 建立一個 `dns` 類型的識別項。
    pub fn dns(value: impl Into<String>) -> Self {
        Identifier {
            type_: "dns".to_owned(),
            value: value.into(),
        }
    }
}

/// 建立新帳號的載荷。
///
/// 若 CA 要求 External Account Binding，`external_account_binding`
/// 欄位會攜帶一個以 HMAC 金鑰簽出的內層 JWS。
#[derive(Debug, Serialize)]
pub struct NewAccountPayload {
    contact: Vec<String>,
    #[serde(rename = "termsOfServiceAgreed")]
    terms_of_service_agreed: bool,
    #[serde(
        rename = "externalAccountBinding",
        skip_serializing_if = "Option::is_none"
    )]
    external_account_binding: Option<Jws>,
}

impl NewAccountPayload {
    /// 建立一個已同意服務條款的新帳號載荷。
    ///
    /// 傳入的 `email` 會自動補上 `mailto:` 前綴，已包含則不重複補充。
    pub fn new(email: &str) -> Self {
        let contact = if email.starts_with("mailto:") {
            vec![email.to_owned()]
        } else {
            vec![format!("mailto:{email}")]
        };

        NewAccountPayload {
            contact,
            terms_of_service_agreed: true,
            external_account_binding: None,
        }
    }

    /// 附加 External Account Binding 的內層 JWS。
    pub fn with_external_account_binding(mut self, binding: Jws) -> Self {
        self.external_account_binding = Some(binding);
        self
    }
}

impl PayloadT for NewAccountPayload {}

/// 建立新訂單的載荷，識別項類型固定為 `dns`。
#[derive(Debug, Serialize)]
pub struct NewOrderPayload {
    pub identifiers: Vec<Identifier>,
}

impl NewOrderPayload {
    /// 為每個域名建立一個 `dns` 識別項。
    pub fn new(domains: &[impl AsRef<str>]) -> Self {
        let identifiers = domains
            .iter()
            .map(|domain| Identifier::dns(domain.as_ref()))
            .collect();

        NewOrderPayload { identifiers }
    }
}

impl PayloadT for NewOrderPayload {}

/// 觸發挑戰驗證的載荷。
///
/// RFC 8555 規定以空 JSON 物件（`{}`）觸發驗證，因此使用空結構表示。
#[derive(Debug, Default, Serialize)]
pub struct ChallengeValidationPayload {}

impl ChallengeValidationPayload {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PayloadT for ChallengeValidationPayload {}

/// 最終化訂單的載荷，攜帶 URL-safe Base64 編碼的 DER 格式 CSR。
#[derive(Debug, Serialize)]
pub struct FinalizeOrderPayload {
    csr: String,
}

impl FinalizeOrderPayload {
    pub fn new(csr_b64url: impl Into<String>) -> Self {
        FinalizeOrderPayload {
            csr: csr_b64url.into(),
        }
    }
}

impl PayloadT for FinalizeOrderPayload {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_adds_mailto_prefix() {
        let payload = NewAccountPayload::new("user@example.com");
        let json: serde_json::Value = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["contact"][0], "mailto:user@example.com");
        assert_eq!(json["termsOfServiceAgreed"], true);
    }

    #[test]
    fn test_new_account_keeps_existing_mailto_prefix() {
        let payload = NewAccountPayload::new("mailto:user@example.com");
        let json: serde_json::Value = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["contact"][0], "mailto:user@example.com");
    }

    #[test]
    fn test_new_account_omits_binding_when_absent() {
        let payload = NewAccountPayload::new("user@example.com");
        let json = payload.to_json_string().unwrap();
        assert!(!json.contains("externalAccountBinding"));
    }

    #[test]
    fn test_new_account_includes_binding_when_present() {
        let binding = Jws {
            protected: "p".to_owned(),
            payload: "pl".to_owned(),
            signature: "s".to_owned(),
        };
        let payload =
            NewAccountPayload::new("user@example.com").with_external_account_binding(binding);
        let json: serde_json::Value = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["externalAccountBinding"]["protected"], "p");
    }

    #[test]
    fn test_new_order_builds_dns_identifiers() {
        let payload = NewOrderPayload::new(&["example.com", "*.example.com"]);
        assert_eq!(payload.identifiers.len(), 2);
        assert_eq!(payload.identifiers[0], Identifier::dns("example.com"));
        assert_eq!(payload.identifiers[1].type_, "dns");
    }

    #[test]
    fn test_challenge_validation_serializes_to_empty_object() {
        let payload = ChallengeValidationPayload::new();
        assert_eq!(payload.to_json_string().unwrap(), "{}");
    }

    #[test]
    fn test_finalize_payload_field_name() {
        let payload = FinalizeOrderPayload::new("Q1NS");
        let json: serde_json::Value = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["csr"], "Q1NS");
    }
}
