//! JSON Web Signature (JWS) 的扁平化 JSON 信封。

use serde::{Deserialize, Serialize};

use crate::{error::Result, key_pair::KeyPair, protection::ProtectedHeader, signature};

/// 扁平化 JSON 序列化的 JWS 物件。
///
/// 三個欄位皆為 URL-safe Base64 字串：`protected` 是保護標頭，
/// `payload` 是請求內容（POST-as-GET 時為空字串），`signature` 是
/// 對 `protected || "." || payload` 的簽名。
#[derive(Debug, Serialize, Deserialize)]
pub struct Jws {
    pub protected: String,
    pub payload: String,
    pub signature: String,
}

impl Jws {
    /// 以帳戶金鑰簽出一個完整的 JWS 信封。
    ///
    /// `payload_b64` 為 `None` 時產生空 payload 的 POST-as-GET 信封。
    pub fn sign(
        header: &ProtectedHeader,
        payload_b64: Option<String>,
        key_pair: &KeyPair,
    ) -> Result<Self> {
        let protected = header.to_base64url()?;
        let payload = payload_b64.unwrap_or_default();
        let signature = signature::create_signature(&protected, &payload, key_pair)?;

        Ok(Jws {
            protected,
            payload,
            signature,
        })
    }

    /// 序列化為傳輸用的 JSON 字串。
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_pair::Algorithm;
    use base64::prelude::*;

    #[test]
    fn test_post_as_get_has_empty_payload() {
        let key_pair = KeyPair::new(Algorithm::Es256).unwrap();
        let header = ProtectedHeader::existing_account(
            key_pair.alg,
            "nonce-1",
            "https://example.com/acme/order/1",
            "https://example.com/acme/acct/1",
        );

        let jws = Jws::sign(&header, None, &key_pair).unwrap();
        assert_eq!(jws.payload, "");
        assert!(!jws.signature.is_empty());
    }

    #[test]
    fn test_signature_covers_protected_and_payload() {
        let key_pair = KeyPair::new(Algorithm::Es256).unwrap();
        let header = ProtectedHeader::new_account(
            key_pair.alg,
            "nonce-1",
            "https://example.com/acme/new-acct",
            key_pair.public_jwk().unwrap(),
        );
        let payload = BASE64_URL_SAFE_NO_PAD.encode(r#"{"termsOfServiceAgreed":true}"#);

        let jws = Jws::sign(&header, Some(payload.clone()), &key_pair).unwrap();
        assert_eq!(jws.payload, payload);

        let json: serde_json::Value =
            serde_json::from_str(&jws.to_json().unwrap()).unwrap();
        assert!(json["protected"].is_string());
        assert!(json["payload"].is_string());
        assert!(json["signature"].is_string());
    }
}
