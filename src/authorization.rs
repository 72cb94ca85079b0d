//! 單一識別項的授權記錄。

use serde::Deserialize;

use crate::{
    ca::Ca,
    challenge::{Challenge, ChallengeType},
    error::{AcmeError, Result},
    payload::Identifier,
};

/// 授權狀態。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationStatus {
    Pending,
    Valid,
    Invalid,
    Deactivated,
    Expired,
    Revoked,
}

/// 一個識別項的授權快照，包含其所有可用的驗證挑戰。
#[derive(Debug, Clone, Deserialize)]
pub struct Authorization {
    pub identifier: Identifier,
    pub status: AuthorizationStatus,
    /// 授權過期時間，`valid` 狀態下必定存在。
    pub expires: Option<String>,
    /// 萬用字元域名的授權，缺席時視為 `false`。
    #[serde(default)]
    pub wildcard: bool,
    pub challenges: Vec<Challenge>,
    /// 授權本身的 URL，由取得時補上，不在回應內容中。
    #[serde(skip)]
    pub url: String,
}

impl Authorization {
    /// 解析授權回應並驗證結構。
    pub fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|_| AcmeError::MalformedResponse(body.to_owned()))
    }

    /// 以 POST-as-GET 取得授權的最新快照。
    pub fn restore(ca: &Ca, url: &str) -> Result<Self> {
        let response = ca.post_as_get(url)?;
        let mut authorization = Self::parse(&response.body)?;
        authorization.url = url.to_owned();
        Ok(authorization)
    }

    /// 重新取得快照以觀察狀態轉移。
    pub fn verify(&self, ca: &Ca) -> Result<Self> {
        Self::restore(ca, &self.url)
    }

    fn challenge_of(&self, challenge_type: ChallengeType) -> Option<&Challenge> {
        self.challenges
            .iter()
            .find(|c| c.challenge_type == challenge_type)
    }

    /// 第一個 `http-01` 挑戰，CA 未提供時為 `None`。
    pub fn challenge_http(&self) -> Option<&Challenge> {
        self.challenge_of(ChallengeType::Http01)
    }

    /// 第一個 `dns-01` 挑戰。
    pub fn challenge_dns(&self) -> Option<&Challenge> {
        self.challenge_of(ChallengeType::Dns01)
    }

    /// 第一個 `tls-alpn-01` 挑戰。
    pub fn challenge_tls_alpn(&self) -> Option<&Challenge> {
        self.challenge_of(ChallengeType::TlsAlpn01)
    }

    pub fn is_pending(&self) -> bool {
        self.status == AuthorizationStatus::Pending
    }

    pub fn is_valid(&self) -> bool {
        self.status == AuthorizationStatus::Valid
    }

    pub fn is_invalid(&self) -> bool {
        self.status == AuthorizationStatus::Invalid
    }

    pub fn is_deactivated(&self) -> bool {
        self.status == AuthorizationStatus::Deactivated
    }

    pub fn is_expired(&self) -> bool {
        self.status == AuthorizationStatus::Expired
    }

    pub fn is_revoked(&self) -> bool {
        self.status == AuthorizationStatus::Revoked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTHORIZATION: &str = r#"{
        "identifier": { "type": "dns", "value": "example.com" },
        "status": "pending",
        "expires": "2026-09-01T00:00:00Z",
        "challenges": [
            {
                "type": "http-01",
                "status": "pending",
                "url": "https://example.com/acme/chall/http",
                "token": "token-http"
            },
            {
                "type": "dns-01",
                "status": "pending",
                "url": "https://example.com/acme/chall/dns",
                "token": "token-dns"
            }
        ]
    }"#;

    #[test]
    fn test_parse_authorization() {
        let authorization = Authorization::parse(AUTHORIZATION).unwrap();
        assert_eq!(authorization.identifier.value, "example.com");
        assert!(authorization.is_pending());
        assert!(!authorization.wildcard);
        assert_eq!(authorization.challenges.len(), 2);
    }

    #[test]
    fn test_challenge_selectors() {
        let authorization = Authorization::parse(AUTHORIZATION).unwrap();
        assert_eq!(
            authorization.challenge_http().map(|c| c.token.as_str()),
            Some("token-http")
        );
        assert_eq!(
            authorization.challenge_dns().map(|c| c.token.as_str()),
            Some("token-dns")
        );
        assert!(authorization.challenge_tls_alpn().is_none());
    }

    #[test]
    fn test_wildcard_flag_parsed() {
        let body = r#"{
            "identifier": { "type": "dns", "value": "example.com" },
            "status": "valid",
            "expires": "2026-09-01T00:00:00Z",
            "wildcard": true,
            "challenges": []
        }"#;
        let authorization = Authorization::parse(body).unwrap();
        assert!(authorization.wildcard);
        assert!(authorization.is_valid());
    }

    #[test]
    fn test_parse_rejects_missing_identifier() {
        let body = r#"{ "status": "pending", "challenges": [] }"#;
        assert!(matches!(
            Authorization::parse(body),
            Err(AcmeError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_status() {
        let body = r#"{
            "identifier": { "type": "dns", "value": "example.com" },
            "status": "paused",
            "challenges": []
        }"#;
        assert!(matches!(
            Authorization::parse(body),
            Err(AcmeError::MalformedResponse(_))
        ));
    }
}
