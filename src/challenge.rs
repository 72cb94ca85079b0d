//! ACME 驗證挑戰的快照與 key authorization 計算。

use base64::prelude::*;
use openssl::sha::sha256;
use serde::Deserialize;

use crate::{
    account::Account,
    ca::Ca,
    error::{AcmeError, Result},
    payload::ChallengeValidationPayload,
};

/// 挑戰類型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ChallengeType {
    #[serde(rename = "http-01")]
    Http01,
    #[serde(rename = "dns-01")]
    Dns01,
    #[serde(rename = "tls-alpn-01")]
    TlsAlpn01,
}

impl ChallengeType {
    /// 挑戰類型在協議中的字串表示。
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http01 => "http-01",
            Self::Dns01 => "dns-01",
            Self::TlsAlpn01 => "tls-alpn-01",
        }
    }
}

/// 挑戰狀態。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    Pending,
    Processing,
    Valid,
    Invalid,
}

/// 一個驗證挑戰的不可變快照。
///
/// `restore` 與 `verify` 都回傳新的快照而不就地更新，
/// 呼叫端以最新一份快照為準。
#[derive(Debug, Clone, Deserialize)]
pub struct Challenge {
    #[serde(rename = "type")]
    pub challenge_type: ChallengeType,
    pub status: ChallengeStatus,
    pub url: String,
    pub token: String,
    /// 驗證完成時間，僅在驗證成功後出現。
    pub validated: Option<String>,
}

impl Challenge {
    /// 解析挑戰回應並驗證結構。
    pub fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|_| AcmeError::MalformedResponse(body.to_owned()))
    }

    /// 取得挑戰的最新快照。
    ///
    /// RFC 8555 §7.5.1 規定對挑戰 URL 的 POST 以空 JSON 物件為
    /// payload，同一請求同時觸發 CA 端驗證。
    pub fn restore(ca: &Ca, url: &str) -> Result<Self> {
        let response = ca.post(url, &ChallengeValidationPayload::new())?;
        Self::parse(&response.body)
    }

    /// 請求 CA 端驗證並回傳刷新後的快照。
    pub fn verify(&self, ca: &Ca) -> Result<Self> {
        Self::restore(ca, &self.url)
    }

    /// 計算挑戰回應方需要發布的 key authorization 值。
    ///
    /// - `http-01`：`token + "." + 帳戶金鑰縮影`，原樣發布在
    ///   `/.well-known/acme-challenge/<token>`。
    /// - `dns-01`：上述字串的 SHA-256，URL-safe Base64 編碼，
    ///   發布為 `_acme-challenge` TXT 記錄。
    /// - `tls-alpn-01`：需要簽發含特殊擴充的自簽憑證，本引擎
    ///   不提供，回傳 `NotImplemented`。
    pub fn key_authorization(&self, account: &Account) -> Result<String> {
        let thumbprint = account.thumbprint()?;
        let key_auth = format!("{}.{}", self.token, thumbprint);

        match self.challenge_type {
            ChallengeType::Http01 => Ok(key_auth),
            ChallengeType::Dns01 => {
                let digest = sha256(key_auth.as_bytes());
                Ok(BASE64_URL_SAFE_NO_PAD.encode(digest))
            }
            ChallengeType::TlsAlpn01 => {
                Err(AcmeError::NotImplemented("tls-alpn-01".to_owned()))
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ChallengeStatus::Pending
    }

    pub fn is_processing(&self) -> bool {
        self.status == ChallengeStatus::Processing
    }

    pub fn is_valid(&self) -> bool {
        self.status == ChallengeStatus::Valid
    }

    pub fn is_invalid(&self) -> bool {
        self.status == ChallengeStatus::Invalid
    }
}
