//! ACME 目錄文件的探索與結構驗證。

use serde::Deserialize;

use crate::{
    error::{AcmeError, Result},
    request::TransportT,
};

/// 目錄文件中的 `meta` 欄位。
///
/// 所有成員皆為可選；目錄未提供 `meta` 時以預設值補上，
/// 讓後續查詢不必區分「缺席」與「空物件」。
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DirectoryMeta {
    #[serde(rename = "termsOfService")]
    pub terms_of_service: Option<String>,
    pub website: Option<String>,
    #[serde(rename = "caaIdentities")]
    pub caa_identities: Option<Vec<String>>,
    #[serde(rename = "externalAccountRequired")]
    pub external_account_required: Option<bool>,
}

impl DirectoryMeta {
    /// CA 是否要求 External Account Binding。
    pub fn requires_external_account(&self) -> bool {
        self.external_account_required.unwrap_or(false)
    }
}

/// ACME 目錄文件，包含各操作端點的 URL。
#[derive(Debug, Clone, Deserialize)]
pub struct Directory {
    #[serde(rename = "newNonce")]
    pub new_nonce: String,
    #[serde(rename = "newAccount")]
    pub new_account: String,
    #[serde(rename = "newOrder")]
    pub new_order: String,
    #[serde(rename = "revokeCert")]
    pub revoke_cert: String,
    #[serde(rename = "keyChange")]
    pub key_change: String,
    /// ACME Renewal Information 擴充端點，多數 CA 尚未提供。
    #[serde(rename = "renewalInfo")]
    pub renewal_info: Option<String>,
    #[serde(default)]
    pub meta: DirectoryMeta,
}

impl Directory {
    /// 從目錄 URL 取得並驗證目錄文件。
    pub fn discover(http: &dyn TransportT, url: &str) -> Result<Self> {
        let response = http.get(url, None)?.error_for_status()?;
        Self::parse(&response.body)
    }

    /// 解析目錄文件並驗證結構。
    ///
    /// 五個操作端點皆必須為非空字串，否則以原始內容回報
    /// `MalformedResponse`。
    pub fn parse(body: &str) -> Result<Self> {
        let directory: Directory = serde_json::from_str(body)
            .map_err(|_| AcmeError::MalformedResponse(body.to_owned()))?;

        let endpoints = [
            &directory.new_nonce,
            &directory.new_account,
            &directory.new_order,
            &directory.revoke_cert,
            &directory.key_change,
        ];
        if endpoints.iter().any(|url| url.is_empty()) {
            return Err(AcmeError::MalformedResponse(body.to_owned()));
        }

        Ok(directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_DIRECTORY: &str = r#"{
        "newNonce": "https://example.com/acme/new-nonce",
        "newAccount": "https://example.com/acme/new-acct",
        "newOrder": "https://example.com/acme/new-order",
        "revokeCert": "https://example.com/acme/revoke-cert",
        "keyChange": "https://example.com/acme/key-change",
        "renewalInfo": "https://example.com/acme/renewal-info",
        "meta": {
            "termsOfService": "https://example.com/terms",
            "website": "https://example.com",
            "caaIdentities": ["example.com"],
            "externalAccountRequired": true
        }
    }"#;

    #[test]
    fn test_parse_full_directory() {
        let directory = Directory::parse(FULL_DIRECTORY).unwrap();
        assert_eq!(directory.new_nonce, "https://example.com/acme/new-nonce");
        assert_eq!(
            directory.renewal_info.as_deref(),
            Some("https://example.com/acme/renewal-info")
        );
        assert_eq!(
            directory.meta.caa_identities.as_deref(),
            Some(["example.com".to_owned()].as_slice())
        );
        assert!(directory.meta.requires_external_account());
    }

    #[test]
    fn test_missing_meta_defaults_to_empty() {
        let body = r#"{
            "newNonce": "https://example.com/nn",
            "newAccount": "https://example.com/na",
            "newOrder": "https://example.com/no",
            "revokeCert": "https://example.com/rc",
            "keyChange": "https://example.com/kc"
        }"#;
        let directory = Directory::parse(body).unwrap();
        assert!(directory.meta.terms_of_service.is_none());
        assert!(!directory.meta.requires_external_account());
        assert!(directory.renewal_info.is_none());
    }

    #[test]
    fn test_missing_endpoint_is_malformed() {
        let body = r#"{
            "newNonce": "https://example.com/nn",
            "newAccount": "https://example.com/na",
            "newOrder": "https://example.com/no"
        }"#;
        assert!(matches!(
            Directory::parse(body),
            Err(AcmeError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_empty_endpoint_is_malformed() {
        let body = r#"{
            "newNonce": "",
            "newAccount": "https://example.com/na",
            "newOrder": "https://example.com/no",
            "revokeCert": "https://example.com/rc",
            "keyChange": "https://example.com/kc"
        }"#;
        assert!(matches!(
            Directory::parse(body),
            Err(AcmeError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_non_list_caa_identities_is_malformed() {
        let body = r#"{
            "newNonce": "https://example.com/nn",
            "newAccount": "https://example.com/na",
            "newOrder": "https://example.com/no",
            "revokeCert": "https://example.com/rc",
            "keyChange": "https://example.com/kc",
            "meta": { "caaIdentities": "example.com" }
        }"#;
        assert!(matches!(
            Directory::parse(body),
            Err(AcmeError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_non_json_body_is_malformed() {
        match Directory::parse("<html>oops</html>") {
            Err(AcmeError::MalformedResponse(body)) => assert_eq!(body, "<html>oops</html>"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
