//! JWS 保護標頭（Protected Header）。
//!
//! ACME 對標頭的金鑰識別方式有嚴格規定：`newAccount` 與金鑰輪替的
//! 內層信封必須內嵌完整 `jwk`，其餘所有請求必須改用帳戶 URL 作為
//! `kid`，兩者互斥。此處以列舉的兩個變體來表達這項互斥，
//! 使錯誤的組合無法被構造出來。

use base64::prelude::*;
use serde::Serialize;

use crate::{error::Result, jwk::Jwk, key_pair::Algorithm};

/// JWS 保護標頭，依金鑰識別方式分為兩個變體。
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ProtectedHeader {
    /// 帳戶尚不存在，內嵌完整公開 JWK。
    NewAccount {
        alg: &'static str,
        nonce: String,
        url: String,
        jwk: Jwk,
    },
    /// 帳戶已存在，以帳戶 URL 作為 `kid`。
    ExistingAccount {
        alg: &'static str,
        nonce: String,
        url: String,
        kid: String,
    },
}

impl ProtectedHeader {
    /// 建立內嵌 JWK 的標頭，用於 `newAccount` 請求。
    pub fn new_account(
        alg: Algorithm,
        nonce: impl Into<String>,
        url: impl Into<String>,
        jwk: Jwk,
    ) -> Self {
        ProtectedHeader::NewAccount {
            alg: alg.as_str(),
            nonce: nonce.into(),
            url: url.into(),
            jwk,
        }
    }

    /// 建立以帳戶 URL 為 `kid` 的標頭，用於其餘所有已認證請求。
    pub fn existing_account(
        alg: Algorithm,
        nonce: impl Into<String>,
        url: impl Into<String>,
        kid: impl Into<String>,
    ) -> Self {
        ProtectedHeader::ExistingAccount {
            alg: alg.as_str(),
            nonce: nonce.into(),
            url: url.into(),
            kid: kid.into(),
        }
    }

    /// 序列化後以 URL-safe Base64 編碼，作為 JWS 的 `protected` 欄位。
    pub fn to_base64url(&self) -> Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(BASE64_URL_SAFE_NO_PAD.encode(json.as_bytes()))
    }
}
