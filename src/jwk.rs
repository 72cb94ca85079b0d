//! JSON Web Key (JWK) 的表示與 RFC 7638 縮影計算。

use base64::prelude::*;
use openssl::sha::sha256;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// 公開 JWK，依 `kty` 欄位區分 EC (P-256) 與 RSA 兩種格式。
///
/// 所有座標與模數欄位皆為 URL-safe、無填充的 Base64 字串。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kty")]
pub enum Jwk {
    /// P-256 橢圓曲線公鑰。
    #[serde(rename = "EC")]
    Ec { crv: String, x: String, y: String },
    /// RSA 公鑰。
    #[serde(rename = "RSA")]
    Rsa { n: String, e: String },
}

impl Jwk {
    /// 計算 RFC 7638 定義的 JWK 縮影。
    ///
    /// 縮影只涵蓋必要成員，且成員必須以字典序排列後序列化，
    /// 再對該 JSON 位元組做 SHA-256 並以 URL-safe Base64 編碼。
    pub fn thumbprint(&self) -> Result<String> {
        let mut members = Map::new();
        match self {
            Jwk::Ec { crv, x, y } => {
                members.insert("crv".to_owned(), Value::String(crv.clone()));
                members.insert("kty".to_owned(), Value::String("EC".to_owned()));
                members.insert("x".to_owned(), Value::String(x.clone()));
                members.insert("y".to_owned(), Value::String(y.clone()));
            }
            Jwk::Rsa { n, e } => {
                members.insert("e".to_owned(), Value::String(e.clone()));
                members.insert("kty".to_owned(), Value::String("RSA".to_owned()));
                members.insert("n".to_owned(), Value::String(n.clone()));
            }
        }

        let canonical = serde_json::to_string(&Value::Object(members))?;
        let hash = sha256(canonical.as_bytes());
        Ok(BASE64_URL_SAFE_NO_PAD.encode(hash))
    }

    /// 取得金鑰類型字串（`EC` 或 `RSA`）。
    pub fn kty(&self) -> &'static str {
        match self {
            Jwk::Ec { .. } => "EC",
            Jwk::Rsa { .. } => "RSA",
        }
    }
}

/// 含私鑰成員的 JWK，用於帳戶憑證的匯出與匯入。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kty")]
pub enum PrivateJwk {
    /// P-256 橢圓曲線私鑰，`d` 為私鑰純量。
    #[serde(rename = "EC")]
    Ec {
        crv: String,
        x: String,
        y: String,
        d: String,
    },
    /// RSA 私鑰，包含 CRT 參數。
    #[serde(rename = "RSA")]
    Rsa {
        n: String,
        e: String,
        d: String,
        p: String,
        q: String,
        dp: String,
        dq: String,
        qi: String,
    },
}

impl PrivateJwk {
    /// 去除私鑰成員後的公開 JWK。
    pub fn to_public(&self) -> Jwk {
        match self {
            PrivateJwk::Ec { crv, x, y, .. } => Jwk::Ec {
                crv: crv.clone(),
                x: x.clone(),
                y: y.clone(),
            },
            PrivateJwk::Rsa { n, e, .. } => Jwk::Rsa {
                n: n.clone(),
                e: e.clone(),
            },
        }
    }
}
