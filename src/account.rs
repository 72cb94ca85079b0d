//! ACME 帳戶身分：金鑰持有、憑證匯出入與 External Account Binding。

use base64::prelude::*;
use openssl::{hash::MessageDigest, pkey::PKey, sign::Signer};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AcmeError, Result},
    jwk::PrivateJwk,
    jws::Jws,
    key_pair::KeyPair,
};

/// ACME 帳戶身分。
///
/// 持有帳戶金鑰對與註冊後取得的帳戶 URL。帳戶本身不發送任何
/// 請求；註冊與後續操作由 CA 會話負責。
#[derive(Debug)]
pub struct Account {
    email: String,
    key_pair: KeyPair,
    account_url: Option<String>,
}

impl Account {
    pub(crate) fn new(
        email: impl Into<String>,
        key_pair: KeyPair,
        account_url: Option<String>,
    ) -> Self {
        Account {
            email: email.into(),
            key_pair,
            account_url,
        }
    }

    /// 帳戶聯絡用電子郵件。
    pub fn email(&self) -> &str {
        &self.email
    }

    /// 帳戶金鑰對。
    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    /// 註冊後由 CA 指派的帳戶 URL，未註冊時為 `None`。
    pub fn account_url(&self) -> Option<&str> {
        self.account_url.as_deref()
    }

    pub(crate) fn set_account_url(&mut self, url: String) {
        self.account_url = Some(url);
    }

    /// 從先前匯出的憑證重建帳戶。
    ///
    /// 簽名演算法由憑證中 JWK 的 `kty` 決定。
    pub fn import(credentials: &AccountCredentials) -> Result<Self> {
        let key_pair = KeyPair::from_jwk(&credentials.jwk)?;

        Ok(Account {
            email: credentials.email.clone(),
            key_pair,
            account_url: Some(credentials.account_url.clone()),
        })
    }

    /// 匯出可持久化的帳戶憑證。
    ///
    /// 帳戶必須已完成註冊（具備帳戶 URL），否則回傳 `NotInitialized`。
    pub fn export(&self) -> Result<AccountCredentials> {
        let account_url = self
            .account_url
            .clone()
            .ok_or(AcmeError::NotInitialized)?;

        Ok(AccountCredentials {
            email: self.email.clone(),
            account_url,
            jwk: self.key_pair.private_jwk()?,
        })
    }

    /// 帳戶公開金鑰的 RFC 7638 縮影。
    pub fn thumbprint(&self) -> Result<String> {
        self.key_pair.thumbprint()
    }
}

/// 可持久化的帳戶憑證，包含含私鑰成員的 JWK。
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountCredentials {
    pub email: String,
    #[serde(rename = "accountUrl")]
    pub account_url: String,
    pub jwk: PrivateJwk,
}

/// CA 預先發放的外部帳戶憑證。
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalAccount {
    pub kid: String,
    /// Base64 編碼的 HMAC 金鑰，URL-safe 與標準編碼皆接受。
    #[serde(rename = "hmacKey")]
    pub hmac_key: String,
}

/// 外部帳戶綁定信封的保護標頭。
#[derive(Debug, Serialize)]
struct BindingHeader<'a> {
    alg: &'static str,
    kid: &'a str,
    url: &'a str,
}

/// 建立 External Account Binding 的內層 JWS。
///
/// 內層信封以 HS256 簽名：保護標頭攜帶 CA 發放的 `kid` 與
/// `newAccount` URL，payload 為帳戶公開 JWK，簽名金鑰為 CA 發放的
/// HMAC 金鑰。此信封不含 nonce。
pub fn create_external_account_binding(
    external: &ExternalAccount,
    key_pair: &KeyPair,
    new_account_url: &str,
) -> Result<Jws> {
    let header = BindingHeader {
        alg: "HS256",
        kid: &external.kid,
        url: new_account_url,
    };
    let protected = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_string(&header)?.as_bytes());
    let payload = key_pair.public_jwk_base64url()?;

    let hmac_key = decode_hmac_key(&external.hmac_key)?;
    let pkey = PKey::hmac(&hmac_key)?;
    let mut signer = Signer::new(MessageDigest::sha256(), &pkey)?;
    signer.update(format!("{protected}.{payload}").as_bytes())?;
    let signature = BASE64_URL_SAFE_NO_PAD.encode(signer.sign_to_vec()?);

    Ok(Jws {
        protected,
        payload,
        signature,
    })
}

/// 解碼 HMAC 金鑰，優先以 URL-safe 無填充解碼，失敗時回退到
/// 標準 Base64。
fn decode_hmac_key(encoded: &str) -> Result<Vec<u8>> {
    if let Ok(key) = BASE64_URL_SAFE_NO_PAD.decode(encoded) {
        return Ok(key);
    }
    Ok(BASE64_STANDARD.decode(encoded)?)
}
