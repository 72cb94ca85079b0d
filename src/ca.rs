//! CA 會話：供應商設定表、目錄探索與帳戶生命週期的進入點。

use serde::Deserialize;

use crate::{
    account::{create_external_account_binding, Account, AccountCredentials, ExternalAccount},
    authorization::Authorization,
    challenge::Challenge,
    directory::Directory,
    error::{AcmeError, Result},
    key_pair::{Algorithm, KeyPair},
    nonce::NoncePool,
    order::Order,
    payload::{NewAccountPayload, PayloadT},
    request::{HttpClient, HttpResponse, Requester, TransportT},
};

/// CA 執行環境。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Staging,
}

/// 已知 CA 的靜態設定。
///
/// 各供應商之間只差在資料（目錄 URL 與 EAB 憑證查詢端點），
/// 行為一律相同，因此以查表取代子類別。
struct CaProfile {
    name: &'static str,
    production_url: &'static str,
    staging_url: Option<&'static str>,
    eab_lookup_url: Option<&'static str>,
}

const PROFILES: &[CaProfile] = &[
    CaProfile {
        name: "LetsEncrypt",
        production_url: "https://acme-v02.api.letsencrypt.org/directory",
        staging_url: Some("https://acme-staging-v02.api.letsencrypt.org/directory"),
        eab_lookup_url: None,
    },
    CaProfile {
        name: "ZeroSSL",
        production_url: "https://acme.zerossl.com/v2/DV90/directory",
        staging_url: None,
        eab_lookup_url: Some("https://api.zerossl.com/acme/eab-credentials-email"),
    },
    CaProfile {
        name: "BuyPass",
        production_url: "https://api.buypass.com/acme/directory",
        staging_url: Some("https://api.test4.buypass.no/acme/directory"),
        eab_lookup_url: None,
    },
];

/// EAB 憑證查詢端點的回應格式（ZeroSSL）。
#[derive(Debug, Deserialize)]
struct EabCredentialResponse {
    #[serde(default)]
    success: bool,
    eab_kid: Option<String>,
    eab_hmac_key: Option<String>,
}

/// 一個 CA 會話。
///
/// 持有 HTTP 客戶端、nonce 池、探索後的目錄與目前帳戶。
/// 所有工作流程物件（訂單、授權、挑戰）都透過會話發送請求。
#[derive(Debug)]
pub struct Ca {
    name: String,
    directory_url: String,
    eab_lookup_url: Option<String>,
    http: Box<dyn TransportT>,
    nonce_pool: NoncePool,
    directory: Option<Directory>,
    account: Option<Account>,
}

impl Ca {
    /// 依名稱與環境建立已知 CA 的會話。
    ///
    /// 名稱不分大小寫。ZeroSSL 不提供 staging 環境，
    /// 要求時立即回傳 `NoStagingEnvironment`。
    pub fn new(name: &str, environment: Environment) -> Result<Self> {
        let profile = PROFILES
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| AcmeError::UnknownCa(name.to_owned()))?;

        let directory_url = match environment {
            Environment::Production => profile.production_url,
            Environment::Staging => profile
                .staging_url
                .ok_or_else(|| AcmeError::NoStagingEnvironment(profile.name.to_owned()))?,
        };

        Ok(Ca {
            name: profile.name.to_owned(),
            directory_url: directory_url.to_owned(),
            eab_lookup_url: profile.eab_lookup_url.map(str::to_owned),
            http: Box::new(HttpClient::new()),
            nonce_pool: NoncePool::new(),
            directory: None,
            account: None,
        })
    }

    /// 以自訂目錄 URL 建立會話，用於任何符合 RFC 8555 的 CA。
    pub fn from_directory_url(url: impl Into<String>) -> Self {
        let directory_url = url.into();
        Ca {
            name: directory_url.clone(),
            directory_url,
            eab_lookup_url: None,
            http: Box::new(HttpClient::new()),
            nonce_pool: NoncePool::new(),
            directory: None,
            account: None,
        }
    }

    /// CA 名稱（自訂會話為目錄 URL）。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 目錄 URL。
    pub fn directory_url(&self) -> &str {
        &self.directory_url
    }

    /// 取得（重新取得）目錄文件。
    pub fn discover(&mut self) -> Result<&Directory> {
        let directory = Directory::discover(self.http.as_ref(), &self.directory_url)?;
        Ok(self.directory.insert(directory))
    }

    /// 已探索的目錄文件，尚未探索時回傳 `NotDiscovered`。
    pub fn directory(&self) -> Result<&Directory> {
        self.directory.as_ref().ok_or(AcmeError::NotDiscovered)
    }

    /// 目前帳戶，尚未建立或匯入時回傳 `NotInitialized`。
    pub fn account(&self) -> Result<&Account> {
        self.account.as_ref().ok_or(AcmeError::NotInitialized)
    }

    fn requester(&self) -> Result<Requester<'_>> {
        let directory = self.directory()?;
        let account = self.account()?;

        Ok(Requester {
            http: self.http.as_ref(),
            new_nonce_url: &directory.new_nonce,
            nonce_pool: &self.nonce_pool,
            account,
        })
    }

    /// 以目前帳戶發送已簽名的 POST 請求。
    pub fn post(&self, url: &str, payload: &impl PayloadT) -> Result<HttpResponse> {
        self.requester()?.post(url, payload)
    }

    /// 以目前帳戶發送 POST-as-GET 請求。
    pub fn post_as_get(&self, url: &str) -> Result<HttpResponse> {
        self.requester()?.post_as_get(url)
    }

    /// 附帶 `Accept` 標頭的 POST-as-GET 請求。
    pub fn post_as_get_accept(&self, url: &str, accept: &str) -> Result<HttpResponse> {
        self.requester()?.post_as_get_accept(url, accept)
    }

    /// 建立新帳戶。
    ///
    /// 產生新的 ES256 金鑰並向 `newAccount` 端點註冊；目錄的
    /// `meta.externalAccountRequired` 為真時自動查詢並附上
    /// External Account Binding。帳戶 URL 取自 `Location` 標頭，
    /// 缺席時回傳 `MissingAccountUrl`。
    pub fn create_account(&mut self, email: &str) -> Result<&Account> {
        let directory = self.directory()?.clone();

        let key_pair = KeyPair::new(Algorithm::Es256)?;
        let account = Account::new(email, key_pair, None);

        let mut payload = NewAccountPayload::new(email);
        if directory.meta.requires_external_account() {
            let external = self.external_account(email)?;
            let binding = create_external_account_binding(
                &external,
                account.key_pair(),
                &directory.new_account,
            )?;
            payload = payload.with_external_account_binding(binding);
        }

        let requester = Requester {
            http: self.http.as_ref(),
            new_nonce_url: &directory.new_nonce,
            nonce_pool: &self.nonce_pool,
            account: &account,
        };
        let response = requester.post(&directory.new_account, &payload)?;

        let account_url = response
            .header("location")
            .ok_or(AcmeError::MissingAccountUrl)?
            .to_owned();

        let mut account = account;
        account.set_account_url(account_url);
        Ok(self.account.insert(account))
    }

    /// 從先前匯出的憑證匯入帳戶，不發送任何請求。
    pub fn import_account(&mut self, credentials: &AccountCredentials) -> Result<&Account> {
        let account = Account::import(credentials)?;
        Ok(self.account.insert(account))
    }

    /// 匯出目前帳戶的憑證。
    pub fn export_account(&self) -> Result<AccountCredentials> {
        self.account()?.export()
    }

    /// 向 CA 的憑證查詢端點取得外部帳戶憑證。
    ///
    /// 目前僅 ZeroSSL 提供以電子郵件查詢的端點；其餘 CA 回傳
    /// `ExternalAccountUnsupported`。
    pub fn external_account(&self, email: &str) -> Result<ExternalAccount> {
        let url = self
            .eab_lookup_url
            .as_deref()
            .ok_or_else(|| AcmeError::ExternalAccountUnsupported(self.name.clone()))?;

        let response = self
            .http
            .post_form(url, &[("email", email)])?
            .error_for_status()?;

        let credentials: EabCredentialResponse = response.json()?;
        match (credentials.success, credentials.eab_kid, credentials.eab_hmac_key) {
            (true, Some(kid), Some(hmac_key)) => Ok(ExternalAccount { kid, hmac_key }),
            _ => Err(AcmeError::ExternalAccountLookup(response.body)),
        }
    }

    /// 為給定域名建立新訂單。
    pub fn new_order(&self, domains: &[impl AsRef<str>]) -> Result<Order> {
        Order::create(self, domains)
    }

    /// 從訂單 URL 取得訂單快照。
    pub fn restore_order(&self, url: &str) -> Result<Order> {
        Order::restore(self, url)
    }

    /// 從授權 URL 取得授權快照。
    pub fn restore_authorization(&self, url: &str) -> Result<Authorization> {
        Authorization::restore(self, url)
    }

    /// 從挑戰 URL 取得挑戰快照。
    pub fn restore_challenge(&self, url: &str) -> Result<Challenge> {
        Challenge::restore(self, url)
    }
}
