//! 統一的錯誤分類模組。
//!
//! ACME 引擎的所有公開操作要麼回傳完整驗證過的結果，要麼以此處定義的
//! [`AcmeError`] 失敗；任何操作都不會在失敗時回傳部分填充的資料。
//! 協議層錯誤（CA 回報的錯誤文件）與傳輸層錯誤（無法解析的非 2xx 回應）
//! 在此明確區分。

use serde::Deserialize;
use thiserror::Error;

/// ACME 引擎的錯誤列舉。
#[derive(Debug, Error)]
pub enum AcmeError {
    /// 在目錄探索完成前嘗試進行需要認證或 nonce 的操作。
    #[error("Directory has not been discovered yet")]
    NotDiscovered,

    /// CA 回應未通過結構驗證，攜帶原始回應內容以便除錯。
    #[error("Response format was malformed: {0}")]
    MalformedResponse(String),

    /// CA 回報的協議層錯誤（符合 RFC 8555 錯誤文件格式）。
    #[error("[{error_type}] {detail}")]
    ErrorResponse {
        error_type: String,
        detail: String,
        status: Option<u16>,
    },

    /// 非 2xx 回應且內容不符合 CA 錯誤文件格式，只能以原始狀態與內容呈現。
    #[error("Request failed: {status} {status_text}: {body}")]
    TransportFailure {
        status: u16,
        status_text: String,
        body: String,
    },

    /// 建立帳戶後回應缺少 `Location` 標頭。
    #[error("Account URL not found in newAccount response")]
    MissingAccountUrl,

    /// 建立訂單後回應缺少 `Location` 標頭。
    #[error("Order URL not found in newOrder response")]
    MissingOrderUrl,

    /// 帳戶尚未同時具備金鑰對與 accountUrl。
    #[error("Account is not initialized yet")]
    NotInitialized,

    /// 不支援的簽名演算法。
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// 金鑰缺少操作所需的參數。
    #[error("Key is missing required parameters: {0}")]
    IncompleteKey(String),

    /// 功能尚未實作（例如 tls-alpn-01 的 key authorization 發布格式）。
    #[error("{0} is not implemented")]
    NotImplemented(String),

    /// 回應缺少 `Replay-Nonce` 標頭。
    #[error("No Replay-Nonce header found in response")]
    MissingNonce,

    /// 查無此名稱的 CA。
    #[error("Unknown certificate authority: {0}")]
    UnknownCa(String),

    /// 該 CA 不提供 staging 環境。
    #[error("No staging environment in {0}")]
    NoStagingEnvironment(String),

    /// 該 CA 不支援 External Account Binding 憑證查詢。
    #[error("External account binding is not supported by {0}")]
    ExternalAccountUnsupported(String),

    /// External Account Binding 憑證查詢失敗。
    #[error("Failed to fetch external account credentials: {0}")]
    ExternalAccountLookup(String),

    /// 訂單尚無可下載的憑證 URL。
    #[error("Certificate is not ready for download")]
    CertificateNotReady,

    /// CSR 需要至少一個域名。
    #[error("No SAN entries")]
    NoSanEntries,

    /// HTTP 請求錯誤。
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON 序列化錯誤。
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// OpenSSL 錯誤。
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    /// Base64 解碼錯誤。
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// 時間戳解析錯誤。
    #[error("Timestamp parse error: {0}")]
    Timestamp(#[from] chrono::ParseError),

    /// UTF-8 轉換錯誤。
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// 簡化引擎操作結果的型別。
pub type Result<T> = std::result::Result<T, AcmeError>;

/// CA 錯誤文件格式。
///
/// RFC 8555 並未強制 `status` 欄位，部分 CA（例如 BuyPass）改用 `code`；
/// [`ErrorDescription::status`] 會在 `status` 缺席時回退到 `code`。
#[derive(Debug, Deserialize)]
pub struct ErrorDescription {
    #[serde(rename = "type")]
    pub error_type: String,
    pub detail: String,
    status: Option<u16>,
    code: Option<u16>,
}

impl ErrorDescription {
    /// 取得錯誤狀態碼，`status` 缺席時回退到 `code` 欄位。
    pub fn status(&self) -> Option<u16> {
        self.status.or(self.code)
    }
}

impl From<ErrorDescription> for AcmeError {
    fn from(desc: ErrorDescription) -> Self {
        let status = desc.status();
        AcmeError::ErrorResponse {
            error_type: desc.error_type,
            detail: desc.detail,
            status,
        }
    }
}
