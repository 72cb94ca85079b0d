//! # ACME 協議引擎
//!
//! 本庫實作 RFC 8555 定義的 ACME 協議客戶端引擎，涵蓋：
//!
//! - **ca**: CA 會話，內建 Let's Encrypt、ZeroSSL 與 BuyPass 的
//!   目錄設定，也可指向任何符合 RFC 8555 的目錄 URL。
//! - **account**: 帳戶金鑰生命週期、憑證匯出入與
//!   External Account Binding。
//! - **order / authorization / challenge**: 訂單、授權與挑戰的
//!   狀態機，皆以不可變快照表示，`restore`/`verify` 回傳新快照。
//! - **csr**: 產生 ECDSA 或 RSA 金鑰與 PKCS#10 CSR。
//!
//! 引擎只負責協議層：挑戰回應值由 [`challenge::Challenge::key_authorization`]
//! 計算，實際發布（DNS TXT 記錄、HTTP 文件）由呼叫端處理。
//!
//! ## 示例
//!
//! ```no_run
//! use acme_kit::ca::{Ca, Environment};
//! use acme_kit::key_pair::Algorithm;
//!
//! fn main() -> Result<(), acme_kit::error::AcmeError> {
//!     // 1. 建立 CA 會話並探索目錄
//!     let mut ca = Ca::new("LetsEncrypt", Environment::Staging)?;
//!     ca.discover()?;
//!
//!     // 2. 建立帳戶並下訂單
//!     ca.create_account("user@example.com")?;
//!     let order = ca.new_order(&["example.com"])?;
//!
//!     // 3. 取得挑戰並計算需要發布的回應值
//!     for authorization in order.authorizations(&ca)? {
//!         if let Some(challenge) = authorization.challenge_dns() {
//!             let txt_value = challenge.key_authorization(ca.account()?)?;
//!             println!("_acme-challenge TXT: {txt_value}");
//!             // 發布後觸發 CA 端驗證
//!             challenge.verify(&ca)?;
//!         }
//!     }
//!
//!     // 4. 訂單 ready 後提交 CSR 並下載憑證
//!     let order = order.verify(&ca)?;
//!     let csr = order.csr(Algorithm::Es256)?;
//!     order.finalize(&ca, &csr.csr)?;
//!     let certificate = order.verify(&ca)?.download_certificate(&ca, None)?;
//!     println!("{certificate}");
//!
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod authorization;
pub mod ca;
pub mod challenge;
pub mod csr;
pub mod directory;
pub mod error;
pub mod jwk;
pub mod jws;
pub mod key_pair;
pub mod nonce;
pub mod order;
pub mod payload;
pub mod protection;
pub mod request;
pub mod signature;
