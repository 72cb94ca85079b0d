//! JWS 簽名輸入的組合與簽名產生。

use crate::{error::Result, key_pair::KeyPair};

/// 根據已編碼的標頭與 payload 產生 JWS 簽名。
///
/// 簽名輸入為 `header_b64 || "." || payload_b64`，POST-as-GET 時
/// payload 為空字串，輸入即以 `.` 結尾。回傳 URL-safe Base64 簽名值。
pub fn create_signature(
    header_b64: &str,
    payload_b64: &str,
    key_pair: &KeyPair,
) -> Result<String> {
    let signing_input = format!("{header_b64}.{payload_b64}");
    key_pair.sign(signing_input.as_bytes())
}
