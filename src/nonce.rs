//! Replay-Nonce 的池化管理。
//!
//! 每次 ACME 回應都會附帶一個新的 `Replay-Nonce` 標頭，
//! 此池以後進先出的方式保存它們，讓連續請求不必每次都額外呼叫
//! `newNonce` 端點。

use parking_lot::Mutex;

/// 後進先出的 nonce 池。
///
/// 取出時優先回傳最近收到的 nonce，降低使用到過期值的機率。
#[derive(Debug, Default)]
pub struct NoncePool {
    pool: Mutex<Vec<String>>,
}

impl NoncePool {
    /// 建立一個空的池。
    pub fn new() -> Self {
        Self::default()
    }

    /// 將回應附帶的 nonce 放入池中。
    pub fn put(&self, nonce: impl Into<String>) {
        let nonce = nonce.into();
        if nonce.is_empty() {
            return;
        }

        log::trace!("nonce pool <- {nonce}");
        self.pool.lock().push(nonce);
    }

    /// 取出最近放入的 nonce，池為空時回傳 `None`。
    pub fn take(&self) -> Option<String> {
        let nonce = self.pool.lock().pop();
        if let Some(n) = &nonce {
            log::trace!("nonce pool -> {n}");
        }
        nonce
    }

    /// 目前池中的 nonce 數量。
    pub fn len(&self) -> usize {
        self.pool.lock().len()
    }

    /// 池是否為空。
    pub fn is_empty(&self) -> bool {
        self.pool.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_from_empty_pool() {
        let pool = NoncePool::new();
        assert!(pool.take().is_none());
    }

    #[test]
    fn test_lifo_order() {
        let pool = NoncePool::new();
        pool.put("first");
        pool.put("second");
        pool.put("third");

        assert_eq!(pool.take().as_deref(), Some("third"));
        assert_eq!(pool.take().as_deref(), Some("second"));
        assert_eq!(pool.take().as_deref(), Some("first"));
        assert!(pool.take().is_none());
    }

    #[test]
    fn test_empty_nonce_is_ignored() {
        let pool = NoncePool::new();
        pool.put("");
        assert!(pool.is_empty());
    }

    #[test]
    fn test_len_tracks_pool_size() {
        let pool = NoncePool::new();
        pool.put("a");
        pool.put("b");
        assert_eq!(pool.len(), 2);
        pool.take();
        assert_eq!(pool.len(), 1);
    }
}
