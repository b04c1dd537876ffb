// ==========================================
// 经营看板数据导入系统 - 上传取消句柄
// ==========================================
// 基于 tokio watch 通道；克隆后共享同一取消状态
// ==========================================

use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// 请求取消（幂等）
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_is_shared_across_clones() {
        let handle = CancelHandle::new();
        let observer = handle.clone();
        assert!(!observer.is_cancelled());

        let remote = handle.clone();
        tokio::spawn(async move { remote.cancel() }).await.unwrap();
        handle.cancel();

        assert!(observer.is_cancelled());
        assert!(handle.is_cancelled());
        assert!(!CancelHandle::default().is_cancelled());
    }
}
