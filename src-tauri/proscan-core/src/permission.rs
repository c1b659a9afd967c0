//! 权限查询与弹窗协商。
//!
//! 弹窗必须在 UI 所在的上下文里发起，而导入流程不能阻塞调用方。
//! `PermissionBroker` 把每次弹窗请求按 id 挂起（oneshot），通过 mpsc 交给唯一的 UI 任务，
//! UI 任务拿到用户选择后调用 `resolve(id, state)` 唤醒对应的导入，`serve` 即这样一个循环。
//! 多个请求同时挂起互不覆盖；每个结果只投递一次。等待方被丢弃时挂起项随之移除。

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::capability::PermissionRequirement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionState {
    Granted,
    /// iOS 的“有限访问”，对仅添加场景等同于已授权
    Limited,
    Denied,
    /// 尚未询问过用户
    Prompt,
}

impl PermissionState {
    pub fn allows_write(&self) -> bool {
        matches!(self, PermissionState::Granted | PermissionState::Limited)
    }
}

/// 权限来源。桌面端为固定值，移动端由原生插件或 broker 提供。
#[async_trait]
pub trait PermissionGate: Send + Sync {
    async fn status(&self, requirement: PermissionRequirement) -> PermissionState;

    /// 弹窗询问用户。每次导入最多调用一次，被拒绝后不重试。
    async fn request(&self, requirement: PermissionRequirement) -> PermissionState;
}

/// 固定返回同一状态的权限来源（桌面端无需权限时使用）。
#[derive(Debug, Clone, Copy)]
pub struct FixedPermissionGate(pub PermissionState);

#[async_trait]
impl PermissionGate for FixedPermissionGate {
    async fn status(&self, _requirement: PermissionRequirement) -> PermissionState {
        self.0
    }

    async fn request(&self, _requirement: PermissionRequirement) -> PermissionState {
        self.0
    }
}

/// 交给 UI 任务的弹窗请求。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub id: Uuid,
    pub requirement: PermissionRequirement,
}

#[derive(Clone)]
pub struct PermissionBroker {
    inner: Arc<BrokerInner>,
}

struct BrokerInner {
    status: RwLock<PermissionState>,
    pending: Mutex<HashMap<Uuid, oneshot::Sender<PermissionState>>>,
    prompts: mpsc::UnboundedSender<PromptRequest>,
}

impl PermissionBroker {
    /// 返回 broker 与 UI 侧的接收端。接收端应交给唯一的 UI 任务消费。
    pub fn new(initial: PermissionState) -> (Self, mpsc::UnboundedReceiver<PromptRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let broker = Self {
            inner: Arc::new(BrokerInner {
                status: RwLock::new(initial),
                pending: Mutex::new(HashMap::new()),
                prompts: tx,
            }),
        };
        (broker, rx)
    }

    /// 宿主在系统权限变化时同步当前状态（如从设置页返回）。
    pub fn set_status(&self, state: PermissionState) {
        if let Ok(mut s) = self.inner.status.write() {
            *s = state;
        }
    }

    /// UI 任务投递用户选择。未知或已投递过的 id 返回 false。
    pub fn resolve(&self, id: Uuid, state: PermissionState) -> bool {
        let sender = match self.inner.pending.lock() {
            Ok(mut pending) => pending.remove(&id),
            Err(_) => None,
        };
        let Some(sender) = sender else {
            log::warn!("[permission] 忽略未知或已完成的弹窗结果: {}", id);
            return false;
        };
        if state.allows_write() {
            self.set_status(state);
        }
        sender.send(state).is_ok()
    }

    /// 仍在等待用户响应的弹窗数量。
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    fn forget(&self, id: &Uuid) {
        if let Ok(mut pending) = self.inner.pending.lock() {
            pending.remove(id);
        }
    }

    /// UI 任务主循环：逐个取出弹窗请求，交给 `ask` 询问用户后投递结果。
    /// 同一时间只弹一个窗；接收端关闭时返回。
    pub async fn serve<F, Fut>(self, mut prompts: mpsc::UnboundedReceiver<PromptRequest>, ask: F)
    where
        F: Fn(PermissionRequirement) -> Fut,
        Fut: Future<Output = PermissionState>,
    {
        while let Some(prompt) = prompts.recv().await {
            let state = ask(prompt.requirement).await;
            log::debug!("[permission] 弹窗 {} 结果: {:?}", prompt.id, state);
            self.resolve(prompt.id, state);
        }
        log::debug!("[permission] 弹窗通道已关闭");
    }
}

/// 等待中的弹窗；等待方被丢弃（超时、取消）时移除挂起项。
struct PendingPrompt<'a> {
    broker: &'a PermissionBroker,
    id: Uuid,
}

impl Drop for PendingPrompt<'_> {
    fn drop(&mut self) {
        self.broker.forget(&self.id);
    }
}

#[async_trait]
impl PermissionGate for PermissionBroker {
    async fn status(&self, _requirement: PermissionRequirement) -> PermissionState {
        self.inner
            .status
            .read()
            .map(|s| *s)
            .unwrap_or(PermissionState::Prompt)
    }

    async fn request(&self, requirement: PermissionRequirement) -> PermissionState {
        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        match self.inner.pending.lock() {
            Ok(mut pending) => {
                pending.insert(id, tx);
            }
            Err(_) => return PermissionState::Denied,
        }
        if self
            .inner
            .prompts
            .send(PromptRequest { id, requirement })
            .is_err()
        {
            log::warn!("[permission] UI 任务已退出，无法弹窗");
            self.forget(&id);
            return PermissionState::Denied;
        }
        let _pending = PendingPrompt { broker: self, id };
        log::debug!("[permission] 等待用户响应弹窗 {}", id);
        // sender 被丢弃（宿主销毁）视为用户未授权，请求丢失不重试
        rx.await.unwrap_or(PermissionState::Denied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_gate() {
        let gate = FixedPermissionGate(PermissionState::Granted);
        assert_eq!(
            gate.status(PermissionRequirement::None).await,
            PermissionState::Granted
        );
    }

    #[tokio::test]
    async fn test_broker_round_trip() {
        let (broker, mut prompts) = PermissionBroker::new(PermissionState::Prompt);
        let b = broker.clone();
        let waiter = tokio::spawn(async move {
            b.request(PermissionRequirement::LegacyStorageWrite).await
        });

        let prompt = prompts.recv().await.unwrap();
        assert_eq!(prompt.requirement, PermissionRequirement::LegacyStorageWrite);
        assert_eq!(broker.pending_count(), 1);
        assert!(broker.resolve(prompt.id, PermissionState::Granted));
        assert_eq!(waiter.await.unwrap(), PermissionState::Granted);
        assert_eq!(broker.pending_count(), 0);

        // 授权结果会同步到当前状态
        assert_eq!(
            broker.status(PermissionRequirement::LegacyStorageWrite).await,
            PermissionState::Granted
        );
        // 同一个 id 只投递一次
        assert!(!broker.resolve(prompt.id, PermissionState::Granted));
    }

    #[tokio::test]
    async fn test_concurrent_prompts_do_not_overwrite() {
        let (broker, mut prompts) = PermissionBroker::new(PermissionState::Prompt);
        let b1 = broker.clone();
        let b2 = broker.clone();
        let first = tokio::spawn(async move { b1.request(PermissionRequirement::PhotoLibraryAdd).await });
        let p1 = prompts.recv().await.unwrap();
        let second = tokio::spawn(async move { b2.request(PermissionRequirement::PhotoLibraryAdd).await });
        let p2 = prompts.recv().await.unwrap();
        assert_ne!(p1.id, p2.id);
        assert_eq!(broker.pending_count(), 2);

        assert!(broker.resolve(p2.id, PermissionState::Denied));
        assert!(broker.resolve(p1.id, PermissionState::Limited));
        assert_eq!(first.await.unwrap(), PermissionState::Limited);
        assert_eq!(second.await.unwrap(), PermissionState::Denied);
    }

    #[tokio::test]
    async fn test_ui_gone_is_denied() {
        let (broker, prompts) = PermissionBroker::new(PermissionState::Prompt);
        drop(prompts);
        assert_eq!(
            broker.request(PermissionRequirement::LegacyStorageWrite).await,
            PermissionState::Denied
        );
        assert_eq!(broker.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_request_is_forgotten() {
        let (broker, mut prompts) = PermissionBroker::new(PermissionState::Prompt);
        let res = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            broker.request(PermissionRequirement::PhotoLibraryAdd),
        )
        .await;
        assert!(res.is_err());
        assert_eq!(broker.pending_count(), 0);

        // UI 之后才处理到这个弹窗：结果无人接收
        let prompt = prompts.recv().await.unwrap();
        assert!(!broker.resolve(prompt.id, PermissionState::Granted));
        assert_eq!(
            broker.status(PermissionRequirement::PhotoLibraryAdd).await,
            PermissionState::Prompt
        );
    }

    #[tokio::test]
    async fn test_serve_answers_prompts_in_order() {
        let (broker, prompts) = PermissionBroker::new(PermissionState::Prompt);
        let asked = Arc::new(Mutex::new(Vec::new()));
        let ui = {
            let asked = asked.clone();
            tokio::spawn(broker.clone().serve(prompts, move |requirement| {
                let asked = asked.clone();
                async move {
                    asked.lock().unwrap().push(requirement);
                    match requirement {
                        PermissionRequirement::LegacyStorageWrite => PermissionState::Denied,
                        _ => PermissionState::Granted,
                    }
                }
            }))
        };

        assert_eq!(
            broker.request(PermissionRequirement::LegacyStorageWrite).await,
            PermissionState::Denied
        );
        assert_eq!(
            broker.request(PermissionRequirement::PhotoLibraryAdd).await,
            PermissionState::Granted
        );
        assert_eq!(broker.pending_count(), 0);
        assert_eq!(
            *asked.lock().unwrap(),
            vec![
                PermissionRequirement::LegacyStorageWrite,
                PermissionRequirement::PhotoLibraryAdd
            ]
        );
        ui.abort();
    }
}
