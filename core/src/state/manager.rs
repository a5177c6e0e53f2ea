//! 会话管理器

use super::session::SessionState;
use super::types::StateEvent;
use crate::config::SessionConfig;
use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::time::Instant;

/// 会话数量上限与空闲回收时间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_sessions: usize,
    pub idle_ttl: Duration,
}

impl SessionLimits {
    pub fn from_config(cfg: &SessionConfig) -> Self {
        Self {
            max_sessions: cfg.max_sessions.max(1),
            idle_ttl: Duration::from_secs(cfg.idle_ttl_secs),
        }
    }
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

struct SessionSlot {
    state: SessionState,
    touched: Instant,
    /// 最近使用顺序
    seq: u64,
}

/// 会话管理器
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionManagerInner>,
}

struct SessionManagerInner {
    /// 所有会话
    sessions: RwLock<HashMap<String, SessionSlot>>,
    /// 每个会话的运行锁，保证同一会话内串行执行
    run_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    /// 事件广播通道
    event_tx: broadcast::Sender<StateEvent>,
    limits: SessionLimits,
    next_seq: AtomicU64,
}

impl SessionManager {
    /// 创建新的会话管理器
    pub fn new() -> Self {
        Self::with_limits(SessionLimits::default())
    }

    pub fn with_limits(limits: SessionLimits) -> Self {
        let (event_tx, _) = broadcast::channel(1000);

        let inner = SessionManagerInner {
            sessions: RwLock::new(HashMap::new()),
            run_locks: Mutex::new(HashMap::new()),
            event_tx,
            limits,
            next_seq: AtomicU64::new(0),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// 订阅状态事件
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.inner.event_tx.subscribe()
    }

    /// 发送状态事件（无订阅者时丢弃）
    pub fn emit_event(&self, event: StateEvent) {
        let _ = self.inner.event_tx.send(event);
    }

    /// 创建新会话
    pub async fn create_session(&self) -> String {
        self.insert_session(SessionState::new()).await
    }

    /// 获取已有会话，不存在则以该 ID 创建
    pub async fn ensure_session(&self, session_id: &str) -> String {
        {
            let sessions = self.inner.sessions.read().await;
            if sessions.contains_key(session_id) {
                return session_id.to_string();
            }
        }
        self.insert_session(SessionState::with_id(session_id)).await
    }

    async fn insert_session(&self, session: SessionState) -> String {
        let session_id = session.session_id.clone();
        {
            let mut sessions = self.inner.sessions.write().await;
            if sessions.contains_key(&session_id) {
                return session_id;
            }
            sessions.insert(session_id.clone(), self.slot(session));
        }

        self.emit_event(StateEvent::SessionCreated {
            session_id: session_id.clone(),
            timestamp: Utc::now(),
        });

        self.evict_idle(&session_id).await;
        session_id
    }

    /// 获取会话状态快照
    pub async fn get_session(&self, session_id: &str) -> Result<SessionState> {
        let sessions = self.inner.sessions.read().await;
        sessions
            .get(session_id)
            .map(|slot| slot.state.clone())
            .context("Session not found")
    }

    /// 写回整个会话状态
    pub async fn store_session(&self, session: SessionState) {
        let mut sessions = self.inner.sessions.write().await;
        sessions.insert(session.session_id.clone(), self.slot(session));
    }

    fn slot(&self, state: SessionState) -> SessionSlot {
        SessionSlot {
            state,
            touched: Instant::now(),
            seq: self.inner.next_seq.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// 获取会话的运行锁
    pub async fn run_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.inner.run_locks.lock().await;
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// 关闭会话，连同其运行锁一起移除
    pub async fn remove_session(&self, session_id: &str) -> bool {
        self.inner.run_locks.lock().await.remove(session_id);
        let removed = self
            .inner
            .sessions
            .write()
            .await
            .remove(session_id)
            .is_some();
        if removed {
            self.emit_event(StateEvent::SessionRemoved {
                session_id: session_id.to_string(),
                reason: "closed".to_string(),
                timestamp: Utc::now(),
            });
        }
        removed
    }

    /// 回收空闲超时的会话，并在超出上限时按最久未使用淘汰。正在运行的会话不回收。
    async fn evict_idle(&self, keep: &str) {
        let limits = self.inner.limits;
        let now = Instant::now();
        let candidates: Vec<(String, &'static str)> = {
            let sessions = self.inner.sessions.read().await;
            let overflow = sessions.len().saturating_sub(limits.max_sessions);
            let mut others: Vec<(&String, &SessionSlot)> = sessions
                .iter()
                .filter(|(id, _)| id.as_str() != keep)
                .collect();
            others.sort_by_key(|(_, slot)| slot.seq);
            others
                .into_iter()
                .enumerate()
                .filter_map(|(i, (id, slot))| {
                    if now.duration_since(slot.touched) >= limits.idle_ttl {
                        Some((id.clone(), "idle"))
                    } else if i < overflow {
                        Some((id.clone(), "capacity"))
                    } else {
                        None
                    }
                })
                .collect()
        };

        for (session_id, reason) in candidates {
            let mut locks = self.inner.run_locks.lock().await;
            if locks
                .get(&session_id)
                .is_some_and(|lock| lock.try_lock().is_err())
            {
                continue;
            }
            locks.remove(&session_id);
            let removed = self
                .inner
                .sessions
                .write()
                .await
                .remove(&session_id)
                .is_some();
            drop(locks);
            if removed {
                tracing::debug!(
                    target: "yunwei.state",
                    stage = "session.evicted",
                    session_id = %session_id,
                    reason
                );
                self.emit_event(StateEvent::SessionRemoved {
                    session_id,
                    reason: reason.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }

        // 对不存在的会话做过审批等操作会留下空闲的运行锁
        let mut locks = self.inner.run_locks.lock().await;
        let sessions = self.inner.sessions.read().await;
        locks.retain(|id, lock| sessions.contains_key(id) || lock.try_lock().is_err());
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_sessions: usize, idle_secs: u64) -> SessionLimits {
        SessionLimits {
            max_sessions,
            idle_ttl: Duration::from_secs(idle_secs),
        }
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let manager = SessionManager::new();

        let session_id = manager.create_session().await;
        let mut session = manager.get_session(&session_id).await.unwrap();
        session.add_conversation("你好", "您好");
        manager.store_session(session).await;

        let session = manager.get_session(&session_id).await.unwrap();
        assert_eq!(session.conversation_history.len(), 1);

        assert!(manager.remove_session(&session_id).await);
        assert!(manager.get_session(&session_id).await.is_err());
        assert!(!manager.remove_session(&session_id).await);
    }

    #[tokio::test]
    async fn test_ensure_session_is_idempotent() {
        let manager = SessionManager::new();
        let id = manager.ensure_session("ops-1").await;
        let mut session = manager.get_session(&id).await.unwrap();
        session.fail("x");
        manager.store_session(session).await;
        assert_eq!(manager.ensure_session("ops-1").await, "ops-1");
        assert!(manager.get_session("ops-1").await.unwrap().has_error());
    }

    #[tokio::test]
    async fn test_event_subscription() {
        let manager = SessionManager::new();
        let mut rx = manager.subscribe();

        let session_id = manager.create_session().await;

        match rx.recv().await {
            Ok(StateEvent::SessionCreated { session_id: id, .. }) => {
                assert_eq!(id, session_id);
            }
            _ => panic!("Expected SessionCreated event"),
        }
    }

    #[tokio::test]
    async fn test_run_lock_shared_per_session() {
        let manager = SessionManager::new();
        let a = manager.run_lock("s1").await;
        let b = manager.run_lock("s1").await;
        let c = manager.run_lock("s2").await;
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[tokio::test]
    async fn test_capacity_keeps_maps_bounded() {
        let manager = SessionManager::with_limits(limits(3, 3600));
        let mut ids = Vec::new();
        for _ in 0..10 {
            let id = manager.create_session().await;
            let _ = manager.run_lock(&id).await;
            ids.push(id);
        }
        assert_eq!(manager.inner.sessions.read().await.len(), 3);
        assert!(manager.inner.run_locks.lock().await.len() <= 3);
        assert!(manager.get_session(&ids[0]).await.is_err());
        assert!(manager.get_session(&ids[9]).await.is_ok());
    }

    #[tokio::test]
    async fn test_orphan_run_locks_are_pruned() {
        let manager = SessionManager::new();
        let _ = manager.run_lock("missing").await;
        let id = manager.create_session().await;
        let locks = manager.inner.run_locks.lock().await;
        assert!(!locks.contains_key("missing"));
        drop(locks);
        assert!(manager.get_session(&id).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_are_retired() {
        let manager = SessionManager::with_limits(limits(100, 60));
        let old = manager.create_session().await;
        tokio::time::advance(Duration::from_secs(61)).await;
        let fresh = manager.create_session().await;
        assert!(manager.get_session(&old).await.is_err());
        assert!(manager.get_session(&fresh).await.is_ok());
    }

    #[tokio::test]
    async fn test_running_session_is_not_evicted() {
        let manager = SessionManager::with_limits(limits(1, 3600));
        let busy = manager.create_session().await;
        let lock = manager.run_lock(&busy).await;
        let _guard = lock.lock().await;

        let other = manager.create_session().await;
        assert!(manager.get_session(&busy).await.is_ok());
        assert!(manager.get_session(&other).await.is_ok());
    }
}
