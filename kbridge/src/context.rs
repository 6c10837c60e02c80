//! # 后台任务上下文

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::{
    sync::{Mutex, Notify},
    task::JoinSet,
};
use tracing::{error, info};

/// 后台任务上下文
pub struct Context {
    initiated: AtomicBool,
    finished: AtomicBool,
    tasks: Mutex<JoinSet<()>>,
    notify: Arc<Notify>,
    done: Notify,
}

impl Context {
    /// 构造上下文
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            initiated: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            tasks: Mutex::new(JoinSet::new()),
            notify: Arc::new(Notify::new()),
            done: Notify::new(),
        })
    }

    /// 构造上下文，并在收到 Ctrl-C 信号时优雅关闭
    pub fn with_signal() -> Arc<Self> {
        let context = Self::new();
        let context_clone = Arc::clone(&context);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(_) => info!("收到 Ctrl-C 信号"),
                Err(e) => {
                    error!("监听 Ctrl-C 信号失败: {e}");
                    info!("启用备用关闭机制");
                }
            }
            context_clone.shutdown().await;
        });
        context
    }

    /// 启用后台任务，等待任务就绪后返回
    pub async fn spawn<F, Fut>(&self, task: F)
    where
        F: FnOnce(Arc<Notify>, Arc<Notify>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().await;
        let notify = Arc::clone(&self.notify);
        let ready = Arc::new(Notify::new());
        let waiter = Arc::clone(&ready);
        tasks.spawn(task(ready, notify));
        waiter.notified().await;
    }

    /// 优雅关闭
    pub async fn shutdown(&self) {
        if self
            .initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
            .is_ok()
        {
            info!("开始优雅退出");
            self.notify.notify_waiters();
            let mut tasks = self.tasks.lock().await;
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    error!("后台任务发生错误：{e}");
                }
            }
            self.finished.store(true, Ordering::SeqCst);
            self.done.notify_waiters();
            info!("优雅退出所有后台任务");
        }
    }

    /// 等待所有后台任务退出
    pub async fn all_done(&self) {
        let done = self.done.notified();
        tokio::pin!(done);
        done.as_mut().enable();
        if self.finished.load(Ordering::SeqCst) {
            return;
        }
        done.await;
    }
}
