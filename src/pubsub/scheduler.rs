//! Отложенное выполнение задач.
//!
//! Шина не знает, как устроен цикл событий хоста: отложенная публикация и
//! диагностика передаются в [`Scheduler`]. Реализация обязана выполнять
//! задачи в порядке FIFO и никогда не выполнять задачу внутри вызова
//! `schedule`.

use std::{
    collections::VecDeque,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use parking_lot::Mutex;
use pubsub_error::StatusCode;
use tokio::{
    runtime::Handle,
    sync::{mpsc, oneshot},
};
use tracing::{error, trace, warn};

use super::subscriber::panic_message;

/// Задача, выполняемая позже.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Планировщик отложенных задач ("выполнить на следующем тике").
pub trait Scheduler: Send + Sync {
    /// Ставит задачу в очередь. Не выполняет её немедленно.
    fn schedule(
        &self,
        task: Task,
    );
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    fn schedule(
        &self,
        task: Task,
    ) {
        (**self).schedule(task)
    }
}

/// Планировщик поверх tokio: один воркер последовательно выполняет задачи
/// из неограниченной очереди.
///
/// Клоны разделяют одну очередь и одного воркера. Задачи выполняются
/// синхронно на потоке рантайма, поэтому медленные подписчики задерживают
/// последующие задачи этого планировщика.
#[derive(Clone)]
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<Task>,
}

impl TokioScheduler {
    /// Запускает воркер на текущем рантайме.
    ///
    /// # Panics
    ///
    /// Паникует при вызове вне контекста tokio-рантайма, как и
    /// `tokio::spawn`.
    pub fn spawn() -> Self {
        Self::spawn_on(&Handle::current())
    }

    /// Запускает воркер на указанном рантайме.
    pub fn spawn_on(handle: &Handle) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Task>();
        handle.spawn(async move {
            while let Some(task) = rx.recv().await {
                run_isolated(task);
            }
            trace!("Scheduler worker stopped");
        });
        Self { tx }
    }

    /// Ждёт, пока выполнятся все задачи, поставленные до этого вызова.
    ///
    /// Задачи, которые они сами поставят в очередь, окажутся после маркера;
    /// для них нужен ещё один `flush`.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        self.schedule(Box::new(move || {
            let _ = done_tx.send(());
        }));
        let _ = done_rx.await;
    }

    /// `true`, если воркер остановлен и новые задачи будут отброшены.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(
        &self,
        task: Task,
    ) {
        if self.tx.send(task).is_err() {
            warn!(
                code = %StatusCode::SchedulerClosed,
                "Deferred task dropped: scheduler worker is gone"
            );
        }
    }
}

impl fmt::Debug for TokioScheduler {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("TokioScheduler")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Выполняет задачу; паника логируется и не выходит за пределы планировщика.
fn run_isolated(task: Task) {
    if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(task)) {
        error!(reason = %panic_message(panic.as_ref()), "Deferred task panicked");
    }
}

/// Очередь задач, которую прокручивает сам хост.
///
/// Подходит для однопоточных циклов событий и детерминированных тестов:
/// ничего не выполняется, пока не вызван [`run_pending`](Self::run_pending)
/// или [`run_until_idle`](Self::run_until_idle). Паника задачи, как и в
/// [`TokioScheduler`], логируется, и очередь продолжает выполняться.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Arc<Mutex<VecDeque<Task>>>,
}

impl ManualScheduler {
    /// Создаёт пустую очередь.
    pub fn new() -> Self {
        Self::default()
    }

    /// Количество задач в очереди.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Выполняет задачи, стоявшие в очереди на момент вызова ("один тик").
    /// Возвращает число выполненных задач.
    pub fn run_pending(&self) -> usize {
        let budget = self.pending();
        let mut ran = 0;
        while ran < budget {
            // Блокировка снимается до запуска: задача может планировать новые.
            let Some(task) = self.queue.lock().pop_front() else {
                break;
            };
            run_isolated(task);
            ran += 1;
        }
        ran
    }

    /// Выполняет задачи, пока очередь не опустеет, включая задачи,
    /// поставленные в процессе.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            let Some(task) = self.queue.lock().pop_front() else {
                break;
            };
            run_isolated(task);
            ran += 1;
        }
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(
        &self,
        task: Task,
    ) {
        self.queue.lock().push_back(task);
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}
