use std::{
    fmt,
    marker::PhantomData,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use bytes::Bytes;
use dashmap::DashMap;
use pubsub_error::{BusError, ErrorExt, Operation};
use tracing::{debug, trace};

use super::{DiagnosticSink, Message, Scheduler, Subscriber, Subscription, TracingSink};
use crate::config::BusConfig;

type TopicKey = Arc<str>;

/// Внутрипроцессная шина publish/subscribe.
///
/// Поддерживает:
/// - Подписку callback'ов на темы по точному имени
/// - Отложенную (`publish`) и немедленную (`publish_sync`) доставку
/// - Изоляцию сбоев: упавший подписчик не мешает остальным
/// - Диагностику некорректных вызовов в debug-режиме
///
/// `Bus` дешево клонируется: все клоны работают с одним реестром. Глобального
/// экземпляра нет, общую шину передают явно.
pub struct Bus<T = Bytes> {
    inner: Arc<BusInner<T>>,
}

pub(crate) struct BusInner<T> {
    /// Тема → подписчики в порядке подписки
    topics: DashMap<TopicKey, Vec<Subscriber<T>>>,
    config: BusConfig,
    scheduler: Arc<dyn Scheduler>,
    diagnostics: Arc<dyn DiagnosticSink>,
    counters: Counters,
}

#[derive(Debug, Default)]
struct Counters {
    published: AtomicU64,
    delivered: AtomicU64,
    faults: AtomicU64,
    rejected: AtomicU64,
}

/// Снимок счётчиков шины.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Публикации, у темы которых были подписчики
    pub published: u64,
    /// Успешные вызовы подписчиков
    pub delivered: u64,
    /// Паники и ошибки подписчиков
    pub faults: u64,
    /// Отклонённые вызовы (пустая тема, нет callback, дубликат)
    pub rejected: u64,
}

/// Построитель [`Bus`].
pub struct BusBuilder<T> {
    config: BusConfig,
    scheduler: Arc<dyn Scheduler>,
    diagnostics: Arc<dyn DiagnosticSink>,
    _payload: PhantomData<fn(T)>,
}

impl<T: Send + 'static> BusBuilder<T> {
    /// Задаёт конфигурацию шины. По умолчанию [`BusConfig::default`].
    pub fn config(
        mut self,
        config: BusConfig,
    ) -> Self {
        self.config = config;
        self
    }

    /// Приёмник диагностики для debug-режима. По умолчанию [`TracingSink`].
    pub fn diagnostics(
        mut self,
        sink: impl DiagnosticSink + 'static,
    ) -> Self {
        self.diagnostics = Arc::new(sink);
        self
    }

    /// Создаёт шину с пустым реестром тем.
    pub fn build(self) -> Bus<T> {
        debug!(
            debug_mode = self.config.debug_mode,
            allow_duplicates = self.config.allow_duplicates,
            "Bus created"
        );
        Bus {
            inner: Arc::new(BusInner {
                topics: DashMap::new(),
                config: self.config,
                scheduler: self.scheduler,
                diagnostics: self.diagnostics,
                counters: Counters::default(),
            }),
        }
    }
}

impl<T: Send + 'static> Bus<T> {
    /// Версия библиотеки, только для диагностики.
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    /// Создаёт шину с конфигурацией по умолчанию.
    pub fn new(scheduler: impl Scheduler + 'static) -> Self {
        Self::builder(scheduler).build()
    }

    /// Построитель шины поверх указанного планировщика.
    pub fn builder(scheduler: impl Scheduler + 'static) -> BusBuilder<T> {
        BusBuilder {
            config: BusConfig::default(),
            scheduler: Arc::new(scheduler),
            diagnostics: Arc::new(TracingSink),
            _payload: PhantomData,
        }
    }

    /// Подписывает callback на тему.
    ///
    /// Возвращает `None`, если вызов отклонён: пустая тема или повторная
    /// подписка при `allow_duplicates == false`. Отклонение не видно
    /// вызывающему иначе как через `None`; в debug-режиме диагностика уходит
    /// в отложенную задачу.
    pub fn subscribe(
        &self,
        topic: &str,
        subscriber: Subscriber<T>,
    ) -> Option<Subscription<T>> {
        self.subscribe_optional(topic, Some(subscriber))
    }

    /// То же, что [`subscribe`](Self::subscribe), для хостов, где callback
    /// может отсутствовать (динамические биндинги, конфигурация). `None`
    /// отклоняется как `InvalidCallback`.
    pub fn subscribe_optional(
        &self,
        topic: &str,
        subscriber: Option<Subscriber<T>>,
    ) -> Option<Subscription<T>> {
        if topic.is_empty() {
            self.inner.reject(BusError::InvalidTopic {
                operation: Operation::Subscribe,
            });
            return None;
        }
        let Some(subscriber) = subscriber else {
            self.inner.reject(BusError::InvalidCallback {
                topic: topic.to_string(),
            });
            return None;
        };

        let mut entry = match self.inner.topics.get_mut(topic) {
            Some(entry) => entry,
            None => self.inner.topics.entry(Arc::from(topic)).or_default(),
        };
        if !self.inner.config.allow_duplicates && entry.iter().any(|s| s.same(&subscriber)) {
            drop(entry);
            self.inner.reject(BusError::DuplicateSubscription {
                topic: topic.to_string(),
            });
            return None;
        }
        entry.push(subscriber.clone());
        let key = entry.key().clone();
        let count = entry.len();
        drop(entry);

        debug!(topic, subscribers = count, "Subscribed");
        Some(Subscription::new(key, subscriber, Arc::downgrade(&self.inner)))
    }

    /// Удаляет первое вхождение подписчика из темы.
    ///
    /// `false` для неизвестной темы или отсутствующего подписчика; это
    /// обычный исход, диагностика не отправляется. Пустая тема остаётся в
    /// реестре.
    pub fn unsubscribe(
        &self,
        topic: &str,
        subscriber: &Subscriber<T>,
    ) -> bool {
        self.inner.unsubscribe(topic, subscriber)
    }

    /// Публикует сообщение отложенно.
    ///
    /// Возвращает `true`, если у темы есть подписчики, и ставит доставку в
    /// планировщик; сама доставка ещё не произошла. Список подписчиков
    /// читается в момент доставки, а не в момент вызова.
    pub fn publish(
        &self,
        topic: &str,
        payload: T,
    ) -> bool {
        let Some(key) = self.inner.target(topic, Operation::Publish) else {
            return false;
        };

        let message = Message::new(key, payload);
        let bus = Arc::downgrade(&self.inner);
        self.inner.scheduler.schedule(Box::new(move || match bus.upgrade() {
            Some(bus) => bus.deliver(&message),
            None => trace!(topic = %message.topic, "Bus dropped before deferred delivery"),
        }));
        true
    }

    /// Публикует сообщение синхронно: все подписчики вызваны до возврата.
    ///
    /// Подписчик может сам вызвать `publish_sync`; доставка в этом случае
    /// рекурсивна.
    pub fn publish_sync(
        &self,
        topic: &str,
        payload: T,
    ) -> bool {
        let Some(key) = self.inner.target(topic, Operation::PublishSync) else {
            return false;
        };

        self.inner.deliver(&Message::new(key, payload));
        true
    }

    /// Снимок подписчиков темы; `None`, если тема ни разу не
    /// регистрировалась.
    pub fn subscribers(
        &self,
        topic: &str,
    ) -> Option<Vec<Subscriber<T>>> {
        self.inner.topics.get(topic).map(|list| list.value().clone())
    }

    /// Количество подписчиков темы (0 для неизвестной темы).
    pub fn subscriber_count(
        &self,
        topic: &str,
    ) -> usize {
        self.inner.topics.get(topic).map_or(0, |list| list.len())
    }

    /// Количество зарегистрированных тем, включая опустевшие.
    pub fn topic_count(&self) -> usize {
        self.inner.topics.len()
    }

    /// Конфигурация, с которой создана шина.
    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    /// Снимок счётчиков публикаций, доставок, сбоев и отклонений.
    pub fn stats(&self) -> BusStats {
        let c = &self.inner.counters;
        BusStats {
            published: c.published.load(Ordering::Relaxed),
            delivered: c.delivered.load(Ordering::Relaxed),
            faults: c.faults.load(Ordering::Relaxed),
            rejected: c.rejected.load(Ordering::Relaxed),
        }
    }
}

impl<T> BusInner<T> {
    pub(crate) fn unsubscribe(
        &self,
        topic: &str,
        subscriber: &Subscriber<T>,
    ) -> bool {
        let Some(mut list) = self.topics.get_mut(topic) else {
            return false;
        };
        match list.iter().position(|s| s.same(subscriber)) {
            Some(index) => {
                list.remove(index);
                let remaining = list.len();
                drop(list);
                debug!(topic, remaining, "Unsubscribed");
                true
            }
            None => false,
        }
    }

    /// Проверяет тему и возвращает ключ реестра, если есть кому доставлять.
    fn target(
        &self,
        topic: &str,
        operation: Operation,
    ) -> Option<TopicKey> {
        if topic.is_empty() {
            self.reject(BusError::InvalidTopic { operation });
            return None;
        }
        let key = self
            .topics
            .get(topic)
            .filter(|list| !list.is_empty())
            .map(|list| list.key().clone());
        match key {
            Some(key) => {
                self.counters.published.fetch_add(1, Ordering::Relaxed);
                Some(key)
            }
            None => {
                trace!(topic, %operation, "No subscribers");
                None
            }
        }
    }

    /// Доставляет сообщение снимку подписчиков.
    ///
    /// Блокировка реестра снимается до первого вызова: подписчики могут
    /// подписываться, отписываться и публиковать. Отписанный во время
    /// доставки подписчик всё равно получает текущее сообщение, добавленный
    /// не получает.
    fn deliver(
        &self,
        message: &Message<T>,
    ) {
        let Some(snapshot) = self
            .topics
            .get(message.topic())
            .map(|list| list.value().clone())
        else {
            return;
        };

        trace!(topic = %message.topic, subscribers = snapshot.len(), "Delivering");
        for (position, subscriber) in snapshot.iter().enumerate() {
            match subscriber.invoke(&message.topic, &message.payload) {
                Ok(()) => {
                    self.counters.delivered.fetch_add(1, Ordering::Relaxed);
                }
                Err((kind, reason)) => {
                    self.counters.faults.fetch_add(1, Ordering::Relaxed);
                    debug!(topic = %message.topic, position, %kind, %reason, "Subscriber fault");
                    self.report(BusError::SubscriberFault {
                        topic: message.topic.to_string(),
                        position,
                        kind,
                        reason,
                    });
                }
            }
        }
    }

    fn reject(
        &self,
        error: BusError,
    ) {
        self.counters.rejected.fetch_add(1, Ordering::Relaxed);
        trace!(code = %error.status_code(), "Rejected: {error}");
        self.report(error);
    }

    /// В debug-режиме передаёт диагностику приёмнику из отложенной задачи.
    fn report(
        &self,
        error: BusError,
    ) {
        if !self.config.debug_mode {
            return;
        }
        let sink = Arc::clone(&self.diagnostics);
        self.scheduler.schedule(Box::new(move || sink.report(error)));
    }
}

impl<T> Clone for Bus<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Bus<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Bus")
            .field("topics", &self.inner.topics.len())
            .field("config", &self.inner.config)
            .finish()
    }
}
