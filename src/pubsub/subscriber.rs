use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Weak},
};

use pubsub_error::FaultKind;

use super::bus::BusInner;

/// Ошибка, которую может вернуть fallible-подписчик.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type Callback<T> = dyn Fn(&str, &T) -> Result<(), BoxError> + Send + Sync;

/// Подписчик темы: callback, вызываемый как `(topic, payload)`.
///
/// Шина сравнивает подписчиков только по идентичности: клон `Subscriber`
/// считается тем же подписчиком, а два `Subscriber::new` с одинаковым
/// замыканием считаются разными.
pub struct Subscriber<T> {
    callback: Arc<Callback<T>>,
}

impl<T: 'static> Subscriber<T> {
    /// Создаёт подписчика из обычного замыкания.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, &T) + Send + Sync + 'static,
    {
        let callback: Arc<Callback<T>> =
            Arc::new(move |topic: &str, payload: &T| -> Result<(), BoxError> {
                f(topic, payload);
                Ok(())
            });
        Self { callback }
    }

    /// Создаёт подписчика, который может вернуть ошибку.
    ///
    /// `Err` обрабатывается так же, как паника: доставка остальным
    /// подписчикам продолжается, а в debug-режиме шина отправляет
    /// диагностику `SubscriberFault`.
    pub fn fallible<F, E>(f: F) -> Self
    where
        F: Fn(&str, &T) -> Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let callback: Arc<Callback<T>> =
            Arc::new(move |topic: &str, payload: &T| -> Result<(), BoxError> {
                f(topic, payload).map_err(Into::into)
            });
        Self { callback }
    }
}

impl<T> Subscriber<T> {
    /// Проверяет, что оба значения указывают на один и тот же callback.
    pub fn same(
        &self,
        other: &Self,
    ) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.callback), Arc::as_ptr(&other.callback))
    }

    /// Вызывает callback, перехватывая панику.
    pub(crate) fn invoke(
        &self,
        topic: &str,
        payload: &T,
    ) -> Result<(), (FaultKind, String)> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.callback)(topic, payload))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err((FaultKind::Error, err.to_string())),
            Err(panic) => Err((FaultKind::Panic, panic_message(panic.as_ref()))),
        }
    }
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T> PartialEq for Subscriber<T> {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.same(other)
    }
}

impl<T> Eq for Subscriber<T> {}

impl<T> fmt::Debug for Subscriber<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "Subscriber({:p})", Arc::as_ptr(&self.callback))
    }
}

/// Текст паники для диагностики.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Результат успешной подписки.
///
/// В отличие от канальных подписок, `Drop` ничего не отписывает: callback
/// остаётся в шине, пока его явно не уберут через [`Subscription::unsubscribe`]
/// или `Bus::unsubscribe`.
pub struct Subscription<T> {
    topic: Arc<str>,
    subscriber: Subscriber<T>,
    bus: Weak<BusInner<T>>,
}

impl<T> Subscription<T> {
    pub(crate) fn new(
        topic: Arc<str>,
        subscriber: Subscriber<T>,
        bus: Weak<BusInner<T>>,
    ) -> Self {
        Self {
            topic,
            subscriber,
            bus,
        }
    }

    /// Тема подписки.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Зарегистрированный подписчик.
    pub fn subscriber(&self) -> &Subscriber<T> {
        &self.subscriber
    }

    /// Отписывается от темы. Аналогично `Bus::unsubscribe(topic, subscriber)`.
    ///
    /// Возвращает `false`, если подписчик уже удалён или шина уничтожена.
    pub fn unsubscribe(self) -> bool {
        match self.bus.upgrade() {
            Some(bus) => bus.unsubscribe(&self.topic, &self.subscriber),
            None => false,
        }
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("subscriber", &self.subscriber)
            .finish()
    }
}
