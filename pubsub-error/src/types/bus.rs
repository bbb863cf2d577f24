use std::{any::Any, fmt};

use crate::{ErrorExt, StatusCode};

/// Операция шины, в которой обнаружена ошибка.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Subscribe,
    Publish,
    PublishSync,
}

/// Как именно подписчик завершился неудачей.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Подписчик запаниковал.
    Panic,
    /// Подписчик вернул `Err`.
    Error,
}

/// Диагностика шины.
///
/// Ни одна из этих ошибок не возвращается вызывающему напрямую: операции
/// шины молча игнорируют некорректные вызовы, а в debug-режиме отправляют
/// диагностику в отложенную задачу.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// Пустое имя темы.
    InvalidTopic { operation: Operation },
    /// Подписка без callback.
    InvalidCallback { topic: String },
    /// Повторная подписка того же callback на ту же тему.
    DuplicateSubscription { topic: String },
    /// Подписчик упал во время доставки.
    SubscriberFault {
        topic: String,
        /// Позиция подписчика в снимке списка на момент доставки.
        position: usize,
        kind: FaultKind,
        reason: String,
    },
}

impl fmt::Display for Operation {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Self::Subscribe => "subscribe",
            Self::Publish => "publish",
            Self::PublishSync => "publish_sync",
        };
        f.write_str(name)
    }
}

impl fmt::Display for FaultKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Panic => f.write_str("panicked"),
            Self::Error => f.write_str("returned an error"),
        }
    }
}

impl BusError {
    /// Тема, к которой относится ошибка (если известна).
    pub fn topic(&self) -> Option<&str> {
        match self {
            Self::InvalidTopic { .. } => None,
            Self::InvalidCallback { topic }
            | Self::DuplicateSubscription { topic }
            | Self::SubscriberFault { topic, .. } => Some(topic),
        }
    }
}

impl fmt::Display for BusError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::InvalidTopic { operation } => {
                write!(f, "Refusing {operation} with an empty topic")
            }
            Self::InvalidCallback { topic } => {
                write!(f, "Refusing to subscribe a missing callback to topic [{topic}]")
            }
            Self::DuplicateSubscription { topic } => {
                write!(f, "Callback is already subscribed to topic [{topic}]")
            }
            Self::SubscriberFault {
                topic,
                position,
                kind,
                reason,
            } => write!(
                f,
                "Subscriber #{position} of topic [{topic}] {kind}: {reason}"
            ),
        }
    }
}

impl std::error::Error for BusError {}

impl ErrorExt for BusError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidTopic { .. } => StatusCode::InvalidTopic,
            Self::InvalidCallback { .. } => StatusCode::InvalidSubscriber,
            Self::DuplicateSubscription { .. } => StatusCode::AlreadySubscribed,
            Self::SubscriberFault {
                kind: FaultKind::Panic,
                ..
            } => StatusCode::SubscriberPanicked,
            Self::SubscriberFault {
                kind: FaultKind::Error,
                ..
            } => StatusCode::SubscriberFailed,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = BusError::InvalidTopic {
            operation: Operation::PublishSync,
        };
        assert_eq!(err.to_string(), "Refusing publish_sync with an empty topic");

        let err = BusError::DuplicateSubscription {
            topic: "news".into(),
        };
        assert_eq!(err.to_string(), "Callback is already subscribed to topic [news]");

        let err = BusError::SubscriberFault {
            topic: "news".into(),
            position: 2,
            kind: FaultKind::Panic,
            reason: "boom".into(),
        };
        assert_eq!(err.to_string(), "Subscriber #2 of topic [news] panicked: boom");
    }

    /// Тест проверяет маппинг вариантов на коды статуса.
    #[test]
    fn test_status_codes() {
        assert_eq!(
            BusError::InvalidCallback { topic: "t".into() }.status_code(),
            StatusCode::InvalidSubscriber
        );
        let fault = |kind| BusError::SubscriberFault {
            topic: "t".into(),
            position: 0,
            kind,
            reason: String::new(),
        };
        assert_eq!(
            fault(FaultKind::Panic).status_code(),
            StatusCode::SubscriberPanicked
        );
        assert_eq!(
            fault(FaultKind::Error).status_code(),
            StatusCode::SubscriberFailed
        );
    }

    #[test]
    fn test_topic_accessor() {
        assert_eq!(
            BusError::InvalidTopic {
                operation: Operation::Subscribe
            }
            .topic(),
            None
        );
        assert_eq!(
            BusError::DuplicateSubscription { topic: "a".into() }.topic(),
            Some("a")
        );
    }

    /// Тест проверяет, что ошибками использования считаются отклонённые
    /// вызовы, но не сбои подписчиков.
    #[test]
    fn test_misuse_category() {
        let errors = [
            BusError::InvalidTopic {
                operation: Operation::Publish,
            },
            BusError::InvalidCallback { topic: "t".into() },
            BusError::DuplicateSubscription { topic: "t".into() },
            BusError::SubscriberFault {
                topic: "t".into(),
                position: 0,
                kind: FaultKind::Panic,
                reason: String::new(),
            },
        ];
        let misuse: Vec<bool> = errors.iter().map(|e| e.status_code().is_misuse()).collect();
        assert_eq!(misuse, vec![true, true, true, false]);
    }
}
