use std::fmt;

use pubsub_error::{BusError, ErrorExt, LogLevel};
use tokio::sync::mpsc;
use tracing::{error, info, trace, warn};

/// Приёмник диагностики шины.
///
/// Вызывается только в debug-режиме и только из отложенной задачи
/// планировщика, никогда внутри `subscribe`/`publish`.
pub trait DiagnosticSink: Send + Sync {
    fn report(
        &self,
        error: BusError,
    );
}

impl<F> DiagnosticSink for F
where
    F: Fn(BusError) + Send + Sync,
{
    fn report(
        &self,
        error: BusError,
    ) {
        self(error)
    }
}

/// Пишет диагностику в `tracing` с уровнем, соответствующим коду статуса.
///
/// Поле `category` равно `misuse` для некорректных вызовов API и `delivery`
/// для сбоев подписчиков.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(
        &self,
        error: BusError,
    ) {
        let code = error.status_code();
        let topic = error.topic().unwrap_or_default();
        // ошибки вызывающей стороны отделяем от сбоев подписчиков
        let category = if code.is_misuse() { "misuse" } else { "delivery" };
        match code.log_level() {
            LogLevel::Info => info!(%code, category, topic, "{error}"),
            LogLevel::Warn => warn!(%code, category, topic, "{error}"),
            LogLevel::Error => error!(%code, category, topic, "{error}"),
        }
    }
}

/// Пересылает диагностику в канал, которым владеет хост.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<BusError>,
}

impl ChannelSink {
    /// Приёмник и парный ему получатель диагностики.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BusError>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl DiagnosticSink for ChannelSink {
    fn report(
        &self,
        error: BusError,
    ) {
        if let Err(lost) = self.tx.send(error) {
            trace!(error = %lost.0, "Diagnostic receiver dropped");
        }
    }
}

impl fmt::Debug for ChannelSink {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ChannelSink")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use pubsub_error::Operation;
    use tracing_subscriber::{fmt::MakeWriter, prelude::*, Registry};

    use super::*;

    #[derive(Clone, Default)]
    struct BufferWriter(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for BufferWriter {
        fn write(
            &mut self,
            buf: &[u8],
        ) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = BufferWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Тест проверяет, что замыкание работает как приёмник.
    #[test]
    fn test_closure_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let store = seen.clone();
        let sink = move |err: BusError| store.lock().push(err);

        sink.report(BusError::InvalidTopic {
            operation: Operation::Publish,
        });

        assert_eq!(
            *seen.lock(),
            vec![BusError::InvalidTopic {
                operation: Operation::Publish
            }]
        );
    }

    #[test]
    fn test_channel_sink_forwards_and_tolerates_closed_receiver() {
        let (sink, mut rx) = ChannelSink::new();
        let err = BusError::DuplicateSubscription {
            topic: "dup".into(),
        };

        sink.report(err.clone());
        assert_eq!(rx.try_recv().ok(), Some(err.clone()));

        drop(rx);
        sink.report(err);
    }

    /// Тест проверяет, что `TracingSink` пишет сообщение и код статуса.
    #[test]
    fn test_tracing_sink_writes_event() {
        let buffer = BufferWriter::default();
        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(buffer.clone());
        let subscriber = Registry::default().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            TracingSink.report(BusError::DuplicateSubscription {
                topic: "orders".into(),
            });
        });

        let output = String::from_utf8(buffer.0.lock().clone()).unwrap();
        assert!(output.contains("Callback is already subscribed to topic [orders]"));
        assert!(output.contains("AlreadySubscribed"));
        assert!(output.contains("category=\"misuse\""));
    }

    /// Тест проверяет, что сбой подписчика пишется как `delivery` с
    /// уровнем ERROR.
    #[test]
    fn test_tracing_sink_marks_delivery_faults() {
        let buffer = BufferWriter::default();
        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(buffer.clone());
        let subscriber = Registry::default().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            TracingSink.report(BusError::SubscriberFault {
                topic: "orders".into(),
                position: 1,
                kind: pubsub_error::FaultKind::Panic,
                reason: "boom".into(),
            });
        });

        let output = String::from_utf8(buffer.0.lock().clone()).unwrap();
        assert!(output.contains("ERROR"));
        assert!(output.contains("category=\"delivery\""));
        assert!(output.contains("panicked: boom"));
    }
}
