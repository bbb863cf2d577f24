use std::sync::Arc;

/// Опубликованное сообщение: тема и полезная нагрузка.
///
/// Для отложенной публикации сообщение перемещается в задачу планировщика
/// и живёт до окончания доставки.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message<T> {
    pub topic: Arc<str>,
    pub payload: T,
}

impl<T> Message<T> {
    /// Сообщение для темы `topic`.
    pub fn new(
        topic: impl Into<Arc<str>>,
        payload: T,
    ) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }

    /// Имя темы.
    pub fn topic(&self) -> &str {
        &self.topic
    }
}
