use std::{any::Any, error::Error};

use crate::StatusCode;

/// Расширение для ошибок библиотеки (object-safe).
///
/// Даёт код статуса, по которому выбираются уровень логирования и категория
/// диагностики, и downcast к конкретному типу.
pub trait ErrorExt: Error + Send + Sync + 'static {
    /// Статус ошибки.
    ///
    /// По умолчанию возвращает [`StatusCode::Internal`].
    fn status_code(&self) -> StatusCode {
        StatusCode::Internal
    }

    /// Возвращает ошибку как [`Any`](std::any::Any),
    /// чтобы можно было выполнить downcast к конкретному типу.
    fn as_any(&self) -> &dyn Any;
}

#[cfg(test)]
mod tests {
    use std::{any::Any, error::Error, fmt};

    use super::*;

    // Ошибка без переопределения status_code (default = Internal).
    #[derive(Debug)]
    struct DefaultError(pub &'static str);

    impl fmt::Display for DefaultError {
        fn fmt(
            &self,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            write!(f, "DefaultError: {}", self.0)
        }
    }

    impl Error for DefaultError {}

    impl ErrorExt for DefaultError {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Debug)]
    struct TopicError(pub &'static str);

    impl fmt::Display for TopicError {
        fn fmt(
            &self,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            write!(f, "TopicError: {}", self.0)
        }
    }

    impl Error for TopicError {}

    impl ErrorExt for TopicError {
        fn status_code(&self) -> StatusCode {
            StatusCode::InvalidTopic
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// Тест проверяет, что по умолчанию статус ошибки равен `Internal`.
    #[test]
    fn test_default_status_code_is_internal() {
        let e = DefaultError("sensitive");
        assert_eq!(e.status_code(), StatusCode::Internal);
        assert_eq!(e.to_string(), "DefaultError: sensitive");
    }

    #[test]
    fn test_overridden_status_code() {
        let e = TopicError("empty");
        assert_eq!(e.status_code(), StatusCode::InvalidTopic);
        assert!(e.status_code().is_misuse());
    }

    #[test]
    fn test_as_any_downcast() {
        let e = TopicError("x");
        let down = e.as_any().downcast_ref::<TopicError>();
        assert_eq!(down.map(|d| d.0), Some("x"));
        assert!(e.as_any().downcast_ref::<DefaultError>().is_none());
    }
}
