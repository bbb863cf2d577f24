use std::fmt;

use num_enum::TryFromPrimitive;
#[cfg(feature = "serde_repr")]
use serde_repr::{Deserialize_repr, Serialize_repr};
#[cfg(feature = "strum")]
use strum_macros::{AsRefStr, EnumIter};

/// Коды статуса для категоризации ошибок шины.
///
/// # Диапазоны:
/// - 1xxx: Общие ошибки
/// - 2xxx: Ошибки регистрации (темы, подписчики)
/// - 3xxx: Ошибки доставки
/// - 4xxx: Конфигурация и окружение
///
/// # Реализация:
/// - `num_enum::TryFromPrimitive` даёт нативную реализацию `TryFrom<u32>`.
/// - опционально: `strum` для `AsRefStr`/`EnumIter` (feature = "strum").
/// - опционально: `serde_repr` для сериализации в виде числового значения
///   (feature = "serde_repr").
#[cfg_attr(feature = "strum", derive(AsRefStr, EnumIter))]
#[cfg_attr(feature = "serde_repr", derive(Serialize_repr, Deserialize_repr))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 1xxx: Общие ошибки ===
    Unexpected = 1001,
    Internal = 1002,

    // === 2xxx: Регистрация ===
    InvalidTopic = 2000,
    InvalidSubscriber = 2001,
    AlreadySubscribed = 2002,

    // === 3xxx: Доставка ===
    SubscriberPanicked = 3000,
    SubscriberFailed = 3001,
    SchedulerClosed = 3002,

    // === 4xxx: Конфигурация/окружение ===
    InvalidConfig = 4000,
    Io = 4001,
}

/// Уровень логирования, рекомендуемый для кода статуса.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Числовое представление кода статуса.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Ошибка использования API вызывающей стороной (диапазон 2xxx).
    pub fn is_misuse(&self) -> bool {
        (2000..=2999).contains(&self.code())
    }

    /// Рекомендуемый уровень логирования для данного кода.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::AlreadySubscribed => LogLevel::Info,
            Self::InvalidTopic | Self::InvalidSubscriber | Self::InvalidConfig | Self::Io => {
                LogLevel::Warn
            }
            Self::SubscriberPanicked
            | Self::SubscriberFailed
            | Self::SchedulerClosed
            | Self::Unexpected
            | Self::Internal => LogLevel::Error,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StatusCode
////////////////////////////////////////////////////////////////////////////////

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        // С feature "strum" используем AsRefStr, иначе Debug-имя.
        #[cfg(feature = "strum")]
        {
            write!(f, "{} ({})", self.as_ref(), self.code())
        }
        #[cfg(not(feature = "strum"))]
        {
            write!(f, "{:?} ({})", self, self.code())
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
