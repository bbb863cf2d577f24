use serde::{Deserialize, Serialize};

/// Параметры шины, фиксируются при создании.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Отправлять диагностику некорректных вызовов и сбоев подписчиков
    /// вместо молчаливого игнорирования.
    pub debug_mode: bool,
    /// Разрешить повторную подписку одного callback на одну тему.
    pub allow_duplicates: bool,
}
