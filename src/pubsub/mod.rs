//! Подсистема Publish–Subscribe (pub/sub).
//!
//! Этот модуль реализует внутрипроцессную шину сообщений на callback'ах:
//!
//! - `bus`: реестр тем, подписка/отписка и доставка (отложенная и
//!   синхронная).
//! - `subscriber`: подписчик с идентичностью по указателю и handle подписки.
//! - `message`: тема и полезная нагрузка опубликованного сообщения.
//! - `scheduler`: отложенное выполнение задач (tokio и ручная очередь).
//! - `diagnostics`: приёмники диагностики debug-режима.
//!
//! Публичный API переэкспортирует все вложенные модули.

pub mod bus;
pub mod diagnostics;
pub mod message;
pub mod scheduler;
pub mod subscriber;

pub use bus::*;
pub use diagnostics::*;
pub use message::*;
pub use scheduler::*;
pub use subscriber::*;
