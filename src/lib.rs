pub mod form;
pub mod i18n;
pub mod presets;
pub mod prelude;

pub use crate::i18n::{I18nManager, Locale};
