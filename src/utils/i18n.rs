use tracing::warn;

/// Locales shipped in `locales/`
pub const SUPPORTED_LOCALES: &[&str] = &["en", "ko"];

/// Set the process-wide locale, falling back to English for unknown ones
pub fn set_locale(locale: &str) {
    let language = locale.split(['-', '_']).next().unwrap_or("en");
    if SUPPORTED_LOCALES.contains(&language) {
        rust_i18n::set_locale(language);
    } else {
        warn!("Unsupported locale {}, falling back to en", locale);
        rust_i18n::set_locale("en");
    }
}
