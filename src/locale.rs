//! Locale resolution for the feed endpoint.
//!
//! The upstream publishes one feed per locale. Resolution happens in two
//! steps: an unsupported or empty requested locale collapses to the default,
//! and an `en_US` default may then be overridden by a bounded geolocation
//! lookup (a handful of countries get a regional feed even though `en_US` is
//! the dominant installed locale there). Every path produces a usable locale;
//! nothing here surfaces an error to the caller.

use async_trait::async_trait;
use std::time::Duration;

/// Fallback locale, and the only one that triggers a geolocation lookup.
pub const DEFAULT_LOCALE: &str = "en_US";

/// Locales the upstream publishes separate feeds for.
pub const SUPPORTED_LOCALES: &[&str] = &["en_US", "fa_IR", "fa", "ms_MY", "zh_CN"];

/// Budget for the country lookup. A slow lookup degrades to the default
/// locale rather than stalling the fetch pipeline.
const GEO_TIMEOUT: Duration = Duration::from_secs(10);

/// Collapse a requested locale onto the supported set.
///
/// Empty or unsupported locales become [`DEFAULT_LOCALE`]; supported ones
/// pass through unchanged. Matching is exact — locale tags are fixed strings,
/// not case-normalized here.
pub fn supported_or_default(locale: &str) -> &str {
    if SUPPORTED_LOCALES.contains(&locale) {
        locale
    } else {
        DEFAULT_LOCALE
    }
}

/// Best-effort country geolocation, implemented by the host.
#[async_trait]
pub trait GeoLookup: Send + Sync {
    /// Two-letter country code for the current connection, or `None` when
    /// the lookup failed or the country is unknown. Implementations need not
    /// enforce their own deadline; callers bound the lookup themselves.
    async fn country(&self) -> Option<String>;
}

/// Geolocation stub for hosts without a lookup service: always unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

#[async_trait]
impl GeoLookup for NoLookup {
    async fn country(&self) -> Option<String> {
        None
    }
}

/// Pick the locale used to derive the endpoint URL.
///
/// A non-`en_US` default already pins a regional feed, so it is returned
/// as-is without a lookup. An `en_US` default consults the geolocation
/// service (bounded to [`GEO_TIMEOUT`]): Iran maps to `fa_IR`, Malaysia to
/// `ms_MY`, and any other country — or a failed or timed-out lookup — keeps
/// the default unchanged.
pub async fn determine_locale(default_locale: &str, geo: &dyn GeoLookup) -> String {
    let default_locale = if default_locale.is_empty() {
        DEFAULT_LOCALE
    } else {
        default_locale
    };

    if !default_locale.eq_ignore_ascii_case(DEFAULT_LOCALE) {
        return default_locale.to_string();
    }

    let country = match tokio::time::timeout(GEO_TIMEOUT, geo.country()).await {
        Ok(Some(country)) => country,
        Ok(None) => {
            tracing::debug!("Country lookup failed, keeping default locale");
            return default_locale.to_string();
        }
        Err(_) => {
            tracing::debug!(
                timeout_secs = GEO_TIMEOUT.as_secs(),
                "Country lookup timed out, keeping default locale"
            );
            return default_locale.to_string();
        }
    };

    if country.eq_ignore_ascii_case("ir") {
        "fa_IR".to_string()
    } else if country.eq_ignore_ascii_case("my") {
        "ms_MY".to_string()
    } else {
        tracing::debug!(country = %country, "No regional feed for country, keeping default locale");
        default_locale.to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
