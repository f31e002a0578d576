//! Media types and `Accept` matching.
//!
//! Vendor media types follow the pattern
//! `application/se.novafaen.<service>.<resource>.v<N>+json`. The schema that
//! describes a media type is found by stripping `application/` and `+json`
//! and appending `.json`.

/// Media type of every error envelope.
pub const ERROR_MEDIA_TYPE: &str = "application/se.novafaen.smrt.error.v1+json";

/// Media type of the `/status` payload.
pub const STATUS_MEDIA_TYPE: &str = "application/se.novafaen.smrt.status.v1+json";

/// Fallback content type for successful responses on routes that do not
/// declare an outbound type.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Derives the schema file name for a media type.
///
/// ```
/// use smrt_core::media::schema_name;
///
/// assert_eq!(
///     schema_name("application/se.novafaen.smrt.status.v1+json"),
///     "se.novafaen.smrt.status.v1.json"
/// );
/// ```
#[must_use]
pub fn schema_name(media_type: &str) -> String {
    let essence = essence(media_type);
    let stem = essence.strip_prefix("application/").unwrap_or(essence);
    let stem = stem.strip_suffix("+json").unwrap_or(stem);
    format!("{stem}.json")
}

/// Returns the `type/subtype` part of a header value, without parameters.
#[must_use]
pub fn essence(value: &str) -> &str {
    value.split(';').next().unwrap_or("").trim()
}

/// Returns `true` if two media types have the same essence.
#[must_use]
pub fn same_type(a: &str, b: &str) -> bool {
    essence(a).eq_ignore_ascii_case(essence(b))
}

/// Returns `true` if an `Accept` header value admits `offered`.
///
/// The header may list several comma-separated ranges. `*/*` and `type/*`
/// are wildcards. Parameters are ignored, except `q=0`, which excludes the
/// range.
///
/// ```
/// use smrt_core::media::accepts;
///
/// assert!(accepts("text/html, application/*;q=0.5", "application/json"));
/// assert!(!accepts("application/json;q=0", "application/json"));
/// assert!(!accepts("other/type", "application/json"));
/// ```
#[must_use]
pub fn accepts(accept: &str, offered: &str) -> bool {
    let offered = essence(offered);
    let offered_major = offered.split('/').next().unwrap_or("");

    accept.split(',').any(|range| {
        let mut parts = range.split(';');
        let media_range = parts.next().unwrap_or("").trim();
        if media_range.is_empty() || parts.any(is_zero_quality) {
            return false;
        }

        if media_range == "*/*" || media_range.eq_ignore_ascii_case(offered) {
            return true;
        }

        media_range
            .strip_suffix("/*")
            .is_some_and(|major| major.eq_ignore_ascii_case(offered_major))
    })
}

fn is_zero_quality(param: &str) -> bool {
    let Some((name, value)) = param.split_once('=') else {
        return false;
    };
    name.trim().eq_ignore_ascii_case("q")
        && value.trim().parse::<f32>().is_ok_and(|q| q <= 0.0)
}
