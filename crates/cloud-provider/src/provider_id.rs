//! Helpers for node provider IDs (`<provider-name>://<instance-id>`).

/// The scheme separator between the provider name and the instance ID.
pub const SCHEME_SEPARATOR: &str = "://";

/// Strip the `<provider-name>://` prefix from a provider ID.
///
/// A bare instance ID is returned unchanged, so IDs registered before the
/// prefix was introduced keep working. Repeated prefixes are all removed,
/// which makes the function idempotent.
pub fn strip_provider_prefix<'a>(provider_id: &'a str, provider_name: &str) -> &'a str {
    let prefix = format!("{}{}", provider_name, SCHEME_SEPARATOR);
    provider_id.trim_start_matches(prefix.as_str())
}
