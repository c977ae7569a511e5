use url::Url;

/// Registrable-ish host of a URL, lowercased, without a leading `www.`.
///
/// Returns `None` for unparseable URLs or URLs without a host.
pub fn extract_domain(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}
