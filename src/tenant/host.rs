// tenant/host.rs - Host header -> tenant candidate

/// Subdomain prefixes that never name a tenant
pub const RESERVED_SUBDOMAINS: &[&str] = &["www"];

/// Extract a tenant candidate from a request hostname.
///
/// The port is stripped from both `hostname` and `main_domain` before
/// comparison and the comparison is case-insensitive. In dev mode any
/// `<name>.localhost` host yields `name`; in production only strict
/// subdomains of `main_domain` yield their prefix. Malformed input, the apex
/// domain itself and reserved prefixes all yield `None`.
pub fn resolve_tenant_candidate(hostname: &str, main_domain: &str, is_dev_mode: bool) -> Option<String> {
    let host = normalize_host(hostname)?;

    let candidate = if is_dev_mode {
        let segments: Vec<&str> = host.split('.').collect();
        match segments.as_slice() {
            [first, .., last] if last.contains("localhost") => first.to_string(),
            _ => return None,
        }
    } else {
        let apex = normalize_host(main_domain)?;
        let prefix = host.strip_suffix(apex.as_str())?.strip_suffix('.')?;
        prefix.to_string()
    };

    if candidate.is_empty() || RESERVED_SUBDOMAINS.contains(&candidate.as_str()) {
        return None;
    }

    Some(candidate)
}

/// Lowercase, drop the port and a single trailing dot. IPv6 literals and
/// empty hosts are rejected.
fn normalize_host(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('[') {
        return None;
    }

    let without_port = match raw.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        Some(_) => return None,
        None => raw,
    };

    let host = without_port.strip_suffix('.').unwrap_or(without_port);
    if host.is_empty() || host.contains(':') {
        return None;
    }

    Some(host.to_ascii_lowercase())
}
