//! Block targets: normalization and matching
//!
//! Every app name or domain that enters a session, a preset or a snooze
//! passes through one of the `normalize_*` functions. Inputs that do not
//! normalize are dropped at that boundary and never stored.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a block target refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    App,
    Website,
}

impl TargetKind {
    /// Normalize `raw` according to this kind's rules
    pub fn normalize(self, raw: &str) -> Option<String> {
        match self {
            TargetKind::App => normalize_app_name(raw),
            TargetKind::Website => normalize_domain(raw),
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::App => write!(f, "app"),
            TargetKind::Website => write!(f, "website"),
        }
    }
}

impl std::str::FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "app" | "application" => Ok(TargetKind::App),
            "website" | "site" | "domain" => Ok(TargetKind::Website),
            other => Err(format!("unknown target kind: {}", other)),
        }
    }
}

/// Reduce a URL or hostname to the bare host used for blocking.
///
/// Strips the scheme, userinfo, port, path, query and fragment, lowercases
/// the host, drops a trailing dot and strips leading `www.` labels. A `www.`
/// label is kept when removing it would leave a single label, so `www.com`
/// never widens into `com`. Returns `None` for input that has no usable host.
///
/// The result is a fixed point: `normalize_domain(d) == Some(d)`.
pub fn normalize_domain(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let rest = match trimmed.find("://") {
        Some(idx) => &trimmed[idx + 3..],
        None => trimmed.strip_prefix("//").unwrap_or(trimmed),
    };

    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..authority_end];

    let host_port = match authority.rsplit_once('@') {
        Some((_, host)) => host,
        None => authority,
    };

    let host = match host_port.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => host_port,
    };

    let mut host = host.trim_end_matches('.').to_ascii_lowercase();
    while let Some(stripped) = host.strip_prefix("www.") {
        if !stripped.contains('.') {
            break;
        }
        host = stripped.to_string();
    }

    if is_valid_host(&host) { Some(host) } else { None }
}

fn is_valid_host(host: &str) -> bool {
    !host.is_empty()
        && host.split('.').all(|label| {
            !label.is_empty()
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        })
}

/// Normalize an application name: trimmed, without a trailing `.app` bundle suffix.
pub fn normalize_app_name(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let name = match trimmed.len().checked_sub(4) {
        Some(cut) if trimmed.is_char_boundary(cut) && trimmed[cut..].eq_ignore_ascii_case(".app") => {
            trimmed[..cut].trim_end()
        }
        _ => trimmed,
    };

    if name.is_empty() || name.chars().any(char::is_control) {
        None
    } else {
        Some(name.to_string())
    }
}

/// Subdomain-aware match between a normalized host and a normalized blocked domain.
///
/// `mail.example.com` matches `example.com`; `notexample.com` does not.
pub fn domain_matches(host: &str, blocked: &str) -> bool {
    if host == blocked {
        return true;
    }
    host.len() > blocked.len()
        && host.ends_with(blocked)
        && host.as_bytes()[host.len() - blocked.len() - 1] == b'.'
}

/// Match an observed tab URL against a normalized blocked domain.
pub fn url_matches(url: &str, blocked: &str) -> bool {
    normalize_domain(url).is_some_and(|host| domain_matches(&host, blocked))
}

/// Process-name match, ignoring ASCII case.
pub fn app_matches(running: &str, blocked: &str) -> bool {
    running.trim().eq_ignore_ascii_case(blocked)
}
