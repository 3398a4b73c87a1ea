//! SSRF guard: URL → resolved-IP validation.
//!
//! Rejections happen in layers, earliest first: scheme, raw-host legacy
//! IPv4 literal forms (hex, short, octal, oversized, packed), hostname
//! deny lists, then per-address checks after DNS. IPv6 transition
//! formats (NAT64, 6to4, ISATAP, Teredo, v4-mapped) have their embedded
//! IPv4 extracted and re-checked, so a loopback hidden in `64:ff9b::/96`
//! is still loopback. Link-local is rejected even when private ranges
//! are allowed — cloud metadata services live there.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tracing::warn;
use url::Url;

use devclaw_core::config::SsrfConfig;
use devclaw_core::errors::{DevclawResult, SsrfError};

/// Hostnames denied regardless of configuration.
const BUILTIN_BLOCKED_HOSTS: &[&str] = &[
    "localhost",
    "0.0.0.0",
    "localhost.localdomain",
    "metadata.google.internal",
    "metadata.goog",
    "instance-data",
];

pub struct SsrfGuard {
    config: SsrfConfig,
}

impl SsrfGuard {
    pub fn new(config: SsrfConfig) -> Self {
        Self { config }
    }

    /// Validate a URL before any outbound request. Returns the first
    /// rejection; every rejection is logged with its triggering rule.
    pub async fn check(&self, raw_url: &str) -> DevclawResult<()> {
        match self.check_inner(raw_url).await {
            Ok(()) => Ok(()),
            Err(e) => {
                if let SsrfError::Rejected { rule, target } = &e {
                    warn!(rule = %rule, target = %target, "SSRF guard rejected request");
                }
                Err(e.into())
            }
        }
    }

    async fn check_inner(&self, raw_url: &str) -> Result<(), SsrfError> {
        // Scheme gate first; `file:` gets a dedicated rule so the log
        // tells local-file probing apart from odd protocols.
        if raw_url.trim_start().to_ascii_lowercase().starts_with("file:") {
            return Err(SsrfError::rejected("scheme-file", raw_url));
        }
        let url = Url::parse(raw_url).map_err(|e| SsrfError::InvalidUrl {
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SsrfError::rejected("scheme", raw_url));
        }

        // Legacy IPv4 literal analysis runs on the host text as written,
        // before any parser normalisation can launder it.
        let raw = raw_host(raw_url).unwrap_or_default();
        if raw.is_empty() {
            return Err(SsrfError::rejected("empty-host", raw_url));
        }
        if !raw.starts_with('[') {
            check_legacy_ipv4(&raw).map_err(|rule| SsrfError::rejected(rule, raw.clone()))?;
        }

        let host = url
            .host_str()
            .ok_or_else(|| SsrfError::rejected("empty-host", raw_url))?
            .to_ascii_lowercase();

        for blocked in BUILTIN_BLOCKED_HOSTS {
            if host == *blocked || raw.eq_ignore_ascii_case(blocked) {
                return Err(SsrfError::rejected("blocked-host", host));
            }
        }
        for blocked in &self.config.blocked_hosts {
            if host.eq_ignore_ascii_case(blocked) {
                return Err(SsrfError::rejected("blocklist", host));
            }
        }
        if !self.config.allowed_hosts.is_empty()
            && !self
                .config
                .allowed_hosts
                .iter()
                .any(|allowed| host.eq_ignore_ascii_case(allowed))
        {
            return Err(SsrfError::rejected("not-in-allowlist", host));
        }

        // IP literals are checked directly; hostnames go through DNS and
        // every answer must pass.
        match url.host() {
            Some(url::Host::Ipv4(ip)) => {
                check_ip(IpAddr::V4(ip), self.config.allow_private)
                    .map_err(|rule| SsrfError::rejected(rule, ip.to_string()))?;
            }
            Some(url::Host::Ipv6(ip)) => {
                check_ip(IpAddr::V6(ip), self.config.allow_private)
                    .map_err(|rule| SsrfError::rejected(rule, ip.to_string()))?;
            }
            Some(url::Host::Domain(domain)) => {
                let port = url.port_or_known_default().unwrap_or(80);
                let addrs = tokio::net::lookup_host((domain, port))
                    .await
                    .map_err(|e| SsrfError::rejected("dns-error", format!("{domain}: {e}")))?;
                let mut any = false;
                for addr in addrs {
                    any = true;
                    check_ip(addr.ip(), self.config.allow_private)
                        .map_err(|rule| SsrfError::rejected(rule, addr.ip().to_string()))?;
                }
                // No answers at all: fail closed.
                if !any {
                    return Err(SsrfError::rejected("dns-empty", domain.to_string()));
                }
            }
            None => return Err(SsrfError::rejected("empty-host", raw_url)),
        }

        Ok(())
    }
}

/// Host text as written in the URL: after the authority marker, before
/// path/query/fragment, minus userinfo and port.
fn raw_host(raw_url: &str) -> Option<String> {
    let after_scheme = raw_url.split("://").nth(1)?;
    let authority = after_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or(after_scheme);
    let host_port = authority.rsplit('@').next().unwrap_or(authority);
    if let Some(stripped) = host_port.strip_prefix('[') {
        // Bracketed IPv6: keep the brackets as the literal marker.
        return Some(format!("[{}", stripped.split(']').next().unwrap_or(stripped)));
    }
    Some(host_port.split(':').next().unwrap_or(host_port).to_string())
}

/// Reject legacy/ambiguous IPv4 literal spellings before DNS.
///
/// A host counts as an IPv4 candidate when its last dot label is purely
/// numeric; domains like `example.com` pass through untouched.
fn check_legacy_ipv4(host: &str) -> Result<(), &'static str> {
    let lower = host.to_ascii_lowercase();
    if lower.contains("0x") {
        return Err("ipv4-hex-literal");
    }

    let last_label = lower.rsplit('.').next().unwrap_or(&lower);
    let candidate = !last_label.is_empty() && last_label.chars().all(|c| c.is_ascii_digit());
    if !candidate {
        return Ok(());
    }

    let octets: Vec<&str> = lower.split('.').collect();
    if octets.len() < 4 {
        // Short forms and packed integers (127.1, 2130706433).
        return Err("ipv4-short-form");
    }
    if octets.len() > 4 {
        return Err("ipv4-too-many-octets");
    }
    for octet in octets {
        if octet.is_empty() || octet.chars().any(|c| !c.is_ascii_digit()) {
            return Err("ipv4-malformed");
        }
        if octet.len() > 1 && octet.starts_with('0') {
            return Err("ipv4-octal-octet");
        }
        match octet.parse::<u32>() {
            Ok(value) if value <= 255 => {}
            _ => return Err("ipv4-octet-range"),
        }
    }
    Ok(())
}

fn check_ip(ip: IpAddr, allow_private: bool) -> Result<(), String> {
    match ip {
        IpAddr::V4(v4) => check_v4(v4, allow_private).map_err(str::to_string),
        IpAddr::V6(v6) => {
            if let Some((label, embedded)) = embedded_ipv4(v6) {
                check_v4(embedded, allow_private).map_err(|rule| format!("{label}-{rule}"))?;
            }
            check_v6(v6, allow_private).map_err(str::to_string)
        }
    }
}

fn check_v4(ip: Ipv4Addr, allow_private: bool) -> Result<(), &'static str> {
    if ip.is_loopback() {
        return Err("loopback");
    }
    if ip.is_unspecified() {
        return Err("unspecified");
    }
    // Always rejected: 169.254/16 covers cloud metadata endpoints.
    if ip.is_link_local() {
        return Err("link-local");
    }
    if ip.is_private() && !allow_private {
        return Err("private-range");
    }
    Ok(())
}

fn check_v6(ip: Ipv6Addr, allow_private: bool) -> Result<(), &'static str> {
    if ip.is_loopback() {
        return Err("loopback");
    }
    if ip.is_unspecified() {
        return Err("unspecified");
    }
    let segments = ip.segments();
    if (segments[0] & 0xffc0) == 0xfe80 {
        return Err("link-local");
    }
    if (segments[0] & 0xfe00) == 0xfc00 && !allow_private {
        return Err("private-range");
    }
    Ok(())
}

/// Extract the IPv4 address embedded in an IPv6 transition format.
fn embedded_ipv4(ip: Ipv6Addr) -> Option<(&'static str, Ipv4Addr)> {
    let segments = ip.segments();
    let octets = ip.octets();
    let last32 = Ipv4Addr::new(octets[12], octets[13], octets[14], octets[15]);

    // NAT64 well-known prefix 64:ff9b::/96 — IPv4 in the last 32 bits.
    if segments[0] == 0x0064 && segments[1] == 0xff9b && segments[2..6] == [0, 0, 0, 0] {
        return Some(("nat64", last32));
    }
    // 6to4 2002::/16 — IPv4 in bytes 2..6.
    if segments[0] == 0x2002 {
        return Some((
            "6to4",
            Ipv4Addr::new(octets[2], octets[3], octets[4], octets[5]),
        ));
    }
    // Teredo 2001:0000::/32 — client IPv4 in the last 32 bits, inverted.
    if segments[0] == 0x2001 && segments[1] == 0 {
        return Some((
            "teredo",
            Ipv4Addr::new(!octets[12], !octets[13], !octets[14], !octets[15]),
        ));
    }
    // ISATAP ::5efe:a.b.c.d — IPv4 in the last 32 bits.
    if segments[5] == 0x5efe {
        return Some(("isatap", last32));
    }
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return Some(("v4-mapped", mapped));
    }
    None
}
