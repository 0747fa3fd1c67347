use std::net::IpAddr;
use std::path::Path;
use url::{Host, Url};

const LOCAL_SCHEMES: [&str; 3] = ["http", "https", "exp"];

/// Origins a session accepts frames from, derived from its load URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecurityPolicy {
    allowed: Vec<String>,
    local_network: bool,
}

impl SecurityPolicy {
    pub fn new(allowed: Vec<String>) -> Self {
        Self {
            allowed,
            local_network: false,
        }
    }

    /// Developer mode additionally accepts localhost, loopback and
    /// private-LAN hosts.
    pub fn for_load_uri(load_uri: &Url, micro_app_root: &Path, is_developer: bool) -> Self {
        let mut allowed = Vec::new();
        match load_uri.scheme() {
            "file" => {
                if let Ok(root) = Url::from_directory_path(micro_app_root) {
                    allowed.push(format!("{}*", root.as_str()));
                }
            }
            _ => {
                let mut page = load_uri.clone();
                page.set_query(None);
                page.set_fragment(None);
                allowed.push(page.to_string());
                let origin = load_uri.origin();
                if origin.is_tuple() {
                    allowed.push(origin.ascii_serialization());
                }
            }
        }
        allowed.dedup();
        Self {
            allowed,
            local_network: is_developer,
        }
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    pub fn allows_local_network(&self) -> bool {
        self.local_network
    }

    /// Origins are parsed first, so dot segments and host lookalikes are
    /// resolved before any pattern is compared.
    pub fn allows(&self, origin: &str) -> bool {
        let Ok(parsed) = Url::parse(origin) else {
            return false;
        };
        if self.local_network && is_local_network(&parsed) {
            return true;
        }
        self.allowed
            .iter()
            .any(|pattern| pattern_matches(pattern, parsed.as_str()))
    }
}

fn is_local_network(origin: &Url) -> bool {
    if !LOCAL_SCHEMES.contains(&origin.scheme()) {
        return false;
    }
    match origin.host() {
        Some(Host::Domain(domain)) => {
            domain.eq_ignore_ascii_case("localhost")
                || domain.parse::<IpAddr>().is_ok_and(is_local_ip)
        }
        Some(Host::Ipv4(ip)) => is_local_ip(IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => is_local_ip(IpAddr::V6(ip)),
        None => false,
    }
}

fn is_local_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(ip) => ip.is_loopback() || ip.is_private(),
        IpAddr::V6(ip) => ip.is_loopback(),
    }
}

fn pattern_matches(pattern: &str, origin: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix('*') {
        return origin.starts_with(prefix);
    }
    if origin == pattern {
        return true;
    }
    let base = pattern.trim_end_matches('/');
    origin
        .strip_prefix(base)
        .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'))
}
