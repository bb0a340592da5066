pub const DEFAULT_WEIGHT: f64 = 1.0;

/// One registered worker as seen by the name server and by clients.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkerInfo {
    pub address: String,
    pub port: String,
    pub weight: f64,
}

impl WorkerInfo {
    pub fn new(address: &str, weight: f64) -> Self {
        WorkerInfo {
            address: address.to_string(),
            port: extract_port(address),
            weight: normalize_weight(weight),
        }
    }
}

/// Weights live in (0, 1]. Anything else falls back to full capacity.
pub fn normalize_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 && weight <= 1.0 {
        weight
    } else {
        DEFAULT_WEIGHT
    }
}

/// Port part of a `host:port` address, or an empty string when the address
/// does not split cleanly. Bracketed IPv6 hosts are accepted.
pub fn extract_port(address: &str) -> String {
    split_host_port(address)
        .map(|(_, port)| port.to_string())
        .unwrap_or_default()
}

fn split_host_port(address: &str) -> Option<(&str, &str)> {
    if let Some(rest) = address.strip_prefix('[') {
        let (host, tail) = rest.split_once(']')?;
        let port = tail.strip_prefix(':')?;
        if port.contains(':') {
            return None;
        }
        return Some((host, port));
    }

    let (host, port) = address.rsplit_once(':')?;
    if host.contains(':') {
        // unbracketed IPv6
        return None;
    }
    Some((host, port))
}
