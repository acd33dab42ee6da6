use crate::error::CryptoError;
use crate::mode::EncryptionMode;
use httpsource_core::EndpointId;

/// One encryption rule: `(target_path, mode)`, optionally scoped to a single
/// endpoint (spec §4.9).
#[derive(Debug, Clone)]
pub struct EncryptionRule {
    pub endpoint: Option<EndpointId>,
    pub path: Vec<String>,
    pub mode: EncryptionMode,
}

impl EncryptionRule {
    /// Whether this rule applies to records flowing through `endpoint`: its
    /// own prefix matches, or it has none and its first path segment is not
    /// itself an `apiN` endpoint prefix meant for some other rule.
    pub fn applies_to(&self, endpoint: EndpointId) -> bool {
        match self.endpoint {
            Some(scoped) => scoped == endpoint,
            None => true,
        }
    }
}

/// Parses `"path1:MODE,apiN.path2:MODE,…"` (spec §6 `field.encryption.rules`).
pub fn parse_rules(spec: &str) -> Result<Vec<EncryptionRule>, CryptoError> {
    let mut rules = Vec::new();
    for entry in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (target, mode_str) = entry
            .rsplit_once(':')
            .ok_or_else(|| CryptoError::MalformedRule(entry.to_string()))?;
        let mode: EncryptionMode = mode_str.parse()?;
        let (endpoint, path) = split_endpoint_prefix(target);
        if path.is_empty() {
            return Err(CryptoError::MalformedRule(entry.to_string()));
        }
        rules.push(EncryptionRule { endpoint, path, mode });
    }
    check_no_overlaps(&rules)?;
    Ok(rules)
}

fn split_endpoint_prefix(target: &str) -> (Option<EndpointId>, Vec<String>) {
    let mut segments: Vec<&str> = target.split('.').collect();
    if let Some(first) = segments.first() {
        if let Some(id) = parse_endpoint_segment(first) {
            segments.remove(0);
            return (Some(id), segments.into_iter().map(str::to_string).collect());
        }
    }
    (None, target.split('.').map(str::to_string).collect())
}

fn parse_endpoint_segment(segment: &str) -> Option<EndpointId> {
    let digits = segment.strip_prefix("api")?;
    let n: u8 = digits.parse().ok()?;
    EndpointId::new(n).ok()
}

fn check_no_overlaps(rules: &[EncryptionRule]) -> Result<(), CryptoError> {
    for (i, a) in rules.iter().enumerate() {
        for b in &rules[i + 1..] {
            if a.endpoint != b.endpoint {
                continue;
            }
            if a.path == b.path {
                return Err(CryptoError::OverlappingRules(
                    a.path.join("."),
                    b.path.join("."),
                ));
            }
        }
    }
    Ok(())
}
