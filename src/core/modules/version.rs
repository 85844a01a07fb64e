//! Dotted version string comparison for module compatibility bounds.

/// Parse a dotted numeric version ("2", "2.4", "2.4.1") into components.
/// Returns None when any component is not a plain number.
pub fn parse_version(version: &str) -> Option<Vec<u64>> {
    let trimmed = version.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect()
}

/// Compare two dotted versions component-wise; missing components count as 0,
/// so "2.4" == "2.4.0".
pub fn compare_versions(left: &[u64], right: &[u64]) -> std::cmp::Ordering {
    let len = left.len().max(right.len());
    for i in 0..len {
        let l = left.get(i).copied().unwrap_or(0);
        let r = right.get(i).copied().unwrap_or(0);
        match l.cmp(&r) {
            std::cmp::Ordering::Equal => continue,
            other => return other,
        }
    }
    std::cmp::Ordering::Equal
}

/// Inclusive engine-version bounds declared by a module.
#[derive(Debug, Clone, Default)]
pub struct VersionBounds {
    pub min: Option<Vec<u64>>,
    pub max: Option<Vec<u64>>,
}

impl VersionBounds {
    /// Whether the running engine version falls inside these bounds.
    pub fn accepts(&self, engine_version: &[u64]) -> bool {
        if let Some(min) = &self.min {
            if compare_versions(engine_version, min) == std::cmp::Ordering::Less {
                return false;
            }
        }
        if let Some(max) = &self.max {
            if compare_versions(engine_version, max) == std::cmp::Ordering::Greater {
                return false;
            }
        }
        true
    }
}
