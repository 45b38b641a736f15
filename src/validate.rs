//! The usability predicate that gates every assignment during merge and
//! finalize. An unusable candidate is treated identically to absence.

use serde_json::Value;

use crate::schema::RewardPointsSummary;

/// Sentinel strings the upstream sources use to mean "unknown".
const NULL_SENTINELS: &[&str] = &["null", "na", "n/a", "", "undefined"];

pub trait Usable {
    fn is_usable(&self) -> bool;
}

impl Usable for f64 {
    // Zero is a legitimate balance, not a sentinel for "unknown".
    fn is_usable(&self) -> bool {
        !self.is_nan()
    }
}

impl Usable for str {
    fn is_usable(&self) -> bool {
        let lowered = self.trim().to_lowercase();
        !NULL_SENTINELS.contains(&lowered.as_str())
    }
}

impl Usable for String {
    fn is_usable(&self) -> bool {
        self.as_str().is_usable()
    }
}

impl Usable for &str {
    fn is_usable(&self) -> bool {
        (**self).is_usable()
    }
}

impl<T> Usable for Vec<T> {
    fn is_usable(&self) -> bool {
        !self.is_empty()
    }
}

impl<T: Usable> Usable for Option<T> {
    fn is_usable(&self) -> bool {
        match self {
            Some(inner) => inner.is_usable(),
            None => false,
        }
    }
}

impl Usable for RewardPointsSummary {
    // Usable when any component carries a value.
    fn is_usable(&self) -> bool {
        self.opening_balance.is_usable()
            || self.earned.is_usable()
            || self.closing_balance.is_usable()
    }
}

impl Usable for Value {
    fn is_usable(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(_) => true,
            Value::Number(n) => n.as_f64().map(|f| f.is_usable()).unwrap_or(true),
            Value::String(s) => s.is_usable(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
        }
    }
}
