use foundation::SlotId;
use serde::{Deserialize, Serialize};

/// One simplification algorithm the service knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmInfo {
    /// Identifier sent to the simplification service.
    pub id: String,
    pub label: String,
    /// Listed but not selectable.
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl AlgorithmInfo {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            available: true,
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    Empty,
    TooMany { count: usize },
    Unknown(String),
    Unavailable(String),
    Duplicate(String),
}

impl std::fmt::Display for SelectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionError::Empty => write!(f, "select at least one algorithm"),
            SelectionError::TooMany { count } => write!(
                f,
                "at most {} algorithms can be compared, got {count}",
                SlotId::MAX_SLOTS
            ),
            SelectionError::Unknown(id) => write!(f, "unknown algorithm '{id}'"),
            SelectionError::Unavailable(id) => write!(f, "algorithm '{id}' is not available"),
            SelectionError::Duplicate(id) => write!(f, "algorithm '{id}' selected twice"),
        }
    }
}

impl std::error::Error for SelectionError {}

/// A validated pick of one or two algorithms, in pick order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmSelection {
    algorithms: Vec<String>,
}

impl AlgorithmSelection {
    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }

    pub fn algorithms(&self) -> &[String] {
        &self.algorithms
    }

    pub fn algorithm(&self, slot: SlotId) -> Option<&str> {
        self.algorithms.get(slot.index()).map(String::as_str)
    }

    /// `(slot, algorithm id)` pairs in slot order.
    pub fn slots(&self) -> impl Iterator<Item = (SlotId, &str)> + '_ {
        SlotId::all()
            .into_iter()
            .zip(self.algorithms.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmRegistry {
    algorithms: Vec<AlgorithmInfo>,
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl AlgorithmRegistry {
    pub fn new(algorithms: Vec<AlgorithmInfo>) -> Self {
        Self { algorithms }
    }

    /// The identifiers the simplification service accepts.
    pub fn builtin() -> Self {
        Self::new(vec![
            AlgorithmInfo::new(
                "Ramer-Douglas-Peucker (beépített)",
                "Ramer-Douglas-Peucker (built-in)",
            ),
            AlgorithmInfo::new(
                "Ramer-Douglas-Peucker (implementált)",
                "Ramer-Douglas-Peucker (implemented)",
            ),
            AlgorithmInfo::new(
                "Ramer-Douglas-Peucker (továbbfejlesztett)",
                "Ramer-Douglas-Peucker (improved)",
            ),
            AlgorithmInfo::new("Visvaligam-Whyatt", "Visvalingam-Whyatt"),
            AlgorithmInfo::new("Reumann-Witkam", "Reumann-Witkam"),
            AlgorithmInfo::new("Merőleges távolság", "Perpendicular distance"),
            AlgorithmInfo::new("Sugárirányú távolság", "Radial distance"),
            AlgorithmInfo::new("N-edik pont", "Nth point"),
            AlgorithmInfo::new("Lang", "Lang"),
            AlgorithmInfo::new("Véletlenszerű", "Random"),
            AlgorithmInfo::new("Opheim", "Opheim").unavailable(),
        ])
    }

    pub fn all(&self) -> &[AlgorithmInfo] {
        &self.algorithms
    }

    pub fn available(&self) -> impl Iterator<Item = &AlgorithmInfo> + '_ {
        self.algorithms.iter().filter(|a| a.available)
    }

    pub fn get(&self, id: &str) -> Option<&AlgorithmInfo> {
        self.algorithms.iter().find(|a| a.id == id)
    }

    /// Validates a pick of algorithm ids and assigns slots in pick order.
    pub fn select<S: AsRef<str>>(&self, picks: &[S]) -> Result<AlgorithmSelection, SelectionError> {
        if picks.is_empty() {
            return Err(SelectionError::Empty);
        }
        if picks.len() > SlotId::MAX_SLOTS {
            return Err(SelectionError::TooMany { count: picks.len() });
        }

        let mut algorithms: Vec<String> = Vec::with_capacity(picks.len());
        for pick in picks {
            let id = pick.as_ref();
            let info = self
                .get(id)
                .ok_or_else(|| SelectionError::Unknown(id.to_string()))?;
            if !info.available {
                return Err(SelectionError::Unavailable(id.to_string()));
            }
            if algorithms.iter().any(|a| a == id) {
                return Err(SelectionError::Duplicate(id.to_string()));
            }
            algorithms.push(id.to_string());
        }

        Ok(AlgorithmSelection { algorithms })
    }
}

#[cfg(test)]
mod tests {
    use super::{AlgorithmInfo, AlgorithmRegistry, SelectionError};
    use foundation::SlotId;
    use pretty_assertions::assert_eq;

    fn registry() -> AlgorithmRegistry {
        AlgorithmRegistry::new(vec![
            AlgorithmInfo::new("VW", "Visvalingam-Whyatt"),
            AlgorithmInfo::new("RDP", "Ramer-Douglas-Peucker"),
            AlgorithmInfo::new("OPH", "Opheim").unavailable(),
        ])
    }

    #[test]
    fn slots_follow_pick_order_not_alphabetical() {
        let sel = registry().select(&["VW", "RDP"]).expect("select");
        let slots: Vec<(SlotId, &str)> = sel.slots().collect();
        assert_eq!(slots, vec![(SlotId::FIRST, "VW"), (SlotId::SECOND, "RDP")]);
        assert_eq!(sel.algorithm(SlotId::SECOND), Some("RDP"));
    }

    #[test]
    fn single_pick_fills_first_slot_only() {
        let sel = registry().select(&["RDP"]).expect("select");
        assert_eq!(sel.len(), 1);
        assert_eq!(sel.algorithm(SlotId::SECOND), None);
    }

    #[test]
    fn rejects_bad_picks() {
        let r = registry();
        let empty: [&str; 0] = [];
        assert_eq!(r.select(&empty), Err(SelectionError::Empty));
        assert_eq!(
            r.select(&["RDP", "VW", "RDP"]),
            Err(SelectionError::TooMany { count: 3 })
        );
        assert_eq!(
            r.select(&["XYZ"]),
            Err(SelectionError::Unknown("XYZ".into()))
        );
        assert_eq!(
            r.select(&["OPH"]),
            Err(SelectionError::Unavailable("OPH".into()))
        );
        assert_eq!(
            r.select(&["RDP", "RDP"]),
            Err(SelectionError::Duplicate("RDP".into()))
        );
    }

    #[test]
    fn builtin_flags_opheim_unavailable() {
        let r = AlgorithmRegistry::builtin();
        assert_eq!(r.get("Opheim").map(|a| a.available), Some(false));
        assert_eq!(r.available().count(), r.all().len() - 1);
    }

    #[test]
    fn registry_loads_from_json_with_default_availability() {
        let r: AlgorithmRegistry = serde_json::from_str(
            r#"{"algorithms":[{"id":"Lang","label":"Lang"},{"id":"X","label":"X","available":false}]}"#,
        )
        .expect("parse");
        assert!(r.get("Lang").expect("lang").available);
        assert!(!r.get("X").expect("x").available);
    }
}
