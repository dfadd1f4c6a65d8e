use foundation::SlotId;

/// Names one of the layers a comparison can display.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerSelector {
    Original,
    Slot(SlotId),
}

impl LayerSelector {
    pub const SLOT1: LayerSelector = LayerSelector::Slot(SlotId::FIRST);
    pub const SLOT2: LayerSelector = LayerSelector::Slot(SlotId::SECOND);

    /// Every selector, in display order.
    pub fn all() -> [LayerSelector; 3] {
        [LayerSelector::Original, Self::SLOT1, Self::SLOT2]
    }

    pub fn slot(self) -> Option<SlotId> {
        match self {
            LayerSelector::Original => None,
            LayerSelector::Slot(slot) => Some(slot),
        }
    }
}

impl std::fmt::Display for LayerSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerSelector::Original => write!(f, "original"),
            LayerSelector::Slot(slot) => write!(f, "{slot}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLayer(pub String);

impl std::fmt::Display for UnknownLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown layer '{}' (expected original, slot1 or slot2)", self.0)
    }
}

impl std::error::Error for UnknownLayer {}

impl std::str::FromStr for LayerSelector {
    type Err = UnknownLayer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "original" => Ok(LayerSelector::Original),
            "slot1" => Ok(Self::SLOT1),
            "slot2" => Ok(Self::SLOT2),
            _ => Err(UnknownLayer(s.to_string())),
        }
    }
}
