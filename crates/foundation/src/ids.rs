/// Monotonic request generation.
///
/// Every outbound request is tagged with the generation that was current when
/// it was issued; a response is only applied if its generation is still the
/// current one.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub const ZERO: Generation = Generation(0);

    pub fn new(n: u64) -> Self {
        Generation(n)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// The generation that follows this one.
    pub fn next(self) -> Self {
        Generation(self.0.saturating_add(1))
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out strictly increasing generations.
#[derive(Debug, Default, Clone)]
pub struct GenerationCounter {
    current: Generation,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Generation {
        self.current
    }

    pub fn advance(&mut self) -> Generation {
        self.current = self.current.next();
        self.current
    }
}

/// Comparison slot index. At most two slots exist at a time.
///
/// Slot order is the order in which the algorithms were picked; it drives
/// colour and display preference downstream.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(u8);

impl SlotId {
    pub const MAX_SLOTS: usize = 2;
    pub const FIRST: SlotId = SlotId(0);
    pub const SECOND: SlotId = SlotId(1);

    /// Returns `None` for indices outside `0..MAX_SLOTS`.
    pub fn new(index: usize) -> Option<Self> {
        if index < Self::MAX_SLOTS {
            Some(SlotId(index as u8))
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub fn all() -> [SlotId; 2] {
        [SlotId::FIRST, SlotId::SECOND]
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // User-facing numbering is 1-based.
        write!(f, "slot{}", self.0 + 1)
    }
}
