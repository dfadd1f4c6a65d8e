use foundation::{Generation, GenerationCounter};

/// Returned when a gate already has a request in flight.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GateBusy {
    pub pending: Generation,
}

/// Single in-flight lock for one kind of request.
///
/// Each acquisition hands out a fresh generation. Only the response carrying
/// the pending generation may release the gate; anything else is stale.
/// There is no cancellation: `abandon` forgets the pending generation so its
/// eventual response is detected as stale and dropped.
#[derive(Debug, Default, Clone)]
pub struct RequestGate {
    counter: GenerationCounter,
    pending: Option<Generation>,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&mut self) -> Result<Generation, GateBusy> {
        if let Some(pending) = self.pending {
            return Err(GateBusy { pending });
        }
        let generation = self.counter.advance();
        self.pending = Some(generation);
        Ok(generation)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<Generation> {
        self.pending
    }

    /// Latest generation handed out, pending or not.
    pub fn latest(&self) -> Generation {
        self.counter.current()
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.pending == Some(generation)
    }

    /// Releases the gate if `generation` is the pending one.
    ///
    /// Returns `false` for a stale generation; the gate is left as is.
    pub fn release(&mut self, generation: Generation) -> bool {
        if self.is_current(generation) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Drops the pending generation, if any, making its response stale.
    pub fn abandon(&mut self) -> Option<Generation> {
        self.pending.take()
    }
}
