use concordium_std::{concordium_cfg_test, to_bytes, Serial};

/// Sink for serialized coordinator events.
///
/// Logging never fails: an event that cannot be stored is dropped.
pub trait HasEventLog {
    fn log_raw(&mut self, event: Vec<u8>);

    fn log<E: Serial>(&mut self, event: &E) {
        self.log_raw(to_bytes(event));
    }
}

/// Event log kept in memory, in order of emission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemEventLog {
    logs: Vec<Vec<u8>>,
}

impl MemEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logs(&self) -> &[Vec<u8>] {
        &self.logs
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    /// Hands out the logged events, leaving the log empty.
    pub fn drain(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.logs)
    }
}

impl HasEventLog for MemEventLog {
    fn log_raw(&mut self, event: Vec<u8>) {
        self.logs.push(event);
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_std::{claim, claim_eq, concordium_test};

    #[concordium_test]
    fn test_log_and_drain() {
        let mut logger = MemEventLog::new();
        claim!(logger.is_empty());

        logger.log(&7u64);
        logger.log(&String::from("listed"));

        claim_eq!(logger.len(), 2);
        claim_eq!(logger.logs()[0], to_bytes(&7u64));

        let drained = logger.drain();
        claim_eq!(drained.len(), 2);
        claim!(logger.is_empty());
    }
}
