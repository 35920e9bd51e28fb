use crate::api::MAX_SUBSCRIBE_BATCH;
use crate::error::GatewayError;

/// Ordered, deduplicated set of instrument identifiers, bounded by the
/// front's maximum batch size.
#[derive(Debug, Clone, Default)]
pub struct InstrumentSet {
    entries: Vec<String>,
}

impl InstrumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_codes<I, S>(codes: I) -> Result<Self, GatewayError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for code in codes {
            set.add(code)?;
        }
        Ok(set)
    }

    /// Returns `Ok(true)` when the instrument was inserted, `Ok(false)` when
    /// it was already present.
    pub fn add(&mut self, instrument: impl Into<String>) -> Result<bool, GatewayError> {
        let instrument = instrument.into();
        if self.entries.iter().any(|x| x == &instrument) {
            return Ok(false);
        }
        if self.entries.len() >= MAX_SUBSCRIBE_BATCH {
            return Err(GatewayError::BatchOverflow(MAX_SUBSCRIBE_BATCH));
        }
        self.entries.push(instrument);
        Ok(true)
    }

    pub fn remove(&mut self, instrument: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|x| x != instrument);
        self.entries.len() != before
    }

    pub fn contains(&self, instrument: &str) -> bool {
        self.entries.iter().any(|x| x == instrument)
    }

    /// Ordered snapshot for batch requests.
    pub fn list(&self) -> Vec<String> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
