//! Static sender allow-list checked before a message reaches the pipeline

#[derive(Debug, Clone, Default)]
pub struct SenderAllowList {
    suffixes: Vec<String>,
}

impl SenderAllowList {
    pub fn new(suffixes: Vec<String>) -> Self {
        Self { suffixes }
    }

    pub fn is_empty(&self) -> bool {
        self.suffixes.is_empty()
    }

    /// Sender ids carry a transport suffix (`...@c.us`), so entries match
    /// on the end of the id
    pub fn is_authorized(&self, sender: &str) -> bool {
        self.suffixes
            .iter()
            .any(|suffix| !suffix.is_empty() && sender.ends_with(suffix.as_str()))
    }
}
