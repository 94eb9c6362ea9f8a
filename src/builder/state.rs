/// Settings for one build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Type name for the root schema of the first document, used when the
    /// root has no `title`. Defaults to the name derived from the document
    /// source name.
    pub root_name: Option<String>,
}

impl Options {
    /// Create options with every setting at its default.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = Some(name.into());
        self
    }
}
