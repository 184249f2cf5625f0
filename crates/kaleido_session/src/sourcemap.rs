use kaleido_diagnostic::sources::Cached;
use kaleido_diagnostic::span::Span;
use kaleido_utils::keyvec::{declare_key_type, KeyVec};

declare_key_type! {
    pub struct SourceId;
}

#[derive(Default, Debug, Clone)]
pub struct SourceMap {
    inner: KeyVec<SourceId, Cached<Source>>,
}

#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub source: String,
}

impl Source {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

impl SourceMap {
    pub fn insert(&mut self, source: Source) -> SourceId {
        self.inner.insert(Cached::new(source))
    }

    /// Replace the text of a source whose input is still being read.
    ///
    /// Streaming sources (the REPL) only know the text consumed so far, so the
    /// driver refreshes it before reporting against it.
    ///
    /// # Panics
    /// Panics if `id` does not belong to this map.
    pub fn update_text(&mut self, id: SourceId, text: &str) {
        let cached = &mut self.inner[id];

        let known = cached.as_source().source.as_str();
        let from = known.len();

        if !text.starts_with(known) {
            cached.edit(0, |source| text.clone_into(&mut source.source));
        } else if text.len() > from {
            cached.edit(from, |source| source.source.push_str(&text[from..]));
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl kaleido_diagnostic::sources::Sources for SourceMap {
    type SourceId = SourceId;
    type Source = Source;

    fn get_source(&self, id: Self::SourceId) -> Option<&Cached<Self::Source>> {
        self.inner.get(id)
    }
}

impl kaleido_diagnostic::sources::Source for Source {
    fn name_str(&self) -> &str {
        &self.name
    }

    fn source_str(&self) -> &str {
        &self.source
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    pub span: Span,
    pub source_id: SourceId,
}

impl SourceSpan {
    pub fn new(span: Span, source_id: SourceId) -> Self {
        Self { span, source_id }
    }
}
