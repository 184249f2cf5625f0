pub trait Sources {
    type SourceId: Copy + Eq + std::hash::Hash;
    type Source: Source;

    fn get_source(&self, id: Self::SourceId) -> Option<&Cached<Self::Source>>;
}

pub trait Source {
    fn name_str(&self) -> &str;
    fn source_str(&self) -> &str;
}

impl<S: Source> Sources for Vec<Cached<S>> {
    type SourceId = usize;
    type Source = S;

    fn get_source(&self, id: usize) -> Option<&Cached<S>> {
        self.get(id)
    }
}

/// `(name, text)`
impl Source for (String, String) {
    fn name_str(&self) -> &str {
        &self.0
    }

    fn source_str(&self) -> &str {
        &self.1
    }
}

/// A source indexed by the byte offset at which each of its lines starts.
///
/// The index can be extended in place when a source is still being read.
#[derive(Debug, Clone)]
pub struct Cached<S: Source> {
    source: S,
    line_starts: Vec<usize>,
}

impl<S: Source> Cached<S> {
    pub fn new(source: S) -> Self {
        let mut cached = Self {
            source,
            line_starts: vec![0],
        };
        cached.index_from(0);
        cached
    }

    pub fn as_source(&self) -> &S {
        &self.source
    }

    /// Modify the source, keeping the index for everything before `from`.
    ///
    /// The text before byte `from` must be left unchanged by `edit`.
    pub fn edit(&mut self, from: usize, edit: impl FnOnce(&mut S)) {
        edit(&mut self.source);

        let kept = self.line_starts.partition_point(|&start| start <= from);
        self.line_starts.truncate(kept);

        let last_start = self.line_starts.last().copied().unwrap_or_default();
        self.index_from(last_start);
    }

    fn index_from(&mut self, from: usize) {
        let Some(rest) = self.source.source_str().get(from..) else {
            return;
        };

        let starts = rest.match_indices('\n').map(|(i, _)| from + i + 1);
        self.line_starts.extend(starts);
    }

    /// Zero-based index of the line containing `byte`.
    pub fn line_index(&self, byte: usize) -> Option<usize> {
        if byte > self.source_str().len() {
            return None;
        }

        Some(self.line_starts.partition_point(|&start| start <= byte) - 1)
    }

    /// One-based line and column of `byte`.
    pub fn line_col(&self, byte: usize) -> Option<(usize, usize)> {
        let line = self.line_index(byte)?;
        let col = byte - self.line_starts[line];

        Some((line + 1, col + 1))
    }

    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// The text of a line without its line ending.
    pub fn line(&self, line: usize) -> Option<&str> {
        let text = self.source_str();

        let start = self.line_start(line)?;
        let end = self
            .line_start(line + 1)
            .map_or(text.len(), |next| next - 1);

        let line = text.get(start..end)?;
        Some(line.strip_suffix('\r').unwrap_or(line))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

impl<S: Source> Source for Cached<S> {
    fn name_str(&self) -> &str {
        self.source.name_str()
    }

    fn source_str(&self) -> &str {
        self.source.source_str()
    }
}
