use std::io;

use termcolor::{ColorSpec, WriteColor};
use unicode_width::UnicodeWidthStr;

use super::sources::{Cached, Source, Sources};
use super::{Config, Diagnostic, Severity, Snippet, SnippetKind};

const TAB: &str = "    ";

impl<S: Sources> Diagnostic<S> {
    pub fn write_to_stream(
        &self,
        sources: &S,
        config: &Config,
        stream: &mut impl WriteColor,
    ) -> io::Result<()> {
        DiagnosticWriter {
            diagnostic: self,
            sources,
            stream,
            config,
        }
        .draw_all()
    }
}

struct DiagnosticWriter<'stream, 'a, W: WriteColor, S: Sources> {
    diagnostic: &'a Diagnostic<S>,
    sources: &'a S,

    stream: &'stream mut W,
    config: &'a Config,
}

impl<'a, W: WriteColor, S: Sources> DiagnosticWriter<'_, 'a, W, S> {
    fn draw_all(mut self) -> io::Result<()> {
        self.draw_header()?;

        let mut snippets: Vec<_> = self.diagnostic.snippets.iter().collect();
        snippets.sort_by_key(|snippet| (snippet.span.start, snippet.kind));

        for snippet in snippets {
            self.draw_snippet(snippet)?;
        }

        for note in &self.diagnostic.notes {
            self.stream.set_color(&self.config.subtle)?;
            write!(self.stream, "{} note:", self.config.note)?;
            self.stream.reset()?;
            writeln!(self.stream, " {note}")?;
        }

        writeln!(self.stream)?;

        Ok(())
    }

    fn draw_header(&mut self) -> io::Result<()> {
        self.stream.set_color(self.get_primary_color())?;

        write!(self.stream, "{}:", self.diagnostic.severity.as_str())?;

        self.stream.reset()?;

        match &self.diagnostic.message {
            Some(message) => writeln!(self.stream, " {message}"),
            None => writeln!(self.stream),
        }
    }

    fn draw_snippet(&mut self, snippet: &Snippet<S>) -> io::Result<()> {
        let Some(source) = self.sources.get_source(snippet.source_id) else {
            // nothing to point at, keep the label
            return writeln!(self.stream, "  {}", snippet.label);
        };

        let source_len = source.source_str().len();
        let start = snippet.span.start.min(source_len);

        let line = source
            .line_index(start)
            .expect("start clamped to source");
        let (line_num, col_num) = source
            .line_col(start)
            .expect("start clamped to source");

        self.stream.set_color(&self.config.subtle)?;
        writeln!(self.stream, "In {}:{line_num}:{col_num}", source.name_str())?;
        self.stream.reset()?;

        let first_line = line.saturating_sub(self.config.context_size);
        let line_num_width = 1 + line_num.ilog10() as usize;

        for context_line in first_line..=line {
            self.draw_gutter(Some(context_line + 1), line_num_width)?;

            let line_str = source.line(context_line).unwrap_or_default();
            writeln!(self.stream, "{}", line_str.replace('\t', TAB))?;
        }

        self.draw_underline(source, snippet, start, line, line_num_width)
    }

    fn draw_underline(
        &mut self,
        source: &Cached<S::Source>,
        snippet: &Snippet<S>,
        start: usize,
        line: usize,
        line_num_width: usize,
    ) -> io::Result<()> {
        let line_start = source.line_start(line).unwrap_or(start);
        let line_str = source.line(line).unwrap_or_default();
        let line_end = line_start + line_str.len();

        // multiline snippets are only underlined up to the end of their first line
        let end = snippet.span.end.clamp(start, line_end);

        let before = &source.source_str()[line_start..start];
        let underlined = &source.source_str()[start..end];

        let offset = str_width(before);
        let width = str_width(underlined).max(1);

        self.draw_gutter(None, line_num_width)?;

        self.stream.set_color(self.get_snippet_color(snippet.kind))?;
        write!(
            self.stream,
            "{:<offset$}{}",
            "",
            self.config.underline.repeat(width)
        )?;

        if !snippet.label.is_empty() {
            write!(self.stream, " {}", snippet.label)?;
        }

        self.stream.reset()?;
        writeln!(self.stream)
    }

    fn draw_gutter(&mut self, line: Option<usize>, line_num_width: usize) -> io::Result<()> {
        self.stream.set_color(&self.config.subtle)?;

        if let Some(line) = line {
            write!(self.stream, "{line:>line_num_width$}")?;
        } else {
            write!(self.stream, "{:>line_num_width$}", "")?;
        }

        write!(self.stream, " {} ", self.config.gutter)?;

        self.stream.reset()
    }

    fn get_primary_color(&self) -> &'a ColorSpec {
        match self.diagnostic.severity {
            Severity::Warning => &self.config.warning_color,
            Severity::Error => &self.config.error_color,
        }
    }

    fn get_snippet_color(&self, kind: SnippetKind) -> &'a ColorSpec {
        match kind {
            SnippetKind::Primary => self.get_primary_color(),
            SnippetKind::Secondary => &self.config.emphasis,
        }
    }
}

fn str_width(s: &str) -> usize {
    let num_tabs = s.chars().filter(|&ch| ch == '\t').count();
    s.width() + num_tabs * TAB.len()
}

#[cfg(test)]
mod tests {
    use termcolor::NoColor;

    use crate::sources::{Cached, Sources};
    use crate::{Config, Diagnostic, Snippet, SnippetKind};

    #[must_use]
    fn diagnostic_to_string<S: Sources>(diagnostic: &Diagnostic<S>, sources: &S) -> String {
        let config = Config::default();
        let mut stream = NoColor::new(vec![]);

        diagnostic
            .write_to_stream(sources, &config, &mut stream)
            .unwrap();

        String::from_utf8(stream.into_inner()).unwrap()
    }

    fn sources(source: &str) -> Vec<Cached<(String, String)>> {
        vec![Cached::new(("repl".to_owned(), source.to_owned()))]
    }

    #[test]
    fn single_line_snippet() {
        let diagnostic = Diagnostic::error()
            .with_message("unknown operator `$`")
            .with_snippet(Snippet::primary("not a binary operator", 0, 2..3));

        let s = diagnostic_to_string(&diagnostic, &sources("a $ b"));
        assert_eq!(
            s,
            "Error: unknown operator `$`\n\
             In repl:1:3\n\
             1 │ a $ b\n  \
             │   ^ not a binary operator\n\
             \n"
        );
    }

    #[test]
    fn context_line_and_note() {
        let diagnostic = Diagnostic::error()
            .with_message("syntax error")
            .with_snippet(Snippet::primary("expected `then`", 0, 8..12))
            .with_note("`if` needs a `then` branch");

        let s = diagnostic_to_string(&diagnostic, &sources("1;\nif x else y"));
        assert_eq!(
            s,
            "Error: syntax error\n\
             In repl:2:6\n\
             1 │ 1;\n\
             2 │ if x else y\n  \
             │      ^^^^ expected `then`\n\
             = note: `if` needs a `then` branch\n\
             \n"
        );
    }

    #[test]
    fn snippets_in_source_order() {
        let diagnostic = Diagnostic::error()
            .with_message("rejected by backend")
            .with_snippet(Snippet::primary("unknown variable `y`", 0, 9..10))
            .with_snippet(Snippet::new(
                SnippetKind::Secondary,
                "in this definition",
                0,
                4..8,
            ));

        let s = diagnostic_to_string(&diagnostic, &sources("def f(x) y"));
        assert_eq!(
            s,
            "Error: rejected by backend\n\
             In repl:1:5\n\
             1 │ def f(x) y\n  \
             │     ^^^^ in this definition\n\
             In repl:1:10\n\
             1 │ def f(x) y\n  \
             │          ^ unknown variable `y`\n\
             \n"
        );
    }

    #[test]
    fn snippet_at_end_of_source() {
        let diagnostic = Diagnostic::error()
            .with_message("unexpected end of input")
            .with_snippet(Snippet::primary("", 0, 5..5));

        let s = diagnostic_to_string(&diagnostic, &sources("f(1,"));
        assert!(s.contains("In repl:1:5\n"), "{s}");
        assert!(s.contains("1 │ f(1,\n  │     ^\n"), "{s}");
    }
}
