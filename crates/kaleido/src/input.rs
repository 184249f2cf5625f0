use std::io::{self, BufRead};
use std::vec;

/// Characters of a reader, read a line at a time as the lexer asks for them.
///
/// A read error ends the input; it is kept for [`LineChars::take_error`].
pub struct LineChars<R> {
    lines: io::Lines<R>,
    prompt: &'static str,

    line: vec::IntoIter<char>,
    error: Option<io::Error>,
}

impl<R: BufRead> LineChars<R> {
    /// `prompt` is printed to stderr before each line is read.
    pub fn new(reader: R, prompt: &'static str) -> Self {
        Self {
            lines: reader.lines(),
            prompt,

            line: vec![].into_iter(),
            error: None,
        }
    }

    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }
}

impl<R: BufRead> Iterator for LineChars<R> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        loop {
            if let Some(ch) = self.line.next() {
                return Some(ch);
            }

            if self.error.is_some() {
                return None;
            }

            eprint!("{}", self.prompt);

            match self.lines.next()? {
                Ok(line) => {
                    let chars: Vec<_> = line.chars().chain(['\n']).collect();
                    self.line = chars.into_iter();
                }
                Err(err) => {
                    self.error = Some(err);
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::LineChars;

    #[test]
    fn lines_end_in_newlines() {
        let mut input = LineChars::new(&b"def f(x) x;\nf(1)"[..], "");

        let text: String = input.by_ref().collect();
        assert_eq!(text, "def f(x) x;\nf(1)\n");
        assert!(input.take_error().is_none());
    }

    #[test]
    fn read_error_is_kept() {
        let mut input = LineChars::new(&b"1;\n\xff\n2;\n"[..], "");

        let text: String = input.by_ref().collect();
        assert_eq!(text, "1;\n");
        assert_eq!(input.next(), None);

        let err = input.take_error().expect("invalid utf-8 should be an error");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
