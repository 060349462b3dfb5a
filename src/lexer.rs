//! Lexical analysis: splits a raw command line into words.
//!
//! Whitespace separates words unless a quote is open. Quote characters are
//! consumed, a backslash outside single quotes makes the next character
//! literal. Unterminated quotes are tolerated: whatever was buffered becomes
//! the final word. After lexing, words containing `*` are expanded against
//! the filesystem (see [`crate::wildcard`]).

use crate::wildcard;
use log::debug;
use std::path::Path;

/// A single word produced by the lexer.
pub type Token = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    Unquoted,
    SingleQuote,
    DoubleQuote,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    quote: QuoteState,
    escape_pending: bool,
    buffer: String,
    /// Set once a quote was opened in the current word, so `""` still yields a word.
    quoted: bool,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            quote: QuoteState::Unquoted,
            escape_pending: false,
            buffer: String::new(),
            quoted: false,
        }
    }

    /// Runs the scan to completion and returns the words in input order.
    fn make_tokens(&mut self) -> Vec<Token> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            if self.escape_pending {
                self.buffer.push(ch);
                self.escape_pending = false;
                continue;
            }
            match self.quote {
                QuoteState::Unquoted => self.handle_unquoted(ch, &mut out),
                QuoteState::SingleQuote => self.handle_single_quote(ch),
                QuoteState::DoubleQuote => self.handle_double_quote(ch),
            }
        }

        // An open quote or a trailing backslash is not an error.
        self.finish_word(&mut out);
        out
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn handle_unquoted(&mut self, ch: char, out: &mut Vec<Token>) {
        match ch {
            c if c.is_whitespace() => self.finish_word(out),
            '\\' => self.escape_pending = true,
            '\'' => {
                self.quote = QuoteState::SingleQuote;
                self.quoted = true;
            }
            '"' => {
                self.quote = QuoteState::DoubleQuote;
                self.quoted = true;
            }
            c => self.buffer.push(c),
        }
    }

    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => self.quote = QuoteState::Unquoted,
            c => self.buffer.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) {
        match ch {
            '"' => self.quote = QuoteState::Unquoted,
            '\\' => self.escape_pending = true,
            c => self.buffer.push(c),
        }
    }

    fn finish_word(&mut self, out: &mut Vec<Token>) {
        if !self.buffer.is_empty() || self.quoted {
            out.push(std::mem::take(&mut self.buffer));
        }
        self.quoted = false;
    }
}

/// Splits `line` into words without wildcard expansion.
pub fn split_into_tokens(line: &str) -> Vec<Token> {
    LexingFSM::new(line).make_tokens()
}

/// Splits `line` into words and expands wildcard words relative to the
/// process working directory.
pub fn tokenize(line: &str) -> Vec<Token> {
    tokenize_in(Path::new("."), line)
}

/// Like [`tokenize`], but wildcard words are resolved relative to `cwd`.
pub fn tokenize_in(cwd: &Path, line: &str) -> Vec<Token> {
    let tokens: Vec<Token> = split_into_tokens(line)
        .into_iter()
        .flat_map(|token| wildcard::expand(cwd, &token))
        .collect();
    debug!("tokens: {:?}", tokens);
    tokens
}
