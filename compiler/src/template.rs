// template.rs — Code templates of procedure implementations
//
// An implementation is a fragment of host-language (TypeScript) source with
// holes: `$name` / `${name}` read an input slot, `@flow(...)` leaves the
// procedure through one of its output flows. `$$` and `@@` escape the sigils.
// Lexing uses `logos`; the token stream is parsed with `chumsky`.
//
// Preconditions: template source is valid UTF-8.
// Postconditions: a parsed template reproduces its source text when every
//                 hole is rendered back as itself.
// Failure modes: a stray sigil or a flow exit not in call position produces
//                `TemplateError`s; parsing reports every error it finds.
// Side effects: none.

use std::collections::HashSet;
use std::fmt;
use std::ops::Range;

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;
use chumsky::span::SimpleSpan;
use logos::Logos;

// ── Tokens ──────────────────────────────────────────────────────────────────

#[derive(Logos, Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    #[token("$$")]
    DollarEscape,
    #[token("@@")]
    AtEscape,

    /// Input hole, `$a` or `${a}`. Carries the slot name.
    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice()[1..].to_string())]
    #[regex(r"\$\{[A-Za-z_][A-Za-z0-9_]*\}", braced_name)]
    Input(String),

    /// Flow exit, `@result`. Carries the flow name.
    #[regex(r"@[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Exit(String),

    /// Verbatim host-language text.
    #[regex(r"[^$@]+", |lex| lex.slice().to_string())]
    Text(String),
}

fn braced_name(lex: &mut logos::Lexer<'_, Token>) -> String {
    let slice = lex.slice();
    slice[2..slice.len() - 1].to_string()
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::DollarEscape => write!(f, "$$"),
            Token::AtEscape => write!(f, "@@"),
            Token::Input(name) => write!(f, "${name}"),
            Token::Exit(name) => write!(f, "@{name}"),
            Token::Text(text) => write!(f, "{text:?}"),
        }
    }
}

// ── Template ────────────────────────────────────────────────────────────────

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Input(String),
    Exit(String),
}

/// What a hole stands for when rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hole<'t> {
    Input(&'t str),
    Exit(&'t str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

/// A template syntax error with its byte range in the template source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateError {
    pub span: Range<usize>,
    pub message: String,
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}: {}", self.span.start, self.span.end, self.message)
    }
}

impl std::error::Error for TemplateError {}

impl Template {
    /// Parse template source. Returns every error found.
    pub fn parse(source: &str) -> Result<Template, Vec<TemplateError>> {
        let mut errors = Vec::new();
        let mut tokens = Vec::new();
        for (result, range) in Token::lexer(source).spanned() {
            match result {
                Ok(token) => tokens.push((token, SimpleSpan::from(range))),
                Err(()) => errors.push(TemplateError {
                    message: format!(
                        "unexpected {:?}: write $$ or @@ for a literal sigil",
                        &source[range.clone()]
                    ),
                    span: range,
                }),
            }
        }

        let len = source.len();
        let eoi: SimpleSpan = (len..len).into();
        let stream = Stream::from_iter(tokens).map(eoi, |(t, s): (_, _)| (t, s));
        let (segments, parse_errors) = template_parser().parse(stream).into_output_errors();
        errors.extend(parse_errors.into_iter().map(|e| TemplateError {
            span: e.span().start()..e.span().end(),
            message: e.to_string(),
        }));

        match segments {
            Some(segments) if errors.is_empty() => Ok(Template {
                source: source.to_string(),
                segments: merge_text(segments),
            }),
            _ => Err(errors),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Input slot names in first-use order, without duplicates.
    pub fn inputs(&self) -> Vec<&str> {
        self.holes(|seg| match seg {
            Segment::Input(name) => Some(name),
            _ => None,
        })
    }

    /// Flow names in first-use order, without duplicates.
    pub fn exits(&self) -> Vec<&str> {
        self.holes(|seg| match seg {
            Segment::Exit(name) => Some(name),
            _ => None,
        })
    }

    fn holes<'t>(&'t self, pick: impl Fn(&'t Segment) -> Option<&'t String>) -> Vec<&'t str> {
        let mut seen = HashSet::new();
        self.segments
            .iter()
            .filter_map(pick)
            .filter(|name| seen.insert(name.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Substitute every hole with the text returned by `fill`.
    pub fn render(&self, mut fill: impl FnMut(Hole<'_>) -> String) -> String {
        let mut out = String::with_capacity(self.source.len() + 32);
        for seg in &self.segments {
            match seg {
                Segment::Text(text) => out.push_str(text),
                Segment::Input(name) => out.push_str(&fill(Hole::Input(name))),
                Segment::Exit(name) => out.push_str(&fill(Hole::Exit(name))),
            }
        }
        out
    }
}

// ── Parser ──────────────────────────────────────────────────────────────────

fn template_parser<'tokens, I>(
) -> impl Parser<'tokens, I, Vec<Segment>, extra::Err<Rich<'tokens, Token, SimpleSpan>>>
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    let text = select! {
        Token::Text(s) => Segment::Text(s),
        Token::DollarEscape => Segment::Text("$".to_string()),
        Token::AtEscape => Segment::Text("@".to_string()),
    };

    let input = select! { Token::Input(name) => Segment::Input(name) };

    // A flow exit is substituted by a callable expression, so it must be
    // applied right away.
    let call_text = select! { Token::Text(s) if s.starts_with('(') => s };
    let exit = select! { Token::Exit(name) => name }
        .then(call_text)
        .map(|(name, rest)| vec![Segment::Exit(name), Segment::Text(rest)]);

    let single = text.or(input).map(|seg| vec![seg]);

    exit.or(single)
        .repeated()
        .collect::<Vec<_>>()
        .then_ignore(end())
        .map(|groups| groups.into_iter().flatten().collect())
}

fn merge_text(segments: Vec<Segment>) -> Vec<Segment> {
    let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());
    for seg in segments {
        match (merged.last_mut(), seg) {
            (Some(Segment::Text(prev)), Segment::Text(next)) => prev.push_str(&next),
            (_, seg) => merged.push(seg),
        }
    }
    merged
}
