//! Best-effort expansion of a regular expression into one matching string.
//!
//! This is not a regex inverter: literals, escapes, character classes, groups
//! and quantifiers are expanded to their shortest form, alternations take
//! their first branch. Anything else (look-arounds, unicode classes, back
//! references) gives up, and the caller falls back to a fixed example.

use std::iter::Peekable;
use std::str::Chars;

use regex::Regex;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Char(char),
    Group(Vec<Node>),
    Repeat(Box<Node>, u32),
}

impl Node {
    fn render(&self, out: &mut String) {
        match self {
            Self::Char(ch) => out.push(*ch),
            Self::Group(nodes) => nodes.iter().for_each(|node| node.render(out)),
            Self::Repeat(node, count) => {
                for _ in 0..*count {
                    node.render(out);
                }
            }
        }
    }
}

/// Candidate characters tried for negated classes and `\W`-like escapes.
const CANDIDATES: &str = "a0A_- .zZ9";

struct Parser<'p> {
    chars: Peekable<Chars<'p>>,
}

impl Parser<'_> {
    /// alternation := sequence ('|' sequence)*
    fn alternation(&mut self) -> Option<Vec<Node>> {
        let first = self.sequence()?;
        while self.chars.peek() == Some(&'|') {
            self.chars.next();
            // other branches must still be well-formed
            self.sequence()?;
        }
        Some(first)
    }

    fn sequence(&mut self) -> Option<Vec<Node>> {
        let mut nodes = Vec::new();
        while let Some(&ch) = self.chars.peek() {
            if ch == '|' || ch == ')' {
                break;
            }
            self.chars.next();
            let atom = match ch {
                '^' | '$' => continue,
                '.' => Node::Char('a'),
                '\\' => match self.escape()? {
                    Some(node) => node,
                    None => continue,
                },
                '[' => Node::Char(self.class()?),
                '(' => Node::Group(self.group()?),
                '*' | '+' | '?' | '{' => return None,
                ch => Node::Char(ch),
            };
            nodes.push(self.quantified(atom)?);
        }
        Some(nodes)
    }

    fn group(&mut self) -> Option<Vec<Node>> {
        if self.chars.peek() == Some(&'?') {
            self.chars.next();
            match self.chars.next()? {
                ':' => {}
                'P' | '<' => {
                    // named group, skip the name
                    for ch in self.chars.by_ref() {
                        if ch == '>' {
                            break;
                        }
                    }
                }
                _ => return None,
            }
        }
        let nodes = self.alternation()?;
        (self.chars.next()? == ')').then_some(nodes)
    }

    /// Returns `Some(None)` for zero-width escapes.
    fn escape(&mut self) -> Option<Option<Node>> {
        let node = match self.chars.next()? {
            'd' => Node::Char('0'),
            'w' | 'D' | 'S' => Node::Char('a'),
            'W' => Node::Char('-'),
            's' => Node::Char(' '),
            'n' => Node::Char('\n'),
            't' => Node::Char('\t'),
            'r' => Node::Char('\r'),
            'b' | 'B' | 'A' | 'z' => return Some(None),
            'p' | 'P' | 'x' | 'u' => return None,
            ch if ch.is_ascii_digit() => return None,
            ch => Node::Char(ch),
        };
        Some(Some(node))
    }

    fn class(&mut self) -> Option<char> {
        let negated = self.chars.peek() == Some(&'^');
        if negated {
            self.chars.next();
        }

        let mut ranges: Vec<(char, char)> = Vec::new();
        let mut first = true;
        loop {
            let ch = self.chars.next()?;
            if ch == ']' && !first {
                break;
            }
            first = false;
            let start = match ch {
                '\\' => match self.chars.next()? {
                    'd' => {
                        ranges.push(('0', '9'));
                        continue;
                    }
                    'w' => {
                        ranges.extend([('a', 'z'), ('A', 'Z'), ('0', '9'), ('_', '_')]);
                        continue;
                    }
                    's' => {
                        ranges.push((' ', ' '));
                        continue;
                    }
                    'n' => '\n',
                    't' => '\t',
                    'p' | 'P' | 'D' | 'W' | 'S' => return None,
                    escaped => escaped,
                },
                '[' if self.chars.peek() == Some(&':') => return None,
                ch => ch,
            };

            let mut lookahead = self.chars.clone();
            if lookahead.next() == Some('-') && lookahead.peek().is_some_and(|end| *end != ']') {
                self.chars.next();
                let end = self.chars.next()?;
                ranges.push((start, end));
            } else {
                ranges.push((start, start));
            }
        }

        if negated {
            CANDIDATES
                .chars()
                .find(|ch| !ranges.iter().any(|&(start, end)| (start..=end).contains(ch)))
        } else {
            ranges.first().map(|(start, _)| *start)
        }
    }

    fn quantified(&mut self, atom: Node) -> Option<Node> {
        let count = match self.chars.peek() {
            Some('*' | '?') => {
                self.chars.next();
                0
            }
            Some('+') => {
                self.chars.next();
                1
            }
            Some('{') => {
                self.chars.next();
                let mut spec = String::new();
                loop {
                    match self.chars.next()? {
                        '}' => break,
                        ch => spec.push(ch),
                    }
                }
                let min = spec.split(',').next()?.trim();
                min.parse().ok()?
            }
            _ => return Some(atom),
        };
        // lazy quantifier
        if self.chars.peek() == Some(&'?') {
            self.chars.next();
        }
        Some(Node::Repeat(Box::new(atom), count))
    }
}

fn expand(pattern: &str) -> Option<String> {
    let mut parser = Parser {
        chars: pattern.chars().peekable(),
    };
    let nodes = parser.alternation()?;
    if parser.chars.next().is_some() {
        return None;
    }

    let mut result = String::new();
    nodes.iter().for_each(|node| node.render(&mut result));
    Some(result)
}

/// Produces a string matching `pattern`, or `None` when the expansion fails.
pub(super) fn sample_pattern(pattern: &str) -> Option<String> {
    let regex = match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(error) => {
            debug!(%pattern, %error, "invalid pattern");
            return None;
        }
    };

    let candidate = expand(pattern)?;
    if regex.is_match(&candidate) {
        Some(candidate)
    } else {
        debug!(%pattern, %candidate, "expanded pattern does not match");
        None
    }
}
