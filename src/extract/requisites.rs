//! Requisite expressions in disjunctive normal form
//!
//! Component pages state requisites as boolean expressions over course
//! codes, e.g. `( MATA01 E MATA02 ) OU MATA03`. They are compiled into a
//! list of alternatives, each alternative a list of codes that must all be
//! satisfied: `[["MATA03"], ["MATA01", "MATA02"]]`.
//!
//! Operators, case-insensitive:
//! - or: `ou`, `or`, `||`, `+`, `∨`
//! - and: `e`, `and`, `&&`, `*`, `∧`
//! - not: `não`, `nao`, `not`, `!`, `~`, `¬` (negated codes are prefixed with `¬`)

use std::collections::BTreeSet;
use thiserror::Error;

/// Prefix marking a negated code in the output
pub const NEGATION: char = '¬';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequisiteError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("unexpected token {0}")]
    UnexpectedToken(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("trailing input after expression")]
    TrailingInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    Or,
    And,
    Not,
    Ident(String),
}

#[derive(Debug, Clone)]
enum Node {
    Var(String),
    Not(Box<Node>),
    And(Vec<Node>),
    Or(Vec<Node>),
}

fn tokenize(expr: &str) -> Result<Vec<Token>, RequisiteError> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c.is_alphanumeric() || c == '_' {
            let mut word = String::new();
            while let Some(&w) = chars.peek() {
                if w.is_alphanumeric() || w == '_' {
                    word.push(w);
                    chars.next();
                } else {
                    break;
                }
            }
            let token = match word.to_lowercase().as_str() {
                "ou" | "or" => Token::Or,
                "e" | "and" => Token::And,
                "não" | "nao" | "not" => Token::Not,
                _ => Token::Ident(word),
            };
            tokens.push(token);
            continue;
        }

        chars.next();
        let token = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '+' | '∨' => Token::Or,
            '*' | '∧' => Token::And,
            '!' | '~' | '¬' => Token::Not,
            '|' if chars.peek() == Some(&'|') => {
                chars.next();
                Token::Or
            }
            '&' if chars.peek() == Some(&'&') => {
                chars.next();
                Token::And
            }
            other => return Err(RequisiteError::UnexpectedChar(other)),
        };
        tokens.push(token);
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn parse(mut self) -> Result<Node, RequisiteError> {
        let node = self.parse_or()?;
        if self.peek().is_some() {
            return Err(RequisiteError::TrailingInput);
        }
        Ok(node)
    }

    fn parse_or(&mut self) -> Result<Node, RequisiteError> {
        let mut items = vec![self.parse_and()?];
        while self.peek() == Some(&Token::Or) {
            self.advance();
            items.push(self.parse_and()?);
        }
        Ok(flatten(items, true))
    }

    fn parse_and(&mut self) -> Result<Node, RequisiteError> {
        let mut items = vec![self.parse_factor()?];
        while self.peek() == Some(&Token::And) {
            self.advance();
            items.push(self.parse_factor()?);
        }
        Ok(flatten(items, false))
    }

    fn parse_factor(&mut self) -> Result<Node, RequisiteError> {
        match self.advance() {
            Some(Token::Not) => Ok(Node::Not(Box::new(self.parse_factor()?))),
            Some(Token::Ident(name)) => Ok(Node::Var(name)),
            Some(Token::LParen) => {
                let node = self.parse_or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(node),
                    Some(other) => Err(RequisiteError::UnexpectedToken(format!("{:?}", other))),
                    None => Err(RequisiteError::UnexpectedEnd),
                }
            }
            Some(other) => Err(RequisiteError::UnexpectedToken(format!("{:?}", other))),
            None => Err(RequisiteError::UnexpectedEnd),
        }
    }
}

fn flatten(items: Vec<Node>, or: bool) -> Node {
    if items.len() == 1 {
        return items.into_iter().next().unwrap_or(Node::And(Vec::new()));
    }
    let mut flat = Vec::new();
    for item in items {
        match item {
            Node::Or(inner) if or => flat.extend(inner),
            Node::And(inner) if !or => flat.extend(inner),
            other => flat.push(other),
        }
    }
    if or {
        Node::Or(flat)
    } else {
        Node::And(flat)
    }
}

/// Pushes negations down to the variables
fn to_nnf(node: Node, negate: bool) -> Node {
    match node {
        Node::Var(name) => {
            if negate {
                Node::Not(Box::new(Node::Var(name)))
            } else {
                Node::Var(name)
            }
        }
        Node::Not(child) => to_nnf(*child, !negate),
        Node::And(items) => {
            let items = items.into_iter().map(|c| to_nnf(c, negate)).collect();
            if negate {
                Node::Or(items)
            } else {
                Node::And(items)
            }
        }
        Node::Or(items) => {
            let items = items.into_iter().map(|c| to_nnf(c, negate)).collect();
            if negate {
                Node::And(items)
            } else {
                Node::Or(items)
            }
        }
    }
}

type Term = BTreeSet<String>;

fn contradicts(term: &Term) -> bool {
    term.iter().any(|lit| {
        lit.strip_prefix(NEGATION)
            .is_some_and(|positive| term.contains(positive))
    })
}

fn dnf(node: &Node) -> BTreeSet<Term> {
    match node {
        Node::Var(name) => BTreeSet::from([Term::from([name.clone()])]),
        Node::Not(child) => match child.as_ref() {
            Node::Var(name) => BTreeSet::from([Term::from([format!("{}{}", NEGATION, name)])]),
            // Not reached after NNF
            other => dnf(other),
        },
        Node::Or(items) => items.iter().flat_map(dnf).collect(),
        Node::And(items) => {
            let mut acc: BTreeSet<Term> = BTreeSet::from([Term::new()]);
            for item in items {
                let rhs = dnf(item);
                let mut next = BTreeSet::new();
                for left in &acc {
                    for right in &rhs {
                        let merged: Term = left.union(right).cloned().collect();
                        if !contradicts(&merged) {
                            next.insert(merged);
                        }
                    }
                }
                acc = next;
            }
            acc
        }
    }
}

fn literal_name(lit: &str) -> &str {
    lit.trim_start_matches(NEGATION)
}

/// Compiles a requisite expression into disjunctive normal form
///
/// Alternatives are ordered by size, then by the codes they mention; codes
/// inside an alternative put plain codes before negated ones.
pub fn to_dnf(expr: &str) -> Result<Vec<Vec<String>>, RequisiteError> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let ast = Parser { tokens, pos: 0 }.parse()?;
    let terms = dnf(&to_nnf(ast, false));

    let mut out: Vec<Vec<String>> = terms
        .into_iter()
        .map(|term| {
            let mut lits: Vec<String> = term.into_iter().collect();
            lits.sort_by(|a, b| {
                (a.starts_with(NEGATION), literal_name(a))
                    .cmp(&(b.starts_with(NEGATION), literal_name(b)))
            });
            lits
        })
        .collect();

    out.sort_by(|a, b| {
        let names_a: Vec<&str> = a.iter().map(|l| literal_name(l)).collect();
        let names_b: Vec<&str> = b.iter().map(|l| literal_name(l)).collect();
        (a.len(), names_a).cmp(&(b.len(), names_b))
    });

    Ok(out)
}

/// Like [`to_dnf`], but unparseable or placeholder text yields no requisites
pub fn requisites_or_empty(expr: &str) -> Vec<Vec<String>> {
    let trimmed = expr.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return Vec::new();
    }
    match to_dnf(trimmed) {
        Ok(terms) => terms,
        Err(e) => {
            tracing::debug!("Ignoring requisite expression '{}': {}", trimmed, e);
            Vec::new()
        }
    }
}
