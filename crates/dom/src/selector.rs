//! Selector parsing and matching
//!
//! Supported grammar (a practical subset of CSS selectors level 3):
//!
//! ```text
//! list     := complex ( ',' complex )*
//! complex  := compound ( combinator compound )*
//! combinator := whitespace | '>'
//! compound := ( tag | '*' )? ( '#id' | '.class' | '[attr]' | '[attr=value]' )*
//! ```
//!
//! Matching runs right-to-left: the last compound is tested against the
//! node itself, earlier compounds against its ancestors.

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId};
use std::iter::Peekable;
use std::str::{Chars, FromStr};

/// Comma-separated selector list
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

#[derive(Debug, Clone, PartialEq)]
struct ComplexSelector {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
}

#[derive(Debug, Clone, PartialEq)]
enum AttrSelector {
    Exists(String),
    Equals(String, String),
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || DomError::InvalidSelector(input.to_string());

        let selectors = split_top_level(input)
            .into_iter()
            .map(|part| parse_complex(part).ok_or_else(invalid))
            .collect::<Result<Vec<_>>>()?;

        if selectors.is_empty() {
            return Err(invalid());
        }

        Ok(Self { selectors })
    }

    /// Does `node` itself match any selector of the list?
    pub fn matches(&self, arena: &DomArena, node: NodeId) -> bool {
        self.selectors.iter().any(|selector| {
            let last = selector.compounds.len() - 1;
            selector.matches_at(arena, node, last)
        })
    }
}

impl FromStr for SelectorList {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl ComplexSelector {
    fn matches_at(&self, arena: &DomArena, node: NodeId, idx: usize) -> bool {
        let Ok(dom_node) = arena.get(node) else {
            return false;
        };
        if !self.compounds[idx].matches(dom_node) {
            return false;
        }
        if idx == 0 {
            return true;
        }

        match self.combinators[idx - 1] {
            Combinator::Child => dom_node
                .parent_id
                .is_some_and(|parent| self.matches_at(arena, parent, idx - 1)),
            Combinator::Descendant => arena
                .ancestors(node)
                .any(|ancestor| self.matches_at(arena, ancestor, idx - 1)),
        }
    }
}

impl Compound {
    fn matches(&self, node: &DomNode) -> bool {
        if !node.is_element() {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !node.node_name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        self.ids.iter().all(|id| node.attr("id") == Some(id.as_str()))
            && self.classes.iter().all(|class| node.has_class(class))
            && self.attrs.iter().all(|attr| match attr {
                AttrSelector::Exists(name) => node.attributes.contains_key(name),
                AttrSelector::Equals(name, value) => node.attr(name) == Some(value.as_str()),
            })
    }
}

/// Split on commas that are not inside brackets or quotes
fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn parse_complex(input: &str) -> Option<ComplexSelector> {
    let mut chars = input.trim().chars().peekable();
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();

    loop {
        compounds.push(parse_compound(&mut chars)?);

        let saw_space = skip_whitespace(&mut chars);
        match chars.peek() {
            None => break,
            Some('>') => {
                chars.next();
                skip_whitespace(&mut chars);
                combinators.push(Combinator::Child);
            }
            Some(_) if saw_space => combinators.push(Combinator::Descendant),
            // Pseudo-classes and sibling combinators are not supported
            Some(_) => return None,
        }
    }

    Some(ComplexSelector {
        compounds,
        combinators,
    })
}

fn parse_compound(chars: &mut Peekable<Chars<'_>>) -> Option<Compound> {
    let mut compound = Compound::default();
    let mut seen_any = false;

    match chars.peek() {
        Some('*') => {
            chars.next();
            seen_any = true;
        }
        Some(&c) if is_ident_char(c) => {
            compound.tag = Some(read_ident(chars).to_ascii_lowercase());
            seen_any = true;
        }
        _ => {}
    }

    loop {
        match chars.peek() {
            Some('#') => {
                chars.next();
                compound.ids.push(non_empty(read_ident(chars))?);
            }
            Some('.') => {
                chars.next();
                compound.classes.push(non_empty(read_ident(chars))?);
            }
            Some('[') => {
                chars.next();
                compound.attrs.push(parse_attr(chars)?);
            }
            _ => break,
        }
        seen_any = true;
    }

    seen_any.then_some(compound)
}

fn parse_attr(chars: &mut Peekable<Chars<'_>>) -> Option<AttrSelector> {
    skip_whitespace(chars);
    // Attribute names are stored lowercased
    let name = non_empty(read_ident(chars))?.to_ascii_lowercase();
    skip_whitespace(chars);

    match chars.next()? {
        ']' => Some(AttrSelector::Exists(name)),
        '=' => {
            skip_whitespace(chars);
            let value = match chars.peek() {
                Some(&q) if q == '"' || q == '\'' => {
                    chars.next();
                    let mut value = String::new();
                    loop {
                        match chars.next()? {
                            c if c == q => break,
                            c => value.push(c),
                        }
                    }
                    value
                }
                _ => non_empty(read_ident(chars))?,
            };
            skip_whitespace(chars);
            (chars.next()? == ']').then_some(AttrSelector::Equals(name, value))
        }
        _ => None,
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

fn read_ident(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        ident.push(c);
        chars.next();
    }
    ident
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

/// Returns true when at least one whitespace char was consumed
fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) -> bool {
    let mut skipped = false;
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
        skipped = true;
    }
    skipped
}
