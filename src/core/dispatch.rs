//! String dispatch compiler
//!
//! Compiles a fixed set of `(string, payload)` cases into a decision tree
//! that picks a payload using only bounds checks, indexed word reads and
//! numeric comparisons, for hosts that cannot compare strings.
//!
//! Candidates are word-encoded and bucketed by their word at the current
//! read position. Buckets are searched with a binary split over their sorted
//! keys; a bucket holding several candidates descends one word deeper. The
//! first node touching a position checks it against the runtime length and
//! reads the word into a single scratch variable. Every bucket reached by a
//! comparison is confirmed with an equality test before its payload runs.
//!
//! Only the words that discriminate between candidates are compared, so an
//! out-of-set string agreeing with a candidate on those words selects that
//! candidate.

use crate::codec::{Word, WordCodec};
use crate::error::{Result, WordStoreError};
use crate::text::string_words;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// One string and the code to run when it matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchCase {
    pub value: String,
    pub payload: String,
}

impl DispatchCase {
    pub fn new(value: impl Into<String>, payload: impl Into<String>) -> Self {
        DispatchCase {
            value: value.into(),
            payload: payload.into(),
        }
    }
}

/// A host argument in a flat dispatch argument list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchArg {
    /// A string literal
    Text(String),
    /// A code block
    Block(String),
}

/// The validated input of a dispatch compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchCases {
    cases: Vec<DispatchCase>,
    default: Option<String>,
}

impl DispatchCases {
    /// Validate a candidate list
    ///
    /// # Errors
    ///
    /// `NoDispatchCandidates` for an empty list, `EmptyDispatchCandidate`
    /// naming the first empty string.
    pub fn new(cases: Vec<DispatchCase>, default: Option<String>) -> Result<Self> {
        if cases.is_empty() {
            return Err(WordStoreError::NoDispatchCandidates);
        }
        if let Some(position) = cases.iter().position(|c| c.value.is_empty()) {
            return Err(WordStoreError::EmptyDispatchCandidate { position });
        }
        Ok(DispatchCases { cases, default })
    }

    /// Parse a flat `(value, block)* default?` argument list
    ///
    /// Positions in errors index into `args`.
    pub fn from_args(args: &[DispatchArg]) -> Result<Self> {
        let mut cases = Vec::new();
        let mut position = 0;

        while position + 1 < args.len() {
            let value = match &args[position] {
                DispatchArg::Text(value) => value,
                DispatchArg::Block(_) => {
                    return Err(WordStoreError::InvalidDispatchArgument {
                        position,
                        reason: "expected a string value to check".to_string(),
                    })
                }
            };
            let payload = match &args[position + 1] {
                DispatchArg::Block(payload) => payload,
                DispatchArg::Text(_) => {
                    return Err(WordStoreError::InvalidDispatchArgument {
                        position: position + 1,
                        reason: "expected a block to run".to_string(),
                    })
                }
            };
            if value.is_empty() {
                return Err(WordStoreError::EmptyDispatchCandidate { position });
            }

            cases.push(DispatchCase::new(value.as_str(), payload.as_str()));
            position += 2;
        }

        let default = match args.get(position) {
            None => None,
            Some(DispatchArg::Block(payload)) => Some(payload.clone()),
            Some(DispatchArg::Text(_)) => {
                return Err(WordStoreError::InvalidDispatchArgument {
                    position,
                    reason: "expected a no-match block to run".to_string(),
                })
            }
        };

        Self::new(cases, default)
    }

    pub fn cases(&self) -> &[DispatchCase] {
        &self.cases
    }

    pub fn default_payload(&self) -> Option<&str> {
        self.default.as_deref()
    }
}

/// Where a dispatch ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The case at this index
    Case(usize),
    /// The default payload, or nothing when none was given
    Default,
}

/// A node of the compiled decision tree
///
/// Comparisons test the scratch variable, which holds the word read by the
/// innermost enclosing [`DispatchNode::Guard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchNode {
    Leaf(Target),
    /// If word `position` exists, read it into scratch and run `body`
    Guard {
        position: usize,
        body: Box<DispatchNode>,
        otherwise: Target,
    },
    Equals {
        value: Word,
        then: Box<DispatchNode>,
        otherwise: Box<DispatchNode>,
    },
    Less {
        pivot: Word,
        less: Box<DispatchNode>,
        greater_equal: Box<DispatchNode>,
    },
}

impl DispatchNode {
    /// Longest path from this node to a leaf, counted in nodes
    pub fn depth(&self) -> usize {
        match self {
            DispatchNode::Leaf(_) => 1,
            DispatchNode::Guard { body, .. } => 1 + body.depth(),
            DispatchNode::Equals { then, otherwise, .. } => 1 + then.depth().max(otherwise.depth()),
            DispatchNode::Less {
                less,
                greater_equal,
                ..
            } => 1 + less.depth().max(greater_equal.depth()),
        }
    }

    /// Number of bounds-checked reads in the subtree
    pub fn guard_count(&self) -> usize {
        match self {
            DispatchNode::Leaf(_) => 0,
            DispatchNode::Guard { body, .. } => 1 + body.guard_count(),
            DispatchNode::Equals { then, otherwise, .. } => {
                then.guard_count() + otherwise.guard_count()
            }
            DispatchNode::Less {
                less,
                greater_equal,
                ..
            } => less.guard_count() + greater_equal.guard_count(),
        }
    }
}

/// A compiled dispatch over a fixed case set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTree {
    codec: WordCodec,
    cases: DispatchCases,
    root: DispatchNode,
}

/// A candidate string during compilation
struct Candidate {
    words: Vec<Word>,
    case: usize,
}

impl DispatchTree {
    /// Compile `cases` into a decision tree
    ///
    /// # Errors
    ///
    /// `InvalidByte` if a value has a character above 255,
    /// `DuplicateDispatchCandidate` if two values encode to the same words.
    pub fn compile(codec: &WordCodec, cases: DispatchCases) -> Result<Self> {
        let mut candidates = Vec::with_capacity(cases.cases.len());
        let mut seen: HashSet<Vec<Word>> = HashSet::new();

        for (index, case) in cases.cases.iter().enumerate() {
            let words = string_words(codec, &case.value)?;
            if !seen.insert(words.clone()) {
                return Err(WordStoreError::DuplicateDispatchCandidate(
                    case.value.clone(),
                ));
            }
            candidates.push(Candidate { words, case: index });
        }

        let members: Vec<&Candidate> = candidates.iter().collect();
        let root = compile_level(&members, 0, None);

        debug!(
            "Compiled dispatch over {} values: depth {}, {} guarded reads",
            candidates.len(),
            root.depth(),
            root.guard_count()
        );

        Ok(DispatchTree {
            codec: *codec,
            cases,
            root,
        })
    }

    pub fn root(&self) -> &DispatchNode {
        &self.root
    }

    pub fn cases(&self) -> &DispatchCases {
        &self.cases
    }

    pub fn word_width(&self) -> usize {
        self.codec.width()
    }

    /// Payload for a target; `None` for a default that was not given
    pub fn payload(&self, target: Target) -> Option<&str> {
        match target {
            Target::Case(index) => self.cases.cases.get(index).map(|c| c.payload.as_str()),
            Target::Default => self.cases.default_payload(),
        }
    }

    /// Walk the tree the way the emitted code runs
    ///
    /// `words` is the runtime string's word storage and `byte_len` its
    /// length in characters. Reads past the end of `words` yield 0.
    pub fn select(&self, words: &[Word], byte_len: usize) -> Target {
        let word_count = self.codec.word_count(byte_len);
        let mut scratch: Word = 0;
        let mut node = &self.root;

        loop {
            match node {
                DispatchNode::Leaf(target) => return *target,
                DispatchNode::Guard {
                    position,
                    body,
                    otherwise,
                } => {
                    if *position >= word_count {
                        return *otherwise;
                    }
                    scratch = words.get(*position).copied().unwrap_or(0);
                    node = &**body;
                }
                DispatchNode::Equals {
                    value,
                    then,
                    otherwise,
                } => node = if scratch == *value { &**then } else { &**otherwise },
                DispatchNode::Less {
                    pivot,
                    less,
                    greater_equal,
                } => node = if scratch < *pivot { &**less } else { &**greater_equal },
            }
        }
    }

    /// Encode `value` and select a target for it
    pub fn select_str(&self, value: &str) -> Result<Target> {
        let words = string_words(&self.codec, value)?;
        Ok(self.select(&words, value.chars().count()))
    }
}

/// A dispatch tree bound to the runtime variables it reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchProgram {
    /// Host expression holding the string's base address
    pub pointer: String,
    /// Host expression holding the string's length in characters
    pub length: String,
    /// Scratch variable declared once for all word reads
    pub scratch: String,
    pub tree: DispatchTree,
}

/// Compile the candidates sharing every word before `position`
///
/// `exhausted` is the candidate whose words end exactly at `position`; it
/// is selected when the runtime string ends there too.
fn compile_level(
    members: &[&Candidate],
    position: usize,
    exhausted: Option<usize>,
) -> DispatchNode {
    let groups = group_by_word(members, position);
    let out_of_bounds = exhausted.map_or(Target::Default, Target::Case);

    match groups.as_slice() {
        [(_, only)] if exhausted.is_none() => resolve_group(only, position),
        [(key, only)] => DispatchNode::Guard {
            position,
            body: Box::new(confirm(*key, resolve_group(only, position))),
            otherwise: out_of_bounds,
        },
        _ => DispatchNode::Guard {
            position,
            body: Box::new(search(&groups, 0, groups.len() - 1, position)),
            otherwise: out_of_bounds,
        },
    }
}

/// Bucket candidates by their word at `position`, keys ascending
fn group_by_word<'a>(
    members: &[&'a Candidate],
    position: usize,
) -> Vec<(Word, Vec<&'a Candidate>)> {
    let mut groups: BTreeMap<Word, Vec<&'a Candidate>> = BTreeMap::new();
    for &candidate in members {
        groups
            .entry(candidate.words[position])
            .or_default()
            .push(candidate);
    }
    groups.into_iter().collect()
}

/// Binary search over `groups[left..=right]` on the scratch word
fn search(
    groups: &[(Word, Vec<&Candidate>)],
    left: usize,
    right: usize,
    position: usize,
) -> DispatchNode {
    if left == right {
        let (key, members) = &groups[left];
        return confirm(*key, resolve_group(members, position));
    }

    if right - left == 1 {
        let (key, members) = &groups[left];
        return DispatchNode::Equals {
            value: *key,
            then: Box::new(resolve_group(members, position)),
            otherwise: Box::new(search(groups, right, right, position)),
        };
    }

    let middle = left + (right - left) / 2;
    DispatchNode::Less {
        pivot: groups[middle].0,
        less: Box::new(search(groups, left, middle - 1, position)),
        greater_equal: Box::new(search(groups, middle, right, position)),
    }
}

/// Run `node` only if the scratch word equals `key`
fn confirm(key: Word, node: DispatchNode) -> DispatchNode {
    DispatchNode::Equals {
        value: key,
        then: Box::new(node),
        otherwise: Box::new(DispatchNode::Leaf(Target::Default)),
    }
}

/// Candidates sharing the word at `position`: a leaf, or the next position
/// where they diverge or one of them ends
///
/// Words shared by every member are skipped without emitting a node.
fn resolve_group(members: &[&Candidate], position: usize) -> DispatchNode {
    let [first, ..] = members else {
        return DispatchNode::Leaf(Target::Default);
    };
    if members.len() == 1 {
        return DispatchNode::Leaf(Target::Case(first.case));
    }

    // Members are distinct, so some position diverges or ends a member
    let mut next = position + 1;
    while members
        .iter()
        .all(|c| c.words.len() > next && c.words[next] == first.words[next])
    {
        next += 1;
    }

    let exhausted = members
        .iter()
        .find(|c| c.words.len() == next)
        .map(|c| c.case);
    let live: Vec<&Candidate> = members
        .iter()
        .copied()
        .filter(|c| c.words.len() > next)
        .collect();

    compile_level(&live, next, exhausted)
}
