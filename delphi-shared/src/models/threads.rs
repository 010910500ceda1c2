//! Reconstruction of reply threads from a flat message feed.
//!
//! The backend returns messages in no particular order (newest first in
//! practice), so a reply can arrive before the message it answers. The
//! organizer therefore works in two passes over the input: the first builds
//! an `id → slot` lookup with a fresh wrapper per message, the second
//! attaches every message to its parent's child list or to the root list.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use super::Message;

/// A message together with its nested replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadedMessage {
    /// The underlying message.
    #[serde(flatten)]
    pub message: Message,
    /// Direct replies, in feed order.
    pub children: Vec<ThreadedMessage>,
}

impl ThreadedMessage {
    /// Wraps `message` with no replies yet.
    #[must_use]
    pub const fn new(message: Message) -> Self {
        Self {
            message,
            children: Vec::new(),
        }
    }

    /// Identifier of the wrapped message.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.message.id
    }

    /// Number of messages in this subtree, including `self`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.flatten().len()
    }

    /// Always `false`; a thread holds at least its root message.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Height of the subtree; a message without replies has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.flatten()
            .into_iter()
            .map(|(level, _)| level + 1)
            .max()
            .unwrap_or(1)
    }

    /// Depth-first, pre-order walk of the subtree. Each entry carries its
    /// nesting level relative to `self` (which is level 0).
    #[must_use]
    pub fn flatten(&self) -> Vec<(usize, &Message)> {
        let mut out = Vec::new();
        let mut stack = vec![(0_usize, self)];
        while let Some((level, node)) = stack.pop() {
            out.push((level, &node.message));
            stack.extend(node.children.iter().rev().map(|child| (level + 1, child)));
        }
        out
    }
}

/// Flattens a whole forest depth-first, root by root.
#[must_use]
pub fn flatten_forest(forest: &[ThreadedMessage]) -> Vec<(usize, &Message)> {
    forest.iter().flat_map(ThreadedMessage::flatten).collect()
}

/// Builds the reply forest for a flat collection of messages.
///
/// * A message is a root when its `parent_id` is absent or names an id that
///   is not in `messages`.
/// * Roots, and the children of each parent, keep the input order.
/// * Messages caught in a parent cycle are not reachable from any root. The
///   earliest message (in input order) of each cycle is promoted to a root,
///   so every input message appears exactly once in the output.
/// * When ids repeat, the first occurrence receives the replies; the
///   duplicates are still placed like any other message.
#[must_use]
pub fn organize_threads(messages: &[Message]) -> Vec<ThreadedMessage> {
    let count = messages.len();

    // First pass: lookup table and one wrapper slot per message.
    let mut lookup: HashMap<&str, usize> = HashMap::with_capacity(count);
    let mut slots: Vec<Option<ThreadedMessage>> = Vec::with_capacity(count);
    for (index, message) in messages.iter().enumerate() {
        lookup.entry(message.id.as_str()).or_insert(index);
        slots.push(Some(ThreadedMessage::new(message.clone())));
    }

    // Second pass: resolve each message to its parent or to the root list.
    let mut parents: Vec<Option<usize>> = vec![None; count];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut roots: Vec<usize> = Vec::new();
    for (index, message) in messages.iter().enumerate() {
        match message
            .parent_id
            .as_deref()
            .and_then(|parent| lookup.get(parent).copied())
        {
            Some(parent) if parent != index => {
                parents[index] = Some(parent);
                children[parent].push(index);
            }
            _ => roots.push(index),
        }
    }

    let promoted = break_cycles(&mut parents, &mut children, &mut roots);
    if promoted > 0 {
        warn!(promoted, "reply cycles detected; promoted messages to roots");
        roots.sort_unstable();
    }

    // Attach children bottom-up: reverse pre-order visits every child before
    // its parent.
    let mut order = Vec::with_capacity(count);
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(index) = stack.pop() {
        order.push(index);
        stack.extend(children[index].iter().rev());
    }
    for &index in order.iter().rev() {
        let replies: Vec<ThreadedMessage> = children[index]
            .iter()
            .filter_map(|&child| slots[child].take())
            .collect();
        if let Some(node) = slots[index].as_mut() {
            node.children = replies;
        }
    }

    let forest: Vec<ThreadedMessage> = roots
        .iter()
        .filter_map(|&root| slots[root].take())
        .collect();
    debug!(messages = count, threads = forest.len(), "organized threads");
    forest
}

/// Promotes one message per parent cycle to a root. Returns how many
/// messages were promoted.
fn break_cycles(
    parents: &mut [Option<usize>],
    children: &mut [Vec<usize>],
    roots: &mut Vec<usize>,
) -> usize {
    let count = parents.len();
    let mut reached = vec![false; count];
    let mut stack: Vec<usize> = roots.clone();
    mark_reachable(&mut stack, children, &mut reached);

    let mut on_path = vec![false; count];
    let mut promoted = 0;
    for start in 0..count {
        if reached[start] {
            continue;
        }

        // Every ancestor of an unreached message is unreached too, so walking
        // up the parent chain must end on a cycle.
        let mut walked = Vec::new();
        let mut current = start;
        while !on_path[current] {
            on_path[current] = true;
            walked.push(current);
            match parents[current] {
                Some(parent) => current = parent,
                None => break,
            }
        }
        for &index in &walked {
            on_path[index] = false;
        }

        let mut earliest = current;
        let mut cursor = current;
        while let Some(parent) = parents[cursor] {
            if parent == current {
                break;
            }
            earliest = earliest.min(parent);
            cursor = parent;
        }

        if let Some(parent) = parents[earliest].take() {
            children[parent].retain(|&child| child != earliest);
        }
        roots.push(earliest);
        promoted += 1;

        stack.push(earliest);
        mark_reachable(&mut stack, children, &mut reached);
    }
    promoted
}

fn mark_reachable(stack: &mut Vec<usize>, children: &[Vec<usize>], reached: &mut [bool]) {
    while let Some(index) = stack.pop() {
        if reached[index] {
            continue;
        }
        reached[index] = true;
        stack.extend(children[index].iter().copied());
    }
}
