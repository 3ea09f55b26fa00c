//! Event stream to arena tree
//!
//! The parser never builds nodes directly. It appends `Start` / `Token` /
//! `Finish` events and patches `Start` slots once it knows what a marker
//! became. This pass replays the events and attaches trivia: whitespace and
//! comments before a node belong to its parent, whitespace between tokens
//! of a node belongs to that node.

use super::tree::{Element, NodeData, NodeId, Span, SyntaxError, SyntaxTree};
use super::NodeKind;
use crate::lexer::Token;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    /// `kind: None` is an abandoned marker and produces no node
    Start {
        kind: Option<NodeKind>,
        incomplete: bool,
        message: Option<String>,
    },
    Finish,
    /// Index of a significant token in the full token vector
    Token(usize),
}

impl Event {
    pub(crate) fn tombstone() -> Self {
        Event::Start {
            kind: None,
            incomplete: false,
            message: None,
        }
    }
}

pub(crate) fn build_tree(source: String, tokens: Vec<Token>, events: Vec<Event>) -> SyntaxTree {
    let mut builder = TreeBuilder {
        tokens: &tokens,
        source_len: source.len(),
        nodes: Vec::new(),
        stack: Vec::new(),
        messages: Vec::new(),
        next_token: 0,
        cursor: 0,
    };

    for event in events {
        match event {
            Event::Start { kind: None, .. } => {}
            Event::Start {
                kind: Some(kind),
                incomplete,
                message,
            } => builder.start(kind, incomplete, message),
            Event::Finish => builder.finish(),
            Event::Token(index) => builder.token(index),
        }
    }
    while !builder.stack.is_empty() {
        builder.finish();
    }
    if builder.nodes.is_empty() {
        builder.start(NodeKind::SchemaFile, false, None);
        builder.finish();
    }

    let TreeBuilder {
        nodes, messages, ..
    } = builder;
    let errors = messages
        .into_iter()
        .map(|(node, message)| SyntaxError {
            node,
            message,
            span: nodes[node.index()].span,
        })
        .collect();

    SyntaxTree {
        source,
        path: None,
        tokens,
        nodes,
        errors,
    }
}

struct TreeBuilder<'a> {
    tokens: &'a [Token],
    source_len: usize,
    nodes: Vec<NodeData>,
    stack: Vec<NodeId>,
    messages: Vec<(NodeId, String)>,
    /// First raw token not yet attached to a node
    next_token: usize,
    /// End offset of the last attached token
    cursor: usize,
}

impl TreeBuilder<'_> {
    fn start(&mut self, kind: NodeKind, incomplete: bool, message: Option<String>) {
        // Error nodes pick up the trivia in front of their first skipped
        // token so an empty one sits right after the preceding construct.
        if kind != NodeKind::Error {
            self.attach_trivia();
        }

        let id = NodeId(self.nodes.len() as u32);
        let parent = self.stack.last().copied();
        self.nodes.push(NodeData {
            kind,
            span: Span::new(self.cursor, self.cursor),
            incomplete,
            parent,
            elements: Vec::new(),
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            let data = &mut self.nodes[parent.index()];
            data.elements.push(Element::Node(id));
            data.children.push(id);
        }
        if let Some(message) = message {
            self.messages.push((id, message));
        }
        self.stack.push(id);
    }

    fn finish(&mut self) {
        if self.stack.len() == 1 {
            self.attach_remaining();
        }
        let Some(id) = self.stack.pop() else {
            return;
        };
        let data = &mut self.nodes[id.index()];
        data.span.end = self.cursor.max(data.span.start);
    }

    fn token(&mut self, index: usize) {
        let Some(&top) = self.stack.last() else {
            return;
        };
        while self.next_token < index {
            self.attach(self.next_token);
        }

        let tokens = self.tokens;
        let token = tokens[index];
        let data = &mut self.nodes[top.index()];
        let first_significant = data.elements.iter().all(|e| match e {
            Element::Token(i) => tokens[*i].kind.is_trivia(),
            Element::Node(_) => false,
        });
        if data.kind == NodeKind::Error && first_significant {
            data.span.start = token.start;
        }
        self.attach(index);
    }

    fn attach_trivia(&mut self) {
        if self.stack.is_empty() {
            return;
        }
        while self
            .tokens
            .get(self.next_token)
            .is_some_and(|t| t.kind.is_trivia())
        {
            self.attach(self.next_token);
        }
    }

    fn attach_remaining(&mut self) {
        while self.next_token < self.tokens.len() {
            self.attach(self.next_token);
        }
        self.cursor = self.source_len;
    }

    fn attach(&mut self, index: usize) {
        let Some(&top) = self.stack.last() else {
            return;
        };
        self.nodes[top.index()]
            .elements
            .push(Element::Token(index));
        self.cursor = self.tokens[index].end;
        self.next_token = index + 1;
    }
}
