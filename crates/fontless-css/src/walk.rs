//! Depth-first traversal helpers over a [`StyleSheet`].

use crate::ast::{AtRule, Block, Declaration, Node, Raw, StyleSheet};

/// Where a visited node sits in the tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkContext<'a> {
    /// The innermost at-rule enclosing the node, if any.
    pub atrule: Option<&'a AtRule>,
}

impl WalkContext<'_> {
    pub fn in_atrule(&self, name: &str) -> bool {
        self.atrule.is_some_and(|a| a.name == name)
    }
}

/// Visits every declaration in document order.
pub fn walk_declarations<'a>(
    sheet: &'a StyleSheet,
    mut visit: impl FnMut(&'a Declaration, WalkContext<'a>),
) {
    walk_nodes(&sheet.children, WalkContext::default(), &mut |node, cx| {
        if let Node::Declaration(decl) = node {
            visit(decl, cx);
        }
    });
}

/// Visits every block-level raw node in document order (declaration values are not visited).
pub fn walk_raws<'a>(sheet: &'a StyleSheet, mut visit: impl FnMut(&'a Raw, WalkContext<'a>)) {
    walk_nodes(&sheet.children, WalkContext::default(), &mut |node, cx| {
        if let Node::Raw(raw) = node {
            visit(raw, cx);
        }
    });
}

fn walk_nodes<'a>(
    nodes: &'a [Node],
    cx: WalkContext<'a>,
    visit: &mut dyn FnMut(&'a Node, WalkContext<'a>),
) {
    for node in nodes {
        visit(node, cx);
        match node {
            Node::Rule(rule) => walk_block(&rule.block, cx, visit),
            Node::AtRule(at) => {
                if let Some(block) = &at.block {
                    walk_block(block, WalkContext { atrule: Some(at) }, visit);
                }
            }
            Node::Declaration(_) | Node::Raw(_) => {}
        }
    }
}

fn walk_block<'a>(
    block: &'a Block,
    cx: WalkContext<'a>,
    visit: &mut dyn FnMut(&'a Node, WalkContext<'a>),
) {
    walk_nodes(&block.children, cx, visit);
}
