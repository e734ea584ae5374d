//! Expression tree handed over by a parser, annotated in place by type resolution.

mod display;
mod resolve;

pub use resolve::*;

use crate::error::Result;
use crate::operator::Resolution;
use crate::types::TypeRef;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Resolution state of a node.
#[derive(Debug, Clone, Default)]
pub enum TypeSlot {
    /// Not visited by the resolver yet.
    #[default]
    Pending,
    Resolved(TypeRef),
    /// Resolution failed here or below.
    Unresolved,
}

impl TypeSlot {
    pub fn resolved(&self) -> Option<&TypeRef> {
        match self {
            TypeSlot::Resolved(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, TypeSlot::Resolved(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupNode {
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableNode {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstantNode {
    pub value: Value,
    /// Mathematical type name of the literal.
    #[serde(rename = "type")]
    pub ty: String,
    /// Source text, kept for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorNode {
    pub name: String,
    pub children: Vec<Node>,
    #[serde(skip)]
    pub resolution: Option<Resolution>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum NodeKind {
    Group(GroupNode),
    Variable(VariableNode),
    Constant(ConstantNode),
    Operator(OperatorNode),
}

/// A node of the expression tree. Nodes own their children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    kind: NodeKind,
    #[serde(skip)]
    ty: TypeSlot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOrder {
    /// Parents before children.
    Pre,
    /// Children before parents.
    Post,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            ty: TypeSlot::Pending,
        }
    }

    pub fn group(child: Node) -> Self {
        Self::new(NodeKind::Group(GroupNode {
            children: vec![child],
        }))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Variable(VariableNode { name: name.into() }))
    }

    pub fn constant(value: impl Into<Value>, ty: impl Into<String>) -> Self {
        Self::new(NodeKind::Constant(ConstantNode {
            value: value.into(),
            ty: ty.into(),
            text: None,
        }))
    }

    pub fn real(x: f64) -> Self {
        Self::constant(x, "real")
    }

    pub fn int(i: i64) -> Self {
        Self::constant(i, "int")
    }

    pub fn boolean(b: bool) -> Self {
        Self::constant(b, "bool")
    }

    pub fn operator(name: impl Into<String>, children: Vec<Node>) -> Self {
        Self::new(NodeKind::Operator(OperatorNode {
            name: name.into(),
            children,
            resolution: None,
        }))
    }

    pub fn binary(name: impl Into<String>, lhs: Node, rhs: Node) -> Self {
        Self::operator(name, vec![lhs, rhs])
    }

    pub fn unary(name: impl Into<String>, operand: Node) -> Self {
        Self::operator(name, vec![operand])
    }

    /// Source text shown instead of the value when displaying a constant.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        if let NodeKind::Constant(constant) = &mut self.kind {
            constant.text = Some(text.into());
        }
        self
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn ty(&self) -> &TypeSlot {
        &self.ty
    }

    pub fn resolved_type(&self) -> Option<&TypeRef> {
        self.ty.resolved()
    }

    /// The winning overload of an operator node, once resolved.
    pub fn resolution(&self) -> Option<&Resolution> {
        match &self.kind {
            NodeKind::Operator(op) => op.resolution.as_ref(),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Group(group) => &group.children,
            NodeKind::Operator(op) => &op.children,
            NodeKind::Variable(_) | NodeKind::Constant(_) => &[],
        }
    }

    pub fn children_mut(&mut self) -> &mut [Node] {
        match &mut self.kind {
            NodeKind::Group(group) => &mut group.children,
            NodeKind::Operator(op) => &mut op.children,
            NodeKind::Variable(_) | NodeKind::Constant(_) => &mut [],
        }
    }

    /// Visits every node with its depth below `self`.
    pub fn apply_all<F: FnMut(&Node, usize)>(&self, order: TraversalOrder, f: &mut F) {
        self.apply_all_at(order, 0, f);
    }

    fn apply_all_at<F: FnMut(&Node, usize)>(&self, order: TraversalOrder, depth: usize, f: &mut F) {
        if order == TraversalOrder::Pre {
            f(self, depth);
        }
        for child in self.children() {
            child.apply_all_at(order, depth + 1, f);
        }
        if order == TraversalOrder::Post {
            f(self, depth);
        }
    }

    /// Distinct variables in first-seen order, with their resolved type if known.
    pub fn used_variables(&self) -> Vec<(String, Option<TypeRef>)> {
        let mut variables: Vec<(String, Option<TypeRef>)> = Vec::new();
        self.apply_all(TraversalOrder::Pre, &mut |node, _| {
            if let NodeKind::Variable(var) = &node.kind {
                if !variables.iter().any(|(name, _)| name == &var.name) {
                    variables.push((var.name.clone(), node.resolved_type().cloned()));
                }
            }
        });
        variables
    }

    /// Whether the subtree references no variables.
    pub fn is_constant(&self) -> bool {
        match &self.kind {
            NodeKind::Variable(_) => false,
            NodeKind::Constant(_) => true,
            _ => self.children().iter().all(Node::is_constant),
        }
    }

    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(Node::node_count).sum::<usize>()
    }

    /// Serializes the raw tree; resolution results are not included.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
