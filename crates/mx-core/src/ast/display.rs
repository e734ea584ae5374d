use super::{Node, NodeKind};
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// Binding strength of an infix operator; `None` for function-call form.
fn precedence(name: &str) -> Option<u8> {
    Some(match name {
        "||" => 1,
        "&&" => 2,
        "==" | "!=" | "<" | "<=" | ">" | ">=" => 3,
        "+" | "-" => 4,
        "*" | "/" => 5,
        "^" => 7,
        _ => return None,
    })
}

const PREFIX_PRECEDENCE: u8 = 6;

impl Node {
    /// Precedence of this node when printed, for deciding on parentheses.
    fn print_precedence(&self) -> u8 {
        match &self.kind {
            NodeKind::Operator(op) => match (op.children.len(), precedence(&op.name)) {
                (2, Some(p)) => p,
                (1, Some(_)) => PREFIX_PRECEDENCE,
                _ => u8::MAX,
            },
            _ => u8::MAX,
        }
    }

    fn fmt_operand(&self, f: &mut Formatter<'_>, min: u8) -> std::fmt::Result {
        if self.print_precedence() < min {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            NodeKind::Group(group) => match group.children.as_slice() {
                [child] => write!(f, "({})", child),
                children => write!(f, "({})", children.iter().join(", ")),
            },
            NodeKind::Variable(var) => f.write_str(&var.name),
            NodeKind::Constant(constant) => match &constant.text {
                Some(text) => f.write_str(text),
                None => write!(f, "{}", constant.value),
            },
            NodeKind::Operator(op) => match (op.children.as_slice(), precedence(&op.name)) {
                ([lhs, rhs], Some(p)) => {
                    // `^` groups to the right, everything else to the left
                    let (left_min, right_min) = if op.name == "^" { (p + 1, p) } else { (p, p + 1) };
                    lhs.fmt_operand(f, left_min)?;
                    write!(f, " {} ", op.name)?;
                    rhs.fmt_operand(f, right_min)
                }
                ([operand], Some(_)) => {
                    f.write_str(&op.name)?;
                    operand.fmt_operand(f, PREFIX_PRECEDENCE)
                }
                (children, _) => write!(f, "{}({})", op.name, children.iter().join(", ")),
            },
        }
    }
}
