//! Walking live trees.
//!
//! [`Compound::traverse`] reports every attribute with its path.
//! [`Compound::visit`] replays the tree into a [`ValueTreeVisitor`], which
//! makes any backend printable and buildable the same way a streamed
//! document is.

use crate::compound::{Attribute, Compound};
use crate::kind::ValueKind;
use crate::path::TreePath;
use crate::values::Values;
use crate::visitor::ValueTreeVisitor;
use std::time::Duration;

impl Compound {
    /// Depth-first pre-order walk from the root.
    ///
    /// `f` receives each attribute with its path from the root; returning
    /// `false` skips the attribute's children. Links are reported but never
    /// descended into.
    pub fn traverse<F>(&self, mut f: F)
    where
        F: FnMut(&Attribute, &TreePath) -> bool,
    {
        let mut path = TreePath::new();
        walk(&self.structure(), &mut path, &mut f);
    }

    /// Drive `visitor` over the whole tree and return the result of its
    /// `finish`.
    pub fn visit<V: ValueTreeVisitor>(&self, mut visitor: V) -> bool {
        visitor.begin();
        visit_node(&self.structure(), &mut visitor);
        visitor.finish()
    }
}

fn child_segment(child: &Attribute, index: usize, is_list: bool) -> String {
    if is_list {
        return index.to_string();
    }
    child
        .name()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| index.to_string())
}

fn walk<F>(attribute: &Attribute, path: &mut TreePath, f: &mut F)
where
    F: FnMut(&Attribute, &TreePath) -> bool,
{
    if !f(attribute, path) || attribute.is_link() {
        return;
    }
    let is_list = attribute.is_list();
    for (index, child) in attribute.children().enumerate() {
        path.push(child_segment(&child, index, is_list));
        walk(&child, path, f);
        path.pop();
    }
}

fn visit_node<V: ValueTreeVisitor>(attribute: &Attribute, visitor: &mut V) {
    let descend = !attribute.is_link();
    if descend && attribute.is_list() {
        visitor.begin_list();
        for child in attribute.children() {
            if !visitor.should_continue() {
                break;
            }
            visit_node(&child, visitor);
        }
        visitor.finish_list();
    } else if descend
        && (attribute.has_nested() || attribute.canonical_type() == ValueKind::Composite)
    {
        visitor.begin_struct();
        for (index, child) in attribute.children().enumerate() {
            if !visitor.should_continue() {
                break;
            }
            let name = child_segment(&child, index, false);
            visitor.begin_attribute(&name);
            visit_node(&child, visitor);
            visitor.finish_attribute(&name);
        }
        visitor.finish_struct();
    } else {
        consume_values(attribute, visitor);
    }
}

fn consume_values<V: ValueTreeVisitor>(attribute: &Attribute, visitor: &mut V) {
    if attribute.value_count() == 0 {
        visitor.consume(Values::Nil(1));
        return;
    }
    match attribute.canonical_type() {
        ValueKind::Bool => visitor.consume(Values::Bool(&attribute.get_all::<bool>())),
        ValueKind::Int16 | ValueKind::Int32 | ValueKind::Int64 => {
            let signed = attribute.get_all::<i64>();
            if signed.len() == attribute.value_count() {
                visitor.consume(Values::Int(&signed));
            } else {
                // Values above i64::MAX only fit unsigned.
                visitor.consume(Values::UInt(&attribute.get_all::<u64>()));
            }
        }
        ValueKind::Float => visitor.consume(Values::Float(&attribute.get_all::<f32>())),
        ValueKind::Duration => {
            let seconds: Vec<f64> = attribute
                .get_all::<Duration>()
                .iter()
                .map(Duration::as_secs_f64)
                .collect();
            visitor.consume(Values::Double(&seconds));
        }
        ValueKind::Byte => match attribute.get_string() {
            Some(text) => visitor.consume(Values::Str(&[text.as_str()])),
            None => visitor.consume(Values::Nil(1)),
        },
        ValueKind::String | ValueKind::Unknown | ValueKind::Composite => {
            let strings = attribute.get_all::<String>();
            let texts: Vec<&str> = strings.iter().map(String::as_str).collect();
            visitor.consume(Values::Str(&texts));
        }
    }
}
