//! The in-memory tree behind the [`Writer`](crate::Writer).
//!
//! Open containers live on a stack. The top of the stack is the container
//! that receives the next child, and each entry remembers the property name
//! it will be filed under once it closes. Only containers are ever pushed,
//! so a scalar can never become the parent of anything.
use alloc::{string::String, vec::Vec};

use crate::{
    error::NestingError,
    format::{self, LengthOverflow},
    options::WriterOptions,
    scalar::Scalar,
};

/// A finished node of a document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A leaf value.
    Scalar(Scalar),
    /// An array and its elements, in order.
    Array(Vec<Node>),
    /// A map and its entries, in insertion order.
    Object(Vec<(String, Node)>),
}

impl Node {
    /// Serializes the subtree depth-first, writing exact length prefixes.
    pub(crate) fn encode(
        &self,
        out: &mut Vec<u8>,
        options: WriterOptions,
    ) -> Result<(), LengthOverflow> {
        match self {
            Self::Scalar(s) => s.encode(out, options),
            Self::Array(items) => {
                format::write_array_len(out, items.len())?;
                items.iter().try_for_each(|item| item.encode(out, options))
            }
            Self::Object(entries) => {
                format::write_map_len(out, entries.len())?;
                entries.iter().try_for_each(|(key, value)| {
                    format::write_str(out, key)?;
                    value.encode(out, options)
                })
            }
        }
    }
}

#[derive(Debug)]
enum OpenNode {
    Array(Vec<Node>),
    Object {
        entries: Vec<(String, Node)>,
        pending: Option<String>,
    },
}

#[derive(Debug)]
struct Open {
    node: OpenNode,
    /// Name under which this container is filed in its parent object.
    key: Option<String>,
}

/// Accumulates push-style writes into a tree.
#[derive(Debug, Default)]
pub(crate) struct TreeBuilder {
    stack: Vec<Open>,
}

impl TreeBuilder {
    pub(crate) fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Claims the slot for a new child of the current container: the
    /// pending property name inside an object, nothing inside an array.
    fn claim_slot(&mut self) -> Result<Option<String>, NestingError> {
        match self.stack.last_mut().map(|open| &mut open.node) {
            None | Some(OpenNode::Array(_)) => Ok(None),
            Some(OpenNode::Object { pending, .. }) => pending
                .take()
                .map(Some)
                .ok_or(NestingError::MissingPropertyName),
        }
    }

    fn attach(&mut self, key: Option<String>, child: Node) -> Option<Node> {
        match self.stack.last_mut().map(|open| &mut open.node) {
            None => Some(child),
            Some(OpenNode::Array(items)) => {
                items.push(child);
                None
            }
            Some(OpenNode::Object { entries, .. }) => {
                entries.push((key.unwrap_or_default(), child));
                None
            }
        }
    }

    pub(crate) fn start_object(&mut self) -> Result<(), NestingError> {
        let key = self.claim_slot()?;
        self.stack.push(Open {
            node: OpenNode::Object {
                entries: Vec::new(),
                pending: None,
            },
            key,
        });
        Ok(())
    }

    pub(crate) fn start_array(&mut self) -> Result<(), NestingError> {
        let key = self.claim_slot()?;
        self.stack.push(Open {
            node: OpenNode::Array(Vec::new()),
            key,
        });
        Ok(())
    }

    pub(crate) fn property_name(&mut self, name: String) -> Result<(), NestingError> {
        match self.stack.last_mut().map(|open| &mut open.node) {
            Some(OpenNode::Object { pending, .. }) => {
                if pending.is_some() {
                    return Err(NestingError::DuplicatePropertyName);
                }
                *pending = Some(name);
                Ok(())
            }
            _ => Err(NestingError::PropertyNameOutsideObject),
        }
    }

    /// Adds a scalar. Returns it back as a finished document when no
    /// container is open.
    pub(crate) fn value(&mut self, scalar: Scalar) -> Result<Option<Node>, NestingError> {
        let key = self.claim_slot()?;
        Ok(self.attach(key, Node::Scalar(scalar)))
    }

    /// Closes the current array. Returns the whole tree when it was the root.
    pub(crate) fn end_array(&mut self) -> Result<Option<Node>, NestingError> {
        match self.stack.last() {
            None => return Err(NestingError::NoOpenContainer),
            Some(Open {
                node: OpenNode::Object { .. },
                ..
            }) => return Err(NestingError::MismatchedEnd),
            Some(_) => {}
        }
        let Some(Open {
            node: OpenNode::Array(items),
            key,
        }) = self.stack.pop()
        else {
            return Err(NestingError::MismatchedEnd);
        };
        Ok(self.attach(key, Node::Array(items)))
    }

    /// Closes the current object. Returns the whole tree when it was the root.
    pub(crate) fn end_object(&mut self) -> Result<Option<Node>, NestingError> {
        match self.stack.last() {
            None => return Err(NestingError::NoOpenContainer),
            Some(Open {
                node: OpenNode::Array(_),
                ..
            }) => return Err(NestingError::MismatchedEnd),
            Some(Open {
                node: OpenNode::Object {
                    pending: Some(_), ..
                },
                ..
            }) => return Err(NestingError::DanglingPropertyName),
            Some(_) => {}
        }
        let Some(Open {
            node: OpenNode::Object { entries, .. },
            key,
        }) = self.stack.pop()
        else {
            return Err(NestingError::MismatchedEnd);
        };
        Ok(self.attach(key, Node::Object(entries)))
    }
}
