// Volkeys Binding Group
// A named, ordered list of alternative bindings for one action

use std::fmt;

use crate::binding::{Binding, InputCandidate};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupError {
    #[error("binding index {index} out of range (group has {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Alternative bindings sharing one logical name. Any member satisfies the
/// group. The name is the persistence key; list order is display order
/// only and carries no matching precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingGroup {
    name: String,
    bindings: Vec<Binding>,
}

impl BindingGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: Vec::new(),
        }
    }

    pub fn with_bindings(name: impl Into<String>, bindings: Vec<Binding>) -> Self {
        Self {
            name: name.into(),
            bindings,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn add_binding(&mut self, binding: Binding) {
        self.bindings.push(binding);
    }

    pub fn remove_binding(&mut self, index: usize) -> Result<Binding, GroupError> {
        if index >= self.bindings.len() {
            return Err(GroupError::IndexOutOfRange {
                index,
                len: self.bindings.len(),
            });
        }
        Ok(self.bindings.remove(index))
    }

    /// Logical OR over the members, short-circuiting on the first match.
    pub fn is_active(&self, candidate: &InputCandidate) -> bool {
        self.bindings.iter().any(|b| b.activates(candidate))
    }

    /// Whether any member needs the mouse hooks (button or scroll trigger).
    pub fn uses_mouse(&self) -> bool {
        self.bindings.iter().any(|b| b.trigger().uses_mouse())
    }
}

impl fmt::Display for BindingGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.bindings.iter().map(|b| b.describe()).collect();
        write!(f, "{}: [{}]", self.name, rendered.join(", "))
    }
}
