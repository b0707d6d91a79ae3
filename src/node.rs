//! The document model: an arena-backed mutable tree of tagged values.
//!
//! Every value in a document is a node. Container nodes (`Object`, `Array`)
//! own an ordered child list; all other variants are leaves. Nodes are
//! addressed by `NodeId` handles into the owning [`Tree`], and a node's
//! parent link is a plain handle validated on every structural mutation, so
//! growing or reordering a child list can never leave a dangling
//! back-reference.

use crate::error::TreeError;

/// Stable handle to a node inside a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

/// The tagged payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Object,
    Array,
    String(String),
    Int(i32),
    Float(f32),
    Bool(bool),
    Null,
    Blob(Vec<u8>),
    /// Free text, not a value; excluded from output under non-keeping
    /// comment policies.
    Comment(String),
}

impl Value {
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Object | Value::Array)
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Value::Comment(_))
    }
}

#[derive(Debug, Clone)]
struct Slot {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    name: String,
    value: Value,
}

/// A document tree. Created with a root node; all other nodes are created
/// through it and freed when their owning subtree is removed.
#[derive(Debug, Clone)]
pub struct Tree {
    slots: Vec<Option<Slot>>,
    free: Vec<u32>,
    root: NodeId,
}

impl Tree {
    /// Creates a tree whose root holds `value`. The root carries no name.
    pub fn new(value: Value) -> Self {
        Tree {
            slots: vec![Some(Slot {
                parent: None,
                children: Vec::new(),
                name: String::new(),
                value,
            })],
            free: Vec::new(),
            root: NodeId(0),
        }
    }

    /// Creates a tree with an empty object root.
    pub fn object() -> Self {
        Tree::new(Value::Object)
    }

    /// Creates a tree with an empty array root.
    pub fn array() -> Self {
        Tree::new(Value::Array)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.slots.get(id.0 as usize)?.as_ref()
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        self.slots.get_mut(id.0 as usize)?.as_mut()
    }

    fn alloc(&mut self, slot: Slot) -> NodeId {
        if let Some(index) = self.free.pop() {
            self.slots[index as usize] = Some(slot);
            NodeId(index)
        } else {
            self.slots.push(Some(slot));
            NodeId((self.slots.len() - 1) as u32)
        }
    }

    /// Constructs a detached node for later attachment with [`Tree::add_child`].
    pub fn orphan(&mut self, value: Value, name: impl Into<String>) -> NodeId {
        self.alloc(Slot {
            parent: None,
            children: Vec::new(),
            name: name.into(),
            value,
        })
    }

    /// Appends a new child under `parent`. Fails if `parent` is not a
    /// container.
    pub fn create(
        &mut self,
        parent: NodeId,
        value: Value,
        name: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        let target = self.slot(parent).ok_or(TreeError::StaleNode)?;
        if !target.value.is_container() {
            return Err(TreeError::NotAContainer);
        }
        let child = self.alloc(Slot {
            parent: Some(parent),
            children: Vec::new(),
            name: name.into(),
            value,
        });
        self.slot_mut(parent)
            .ok_or(TreeError::StaleNode)?
            .children
            .push(child);
        Ok(child)
    }

    pub fn create_object(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        self.create(parent, Value::Object, name)
    }

    pub fn create_array(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        self.create(parent, Value::Array, name)
    }

    pub fn create_string(
        &mut self,
        parent: NodeId,
        value: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        self.create(parent, Value::String(value.into()), name)
    }

    pub fn create_int(
        &mut self,
        parent: NodeId,
        value: i32,
        name: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        self.create(parent, Value::Int(value), name)
    }

    pub fn create_float(
        &mut self,
        parent: NodeId,
        value: f32,
        name: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        self.create(parent, Value::Float(value), name)
    }

    pub fn create_bool(
        &mut self,
        parent: NodeId,
        value: bool,
        name: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        self.create(parent, Value::Bool(value), name)
    }

    pub fn create_null(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        self.create(parent, Value::Null, name)
    }

    pub fn create_blob(
        &mut self,
        parent: NodeId,
        value: Vec<u8>,
        name: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        self.create(parent, Value::Blob(value), name)
    }

    /// Comments carry no member name.
    pub fn create_comment(
        &mut self,
        parent: NodeId,
        text: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        self.create(parent, Value::Comment(text.into()), "")
    }

    /// Attaches a currently-unparented node at the end of `parent`'s child
    /// list.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let at = self.child_count(parent);
        self.insert_child(parent, child, at)
    }

    /// Attaches a currently-unparented node at `index` (clamped to the child
    /// count). Neither tree is mutated on failure.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<(), TreeError> {
        let child_slot = self.slot(child).ok_or(TreeError::StaleNode)?;
        if child_slot.parent.is_some() {
            return Err(TreeError::AlreadyParented);
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(TreeError::SelfChild);
        }
        let target = self.slot(parent).ok_or(TreeError::StaleNode)?;
        if !target.value.is_container() {
            return Err(TreeError::NotAContainer);
        }
        let at = index.min(target.children.len());
        if let Some(slot) = self.slot_mut(parent) {
            slot.children.insert(at, child);
        }
        if let Some(slot) = self.slot_mut(child) {
            slot.parent = Some(parent);
        }
        Ok(())
    }

    /// True if `ancestor` lies on `id`'s parent chain.
    fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Detaches and destroys the nth child. Out-of-range is a no-op.
    pub fn remove_child(&mut self, parent: NodeId, index: usize) {
        let Some(slot) = self.slot(parent) else {
            return;
        };
        let Some(&child) = slot.children.get(index) else {
            return;
        };
        if let Some(slot) = self.slot_mut(parent) {
            slot.children.remove(index);
        }
        self.free_subtree(child);
    }

    /// Detaches `id` from its parent (if any) and destroys the subtree.
    /// Removing the root is a no-op.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        let Some(slot) = self.slot(id) else {
            return;
        };
        if let Some(parent) = slot.parent {
            if let Some(parent_slot) = self.slot_mut(parent) {
                parent_slot.children.retain(|&c| c != id);
            }
        }
        self.free_subtree(id);
    }

    pub fn remove_all_children(&mut self, id: NodeId) {
        let Some(slot) = self.slot_mut(id) else {
            return;
        };
        let children = std::mem::take(&mut slot.children);
        for child in children {
            self.free_subtree(child);
        }
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if let Some(slot) = self.slots.get_mut(node.0 as usize).and_then(Option::take) {
                stack.extend(slot.children);
                self.free.push(node.0);
            }
        }
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.slot(id).map_or(0, |s| s.children.len())
    }

    /// The nth child, or `None` if out of range or `id` is not a container.
    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.slot(id)?.children.get(index).copied()
    }

    /// Searches an object's children by name, returning the **last** match.
    /// Duplicate names are legal; `None` for non-objects.
    pub fn child_by_name(&self, id: NodeId, name: &str) -> Option<NodeId> {
        let slot = self.slot(id)?;
        if !matches!(slot.value, Value::Object) {
            return None;
        }
        slot.children
            .iter()
            .rev()
            .copied()
            .find(|&child| self.name(child) == name)
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.child(id, 0)
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        let slot = self.slot(id)?;
        slot.children.last().copied()
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.slot(id)
            .map_or(&[][..], |s| s.children.as_slice())
            .iter()
            .copied()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id)?.parent
    }

    /// Nesting level: the root is 0, its children 1, and so on.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(node) = current {
            depth += 1;
            current = self.parent(node);
        }
        depth
    }

    pub fn name(&self, id: NodeId) -> &str {
        self.slot(id).map_or("", |s| s.name.as_str())
    }

    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) {
        if let Some(slot) = self.slot_mut(id) {
            slot.name = name.into();
        }
    }

    pub fn value(&self, id: NodeId) -> Option<&Value> {
        self.slot(id).map(|s| &s.value)
    }

    pub fn is_container(&self, id: NodeId) -> bool {
        self.value(id).is_some_and(Value::is_container)
    }

    /// Replaces the node's variant and payload. Any existing children are
    /// destroyed recursively first.
    pub fn set_value(&mut self, id: NodeId, value: Value) {
        if self.slot(id).is_none() {
            return;
        }
        self.remove_all_children(id);
        if let Some(slot) = self.slot_mut(id) {
            slot.value = value;
        }
    }

    // Coercing accessors: a variant mismatch yields the defined default
    // rather than failing.

    pub fn get_bool(&self, id: NodeId) -> bool {
        matches!(self.value(id), Some(Value::Bool(true)))
    }

    pub fn get_string(&self, id: NodeId) -> &str {
        match self.value(id) {
            Some(Value::String(s)) => s,
            _ => "",
        }
    }

    /// Ints read back directly; floats truncate toward zero.
    pub fn get_int(&self, id: NodeId) -> i32 {
        match self.value(id) {
            Some(Value::Int(v)) => *v,
            Some(Value::Float(v)) => *v as i32,
            _ => 0,
        }
    }

    pub fn get_float(&self, id: NodeId) -> f32 {
        match self.value(id) {
            Some(Value::Float(v)) => *v,
            Some(Value::Int(v)) => *v as f32,
            _ => 0.0,
        }
    }

    pub fn get_blob(&self, id: NodeId) -> &[u8] {
        match self.value(id) {
            Some(Value::Blob(b)) => b,
            _ => &[],
        }
    }

    pub fn get_comment(&self, id: NodeId) -> &str {
        match self.value(id) {
            Some(Value::Comment(c)) => c,
            _ => "",
        }
    }

    fn subtree_eq(&self, a: NodeId, other: &Tree, b: NodeId) -> bool {
        match (self.slot(a), other.slot(b)) {
            (Some(x), Some(y)) => {
                x.name == y.name
                    && x.value == y.value
                    && x.children.len() == y.children.len()
                    && x.children
                        .iter()
                        .zip(&y.children)
                        .all(|(&ca, &cb)| self.subtree_eq(ca, other, cb))
            }
            _ => false,
        }
    }
}

/// Structural comparison from the roots; slot layout and detached nodes are
/// ignored.
impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }
}
