//! The host document: the environment widgets are attached into.
//!
//! A minimal element tree with a permanent `body`. An element is *live* when
//! its ancestor chain reaches the body. Widgets each own one element; the
//! toolkit moves those elements around as the widget tree changes and toggles
//! its reserved marker classes on them.

use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Opaque identifier for an element in a [`Document`].
    pub struct ElementId;
}

/// An element in the host document.
#[derive(Debug, Clone)]
pub struct Element {
    /// Tag name, informational only.
    tag: String,
    /// Parent element.
    parent: Option<ElementId>,
    /// Child elements in document order.
    children: Vec<ElementId>,
    /// Class list, in insertion order without duplicates.
    classes: Vec<String>,
}

impl Element {
    /// Return the tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Return the parent element, if any.
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    /// Return the child elements in document order.
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    /// Return the class list.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// An in-memory host document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Element storage.
    elements: SlotMap<ElementId, Element>,
    /// The root of the live tree.
    body: ElementId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document containing only a body element.
    pub fn new() -> Self {
        let mut elements = SlotMap::with_key();
        let body = elements.insert(Element {
            tag: "body".into(),
            parent: None,
            children: Vec::new(),
            classes: Vec::new(),
        });
        Self { elements, body }
    }

    /// Return the body element.
    pub fn body(&self) -> ElementId {
        self.body
    }

    /// Return an element by id.
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: impl Into<String>) -> ElementId {
        self.elements.insert(Element {
            tag: tag.into(),
            parent: None,
            children: Vec::new(),
            classes: Vec::new(),
        })
    }

    /// Destroy an element. It is removed from its parent and its remaining
    /// children become detached.
    pub fn destroy(&mut self, id: ElementId) {
        if id == self.body {
            return;
        }
        self.remove(id);
        if let Some(element) = self.elements.remove(id) {
            for child in element.children {
                if let Some(c) = self.elements.get_mut(child) {
                    c.parent = None;
                }
            }
        }
    }

    /// Return true if `ancestor` is `node` or one of its ancestors.
    pub fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.elements.get(id).and_then(|e| e.parent);
        }
        false
    }

    /// Return true if the element is part of the live tree under the body.
    pub fn is_live(&self, id: ElementId) -> bool {
        self.elements.contains_key(id) && self.contains(self.body, id)
    }

    /// Append `child` as the last child of `parent`, moving it if it is
    /// already in the document. Returns false if either element is missing or
    /// the move would create a cycle.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> bool {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` into `parent` before `before`, or at the end if
    /// `before` is `None` or not a child of `parent`.
    pub fn insert_before(
        &mut self,
        parent: ElementId,
        child: ElementId,
        before: Option<ElementId>,
    ) -> bool {
        if !self.elements.contains_key(parent)
            || !self.elements.contains_key(child)
            || self.contains(child, parent)
        {
            return false;
        }
        self.remove(child);
        let Some(p) = self.elements.get_mut(parent) else {
            return false;
        };
        let pos = before
            .and_then(|b| p.children.iter().position(|c| *c == b))
            .unwrap_or(p.children.len());
        p.children.insert(pos, child);
        if let Some(c) = self.elements.get_mut(child) {
            c.parent = Some(parent);
        }
        true
    }

    /// Remove an element from its parent. Returns true if it had one.
    pub fn remove(&mut self, id: ElementId) -> bool {
        let Some(parent) = self.elements.get(id).and_then(|e| e.parent) else {
            return false;
        };
        if let Some(p) = self.elements.get_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(e) = self.elements.get_mut(id) {
            e.parent = None;
        }
        true
    }

    /// Return true if the element has a class.
    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.elements
            .get(id)
            .is_some_and(|e| e.classes.iter().any(|c| c == class))
    }

    /// Add a class. Adding an existing class is a no-op.
    pub fn add_class(&mut self, id: ElementId, class: &str) {
        if let Some(e) = self.elements.get_mut(id)
            && !e.classes.iter().any(|c| c == class)
        {
            e.classes.push(class.to_string());
        }
    }

    /// Remove a class.
    pub fn remove_class(&mut self, id: ElementId, class: &str) {
        if let Some(e) = self.elements.get_mut(id) {
            e.classes.retain(|c| c != class);
        }
    }

    /// Toggle a class, optionally forcing its presence. Returns whether the
    /// class is present afterwards.
    pub fn toggle_class(&mut self, id: ElementId, class: &str, force: Option<bool>) -> bool {
        let present = force.unwrap_or(!self.has_class(id, class));
        if present {
            self.add_class(id, class);
        } else {
            self.remove_class(id, class);
        }
        present
    }
}
