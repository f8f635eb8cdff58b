//! Owned, ordered element tree
//!
//! An [`Element`] owns its children outright: there are no parent links and
//! no shared nodes. Every mutating method clears the node's cached
//! rendering, and a descendant can only be reached mutably through its
//! ancestors' `&mut` accessors, which clear theirs on the way down.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};

use crate::error::ElementError;
use crate::fragment::TreeFragment;
use crate::render::RenderCache;

/// A node of an XML element tree
#[derive(Clone, Default)]
pub struct Element {
    tag: String,
    /// Sorted by key so rendered output is stable
    attributes: BTreeMap<String, String>,
    text: Option<String>,
    tail: Option<String>,
    children: Vec<Element>,
    pub(crate) cache: RenderCache,
}

impl Element {
    /// Create an empty element with no attributes
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Create an empty element with the given attributes
    pub fn with_attributes<I, K, V>(tag: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            tag: tag.into(),
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Default::default()
        }
    }

    /// Deep copy any element-like tree into owned elements
    pub fn from_fragment<F: TreeFragment + ?Sized>(fragment: &F) -> Self {
        Self {
            tag: fragment.tag().to_string(),
            attributes: fragment
                .attribute_pairs()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            text: non_empty(fragment.text()),
            tail: non_empty(fragment.tail()),
            children: fragment
                .child_fragments()
                .into_iter()
                .map(Element::from_fragment)
                .collect(),
            cache: RenderCache::default(),
        }
    }

    /// Build a new empty element without touching `self`
    ///
    /// Generic tree-building helpers use this as a factory so they need not
    /// know the concrete node type.
    pub fn make_element<I, K, V>(&self, tag: impl Into<String>, attributes: I) -> Element
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Element::with_attributes(tag, attributes)
    }

    /// Create a child through [`Element::make_element`], append it, and
    /// return it for further building
    pub fn sub_element<I, K, V>(&mut self, tag: impl Into<String>, attributes: I) -> &mut Element
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let child = self.make_element(tag, attributes);
        self.append(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// [`Element::sub_element`] without attributes
    pub fn sub_element_tag(&mut self, tag: impl Into<String>) -> &mut Element {
        self.sub_element(tag, std::iter::empty::<(String, String)>())
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.invalidate();
        self.tag = tag.into();
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Look up a single attribute value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Set an attribute, returning the previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.invalidate();
        self.attributes.insert(key.into(), value.into())
    }

    pub fn remove_attribute(&mut self, key: &str) -> Option<String> {
        self.invalidate();
        self.attributes.remove(key)
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Set the text; an empty string clears it, as an empty element has no text
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.invalidate();
        self.text = Some(text.into()).filter(|t| !t.is_empty());
    }

    pub fn take_text(&mut self) -> Option<String> {
        self.invalidate();
        self.text.take()
    }

    pub fn tail(&self) -> Option<&str> {
        self.tail.as_deref()
    }

    /// Set the tail; an empty string clears it
    pub fn set_tail(&mut self, tail: impl Into<String>) {
        self.invalidate();
        self.tail = Some(tail.into()).filter(|t| !t.is_empty());
    }

    pub fn take_tail(&mut self) -> Option<String> {
        self.invalidate();
        self.tail.take()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Mutable access to the children in place
    ///
    /// Adding or removing children goes through [`Element::append`],
    /// [`Element::insert`], [`Element::remove`] and friends.
    pub fn children_mut(&mut self) -> &mut [Element] {
        self.invalidate();
        &mut self.children
    }

    /// Number of direct children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Add a child at the end
    pub fn append(&mut self, item: impl Into<Element>) {
        self.invalidate();
        self.children.push(item.into());
    }

    /// Add a child at `index`, shifting later children right
    ///
    /// An index past the end appends.
    pub fn insert(&mut self, index: usize, item: impl Into<Element>) {
        self.invalidate();
        let index = index.min(self.children.len());
        self.children.insert(index, item.into());
    }

    /// Append each item in order
    pub fn extend<I>(&mut self, items: I)
    where
        I: IntoIterator,
        I::Item: Into<Element>,
    {
        self.invalidate();
        self.children.extend(items.into_iter().map(Into::into));
    }

    /// Remove and return the child at `index`
    pub fn remove(&mut self, index: usize) -> Option<Element> {
        if index >= self.children.len() {
            return None;
        }
        self.invalidate();
        Some(self.children.remove(index))
    }

    /// Remove and return the first direct child tagged `tag`
    pub fn remove_child(&mut self, tag: &str) -> Result<Element, ElementError> {
        let index = self
            .children
            .iter()
            .position(|c| c.tag == tag)
            .ok_or_else(|| ElementError::not_found(tag))?;
        self.invalidate();
        Ok(self.children.remove(index))
    }

    pub fn clear_children(&mut self) {
        self.invalidate();
        self.children.clear();
    }

    /// First direct child tagged `tag`
    ///
    /// Only direct children are searched, in document order.
    pub fn get_child(&self, tag: &str) -> Result<&Element, ElementError> {
        self.children
            .iter()
            .find(|c| c.tag == tag)
            .ok_or_else(|| ElementError::not_found(tag))
    }

    pub fn get_child_mut(&mut self, tag: &str) -> Result<&mut Element, ElementError> {
        self.invalidate();
        self.children
            .iter_mut()
            .find(|c| c.tag == tag)
            .ok_or_else(|| ElementError::not_found(tag))
    }

    /// All direct children tagged `tag`, in document order
    pub fn children_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Pre-order walk over this element and all descendants
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// Append character data at the current end of this element's content:
    /// to the last child's tail, or to the text when there are no children
    pub(crate) fn push_content(&mut self, data: &str) {
        if data.is_empty() {
            return;
        }
        self.invalidate();
        let slot = match self.children.last_mut() {
            Some(last) => {
                last.invalidate();
                &mut last.tail
            }
            None => &mut self.text,
        };
        slot.get_or_insert_with(String::new).push_str(data);
    }

    fn invalidate(&mut self) {
        self.cache.clear();
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Pre-order iterator returned by [`Element::iter`]
pub struct Iter<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
            && self.attributes == other.attributes
            && self.text == other.text
            && self.tail == other.tail
            && self.children == other.children
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("attributes", &self.attributes)
            .field("text", &self.text)
            .field("tail", &self.tail)
            .field("children", &self.children)
            .finish()
    }
}

/// `element["package"]` is shorthand for `get_child("package")`
///
/// # Panics
///
/// Panics if there is no direct child with that tag. Use
/// [`Element::get_child`] when absence is expected.
impl Index<&str> for Element {
    type Output = Element;

    fn index(&self, tag: &str) -> &Element {
        match self.get_child(tag) {
            Ok(child) => child,
            Err(e) => panic!("{e}"),
        }
    }
}

impl IndexMut<&str> for Element {
    fn index_mut(&mut self, tag: &str) -> &mut Element {
        match self.get_child_mut(tag) {
            Ok(child) => child,
            Err(e) => panic!("{e}"),
        }
    }
}

/// Follow a chain of child tags with `get_child`
///
/// `child!(policy, general.name)` is
/// `policy.get_child("general").and_then(|g| g.get_child("name"))`.
/// Tags that are not Rust identifiers need [`Element::get_child`].
#[macro_export]
macro_rules! child {
    ($root:expr, $($tag:ident).+) => {
        ::std::result::Result::<&$crate::Element, $crate::ElementError>::Ok(&$root)
            $( .and_then(|node| node.get_child(stringify!($tag))) )+
    };
}
