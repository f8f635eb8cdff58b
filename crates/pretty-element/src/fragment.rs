//! Foreign tree values that can be adopted into an [`Element`] tree
//!
//! Any tree type exposing a tag, attributes, text, tail and ordered
//! children can implement [`TreeFragment`]. Passing such a value to
//! [`Element::append`], [`Element::insert`] or [`Element::extend`] deep
//! copies it into owned elements, so every child of an `Element` is an
//! `Element`.

use crate::element::Element;

/// Read-only view of an element-like tree node
pub trait TreeFragment {
    fn tag(&self) -> &str;

    /// Attribute name/value pairs, in any order
    fn attribute_pairs(&self) -> Vec<(&str, &str)>;

    fn text(&self) -> Option<&str>;

    fn tail(&self) -> Option<&str>;

    /// Direct children in document order
    fn child_fragments(&self) -> Vec<&Self>;
}

impl TreeFragment for Element {
    fn tag(&self) -> &str {
        Element::tag(self)
    }

    fn attribute_pairs(&self) -> Vec<(&str, &str)> {
        self.attributes()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    fn text(&self) -> Option<&str> {
        Element::text(self)
    }

    fn tail(&self) -> Option<&str> {
        Element::tail(self)
    }

    fn child_fragments(&self) -> Vec<&Self> {
        self.children().iter().collect()
    }
}

impl<F: TreeFragment> From<&F> for Element {
    fn from(fragment: &F) -> Self {
        Element::from_fragment(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal foreign tree used to exercise conversion
    struct Node {
        name: &'static str,
        attrs: Vec<(&'static str, &'static str)>,
        text: Option<&'static str>,
        tail: Option<&'static str>,
        kids: Vec<Node>,
    }

    impl Node {
        fn leaf(name: &'static str) -> Self {
            Self {
                name,
                attrs: Vec::new(),
                text: None,
                tail: None,
                kids: Vec::new(),
            }
        }
    }

    impl TreeFragment for Node {
        fn tag(&self) -> &str {
            self.name
        }

        fn attribute_pairs(&self) -> Vec<(&str, &str)> {
            self.attrs.clone()
        }

        fn text(&self) -> Option<&str> {
            self.text
        }

        fn tail(&self) -> Option<&str> {
            self.tail
        }

        fn child_fragments(&self) -> Vec<&Self> {
            self.kids.iter().collect()
        }
    }

    fn sample() -> Node {
        let mut script = Node::leaf("script");
        script.attrs = vec![("id", "12"), ("priority", "After")];
        script.text = Some("cleanup.sh");
        script.tail = Some("\n");
        Node {
            name: "scripts",
            attrs: Vec::new(),
            text: None,
            tail: None,
            kids: vec![script, Node::leaf("size")],
        }
    }

    #[test]
    fn test_fragment_deep_conversion() {
        let element = Element::from(&sample());

        assert_eq!(element.tag(), "scripts");
        assert_eq!(element.len(), 2);

        let script = element.get_child("script").unwrap();
        assert_eq!(script.get("id"), Some("12"));
        assert_eq!(script.get("priority"), Some("After"));
        assert_eq!(script.text(), Some("cleanup.sh"));
        assert_eq!(script.tail(), Some("\n"));
        assert_eq!(element.children()[1].tag(), "size");
    }

    #[test]
    fn test_append_converts_fragments() {
        let mut policy = Element::new("policy");
        policy.append(&sample());
        policy.insert(0, &Node::leaf("general"));
        policy.extend([&Node::leaf("self_service"), &Node::leaf("maintenance")]);

        let tags: Vec<_> = policy.children().iter().map(|c| c.tag()).collect();
        assert_eq!(tags, ["general", "scripts", "self_service", "maintenance"]);
        assert_eq!(policy["scripts"].len(), 2);
    }
}
