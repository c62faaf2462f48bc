use std::fmt;
use std::sync::Arc;

use scraper::{ElementRef, Html, Selector};

use crate::page::{Page, PageSchema};

/// A parsed HTML document.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses a complete document. Parsing is lenient and never fails.
    pub fn parse(html: &str) -> Self {
        Document {
            html: Html::parse_document(html),
        }
    }

    /// Parses a fragment, such as a single element's markup.
    pub fn fragment(html: &str) -> Self {
        Document {
            html: Html::parse_fragment(html),
        }
    }

    pub fn root(&self) -> Node<'_> {
        Node(self.html.root_element())
    }

    /// Wraps the document root in a page object of `schema`.
    pub fn page(&self, schema: &Arc<PageSchema>) -> Page<'_> {
        Page::new(schema, self.root())
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document").finish_non_exhaustive()
    }
}

/// An element of a parsed document.
///
/// This is the whole surface extraction relies on: descendant selection,
/// attribute lookup and text content.
#[derive(Clone, Copy)]
pub struct Node<'a>(ElementRef<'a>);

impl<'a> Node<'a> {
    pub fn new(element: ElementRef<'a>) -> Self {
        Node(element)
    }

    /// First descendant matching `selector`.
    pub fn select_one(&self, selector: &Selector) -> Option<Node<'a>> {
        self.0.select(selector).next().map(Node)
    }

    /// All descendants matching `selector`, in document order.
    pub fn select_all(&self, selector: &Selector) -> Vec<Node<'a>> {
        self.0.select(selector).map(Node).collect()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.0.value().attr(name)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.0.value().attrs()
    }

    /// Concatenated text of all descendants.
    pub fn text(&self) -> String {
        self.0.text().collect()
    }

    /// Text of the direct text children only.
    pub fn own_text(&self) -> String {
        self.0
            .children()
            .filter_map(|child| child.value().as_text())
            .map(|text| &**text)
            .collect()
    }

    pub fn tag(&self) -> &'a str {
        self.0.value().name()
    }

    /// Outer HTML of the element.
    pub fn html(&self) -> String {
        self.0.html()
    }

    /// An element with neither child nodes nor attributes is falsy.
    pub fn is_truthy(&self) -> bool {
        self.0.has_children() || self.0.value().attrs().next().is_some()
    }

    pub fn element(&self) -> ElementRef<'a> {
        self.0
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(s: &str) -> Selector {
        Selector::parse(s).unwrap()
    }

    #[test]
    fn select_and_read() {
        let doc = Document::parse(r#"<div id="x"><p class="a">Hello <b>bold</b> world</p><p>two</p></div>"#);
        let root = doc.root();

        let p = root.select_one(&sel("p.a")).unwrap();
        assert_eq!(p.text(), "Hello bold world");
        assert_eq!(p.own_text(), "Hello  world");
        assert_eq!(p.attr("class"), Some("a"));
        assert_eq!(p.attr("href"), None);
        assert_eq!(p.tag(), "p");

        assert_eq!(root.select_all(&sel("p")).len(), 2);
        assert!(root.select_one(&sel("table")).is_none());
    }

    #[test]
    fn empty_elements_are_falsy() {
        let doc = Document::parse(r#"<div><span></span><img src="x.png"><i>t</i></div>"#);
        let root = doc.root();
        assert!(!root.select_one(&sel("span")).unwrap().is_truthy());
        assert!(root.select_one(&sel("img")).unwrap().is_truthy());
        assert!(root.select_one(&sel("i")).unwrap().is_truthy());
    }
}
