//! Image sources queried by the readiness prober.

use parking_lot::RwLock;

/// Observable state of one image element at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageSnapshot {
    /// The element finished its load attempt (successfully or not).
    pub complete: bool,
    /// Intrinsic height of the decoded image, zero if nothing decoded.
    pub natural_height: u32,
}

impl ImageSnapshot {
    /// Whether the image has actually rendered.
    pub fn is_rendered(&self) -> bool {
        self.complete && self.natural_height > 0
    }
}

/// A document whose images can be queried by selector.
///
/// Implementations must be cheap to query; the prober calls `query` once
/// per frame.
pub trait ImageSource: Send + Sync {
    /// Snapshot every image element matching any of `selectors`.
    ///
    /// An element matching several selectors is reported once.
    fn query(&self, selectors: &[String]) -> Vec<ImageSnapshot>;
}

/// Check that every alternative in a selector list uses a supported form.
///
/// Supported: `*`, a bare tag name, and compounds of an optional tag with
/// `.class` and `#id` parts (`img.card.cover`, `img#main`). Descendant and
/// child combinators, attributes and pseudo-classes are rejected, since
/// [`ImageElement::matches`] would never match them.
pub fn check_selector(selector: &str) -> Result<(), String> {
    let alternatives: Vec<&str> = selector
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if alternatives.is_empty() {
        return Err("empty selector".to_string());
    }

    for alternative in alternatives {
        if alternative == "*" {
            continue;
        }
        if let Some(c) = alternative
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '#')))
        {
            return Err(format!(
                "unsupported selector '{}': '{}' is not allowed; use tag, .class or #id compounds",
                alternative, c
            ));
        }
        let empty_part = alternative
            .split(['.', '#'])
            .skip(1)
            .any(str::is_empty);
        if empty_part {
            return Err(format!(
                "unsupported selector '{}': empty class or id",
                alternative
            ));
        }
    }
    Ok(())
}

/// An image element tracked by [`DocumentImages`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageElement {
    pub id: String,
    pub classes: Vec<String>,
    pub src: String,
    pub complete: bool,
    pub natural_height: u32,
}

impl ImageElement {
    /// Create a pending (not yet complete) element.
    pub fn new(id: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            classes: Vec::new(),
            src: src.into(),
            complete: false,
            natural_height: 0,
        }
    }

    /// Add a class name.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Current snapshot of the element.
    pub fn snapshot(&self) -> ImageSnapshot {
        ImageSnapshot {
            complete: self.complete,
            natural_height: self.natural_height,
        }
    }

    /// Whether this element matches a selector list such as `"img, .hero"`.
    ///
    /// Supported forms per alternative: `*`, `img`, `.class`, `#id` and
    /// compounds thereof (`img.card.cover`, `img#main`). See
    /// [`check_selector`] for validating a list up front.
    pub fn matches(&self, selector: &str) -> bool {
        selector
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .any(|alternative| self.matches_compound(alternative))
    }

    fn matches_compound(&self, selector: &str) -> bool {
        if selector == "*" {
            return true;
        }
        let rest = selector.strip_prefix("img").unwrap_or(selector);
        if rest.is_empty() {
            return true;
        }
        if !rest.starts_with(['.', '#']) {
            // Some other tag name; image elements never match it.
            return false;
        }

        let mut remaining = rest;
        while let Some(marker) = remaining.chars().next() {
            let body = &remaining[1..];
            let end = body.find(['.', '#']).unwrap_or(body.len());
            let name = &body[..end];
            if name.is_empty() {
                return false;
            }
            let ok = match marker {
                '.' => self.classes.iter().any(|c| c == name),
                '#' => self.id == name,
                _ => false,
            };
            if !ok {
                return false;
            }
            remaining = &body[end..];
        }
        true
    }
}

/// In-memory document holding image elements.
///
/// A renderer (or a test) mounts elements and reports their load outcome;
/// the prober reads them concurrently.
#[derive(Debug, Default)]
pub struct DocumentImages {
    elements: RwLock<Vec<ImageElement>>,
}

impl DocumentImages {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount an element, replacing any element with the same id.
    pub fn insert(&self, element: ImageElement) {
        let mut elements = self.elements.write();
        match elements.iter_mut().find(|e| e.id == element.id) {
            Some(existing) => *existing = element,
            None => elements.push(element),
        }
    }

    /// Record a successful decode. Returns `false` if the id is unknown.
    pub fn mark_loaded(&self, id: &str, natural_height: u32) -> bool {
        self.update(id, |e| {
            e.complete = true;
            e.natural_height = natural_height;
        })
    }

    /// Record a failed load. The element becomes complete with no height.
    pub fn mark_broken(&self, id: &str) -> bool {
        self.update(id, |e| {
            e.complete = true;
            e.natural_height = 0;
        })
    }

    /// Unmount an element. Returns `false` if the id is unknown.
    pub fn remove(&self, id: &str) -> bool {
        let mut elements = self.elements.write();
        let before = elements.len();
        elements.retain(|e| e.id != id);
        elements.len() != before
    }

    /// Unmount everything.
    pub fn clear(&self) {
        self.elements.write().clear();
    }

    /// Number of mounted elements.
    pub fn len(&self) -> usize {
        self.elements.read().len()
    }

    /// Whether no elements are mounted.
    pub fn is_empty(&self) -> bool {
        self.elements.read().is_empty()
    }

    fn update(&self, id: &str, f: impl FnOnce(&mut ImageElement)) -> bool {
        let mut elements = self.elements.write();
        match elements.iter_mut().find(|e| e.id == id) {
            Some(element) => {
                f(element);
                true
            }
            None => false,
        }
    }
}

impl ImageSource for DocumentImages {
    fn query(&self, selectors: &[String]) -> Vec<ImageSnapshot> {
        self.elements
            .read()
            .iter()
            .filter(|e| selectors.iter().any(|s| e.matches(s)))
            .map(ImageElement::snapshot)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selectors(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_check_selector() {
        for ok in ["img", "*", ".hero-image", "#plan", "img.card.cover", "img, .gallery", "picture"] {
            assert!(check_selector(ok).is_ok(), "{ok}");
        }
        for bad in [".gallery img", "div > img", "img[alt]", "img:first-child", "img..x", ".", " , "] {
            assert!(check_selector(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_snapshot_rendered_requires_height() {
        let broken = ImageSnapshot {
            complete: true,
            natural_height: 0,
        };
        let pending = ImageSnapshot {
            complete: false,
            natural_height: 480,
        };
        let rendered = ImageSnapshot {
            complete: true,
            natural_height: 480,
        };

        assert!(!broken.is_rendered());
        assert!(!pending.is_rendered());
        assert!(rendered.is_rendered());
    }

    #[test]
    fn test_selector_matching() {
        let element = ImageElement::new("hero", "https://cdn.example.com/a.jpg")
            .with_class("card")
            .with_class("cover");

        assert!(element.matches("img"));
        assert!(element.matches("*"));
        assert!(element.matches(".card"));
        assert!(element.matches("img.card.cover"));
        assert!(element.matches("#hero"));
        assert!(element.matches("img#hero.card"));
        assert!(element.matches("div, .cover"));

        assert!(!element.matches(".thumb"));
        assert!(!element.matches("img.card.thumb"));
        assert!(!element.matches("#other"));
        assert!(!element.matches("div"));
        assert!(!element.matches("."));
    }

    #[test]
    fn test_query_reports_each_element_once() {
        let doc = DocumentImages::new();
        doc.insert(ImageElement::new("a", "/media/a.png").with_class("card"));
        doc.insert(ImageElement::new("b", "/media/b.png"));

        let found = doc.query(&selectors(&["img", ".card"]));
        assert_eq!(found.len(), 2);

        let cards = doc.query(&selectors(&[".card"]));
        assert_eq!(cards.len(), 1);
    }

    #[test]
    fn test_mark_loaded_and_broken() {
        let doc = DocumentImages::new();
        doc.insert(ImageElement::new("a", "/media/a.png"));
        doc.insert(ImageElement::new("b", "/media/b.png"));

        assert!(doc.mark_loaded("a", 300));
        assert!(doc.mark_broken("b"));
        assert!(!doc.mark_loaded("missing", 10));

        let snapshots = doc.query(&selectors(&["img"]));
        let rendered = snapshots.iter().filter(|s| s.is_rendered()).count();
        assert_eq!(rendered, 1);
        assert!(snapshots.iter().all(|s| s.complete));
    }

    #[test]
    fn test_insert_replaces_same_id() {
        let doc = DocumentImages::new();
        doc.insert(ImageElement::new("a", "/media/a.png"));
        doc.mark_loaded("a", 100);
        doc.insert(ImageElement::new("a", "/media/a2.png"));

        assert_eq!(doc.len(), 1);
        assert!(!doc.query(&selectors(&["img"]))[0].complete);
    }

    #[test]
    fn test_remove_and_clear() {
        let doc = DocumentImages::new();
        doc.insert(ImageElement::new("a", "/media/a.png"));
        doc.insert(ImageElement::new("b", "/media/b.png"));

        assert!(doc.remove("a"));
        assert!(!doc.remove("a"));
        assert_eq!(doc.len(), 1);

        doc.clear();
        assert!(doc.is_empty());
    }
}
