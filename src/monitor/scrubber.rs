//! Rendered-text scrubber.
//!
//! Walks every text node of a [`Document`], applies the rendered-text
//! pipeline, and writes back only nodes whose text actually changed. Runs
//! once on content load and again for each relevant mutation batch. A
//! write-back may itself be observed; the second pass is a no-op because
//! scrubbed text no longer matches.

use tracing::debug;

use crate::patterns::Redactor;

/// Opaque handle of a text-bearing node.
pub type NodeId = usize;

/// The subset of the host DOM the monitor touches.
pub trait Document: Send {
    /// Text-bearing nodes under the body, in document order.
    fn text_nodes(&self) -> Vec<NodeId>;
    fn node_value(&self, node: NodeId) -> Option<String>;
    fn set_node_value(&mut self, node: NodeId, value: String);
    /// Replace the entire body markup.
    fn replace_body(&mut self, html: &str);
}

/// Kind of an observed mutation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    CharacterData,
    Attributes,
}

#[derive(Debug, Clone)]
pub struct ContentScrubber {
    redactor: Redactor,
}

impl ContentScrubber {
    pub fn new(redactor: Redactor) -> Self {
        Self { redactor }
    }

    /// Scrub all text nodes. Returns the number of nodes rewritten.
    pub fn scrub<D: Document + ?Sized>(&self, doc: &mut D) -> usize {
        let mut changed = 0;
        for node in doc.text_nodes() {
            let Some(text) = doc.node_value(node) else {
                continue;
            };
            let scrubbed = self.redactor.rendered_text(&text);
            if scrubbed != text {
                doc.set_node_value(node, scrubbed);
                changed += 1;
            }
        }
        if changed > 0 {
            debug!(changed, "scrubbed text nodes");
        }
        changed
    }

    pub fn on_content_loaded<D: Document + ?Sized>(&self, doc: &mut D) -> usize {
        self.scrub(doc)
    }

    /// Scrub once if the batch contains a subtree or character-data change.
    pub fn on_mutations<D: Document + ?Sized>(
        &self,
        records: &[MutationKind],
        doc: &mut D,
    ) -> usize {
        let relevant = records
            .iter()
            .any(|k| matches!(k, MutationKind::ChildList | MutationKind::CharacterData));
        if relevant {
            self.scrub(doc)
        } else {
            0
        }
    }
}

/// In-memory document: a flat list of text nodes plus body markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryDocument {
    nodes: Vec<String>,
    body: Option<String>,
    writes: usize,
}

impl MemoryDocument {
    pub fn new<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            nodes: nodes.into_iter().map(Into::into).collect(),
            body: None,
            writes: 0,
        }
    }

    pub fn push_text(&mut self, text: &str) -> NodeId {
        self.nodes.push(text.to_string());
        self.nodes.len() - 1
    }

    pub fn texts(&self) -> &[String] {
        &self.nodes
    }

    /// Body markup set by [`Document::replace_body`], if any.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Number of node writes performed so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl Document for MemoryDocument {
    fn text_nodes(&self) -> Vec<NodeId> {
        (0..self.nodes.len()).collect()
    }

    fn node_value(&self, node: NodeId) -> Option<String> {
        self.nodes.get(node).cloned()
    }

    fn set_node_value(&mut self, node: NodeId, value: String) {
        if let Some(slot) = self.nodes.get_mut(node) {
            *slot = value;
            self.writes += 1;
        }
    }

    fn replace_body(&mut self, html: &str) {
        self.nodes.clear();
        self.body = Some(html.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scrubber() -> ContentScrubber {
        ContentScrubber::new(Redactor::default())
    }

    #[test]
    fn scrubs_hosts_and_tokens_in_text_nodes() {
        let mut doc = MemoryDocument::new([
            "Served by acct.r2.cloudflarestorage.com",
            "link: /view?token=abc&expires=123",
            "nothing here",
        ]);
        let changed = scrubber().scrub(&mut doc);
        assert_eq!(changed, 2);
        assert_eq!(
            doc.texts(),
            &[
                "Served by [PROTECTED]".to_string(),
                "link: /view?token=***&expires=***".to_string(),
                "nothing here".to_string(),
            ]
        );
    }

    #[test]
    fn only_changed_nodes_are_written() {
        let mut doc = MemoryDocument::new(["clean", "also clean"]);
        assert_eq!(scrubber().scrub(&mut doc), 0);
        assert_eq!(doc.writes(), 0);
    }

    #[test]
    fn second_pass_is_a_noop() {
        let mut doc = MemoryDocument::new([
            "https://cryptograph-oneoff.shubhham-jain.workers.dev/?token=x",
            "Your signed download url is ready",
        ]);
        let s = scrubber();
        s.scrub(&mut doc);
        let after_first = doc.clone();
        assert_eq!(s.scrub(&mut doc), 0);
        assert_eq!(doc.texts(), after_first.texts());
    }

    #[test]
    fn attribute_mutations_are_ignored() {
        let mut doc = MemoryDocument::new(["x.workers.dev"]);
        let s = scrubber();
        assert_eq!(s.on_mutations(&[MutationKind::Attributes], &mut doc), 0);
        assert_eq!(doc.texts()[0], "x.workers.dev");
        assert_eq!(
            s.on_mutations(&[MutationKind::Attributes, MutationKind::ChildList], &mut doc),
            1
        );
        assert_eq!(doc.texts()[0], "[PROTECTED]");
    }

    #[test]
    fn content_loaded_scrubs_dynamic_text() {
        let mut doc = MemoryDocument::default();
        doc.push_text("validatekey endpoint");
        assert_eq!(scrubber().on_content_loaded(&mut doc), 1);
        assert_eq!(doc.texts()[0], "[PROTECTED] endpoint");
    }
}
