//! FFmpeg filter-graph fragments.
//!
//! Filters are composed as data: a [`FilterChain`] is an ordered list of
//! filter fragments joined with `,`, a [`FilterGraph`] is an ordered list of
//! chains joined with `;`. Label ordering and value escaping are enforced
//! here and nowhere else.

use crate::command::is_stream_specifier;
use crate::error::{MediaError, MediaResult};

/// Separator between filters inside one chain.
pub const CHAIN_SEPARATOR: &str = ",";
/// Separator between chains inside a graph.
pub const GRAPH_SEPARATOR: &str = ";";

/// Escape a value for use inside a single-quoted filter option.
///
/// The graph parser strips the quotes, then the option parser handles the
/// backslashes, so quotes need the close-escape-reopen form and colons a
/// single backslash.
pub fn escape_filter_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("'\\\\\\''"),
            ':' => escaped.push_str("\\:"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// An ordered chain of filters with optional input and output labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    inputs: Vec<String>,
    filters: Vec<String>,
    outputs: Vec<String>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a stream (`0:a`) or a label produced by an earlier chain.
    pub fn input(mut self, label: impl Into<String>) -> Self {
        self.inputs.push(label.into());
        self
    }

    /// Append a filter fragment.
    pub fn filter(mut self, fragment: impl Into<String>) -> Self {
        self.filters.push(fragment.into());
        self
    }

    /// Name an output of this chain.
    pub fn output(mut self, label: impl Into<String>) -> Self {
        self.outputs.push(label.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn fragments(&self) -> &[String] {
        &self.filters
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn render(&self) -> String {
        let mut rendered = String::new();
        for label in &self.inputs {
            rendered.push('[');
            rendered.push_str(label);
            rendered.push(']');
        }
        rendered.push_str(&self.filters.join(CHAIN_SEPARATOR));
        for label in &self.outputs {
            rendered.push('[');
            rendered.push_str(label);
            rendered.push(']');
        }
        rendered
    }
}

/// An ordered set of chains; named labels must be produced before use.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterGraph {
    chains: Vec<FilterChain>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chain.
    pub fn chain(mut self, chain: FilterChain) -> Self {
        self.chains.push(chain);
        self
    }

    pub fn chains(&self) -> &[FilterChain] {
        &self.chains
    }

    /// Check that every chain has filters and that each named label is
    /// produced once, before it is consumed.
    pub fn validate(&self) -> MediaResult<()> {
        let mut produced: Vec<&str> = Vec::new();

        for (index, chain) in self.chains.iter().enumerate() {
            if chain.is_empty() {
                return Err(MediaError::invalid_plan(format!(
                    "filter chain {} has no filters",
                    index
                )));
            }

            for label in chain.inputs() {
                if is_stream_specifier(label) {
                    continue;
                }
                if !produced.contains(&label.as_str()) {
                    return Err(MediaError::invalid_plan(format!(
                        "filter chain {} consumes [{}] before it is produced",
                        index, label
                    )));
                }
            }

            for label in chain.outputs() {
                if produced.contains(&label.as_str()) {
                    return Err(MediaError::invalid_plan(format!(
                        "filter label [{}] produced twice",
                        label
                    )));
                }
                produced.push(label);
            }
        }

        Ok(())
    }

    pub fn render(&self) -> String {
        self.chains
            .iter()
            .map(FilterChain::render)
            .collect::<Vec<_>>()
            .join(GRAPH_SEPARATOR)
    }
}

/// Filter expression attached to an encode plan.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    /// Single chain applied to the video stream (`-vf`)
    Video(FilterChain),
    /// Full graph (`-filter_complex`)
    Complex(FilterGraph),
}

impl FilterSpec {
    pub fn flag(&self) -> &'static str {
        match self {
            FilterSpec::Video(_) => "-vf",
            FilterSpec::Complex(_) => "-filter_complex",
        }
    }

    pub fn render(&self) -> String {
        match self {
            FilterSpec::Video(chain) => chain.render(),
            FilterSpec::Complex(graph) => graph.render(),
        }
    }
}

/// Scale to even dimensions, which libx264 with yuv420p requires.
pub fn filter_even_dimensions() -> &'static str {
    "scale=trunc(iw/2)*2:trunc(ih/2)*2"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_quotes_and_colons() {
        assert_eq!(escape_filter_value("10:30"), "10\\:30");
        assert_eq!(escape_filter_value("It's"), "It'\\\\\\''s");
        assert_eq!(escape_filter_value("a\\b"), "a\\\\b");
        assert_eq!(escape_filter_value("plain text"), "plain text");
    }

    #[test]
    fn test_chain_render_preserves_order() {
        let chain = FilterChain::new()
            .input("1:a")
            .filter("aformat=channel_layouts=stereo")
            .filter("volume=0.15")
            .output("music");
        assert_eq!(
            chain.render(),
            "[1:a]aformat=channel_layouts=stereo,volume=0.15[music]"
        );
    }

    #[test]
    fn test_graph_joins_chains() {
        let graph = FilterGraph::new()
            .chain(FilterChain::new().input("0:a").filter("anull").output("a"))
            .chain(FilterChain::new().input("a").filter("anull").output("b"));
        assert_eq!(graph.render(), "[0:a]anull[a];[a]anull[b]");
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_graph_rejects_label_used_before_produced() {
        let graph = FilterGraph::new()
            .chain(FilterChain::new().input("b").filter("anull").output("a"))
            .chain(FilterChain::new().input("0:a").filter("anull").output("b"));
        assert!(matches!(graph.validate(), Err(MediaError::InvalidPlan(_))));
    }

    #[test]
    fn test_graph_rejects_duplicate_and_empty() {
        let duplicate = FilterGraph::new()
            .chain(FilterChain::new().input("0:a").filter("anull").output("a"))
            .chain(FilterChain::new().input("1:a").filter("anull").output("a"));
        assert!(duplicate.validate().is_err());

        let empty = FilterGraph::new().chain(FilterChain::new().input("0:a"));
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_spec_flags() {
        let chain = FilterChain::new().filter(filter_even_dimensions());
        assert_eq!(FilterSpec::Video(chain).flag(), "-vf");
        assert_eq!(FilterSpec::Complex(FilterGraph::new()).flag(), "-filter_complex");
    }
}
