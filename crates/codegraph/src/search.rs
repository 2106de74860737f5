use crate::model::GraphNode;

/// Keys the search bar reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Down,
    Up,
    Enter,
    Escape,
}

/// Live query plus the index of the current match.
///
/// Matches are not cached: they are recomputed from the nodes on every
/// read, so edits to labels are picked up without invalidation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    query: String,
    current: usize,
}

impl SearchState {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    /// Replace the query. The current index resets only when the text
    /// actually changes.
    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query != self.query {
            self.query = query;
            self.current = 0;
        }
    }

    pub fn clear(&mut self) {
        self.set_query(String::new());
    }

    /// Ids of matching nodes, in store order.
    pub fn matches<'a>(&self, nodes: &'a [GraphNode]) -> Vec<&'a str> {
        if self.query.is_empty() {
            return Vec::new();
        }
        let needle = self.query.to_lowercase();
        nodes
            .iter()
            .filter(|n| n.label.to_lowercase().contains(&needle))
            .map(|n| n.id.as_str())
            .collect()
    }

    /// Current index, folded into the live match count.
    pub fn current_index(&self, match_count: usize) -> Option<usize> {
        (match_count > 0).then(|| self.current % match_count)
    }

    pub fn current_match<'a>(&self, nodes: &'a [GraphNode]) -> Option<&'a str> {
        let matches = self.matches(nodes);
        self.current_index(matches.len()).map(|i| matches[i])
    }

    /// Step forward, wrapping. Returns the new index, or `None` when
    /// nothing matches.
    pub fn advance(&mut self, match_count: usize) -> Option<usize> {
        let i = self.current_index(match_count)?;
        self.current = (i + 1) % match_count;
        Some(self.current)
    }

    pub fn retreat(&mut self, match_count: usize) -> Option<usize> {
        let i = self.current_index(match_count)?;
        self.current = (i + match_count - 1) % match_count;
        Some(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeKind, Point};

    fn nodes(labels: &[&str]) -> Vec<GraphNode> {
        labels
            .iter()
            .map(|l| GraphNode::new(*l, NodeKind::Function, *l, Point::default()))
            .collect()
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        let nodes = nodes(&["load_File", "save", "FILE_name", "fiel"]);
        let mut search = SearchState::default();
        search.set_query("file");
        assert_eq!(search.matches(&nodes), vec!["load_File", "FILE_name"]);
    }

    #[test]
    fn empty_query_matches_nothing() {
        let nodes = nodes(&["a", "b"]);
        let search = SearchState::default();
        assert!(!search.is_active());
        assert!(search.matches(&nodes).is_empty());
        assert_eq!(search.current_match(&nodes), None);
    }

    #[test]
    fn next_cycles_through_matches_and_wraps() {
        let nodes = nodes(&["A1", "x", "A2", "A3"]);
        let mut search = SearchState::default();
        search.set_query("a");
        assert_eq!(search.current_match(&nodes), Some("A1"));
        search.advance(3);
        assert_eq!(search.current_match(&nodes), Some("A2"));
        search.advance(3);
        assert_eq!(search.current_match(&nodes), Some("A3"));
        search.advance(3);
        assert_eq!(search.current_match(&nodes), Some("A1"));
        search.retreat(3);
        assert_eq!(search.current_match(&nodes), Some("A3"));
    }

    #[test]
    fn changing_the_query_resets_the_index() {
        let mut search = SearchState::default();
        search.set_query("a");
        search.advance(3);
        search.set_query("a");
        assert_eq!(search.current_index(3), Some(1));
        search.set_query("ab");
        assert_eq!(search.current_index(3), Some(0));
    }

    #[test]
    fn navigation_is_inert_without_matches() {
        let mut search = SearchState::default();
        search.set_query("zzz");
        assert_eq!(search.advance(0), None);
        assert_eq!(search.retreat(0), None);
    }
}
