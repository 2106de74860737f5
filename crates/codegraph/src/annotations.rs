use crate::model::{
    CommentMeta, EdgeKind, GraphEdge, GraphNode, NodeKind, Point, Tag,
    COMMENT_NODE_SIZE,
};
use crate::scan::Annotation;
use crate::store::GraphStore;

/// Horizontal gap between a code node and its first comment.
const COMMENT_OFFSET_X: f32 = 60.0;
const COMMENT_STACK_GAP: f32 = 20.0;
const ORPHAN_GAP: f32 = 40.0;

/// One committed edit of a comment node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationEdit {
    Text(String),
    Title(String),
    Tag(Tag),
}

/// Attach a fresh, empty comment to the code node `parent_id`.
///
/// Returns the new node id, or `None` when the parent is missing or is a
/// comment itself.
pub fn create(store: &mut GraphStore, parent_id: &str) -> Option<String> {
    let parent = store.node(parent_id).filter(|n| !n.kind.is_comment())?;
    let meta = CommentMeta {
        title: String::new(),
        tag: Tag::None,
        parent_label: parent.label.clone(),
        is_new: true,
    };
    Some(insert_comment(store, Some(parent_id), String::new(), meta))
}

/// Attach a comment that is committed from the start.
pub fn quick_add(
    store: &mut GraphStore,
    parent_id: &str,
    text: &str,
) -> Option<Annotation> {
    let parent = store.node(parent_id).filter(|n| !n.kind.is_comment())?;
    let meta = CommentMeta {
        title: String::new(),
        tag: Tag::None,
        parent_label: parent.label.clone(),
        is_new: false,
    };
    let record = Annotation {
        node_label: meta.parent_label.clone(),
        text: text.to_string(),
        title: String::new(),
        tag: Tag::None,
    };
    insert_comment(store, Some(parent_id), text.to_string(), meta);
    Some(record)
}

/// Apply an edit in place. Clears `is_new`.
pub fn apply_edit(
    store: &mut GraphStore,
    comment_id: &str,
    edit: AnnotationEdit,
) -> bool {
    let Some(node) = store.node_mut(comment_id) else {
        return false;
    };
    let Some(meta) = node.metadata.comment.as_mut() else {
        return false;
    };
    match edit {
        AnnotationEdit::Text(text) => node.label = text,
        AnnotationEdit::Title(title) => meta.title = title,
        AnnotationEdit::Tag(tag) => meta.tag = tag,
    }
    meta.is_new = false;
    true
}

/// Remove a comment node and its edges.
pub fn delete(store: &mut GraphStore, comment_id: &str) -> bool {
    let is_comment = store
        .node(comment_id)
        .is_some_and(|n| n.kind.is_comment());
    is_comment && store.remove_node(comment_id).is_some()
}

/// Full persisted list: every comment node, in store order.
pub fn project(store: &GraphStore) -> Vec<Annotation> {
    store
        .nodes()
        .iter()
        .filter_map(|node| {
            let meta = node.comment()?;
            Some(Annotation {
                node_label: meta.parent_label.clone(),
                text: node.label.clone(),
                title: meta.title.clone(),
                tag: meta.tag,
            })
        })
        .collect()
}

/// Recreate comment nodes from persisted records after a rebuild.
///
/// Each record joins to the first code node whose label equals its
/// `node_label`. Two code nodes sharing a label cannot be told apart here;
/// the first one in store order wins. Records that match nothing become
/// unattached comment nodes so the next save keeps them.
pub fn restore(store: &mut GraphStore, records: &[Annotation]) {
    for record in records {
        let parent_id = store
            .nodes()
            .iter()
            .find(|n| !n.kind.is_comment() && n.label == record.node_label)
            .map(|n| n.id.clone());
        let meta = CommentMeta {
            title: record.title.clone(),
            tag: record.tag,
            parent_label: record.node_label.clone(),
            is_new: false,
        };
        insert_comment(store, parent_id.as_deref(), record.text.clone(), meta);
    }
}

fn insert_comment(
    store: &mut GraphStore,
    parent_id: Option<&str>,
    text: String,
    meta: CommentMeta,
) -> String {
    let position = match parent_id.and_then(|id| store.node(id)) {
        Some(parent) => {
            let size = parent.footprint();
            let siblings = attached_comments(store, &parent.id);
            Point::new(
                parent.position.x + size.width + COMMENT_OFFSET_X,
                parent.position.y
                    + siblings as f32
                        * (COMMENT_NODE_SIZE.height + COMMENT_STACK_GAP),
            )
        }
        None => orphan_slot(store),
    };

    let id = store.next_comment_id();
    let mut node = GraphNode::new(id.clone(), NodeKind::Comment, text, position);
    node.metadata.comment = Some(meta);
    store.add_node(node);
    if let Some(parent_id) = parent_id {
        store.add_edge(GraphEdge::between(
            EdgeKind::AnnotationLink,
            parent_id,
            id.clone(),
        ));
    }
    id
}

fn attached_comments(store: &GraphStore, parent_id: &str) -> usize {
    store
        .edges()
        .iter()
        .filter(|e| e.kind == EdgeKind::AnnotationLink && e.source == parent_id)
        .count()
}

/// Below everything currently in the store.
fn orphan_slot(store: &GraphStore) -> Point {
    match store.bounds() {
        Some(bounds) => Point::new(bounds.min.x, bounds.max.y + ORPHAN_GAP),
        None => Point::default(),
    }
}
