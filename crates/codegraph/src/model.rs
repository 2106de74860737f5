use serde::{Deserialize, Deserializer, Serialize};

/// Default footprint of code nodes that the surface has not measured yet.
pub const CODE_NODE_SIZE: Size = Size {
    width: 150.0,
    height: 40.0,
};
/// Default footprint of comment nodes that the surface has not measured yet.
pub const COMMENT_NODE_SIZE: Size = Size {
    width: 220.0,
    height: 80.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned box in graph coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Class,
    Method,
    Function,
    Comment,
}

impl NodeKind {
    pub fn is_comment(self) -> bool {
        matches!(self, NodeKind::Comment)
    }

    pub fn default_size(self) -> Size {
        match self {
            NodeKind::Comment => COMMENT_NODE_SIZE,
            NodeKind::File
            | NodeKind::Class
            | NodeKind::Method
            | NodeKind::Function => CODE_NODE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    /// file -> class, class -> method
    Containment,
    /// file -> function
    Reference,
    /// caller -> callee
    CallDependency,
    /// code node -> comment node
    AnnotationLink,
}

impl EdgeKind {
    fn id_prefix(self) -> &'static str {
        match self {
            EdgeKind::Containment => "contains",
            EdgeKind::Reference => "refers",
            EdgeKind::CallDependency => "calls",
            EdgeKind::AnnotationLink => "notes",
        }
    }
}

/// Closed set of annotation tags. Anything unrecognised reads as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    #[default]
    None,
    Todo,
    Bug,
    Refactor,
    Review,
    Done,
}

impl Tag {
    pub const ALL: [Tag; 6] = [
        Tag::None,
        Tag::Todo,
        Tag::Bug,
        Tag::Refactor,
        Tag::Review,
        Tag::Done,
    ];

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "todo" => Tag::Todo,
            "bug" => Tag::Bug,
            "refactor" => Tag::Refactor,
            "review" => Tag::Review,
            "done" => Tag::Done,
            _ => Tag::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tag::None => "none",
            Tag::Todo => "todo",
            Tag::Bug => "bug",
            Tag::Refactor => "refactor",
            Tag::Review => "review",
            Tag::Done => "done",
        }
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Non-string values (null, numbers) fall back as well.
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(value.as_str().map(Tag::parse).unwrap_or_default())
    }
}

/// Comment-only payload of a node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommentMeta {
    pub title: String,
    pub tag: Tag,
    /// Label of the annotated code node; the persistence join key.
    pub parent_label: String,
    /// True until the first edit commit.
    pub is_new: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeMetadata {
    pub signature: Option<String>,
    pub source_code: Option<String>,
    pub comment: Option<CommentMeta>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    /// Top-left corner in graph coordinates.
    pub position: Point,
    /// Measured footprint, if the surface reported one.
    pub size: Option<Size>,
    pub metadata: NodeMetadata,
}

impl GraphNode {
    pub fn new(
        id: impl Into<String>,
        kind: NodeKind,
        label: impl Into<String>,
        position: Point,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            position,
            size: None,
            metadata: NodeMetadata::default(),
        }
    }

    pub fn footprint(&self) -> Size {
        self.size.unwrap_or_else(|| self.kind.default_size())
    }

    pub fn center(&self) -> Point {
        let size = self.footprint();
        Point::new(
            self.position.x + size.width / 2.0,
            self.position.y + size.height / 2.0,
        )
    }

    pub fn comment(&self) -> Option<&CommentMeta> {
        self.metadata.comment.as_ref()
    }

    pub fn comment_mut(&mut self) -> Option<&mut CommentMeta> {
        self.metadata.comment.as_mut()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

impl GraphEdge {
    /// Edge whose id is derived from its kind and endpoints.
    pub fn between(
        kind: EdgeKind,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("{}:{}->{}", kind.id_prefix(), source, target),
            source,
            target,
            kind,
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// Bounding box of a set of nodes, using their footprints.
pub fn bounds_of<'a>(
    nodes: impl IntoIterator<Item = &'a GraphNode>,
) -> Option<Bounds> {
    let mut iter = nodes.into_iter();
    let first = iter.next()?;
    let size = first.footprint();
    let mut bounds = Bounds {
        min: first.position,
        max: Point::new(
            first.position.x + size.width,
            first.position.y + size.height,
        ),
    };
    for node in iter {
        let size = node.footprint();
        bounds.min.x = bounds.min.x.min(node.position.x);
        bounds.min.y = bounds.min.y.min(node.position.y);
        bounds.max.x = bounds.max.x.max(node.position.x + size.width);
        bounds.max.y = bounds.max.y.max(node.position.y + size.height);
    }
    Some(bounds)
}
