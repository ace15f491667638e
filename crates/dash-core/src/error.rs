use crate::id::NodeId;
use thiserror::Error;

/// Why a scene-graph mutation was refused. A refused mutation leaves the
/// graph exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("widget {0} does not exist")]
    NotFound(NodeId),
    #[error("widget {0} is locked")]
    Locked(NodeId),
    #[error("widget {0} cannot hold children")]
    NotContainer(NodeId),
    #[error("the root frame cannot be moved into, deleted or grouped")]
    RootFrame,
    #[error("widget {0} cannot be placed inside its own subtree")]
    Cycle(NodeId),
    #[error("widget id {0} is already in use")]
    DuplicateId(NodeId),
    #[error("grouped widgets must share one parent")]
    MixedParents,
    #[error("nothing selected")]
    EmptySelection,
}

/// Failure reading or writing a project document or package.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid project document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("project document has no `root` entry")]
    MissingRoot,
    #[error("widget.json not found in package")]
    ManifestNotFound,
    #[error("invalid package archive: {0}")]
    Archive(#[from] zip::result::ZipError),
}
