//! In-process clipboard.
//!
//! A copied node is stored with its whole subtree as MessagePack-encoded
//! [`WidgetRecord`]s, the same shape the project file uses, so a paste goes
//! through the ordinary template-backfilled decode.

use dash_core::codec::WidgetRecord;
use dash_core::scene::{SceneGraph, Subtree};
use dash_core::{EditError, NodeId};
use std::collections::HashMap;
use thiserror::Error;

/// Offset applied to a pasted node so it does not cover the original.
pub const PASTE_OFFSET: i32 = 20;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard is empty")]
    Empty,
    #[error("cannot encode clipboard payload: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("cannot decode clipboard payload: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error(transparent)]
    Edit(#[from] EditError),
}

#[derive(Debug, Default)]
pub struct Clipboard {
    payload: Option<Vec<u8>>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_none()
    }

    /// Copy `id` and its descendants. Returns the number of nodes copied.
    pub fn copy(&mut self, scene: &SceneGraph, id: NodeId) -> Result<usize, ClipboardError> {
        let node = scene.get(id).ok_or(EditError::NotFound(id))?;
        if node.is_root() {
            return Err(EditError::RootFrame.into());
        }
        let records: Vec<WidgetRecord> = scene
            .traverse(id)
            .filter_map(|n| {
                let node = scene.get(n)?;
                let parent = scene.parent(n)?;
                Some(WidgetRecord::from_node(node, parent))
            })
            .collect();
        self.payload = Some(rmp_serde::to_vec_named(&records)?);
        log::debug!("copied {} nodes from {id}", records.len());
        Ok(records.len())
    }

    /// Parent the copied node had when it was copied.
    pub fn source_parent(&self) -> Option<NodeId> {
        self.records().ok()?.first()?.parent_id
    }

    fn records(&self) -> Result<Vec<WidgetRecord>, ClipboardError> {
        let bytes = self.payload.as_deref().ok_or(ClipboardError::Empty)?;
        Ok(rmp_serde::from_slice(bytes)?)
    }

    /// Decode the payload into a detached subtree with fresh ids, the top
    /// node shifted by [`PASTE_OFFSET`].
    pub fn materialize(&self) -> Result<Subtree, ClipboardError> {
        let mut records = self.records()?.into_iter();
        let mut top = records.next().ok_or(ClipboardError::Empty)?;

        let mut fresh: HashMap<NodeId, NodeId> = HashMap::new();
        fresh.insert(top.id, NodeId::generate());
        top.id = fresh[&top.id];
        top.x += PASTE_OFFSET;
        top.y += PASTE_OFFSET;

        // Records are in pre-order, so a parent is always remapped before
        // its children.
        let mut children: HashMap<NodeId, Vec<WidgetRecord>> = HashMap::new();
        for mut record in records {
            let Some(parent) = record.parent_id.and_then(|p| fresh.get(&p).copied()) else {
                continue;
            };
            let id = NodeId::generate();
            fresh.insert(record.id, id);
            record.id = id;
            record.parent_id = Some(parent);
            children.entry(parent).or_default().push(record);
        }
        Ok(build(top, &mut children))
    }
}

fn build(record: WidgetRecord, children: &mut HashMap<NodeId, Vec<WidgetRecord>>) -> Subtree {
    let kids = children.remove(&record.id).unwrap_or_default();
    let children = kids
        .into_iter()
        .enumerate()
        .map(|(i, child)| Subtree {
            order: i as u64,
            ..build(child, children)
        })
        .collect();
    Subtree {
        node: record.into_node(),
        order: 0,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_core::NodeKind;

    #[test]
    fn paste_payload_has_fresh_ids_and_offset() {
        let mut scene = SceneGraph::new();
        let root = scene.root_id();
        let block = scene.create(NodeKind::Rect, 30, 40, root).unwrap();
        let inner = scene.create(NodeKind::Group, 0, 0, block).unwrap();
        scene.create(NodeKind::Text, 0, 0, inner).unwrap();

        let mut clipboard = Clipboard::new();
        assert_eq!(clipboard.copy(&scene, block).unwrap(), 3);
        assert_eq!(clipboard.source_parent(), Some(root));

        let pasted = clipboard.materialize().unwrap();
        assert_eq!(pasted.node_count(), 3);
        assert_ne!(pasted.node.id, block);
        assert_eq!((pasted.node.rect.x, pasted.node.rect.y), (50, 60));
        assert_eq!(pasted.children[0].children[0].node.kind, NodeKind::Text);
        assert!(pasted.ids().iter().all(|id| !scene.contains(*id)));
    }

    #[test]
    fn empty_clipboard() {
        let clipboard = Clipboard::new();
        assert!(matches!(clipboard.materialize(), Err(ClipboardError::Empty)));
    }

    #[test]
    fn root_cannot_be_copied() {
        let scene = SceneGraph::new();
        let mut clipboard = Clipboard::new();
        let err = clipboard.copy(&scene, scene.root_id()).unwrap_err();
        assert!(matches!(err, ClipboardError::Edit(EditError::RootFrame)));
        assert!(clipboard.is_empty());
    }
}
