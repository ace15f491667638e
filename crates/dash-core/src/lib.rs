pub mod codec;
pub mod content;
pub mod error;
pub mod geometry;
pub mod id;
pub mod lenient;
pub mod model;
pub mod package;
pub mod property;
pub mod scene;
pub mod settings;
pub mod template;

pub use codec::{ProjectDocument, WidgetRecord, load, load_file, save, save_file};
pub use error::{CodecError, EditError};
pub use geometry::{Rect, ScreenBounds, clamp_rect};
pub use id::NodeId;
pub use model::*;
pub use package::{export_package, export_package_file, import_package, import_package_file};
pub use property::PropertyPath;
pub use scene::{RectChange, Relink, SceneGraph, Subtree};
pub use settings::{EditorSettings, Theme};
