pub mod composer;
pub mod scene;
pub mod selection;
pub mod shortcuts;
pub mod sync;

pub use composer::{Composer, ExportOutput};
pub use scene::{MemoryScene, NodeProp, NodeProps, NodeTransform, SceneEvent, SceneGraph, ZOrder};
pub use selection::SelectionController;
pub use shortcuts::{FocusTarget, KeyEvent, NudgeSteps, ShortcutAction, ShortcutMap};
pub use sync::SceneSync;
