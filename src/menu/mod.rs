pub mod cursor;
pub mod layout;
pub mod model;
pub mod scan;
pub mod storage;
pub mod store;

pub use cursor::{Anchor, Cursor};
pub use layout::{project, FlatEntry, Projection};
pub use model::{Item, MenuTree};
pub use storage::JsonFile;
pub use store::MenuStore;
