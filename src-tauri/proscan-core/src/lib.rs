pub mod bridge;
pub mod capability;
pub mod error;
pub mod image_type;
pub mod importer;
pub mod permission;
pub mod settings;
pub mod source;
pub mod store;

pub use bridge::{GalleryChannel, MethodCall, MethodResult};
pub use error::{ImportError, Result};
pub use importer::{GalleryImporter, ImportRequest};
