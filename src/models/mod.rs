pub mod loaders;
pub mod scan_file;

pub use loaders::discover_images;
pub use scan_file::{ImageKind, ScanFile};
