pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod format;
pub mod invoice;
pub mod pdf;
pub mod session;
pub mod upload;

pub use config::{Company, Config, VisionSettings};
pub use error::{InvoiceError, Result};
pub use extract::{extractor_for, Extractor, SampleExtractor, VisionClient};
pub use invoice::{normalize, recompute, validate, InvoiceRecord, LineItem, ValidationError};
pub use session::Session;
pub use upload::ImageUpload;
