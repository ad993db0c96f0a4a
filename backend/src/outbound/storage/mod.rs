//! Object-storage adapters for attachment blobs.

mod opendal_attachment_store;

pub use opendal_attachment_store::{OpendalAttachmentStore, S3Settings};
