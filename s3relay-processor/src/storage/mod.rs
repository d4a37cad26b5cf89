//! Object storage backends

mod ephemeral;
mod s3;
mod traits;


pub use ephemeral::EphemeralStorage;
pub use s3::{S3Storage, S3StorageConfig};
pub use traits::{ObjectStorage, PutObjectResult, StorageError, StoredObject};
