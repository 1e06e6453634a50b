//! Operations shared by the `object_store` backed implementations.

use bytes::Bytes;
use object_store::path::Path;
use object_store::{
    Attribute, Attributes, Error as ObjectStoreError, ObjectStore, ObjectStoreExt, PutOptions,
    PutPayload,
};

use crate::traits::StorageError;

pub(crate) async fn put_object<S: ObjectStore>(
    store: &S,
    storage_key: &str,
    data: Vec<u8>,
    content_type: &str,
) -> Result<(), StorageError> {
    let location = Path::from(storage_key.to_string());

    let mut attributes = Attributes::new();
    attributes.insert(Attribute::ContentType, content_type.to_string().into());
    let opts = PutOptions {
        attributes,
        ..Default::default()
    };

    store
        .put_opts(&location, PutPayload::from(Bytes::from(data)), opts)
        .await
        .map(|_| ())
        .map_err(|e| StorageError::UploadFailed(e.to_string()))
}

/// Delete an object, reporting `NotFound` when it is absent.
///
/// Object stores treat deleting a missing key as success, so existence is checked first.
pub(crate) async fn delete_object<S: ObjectStore>(
    store: &S,
    storage_key: &str,
) -> Result<(), StorageError> {
    let location = Path::from(storage_key.to_string());

    match store.head(&location).await {
        Ok(_) => {}
        Err(ObjectStoreError::NotFound { .. }) => {
            return Err(StorageError::NotFound(storage_key.to_string()))
        }
        Err(e) => return Err(StorageError::BackendError(e.to_string())),
    }

    store
        .delete(&location)
        .await
        .map_err(|e| StorageError::DeleteFailed(e.to_string()))
}

pub(crate) async fn object_exists<S: ObjectStore>(
    store: &S,
    storage_key: &str,
) -> Result<bool, StorageError> {
    let location = Path::from(storage_key.to_string());

    match store.head(&location).await {
        Ok(_) => Ok(true),
        Err(ObjectStoreError::NotFound { .. }) => Ok(false),
        Err(e) => Err(StorageError::BackendError(e.to_string())),
    }
}
