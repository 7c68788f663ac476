use crate::error::KVError;

/// Mutation applied by [`KVStore::update`] to the current value of a key.
pub type UpdateFn<'a> = dyn FnMut(&[u8]) -> Result<Vec<u8>, KVError> + 'a;

/// KVStore provides a key-value storage interface.
///
/// Keys follow a namespaced convention: `userdata:record:<token>`,
/// `userdata:identity:<discord id>`, etc.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Scan all keys matching a prefix. Returns sorted (key, value) pairs.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;

    /// Read-modify-write a single key inside one write transaction.
    ///
    /// Returns `Ok(None)` without calling `f` when the key is absent.
    /// Otherwise stores and returns the value produced by `f`. An error from
    /// `f` aborts the transaction and leaves the stored value untouched.
    fn update(&self, key: &str, f: &mut UpdateFn<'_>) -> Result<Option<Vec<u8>>, KVError>;

    /// Insert every entry in one transaction. Fails with
    /// `KVError::AlreadyExists` (writing nothing) if any key is present.
    fn create_all(&self, entries: &[(&str, &[u8])]) -> Result<(), KVError>;

    /// Delete several keys in one transaction.
    fn batch_delete(&self, keys: &[&str]) -> Result<(), KVError>;
}
