//! Thread-safe in-memory [`KeyValueStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{KeyValueStore, StoreError, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<(String, String), String>>>;

/// Storage driver that keeps values in-process; contents vanish with the process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Returns the number of stored values across all namespaces.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no values are stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn get_now(map: StoreMap, namespace: &str, key: &str) -> Option<String> {
		map.read().get(&(namespace.to_owned(), key.to_owned())).cloned()
	}

	fn set_now(map: StoreMap, namespace: &str, key: &str, value: String) -> Result<(), StoreError> {
		map.write().insert((namespace.to_owned(), key.to_owned()), value);

		Ok(())
	}

	fn remove_now(map: StoreMap, namespace: &str, key: &str) -> Result<(), StoreError> {
		map.write().remove(&(namespace.to_owned(), key.to_owned()));

		Ok(())
	}
}
impl KeyValueStore for MemoryStore {
	fn get<'a>(&'a self, namespace: &'a str, key: &'a str) -> StoreFuture<'a, Option<String>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::get_now(map, namespace, key)) })
	}

	fn set<'a>(&'a self, namespace: &'a str, key: &'a str, value: String) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::set_now(map, namespace, key, value) })
	}

	fn remove<'a>(&'a self, namespace: &'a str, key: &'a str) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::remove_now(map, namespace, key) })
	}
}
