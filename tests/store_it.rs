// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// self
use bearer_fetch::{
	auth::TokenPair,
	error::Error,
	source::TokenSource,
	store::{KeyValueStore, MemoryStore, StoreFuture, TokenStore},
};

const NAMESPACE: &str = "it-store";

/// Driver that counts reads before delegating to [`MemoryStore`].
#[derive(Default)]
struct CountingStore {
	inner: MemoryStore,
	reads: AtomicUsize,
}
impl KeyValueStore for CountingStore {
	fn get<'a>(&'a self, namespace: &'a str, key: &'a str) -> StoreFuture<'a, Option<String>> {
		self.reads.fetch_add(1, Ordering::SeqCst);

		self.inner.get(namespace, key)
	}

	fn set<'a>(&'a self, namespace: &'a str, key: &'a str, value: String) -> StoreFuture<'a, ()> {
		self.inner.set(namespace, key, value)
	}

	fn remove<'a>(&'a self, namespace: &'a str, key: &'a str) -> StoreFuture<'a, ()> {
		self.inner.remove(namespace, key)
	}
}

#[tokio::test]
async fn candidate_pairs_never_touch_storage() {
	let driver = Arc::new(CountingStore::default());
	let store = TokenStore::new(NAMESPACE, driver.clone());
	let candidate = TokenPair::new("state-access", "state-refresh");

	for _ in 0..3 {
		let resolved = TokenSource::new(store.clone())
			.with_candidate(Some(candidate.clone()))
			.resolve()
			.await
			.expect("Candidate pairs should resolve.");

		assert_eq!(resolved, candidate);
	}

	assert_eq!(driver.reads.load(Ordering::SeqCst), 0);

	store.save(&candidate).await.expect("Saving the pair should succeed.");

	let resolved = TokenSource::new(store.clone())
		.resolve()
		.await
		.expect("Persisted pairs should resolve.");

	assert_eq!(resolved, candidate);
	assert_eq!(driver.reads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn cleared_store_reports_missing_tokens() {
	let driver = Arc::new(MemoryStore::default());
	let store = TokenStore::new(NAMESPACE, driver.clone());

	store
		.save(&TokenPair::new("access", "refresh"))
		.await
		.expect("Saving the pair should succeed.");

	assert_eq!(driver.len(), 2);

	store.clear().await.expect("Clearing the store should succeed.");
	store.clear().await.expect("Clearing an empty store should succeed.");

	assert!(driver.is_empty());
	assert!(matches!(TokenSource::new(store).resolve().await, Err(Error::NoStoredTokens)));
}
