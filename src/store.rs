//! Persistent token storage over pluggable key-value drivers.
//!
//! [`TokenStore`] owns the durable copy of a session's [`TokenPair`]. It writes the two halves
//! under fixed keys inside a caller-chosen namespace and keeps no in-memory cache, so every call
//! reaches the driver.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::TokenPair};

/// Boxed future returned by [`KeyValueStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Async key-value driver contract backing [`TokenStore`].
pub trait KeyValueStore
where
	Self: Send + Sync,
{
	/// Reads the value stored under `namespace`/`key`, if present.
	fn get<'a>(&'a self, namespace: &'a str, key: &'a str) -> StoreFuture<'a, Option<String>>;

	/// Writes `value` under `namespace`/`key`, replacing any previous value.
	fn set<'a>(&'a self, namespace: &'a str, key: &'a str, value: String) -> StoreFuture<'a, ()>;

	/// Removes `namespace`/`key`; removing an absent key succeeds.
	fn remove<'a>(&'a self, namespace: &'a str, key: &'a str) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`KeyValueStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Namespace-scoped token pair persistence.
#[derive(Clone)]
pub struct TokenStore {
	namespace: String,
	driver: Arc<dyn KeyValueStore>,
}
impl TokenStore {
	/// Key holding the access token.
	pub const ACCESS_TOKEN_KEY: &'static str = "accessToken";
	/// Key holding the refresh token.
	pub const REFRESH_TOKEN_KEY: &'static str = "refreshToken";

	/// Creates a store writing into `namespace` through `driver`.
	pub fn new(namespace: impl Into<String>, driver: Arc<dyn KeyValueStore>) -> Self {
		Self { namespace: namespace.into(), driver }
	}

	/// Returns the namespace this store writes into.
	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	/// Persists both halves of `pair`.
	///
	/// The halves are written one after the other. When the second write fails the namespace may
	/// hold a mixed pair; the error is surfaced and [`TokenStore::load`] keeps treating an
	/// incomplete pair as absent.
	pub async fn save(&self, pair: &TokenPair) -> Result<()> {
		self.driver
			.set(&self.namespace, Self::ACCESS_TOKEN_KEY, pair.access_token.expose().to_owned())
			.await?;
		self.driver
			.set(&self.namespace, Self::REFRESH_TOKEN_KEY, pair.refresh_token.expose().to_owned())
			.await?;

		Ok(())
	}

	/// Loads the persisted pair, failing with [`Error::NoStoredTokens`] if either half is absent.
	pub async fn load(&self) -> Result<TokenPair> {
		let access = self.driver.get(&self.namespace, Self::ACCESS_TOKEN_KEY).await?;
		let refresh = self.driver.get(&self.namespace, Self::REFRESH_TOKEN_KEY).await?;

		TokenPair::from_parts(access, refresh).ok_or(Error::NoStoredTokens)
	}

	/// Removes both halves; succeeds when nothing is stored.
	pub async fn clear(&self) -> Result<()> {
		self.driver.remove(&self.namespace, Self::ACCESS_TOKEN_KEY).await?;
		self.driver.remove(&self.namespace, Self::REFRESH_TOKEN_KEY).await?;

		Ok(())
	}
}
impl Debug for TokenStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenStore").field("namespace", &self.namespace).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn store() -> (TokenStore, Arc<MemoryStore>) {
		let driver = Arc::new(MemoryStore::default());

		(TokenStore::new("session", driver.clone()), driver)
	}

	#[tokio::test]
	async fn save_then_load_round_trip() {
		let (store, _) = store();
		let pair = TokenPair::new("access-1", "refresh-1");

		store.save(&pair).await.expect("Saving a token pair should succeed.");

		let loaded = store.load().await.expect("Loading a saved pair should succeed.");

		assert_eq!(loaded, pair);
	}

	#[tokio::test]
	async fn half_written_pair_is_absent() {
		let (store, driver) = store();

		driver
			.set("session", TokenStore::ACCESS_TOKEN_KEY, "access-only".into())
			.await
			.expect("Seeding the access token should succeed.");

		let err = store.load().await.expect_err("A lone access token must not load.");

		assert!(matches!(err, Error::NoStoredTokens));
	}

	#[tokio::test]
	async fn clear_is_idempotent_and_scoped_to_namespace() {
		let (store, driver) = store();
		let other = TokenStore::new("other", driver.clone());
		let pair = TokenPair::new("access-1", "refresh-1");

		store.save(&pair).await.expect("Saving a token pair should succeed.");
		other.save(&pair).await.expect("Saving into a second namespace should succeed.");
		store.clear().await.expect("Clearing a populated namespace should succeed.");
		store.clear().await.expect("Clearing an empty namespace should succeed.");

		assert!(matches!(store.load().await, Err(Error::NoStoredTokens)));
		assert_eq!(
			other.load().await.expect("The second namespace should be untouched."),
			pair
		);
	}
}
