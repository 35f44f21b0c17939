//! Current token pair resolution, preferring caller state over persisted tokens.

// self
use crate::{
	_prelude::*,
	auth::TokenPair,
	obs::{self, FlowKind},
	store::TokenStore,
};

/// Resolves the token pair a request should use.
///
/// A source carries whatever pair the caller's own state currently holds plus a [`TokenStore`]
/// handle. When the candidate is present it wins without any storage I/O; otherwise the store is
/// consulted, which covers the first call after a process restart.
#[derive(Clone, Debug)]
pub struct TokenSource {
	candidate: Option<TokenPair>,
	store: TokenStore,
}
impl TokenSource {
	/// Creates a source with no candidate; [`TokenSource::resolve`] reads from `store`.
	pub fn new(store: TokenStore) -> Self {
		Self { candidate: None, store }
	}

	/// Sets the pair currently held by the caller; incomplete pairs count as absent.
	pub fn with_candidate(mut self, candidate: Option<TokenPair>) -> Self {
		self.candidate = candidate.filter(TokenPair::is_complete);

		self
	}

	/// Returns the candidate pair, if one is set.
	pub fn candidate(&self) -> Option<&TokenPair> {
		self.candidate.as_ref()
	}

	/// Returns the candidate unchanged, or falls back to [`TokenStore::load`].
	pub async fn resolve(&self) -> Result<TokenPair> {
		if let Some(pair) = &self.candidate {
			return Ok(pair.clone());
		}

		obs::observe(FlowKind::Resolve, "load_persisted", self.store.load()).await
	}

	/// Writes `pair` to the backing store, typically after a refresh replaced the access token.
	pub async fn persist(&self, pair: &TokenPair) -> Result<()> {
		obs::observe(FlowKind::Resolve, "persist", self.store.save(pair)).await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::MemoryStore;

	#[tokio::test]
	async fn candidate_wins_over_store() {
		let driver = Arc::new(MemoryStore::default());
		let store = TokenStore::new("session", driver);

		store
			.save(&TokenPair::new("stored-access", "stored-refresh"))
			.await
			.expect("Seeding the store should succeed.");

		let candidate = TokenPair::new("state-access", "state-refresh");
		let source = TokenSource::new(store.clone()).with_candidate(Some(candidate.clone()));

		assert_eq!(source.resolve().await.expect("Candidate should resolve."), candidate);

		let fallback = TokenSource::new(store).with_candidate(None);
		let resolved = fallback.resolve().await.expect("Stored pair should resolve.");

		assert_eq!(resolved.access_token.expose(), "stored-access");
	}

	#[tokio::test]
	async fn incomplete_candidate_falls_back_and_reports_missing_tokens() {
		let store = TokenStore::new("session", Arc::new(MemoryStore::default()));
		let source = TokenSource::new(store).with_candidate(Some(TokenPair::new("access", "")));

		assert!(source.candidate().is_none());
		assert!(matches!(source.resolve().await, Err(Error::NoStoredTokens)));
	}

	#[tokio::test]
	async fn persisted_pairs_become_the_fallback() {
		let store = TokenStore::new("session", Arc::new(MemoryStore::default()));
		let refreshed = TokenPair::new("access-2", "refresh-1");
		let source = TokenSource::new(store.clone())
			.with_candidate(Some(TokenPair::new("access-1", "refresh-1")));

		source.persist(&refreshed).await.expect("Persisting should succeed.");

		let resolved =
			TokenSource::new(store).resolve().await.expect("Persisted pair should resolve.");

		assert_eq!(resolved, refreshed);
	}
}
