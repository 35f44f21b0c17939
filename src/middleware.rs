//! Thunk-style action adapter for application state containers.
//!
//! [`Middleware::handle`] forwards plain actions to the next handler untouched and hands back
//! whatever it returned. Thunk actions are invoked with a [`ThunkContext`] carrying the plain
//! dispatcher, a [`BoundDispatcher`] for API calls, and the state reader; their future resolves
//! to the thunk's own result. The bound dispatcher reads state on every call, so a thunk that runs
//! after a login or a token update observes the latest pair. Pairs produced by a refresh are
//! persisted by the dispatcher and, when a sink is registered with [`Middleware::on_refresh`],
//! pushed back into the state container.

// self
use crate::{
	_prelude::*,
	auth::TokenPair,
	dispatch::{ApiResponse, Dispatched, Dispatcher, RequestSpec},
	http::HttpTransport,
	obs::{FlowKind, FlowSpan},
	source::TokenSource,
	store::TokenStore,
};

/// Boxed future returned by a thunk.
pub type ThunkFuture<T = ()> = Pin<Box<dyn Future<Output = T> + Send>>;
/// Deferred action invoked with a [`ThunkContext`].
pub type Thunk<S, A, C, T = (), N = ()> =
	Box<dyn FnOnce(ThunkContext<S, A, C, N>) -> ThunkFuture<T> + Send>;
/// Handler receiving plain actions.
pub type DispatchFn<A, N = ()> = Arc<dyn Fn(A) -> N + Send + Sync>;
/// Reader returning the current application state.
pub type GetStateFn<S> = Arc<dyn Fn() -> S + Send + Sync>;
/// Receiver for pairs produced by a refresh.
pub type TokenSink = Arc<dyn Fn(TokenPair) + Send + Sync>;

/// Application state that may hold the session's token pair.
pub trait SessionState {
	/// Returns the pair currently held in state, if any.
	fn tokens(&self) -> Option<TokenPair>;
}
impl SessionState for Option<TokenPair> {
	fn tokens(&self) -> Option<TokenPair> {
		self.clone()
	}
}

/// Action accepted by [`Middleware::handle`].
///
/// `T` is the thunk's result and `N` what the next handler returns for plain actions.
pub enum Action<S, A, C, T = (), N = ()>
where
	C: ?Sized + HttpTransport,
{
	/// Deferred work receiving dispatch, API, and state callbacks.
	Thunk(Thunk<S, A, C, T, N>),
	/// Regular action forwarded to the next handler.
	Plain(A),
}
impl<S, A, C, T, N> Action<S, A, C, T, N>
where
	S: 'static,
	A: 'static,
	C: ?Sized + HttpTransport,
	T: 'static,
	N: 'static,
{
	/// Wraps an async closure as a thunk action.
	pub fn thunk<F, Fut>(f: F) -> Self
	where
		F: 'static + Send + FnOnce(ThunkContext<S, A, C, N>) -> Fut,
		Fut: 'static + Send + Future<Output = T>,
	{
		Self::Thunk(Box::new(move |ctx: ThunkContext<S, A, C, N>| -> ThunkFuture<T> {
			Box::pin(f(ctx))
		}))
	}
}
impl<S, A, C, T, N> Debug for Action<S, A, C, T, N>
where
	A: Debug,
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Thunk(_) => f.write_str("Action::Thunk(..)"),
			Self::Plain(action) => f.debug_tuple("Action::Plain").field(action).finish(),
		}
	}
}

/// Outcome of [`Middleware::handle`].
pub enum Handled<T = (), N = ()> {
	/// The action was a thunk; await the future to drive it and obtain its result.
	Thunk(ThunkFuture<T>),
	/// The action was forwarded; carries the next handler's return value.
	Forwarded(N),
}
impl<T, N> Debug for Handled<T, N>
where
	N: Debug,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Thunk(_) => f.write_str("Handled::Thunk(..)"),
			Self::Forwarded(value) => f.debug_tuple("Handled::Forwarded").field(value).finish(),
		}
	}
}

/// Callbacks handed to a thunk.
pub struct ThunkContext<S, A, C, N = ()>
where
	C: ?Sized + HttpTransport,
{
	/// Forwards plain actions to the next handler.
	pub dispatch: DispatchFn<A, N>,
	/// Sends API requests with tokens taken from the state current at call time.
	pub api: BoundDispatcher<S, C>,
	/// Reads the current state.
	pub get_state: GetStateFn<S>,
}

/// [`Dispatcher::dispatch`] bound to a state reader and a token store.
pub struct BoundDispatcher<S, C>
where
	C: ?Sized + HttpTransport,
{
	dispatcher: Dispatcher<C>,
	store: TokenStore,
	get_state: GetStateFn<S>,
	on_refresh: Option<TokenSink>,
}
impl<S, C> BoundDispatcher<S, C>
where
	S: SessionState,
	C: ?Sized + HttpTransport,
{
	/// Dispatches `spec` with a [`TokenSource`] built from the state read right now.
	pub async fn call(&self, spec: &RequestSpec) -> Result<ApiResponse> {
		Ok(self.call_tracked(spec).await?.response)
	}

	/// [`BoundDispatcher::call`], also returning the pair a refresh produced.
	///
	/// The refreshed pair has already been persisted and passed to the registered sink.
	pub async fn call_tracked(&self, spec: &RequestSpec) -> Result<Dispatched> {
		let candidate = (self.get_state)().tokens();
		let source = TokenSource::new(self.store.clone()).with_candidate(candidate);
		let dispatched = self.dispatcher.dispatch_tracked(spec, &source).await?;

		if let (Some(pair), Some(sink)) = (&dispatched.refreshed, &self.on_refresh) {
			sink(pair.clone());
		}

		Ok(dispatched)
	}
}
impl<S, C> Clone for BoundDispatcher<S, C>
where
	C: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			dispatcher: self.dispatcher.clone(),
			store: self.store.clone(),
			get_state: self.get_state.clone(),
			on_refresh: self.on_refresh.clone(),
		}
	}
}

/// Adapter routing thunks and plain actions for a state container.
pub struct Middleware<S, A, C, N = ()>
where
	C: ?Sized + HttpTransport,
{
	dispatcher: Dispatcher<C>,
	store: TokenStore,
	get_state: GetStateFn<S>,
	next: DispatchFn<A, N>,
	on_refresh: Option<TokenSink>,
}
impl<S, A, C, N> Middleware<S, A, C, N>
where
	S: SessionState,
	C: ?Sized + HttpTransport,
{
	/// Creates the adapter from a dispatcher, a token store, a state reader, and the next handler.
	pub fn new(
		dispatcher: Dispatcher<C>,
		store: TokenStore,
		get_state: impl 'static + Send + Sync + Fn() -> S,
		next: impl 'static + Send + Sync + Fn(A) -> N,
	) -> Self {
		Self {
			dispatcher,
			store,
			get_state: Arc::new(get_state),
			next: Arc::new(next),
			on_refresh: None,
		}
	}

	/// Registers a receiver for refreshed pairs, usually dispatching a token-update action.
	pub fn on_refresh(mut self, sink: impl 'static + Send + Sync + Fn(TokenPair)) -> Self {
		self.on_refresh = Some(Arc::new(sink));

		self
	}

	/// Runs thunks with a [`ThunkContext`]; forwards every other action unchanged.
	pub fn handle<T>(&self, action: Action<S, A, C, T, N>) -> Handled<T, N> {
		let _span = FlowSpan::new(FlowKind::Dispatch, "middleware").entered();

		match action {
			Action::Thunk(thunk) => Handled::Thunk(thunk(self.context())),
			Action::Plain(action) => Handled::Forwarded((self.next)(action)),
		}
	}

	fn context(&self) -> ThunkContext<S, A, C, N> {
		ThunkContext {
			dispatch: self.next.clone(),
			api: BoundDispatcher {
				dispatcher: self.dispatcher.clone(),
				store: self.store.clone(),
				get_state: self.get_state.clone(),
				on_refresh: self.on_refresh.clone(),
			},
			get_state: self.get_state.clone(),
		}
	}
}
