//! Thread-safe in-memory [`TokenStore`] holding entries for the process lifetime.

// self
use crate::{
	_prelude::*,
	auth::{TokenSet, UserId},
	store::{StoreFuture, TokenStore},
};

type StoreMap = Arc<RwLock<HashMap<UserId, TokenSet>>>;

/// Thread-safe storage backend that keeps token sets in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore(StoreMap);
impl MemoryTokenStore {
	fn save_now(map: StoreMap, user: UserId, tokens: TokenSet) {
		map.write().insert(user, tokens);
	}

	fn fetch_now(map: StoreMap, user: UserId) -> Option<TokenSet> {
		map.read().get(&user).cloned()
	}

	fn delete_now(map: StoreMap, user: UserId) -> Option<TokenSet> {
		map.write().remove(&user)
	}

	fn clear_now(map: StoreMap) {
		map.write().clear();
	}
}
impl TokenStore for MemoryTokenStore {
	fn save(&self, user: UserId, tokens: TokenSet) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			Self::save_now(map, user, tokens);

			Ok(())
		})
	}

	fn fetch<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, Option<TokenSet>> {
		let map = self.0.clone();
		let user = user.to_owned();

		Box::pin(async move { Ok(Self::fetch_now(map, user)) })
	}

	fn delete<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, Option<TokenSet>> {
		let map = self.0.clone();
		let user = user.to_owned();

		Box::pin(async move { Ok(Self::delete_now(map, user)) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			Self::clear_now(map);

			Ok(())
		})
	}
}
