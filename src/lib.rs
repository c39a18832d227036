//! OAuth 2.1 token-lifecycle core for multi-session bridge servers—coordinated refreshes,
//! proactive renewal, and reactive recovery behind one facade.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod classify;
pub mod error;
pub mod exchange;
pub mod flows;
pub mod obs;
pub mod session;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::time::Duration as StdDuration;
	// self
	use crate::{
		exchange::ReqwestExchanger,
		flows::Bridge,
		store::{MemoryTokenStore, TokenStore},
	};

	/// Bridge type alias used by reqwest-backed integration tests.
	pub type ReqwestTestBridge = Bridge<ReqwestExchanger>;

	/// Constructs a [`Bridge`] backed by an in-memory store and a short-timeout reqwest
	/// exchanger pointed at the provided token endpoint.
	pub fn build_reqwest_test_bridge(
		token_endpoint: Url,
		client_id: &str,
	) -> (ReqwestTestBridge, Arc<MemoryTokenStore>) {
		let store_backend = Arc::new(MemoryTokenStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let exchanger =
			ReqwestExchanger::new(token_endpoint, client_id).with_timeout(StdDuration::from_secs(5));
		let bridge = Bridge::with_exchanger(store, exchanger);

		(bridge, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use futures::{
		FutureExt,
		future::{BoxFuture, Shared},
	};
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use oauth2_bridge as _;
#[cfg(all(test, feature = "reqwest"))] use {httpmock as _, tokio as _};
