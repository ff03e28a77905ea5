//! Static session credential with single-flight refresh.
//!
//! The session token carries a generation number that increases on every replacement. A caller
//! that saw a 401 enters the async guard with the generation it sent and the login-attempt ticket
//! it read before sending. Under the guard it either reuses a token another caller already
//! installed, gives up because a login attempted after its request already failed, or performs the
//! login itself. Overlapping 401s therefore cost exactly one login.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::CredentialSecret,
	dispatch::DispatchMetrics,
	error::{ConfigError, StatusError},
	login::SessionLogin,
	obs::{self, DispatchSpan, RefreshOutcome},
};

/// Token value plus the generation it was installed under.
#[derive(Clone, Debug)]
pub(crate) struct SessionToken {
	pub(crate) secret: Option<CredentialSecret>,
	pub(crate) generation: u64,
}

#[derive(Debug, Default)]
struct RefreshState {
	/// Generation and attempt number of the most recent failed login.
	last_failure: Option<(u64, u64)>,
}

/// Shared static credential of one dispatcher family.
pub(crate) struct Session {
	token: RwLock<SessionToken>,
	login: Option<Arc<dyn SessionLogin>>,
	attempts: AtomicU64,
	guard: AsyncMutex<RefreshState>,
}
impl Session {
	pub(crate) fn new(
		secret: Option<CredentialSecret>,
		login: Option<Arc<dyn SessionLogin>>,
	) -> Self {
		Self {
			token: RwLock::new(SessionToken { secret, generation: 0 }),
			login,
			attempts: AtomicU64::new(0),
			guard: AsyncMutex::new(RefreshState::default()),
		}
	}

	pub(crate) fn can_refresh(&self) -> bool {
		self.login.is_some()
	}

	pub(crate) fn snapshot(&self) -> SessionToken {
		self.token.read().clone()
	}

	/// Login attempts started so far; read before sending a request.
	pub(crate) fn ticket(&self) -> u64 {
		self.attempts.load(Ordering::Acquire)
	}

	/// Installs `secret` and returns the new generation.
	pub(crate) fn replace(&self, secret: CredentialSecret) -> SessionToken {
		let mut token = self.token.write();

		token.secret = Some(secret);
		token.generation += 1;

		token.clone()
	}

	/// Returns a usable token, logging in first when the session starts empty.
	pub(crate) async fn current(
		&self,
		metrics: &DispatchMetrics,
	) -> Result<(CredentialSecret, u64)> {
		let ticket = self.ticket();
		let token = self.snapshot();

		if let Some(secret) = token.secret {
			return Ok((secret, token.generation));
		}
		if !self.can_refresh() {
			return Err(ConfigError::MissingSessionToken.into());
		}

		self.refresh_after_rejection(token.generation, ticket, metrics).await
	}

	/// Coordinates a refresh after a request sent with `seen_generation` was rejected.
	pub(crate) async fn refresh_after_rejection(
		&self,
		seen_generation: u64,
		ticket: u64,
		metrics: &DispatchMetrics,
	) -> Result<(CredentialSecret, u64)> {
		let mut state = self.guard.lock().await;
		let current = self.snapshot();

		if let Some(secret) = current.secret.filter(|_| current.generation != seen_generation) {
			obs::refresh_finished(RefreshOutcome::Coalesced, current.generation);

			return Ok((secret, current.generation));
		}
		if state.last_failure.is_some_and(|(generation, attempt)| {
			generation == seen_generation && attempt > ticket
		}) {
			obs::refresh_finished(RefreshOutcome::Suppressed, current.generation);

			return Err(StatusError::Unauthorized.into());
		}

		let token = self.login_locked(&mut state, seen_generation, metrics).await?;

		match token.secret {
			Some(secret) => Ok((secret, token.generation)),
			None => Err(ConfigError::MissingSessionToken.into()),
		}
	}

	/// Logs in unconditionally, serialized with concurrent refreshes.
	pub(crate) async fn refresh_now(&self, metrics: &DispatchMetrics) -> Result<()> {
		let mut state = self.guard.lock().await;
		let generation = self.snapshot().generation;

		self.login_locked(&mut state, generation, metrics).await?;

		Ok(())
	}

	async fn login_locked(
		&self,
		state: &mut RefreshState,
		generation: u64,
		metrics: &DispatchMetrics,
	) -> Result<SessionToken> {
		let login = self.login.as_ref().ok_or(ConfigError::RefreshRequiresStaticCredential)?;
		let attempt = self.attempts.fetch_add(1, Ordering::AcqRel) + 1;

		metrics.record_login();

		match DispatchSpan::refresh(generation).instrument(login.login()).await {
			Ok(secret) => {
				let token = self.replace(secret);

				state.last_failure = None;
				obs::refresh_finished(RefreshOutcome::LoggedIn, token.generation);

				Ok(token)
			},
			Err(e) => {
				state.last_failure = Some((generation, attempt));
				metrics.record_login_failure();
				obs::refresh_finished(RefreshOutcome::Failed, generation);

				Err(e)
			},
		}
	}
}
impl Debug for Session {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let token = self.token.read();

		f.debug_struct("Session")
			.field("has_token", &token.secret.is_some())
			.field("generation", &token.generation)
			.field("can_refresh", &self.can_refresh())
			.finish()
	}
}
