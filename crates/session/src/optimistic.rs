//! The optimistic mutation engine.
//!
//! One control path shared by every mutating operation: snapshot the
//! previous value, apply the local write immediately, await the network
//! call, and on failure re-apply the snapshot. On success the caller
//! schedules a reconciling refresh, since the server may adjust computed
//! fields the optimistic write could not know.

use std::future::Future;

use shopsync_client::ApiResult;

use crate::session::Session;
use crate::state::SessionState;

impl Session {
    /// Run `call` with an optimistic local write and automatic rollback.
    ///
    /// - `read` snapshots the current value under the key being mutated
    /// - `write` applies a value (or absence) to the state; it is invoked
    ///   once with `value` before the call and, on failure, once more with
    ///   the snapshot
    ///
    /// The rollback is skipped if the session epoch moved while the call
    /// was in flight (login/logout happened); writing the snapshot into a
    /// different session's state would resurrect stale data.
    pub(crate) async fn with_optimistic_update<V, T, Fut>(
        &self,
        read: impl FnOnce(&SessionState) -> Option<V>,
        write: impl Fn(&mut SessionState, Option<V>),
        value: Option<V>,
        call: Fut,
    ) -> ApiResult<T>
    where
        Fut: Future<Output = ApiResult<T>>,
    {
        let epoch = self.current_epoch();
        let snapshot = {
            let state = self.lock_state();
            read(&state)
        };
        {
            let mut state = self.lock_state();
            write(&mut state, value);
        }

        match call.await {
            Ok(result) => Ok(result),
            Err(e) => {
                self.apply_if_current(epoch, |state| write(state, snapshot));
                Err(e)
            }
        }
    }
}
