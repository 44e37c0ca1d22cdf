//! Один цикл отправки: Collecting -> Uploading -> (Completed | Collecting).
//!
//! Переход в Uploading делается синхронно до первого `.await`, поэтому второй
//! запуск, пока первый ждёт ответа, получает `AlreadyInProgress` и в сеть
//! не ходит.

use std::cell::RefCell;

use leptos::prelude::*;

use super::api::BatchSubmitter;
use super::session::{Finished, SessionError, UploadSession};

/// Где живёт сессия. `None`: владелец уже уничтожен (окно закрыто).
pub trait SessionCell {
    fn with_session<R>(&self, f: impl FnOnce(&mut UploadSession) -> R) -> Option<R>;
}

impl SessionCell for RefCell<UploadSession> {
    fn with_session<R>(&self, f: impl FnOnce(&mut UploadSession) -> R) -> Option<R> {
        Some(f(&mut self.borrow_mut()))
    }
}

impl SessionCell for RwSignal<UploadSession> {
    fn with_session<R>(&self, f: impl FnOnce(&mut UploadSession) -> R) -> Option<R> {
        self.try_update(f)
    }
}

pub async fn drive_submission<C, S>(cell: &C, submitter: &S) -> Result<Finished, SessionError>
where
    C: SessionCell + ?Sized,
    S: BatchSubmitter + ?Sized,
{
    let batch = cell
        .with_session(UploadSession::begin_submit)
        .ok_or(SessionError::Disposed)??;

    let outcome = submitter.submit(batch).await;

    cell.with_session(|session| session.finish(outcome))
        .ok_or_else(|| {
            log::warn!("Import session disposed before the batch result arrived");
            SessionError::Disposed
        })?
}
