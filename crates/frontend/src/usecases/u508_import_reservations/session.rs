//! Состояние окна импорта.
//!
//! Каждое состояние представлено отдельным типом, переходы потребляют исходное состояние.
//! В `Uploading` можно попасть только через `Collecting::submit` с валидным
//! файлом, поэтому повторная отправка во время загрузки невыразима.
//! `UploadSession` это обёртка для UI, которая хранит текущее состояние и флаги.

use contracts::usecases::u508_import_reservations::{ImportReservationsRequest, ReservationRecord};
use thiserror::Error;

use super::outcome::SubmissionOutcome;
use super::reconcile::Reconciliation;
use super::validate::ValidationReport;
use crate::shared::csv_importer::Header;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Загрузка уже выполняется")]
    AlreadyInProgress,
    #[error("Файл не выбран")]
    NoFile,
    #[error("В файле есть ошибки, загрузка невозможна")]
    Invalid,
    #[error("Загрузка завершена, для нового файла откройте импорт заново")]
    NotCollecting,
    #[error("Нет активной загрузки")]
    NotUploading,
    #[error("Окно импорта закрыто")]
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Сообщение пользователю в окне импорта
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Файл после разбора, нормализации и проверки
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub name: String,
    pub size: u64,
    pub header: Header,
    pub records: Vec<ReservationRecord>,
    pub report: ValidationReport,
}

impl LoadedFile {
    pub fn is_valid(&self) -> bool {
        self.report.is_valid()
    }
}

/// Пакет, который уходит одним запросом
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitBatch {
    records: Vec<ReservationRecord>,
}

impl SubmitBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_request(self) -> ImportReservationsRequest {
        ImportReservationsRequest::new(self.records)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collecting {
    file: Option<LoadedFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uploading {
    file: LoadedFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    file: LoadedFile,
    reconciliation: Reconciliation,
}

/// Чем закончилась загрузка
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Completed(Completed),
    /// Транспортная ошибка: файл и записи остаются, можно отправить снова
    Retry { state: Collecting, reason: String },
}

impl Collecting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(&self) -> Option<&LoadedFile> {
        self.file.as_ref()
    }

    /// Новый файл полностью заменяет предыдущий
    pub fn select(self, file: LoadedFile) -> Collecting {
        Collecting { file: Some(file) }
    }

    pub fn discard(self) -> Collecting {
        Collecting { file: None }
    }

    pub fn submit(self) -> Result<(Uploading, SubmitBatch), (Collecting, SessionError)> {
        let file = match self.file {
            Some(file) => file,
            None => return Err((Collecting { file: None }, SessionError::NoFile)),
        };
        if !file.is_valid() {
            return Err((Collecting { file: Some(file) }, SessionError::Invalid));
        }

        let batch = SubmitBatch {
            records: file.records.clone(),
        };
        Ok((Uploading { file }, batch))
    }
}

impl Uploading {
    pub fn file(&self) -> &LoadedFile {
        &self.file
    }

    pub fn resolve(self, outcome: SubmissionOutcome) -> Resolved {
        match Reconciliation::from_outcome(outcome, &self.file.records) {
            Ok(reconciliation) => Resolved::Completed(Completed {
                file: self.file,
                reconciliation,
            }),
            Err(reason) => Resolved::Retry {
                state: Collecting {
                    file: Some(self.file),
                },
                reason,
            },
        }
    }
}

impl Completed {
    pub fn file(&self) -> &LoadedFile {
        &self.file
    }

    pub fn reconciliation(&self) -> &Reconciliation {
        &self.reconciliation
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Collecting(Collecting),
    Uploading(Uploading),
    Completed(Completed),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Collecting,
    Uploading,
    Completed,
}

/// Решение по запросу на закрытие окна
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    /// Закрыть; `changed`: нужно ли вызывающему обновить список
    Allow { changed: bool },
    /// Закрытие уже разрешалось раньше, повторно не оповещаем
    AlreadyClosed,
    /// Идёт загрузка, окно остаётся открытым
    Blocked,
}

/// Что сделать окну после ответа сервера
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finished {
    Completed(Reconciliation),
    ReturnedToCollecting { reason: String },
}

const IN_PROGRESS: &str = "Загрузка уже выполняется, дождитесь результата";

/// Сессия одного окна импорта
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    state: SessionState,
    changed: bool,
    partial: bool,
    closed: bool,
    notice: Option<Notice>,
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Collecting(Collecting::new()),
            changed: false,
            partial: false,
            closed: false,
            notice: None,
        }
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            SessionState::Collecting(_) => Phase::Collecting,
            SessionState::Uploading(_) => Phase::Uploading,
            SessionState::Completed(_) => Phase::Completed,
        }
    }

    pub fn file(&self) -> Option<&LoadedFile> {
        match &self.state {
            SessionState::Collecting(s) => s.file(),
            SessionState::Uploading(s) => Some(s.file()),
            SessionState::Completed(s) => Some(s.file()),
        }
    }

    pub fn reconciliation(&self) -> Option<&Reconciliation> {
        match &self.state {
            SessionState::Completed(s) => Some(s.reconciliation()),
            _ => None,
        }
    }

    pub fn changed(&self) -> bool {
        self.changed
    }

    pub fn partial(&self) -> bool {
        self.partial
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn can_submit(&self) -> bool {
        match &self.state {
            SessionState::Collecting(s) => s.file().map(LoadedFile::is_valid).unwrap_or(false),
            _ => false,
        }
    }

    fn take_state(&mut self) -> SessionState {
        std::mem::replace(&mut self.state, SessionState::Collecting(Collecting::new()))
    }

    fn in_progress(&mut self) -> SessionError {
        self.notice = Some(Notice::info(IN_PROGRESS));
        SessionError::AlreadyInProgress
    }

    pub fn select_file(&mut self, file: LoadedFile) -> Result<(), SessionError> {
        match self.take_state() {
            SessionState::Collecting(s) => {
                log::debug!(
                    "File {} selected: {} records, valid: {}",
                    file.name,
                    file.records.len(),
                    file.is_valid()
                );
                self.state = SessionState::Collecting(s.select(file));
                self.notice = None;
                Ok(())
            }
            other => {
                let uploading = matches!(other, SessionState::Uploading(_));
                self.state = other;
                if uploading {
                    Err(self.in_progress())
                } else {
                    Err(SessionError::NotCollecting)
                }
            }
        }
    }

    pub fn discard_file(&mut self) -> Result<(), SessionError> {
        match self.take_state() {
            SessionState::Collecting(s) => {
                self.state = SessionState::Collecting(s.discard());
                self.notice = None;
                Ok(())
            }
            other => {
                let uploading = matches!(other, SessionState::Uploading(_));
                self.state = other;
                if uploading {
                    Err(self.in_progress())
                } else {
                    Err(SessionError::NotCollecting)
                }
            }
        }
    }

    /// Collecting -> Uploading. Во всех остальных состояниях запрос
    /// отклоняется, сетевой вызов делать нельзя.
    pub fn begin_submit(&mut self) -> Result<SubmitBatch, SessionError> {
        match self.take_state() {
            SessionState::Collecting(s) => match s.submit() {
                Ok((uploading, batch)) => {
                    log::info!("Submitting batch of {} reservations", batch.len());
                    self.state = SessionState::Uploading(uploading);
                    self.notice = None;
                    Ok(batch)
                }
                Err((s, err)) => {
                    self.state = SessionState::Collecting(s);
                    Err(err)
                }
            },
            other @ SessionState::Uploading(_) => {
                self.state = other;
                log::warn!("Submit ignored: upload already in progress");
                Err(self.in_progress())
            }
            other => {
                self.state = other;
                Err(SessionError::NotCollecting)
            }
        }
    }

    /// Uploading -> Completed (или обратно в Collecting при транспортной ошибке)
    pub fn finish(&mut self, outcome: SubmissionOutcome) -> Result<Finished, SessionError> {
        let uploading = match self.take_state() {
            SessionState::Uploading(s) => s,
            other => {
                self.state = other;
                return Err(SessionError::NotUploading);
            }
        };

        match uploading.resolve(outcome) {
            Resolved::Completed(completed) => {
                let reconciliation = completed.reconciliation().clone();
                log::info!(
                    "Batch finished: {:?}, accepted {}, failed {}",
                    reconciliation.kind,
                    reconciliation.accepted,
                    reconciliation.failed()
                );
                self.changed |= reconciliation.marks_changed();
                self.partial |= reconciliation.is_partial();
                self.notice = Some(reconciliation.notice());
                self.state = SessionState::Completed(completed);
                Ok(Finished::Completed(reconciliation))
            }
            Resolved::Retry { state, reason } => {
                log::warn!("Batch submission failed: {}", reason);
                self.notice = Some(Notice::error(format!(
                    "Не удалось отправить файл: {}. Можно повторить загрузку.",
                    reason
                )));
                self.state = SessionState::Collecting(state);
                Ok(Finished::ReturnedToCollecting { reason })
            }
        }
    }

    /// Закрытие окна по запросу пользователя. Во время загрузки окно не
    /// закрывается, вместо этого показывается сообщение.
    pub fn request_close(&mut self) -> CloseDecision {
        if self.closed {
            return CloseDecision::AlreadyClosed;
        }
        if self.phase() == Phase::Uploading {
            log::warn!("Close requested while uploading");
            self.in_progress();
            return CloseDecision::Blocked;
        }
        self.closed = true;
        CloseDecision::Allow {
            changed: self.changed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::u508_import_reservations::outcome::FailureOrigin;
    use crate::usecases::u508_import_reservations::validate::validate;
    use contracts::usecases::u508_import_reservations::RowErrors;

    fn loaded(numbers: &[&str]) -> LoadedFile {
        let records: Vec<ReservationRecord> = numbers
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let mut r = ReservationRecord::new();
                r.insert("product_id", (i + 1).to_string());
                if !n.is_empty() {
                    r.insert("number", *n);
                }
                r
            })
            .collect();
        LoadedFile {
            name: "r.csv".to_string(),
            size: 10,
            header: Header::new(["product_id", "number"]),
            report: validate(&records, "000000000000"),
            records,
        }
    }

    fn errors(pairs: &[(&str, &str)]) -> RowErrors {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_submit_requires_valid_file() {
        let mut session = UploadSession::new();
        assert_eq!(session.begin_submit(), Err(SessionError::NoFile));

        session.select_file(loaded(&["1", ""])).unwrap();
        assert!(!session.can_submit());
        assert_eq!(session.begin_submit(), Err(SessionError::Invalid));
        assert_eq!(session.phase(), Phase::Collecting);
        assert!(session.file().is_some());
    }

    #[test]
    fn test_second_submit_while_uploading_is_rejected() {
        let mut session = UploadSession::new();
        session.select_file(loaded(&["1", "2"])).unwrap();

        let batch = session.begin_submit().unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(session.phase(), Phase::Uploading);

        assert_eq!(session.begin_submit(), Err(SessionError::AlreadyInProgress));
        assert_eq!(session.notice().map(|n| n.level), Some(NoticeLevel::Info));
        assert_eq!(session.phase(), Phase::Uploading);
    }

    #[test]
    fn test_close_blocked_while_uploading() {
        let mut session = UploadSession::new();
        session.select_file(loaded(&["1"])).unwrap();
        session.begin_submit().unwrap();

        assert_eq!(session.request_close(), CloseDecision::Blocked);
        assert_eq!(session.notice().unwrap().text, IN_PROGRESS);
        assert_eq!(session.select_file(loaded(&["2"])), Err(SessionError::AlreadyInProgress));
    }

    #[test]
    fn test_discard_file_outside_collecting() {
        let mut session = UploadSession::new();
        session.select_file(loaded(&["1"])).unwrap();
        session.begin_submit().unwrap();

        assert_eq!(session.discard_file(), Err(SessionError::AlreadyInProgress));
        assert_eq!(session.notice().unwrap().text, IN_PROGRESS);
        assert!(session.file().is_some());

        session.finish(SubmissionOutcome::Accepted { accepted: 1 }).unwrap();
        assert_eq!(session.discard_file(), Err(SessionError::NotCollecting));
        assert_eq!(session.phase(), Phase::Completed);
    }

    #[test]
    fn test_total_success_then_close_signals_refresh() {
        let mut session = UploadSession::new();
        session.select_file(loaded(&["1", "2"])).unwrap();
        session.begin_submit().unwrap();

        let finished = session
            .finish(SubmissionOutcome::Accepted { accepted: 2 })
            .unwrap();
        assert!(matches!(finished, Finished::Completed(_)));
        assert_eq!(session.phase(), Phase::Completed);
        assert!(session.changed());
        assert!(!session.partial());

        assert_eq!(session.request_close(), CloseDecision::Allow { changed: true });
        assert_eq!(session.request_close(), CloseDecision::AlreadyClosed);
    }

    #[test]
    fn test_partial_success_sets_both_flags() {
        let mut session = UploadSession::new();
        session.select_file(loaded(&["1", "2", "3", "4", "5"])).unwrap();
        session.begin_submit().unwrap();

        let outcome = SubmissionOutcome::PartialFailure {
            accepted: 3,
            errors: errors(&[("1", "x"), ("2", "y")]),
        };
        match session.finish(outcome).unwrap() {
            Finished::Completed(rec) => assert_eq!(rec.items.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
        assert!(session.changed());
        assert!(session.partial());
        assert_eq!(session.notice().map(|n| n.level), Some(NoticeLevel::Warning));
    }

    #[test]
    fn test_total_failure_keeps_changed_false() {
        let mut session = UploadSession::new();
        session.select_file(loaded(&["1"])).unwrap();
        session.begin_submit().unwrap();

        session
            .finish(SubmissionOutcome::TotalFailure {
                errors: errors(&[("0", "x")]),
                origin: FailureOrigin::Reported,
            })
            .unwrap();
        assert!(!session.changed());
        assert_eq!(session.request_close(), CloseDecision::Allow { changed: false });
    }

    #[test]
    fn test_transport_failure_returns_to_collecting_with_records() {
        let mut session = UploadSession::new();
        session.select_file(loaded(&["1", "2"])).unwrap();
        session.begin_submit().unwrap();

        let finished = session.finish(SubmissionOutcome::transport("HTTP 503")).unwrap();
        assert_eq!(
            finished,
            Finished::ReturnedToCollecting {
                reason: "HTTP 503".to_string()
            }
        );
        assert_eq!(session.phase(), Phase::Collecting);
        assert_eq!(session.file().map(|f| f.records.len()), Some(2));
        assert_eq!(session.notice().map(|n| n.level), Some(NoticeLevel::Error));
        assert!(session.can_submit());
        assert!(session.begin_submit().is_ok());
    }

    #[test]
    fn test_discard_resets_and_close_does_not_signal_refresh() {
        let mut session = UploadSession::new();
        session.select_file(loaded(&["1"])).unwrap();
        session.discard_file().unwrap();
        assert!(session.file().is_none());
        assert_eq!(session.request_close(), CloseDecision::Allow { changed: false });
    }

    #[test]
    fn test_finish_without_submission() {
        let mut session = UploadSession::new();
        assert_eq!(
            session.finish(SubmissionOutcome::Accepted { accepted: 1 }),
            Err(SessionError::NotUploading)
        );
    }

    #[test]
    fn test_no_file_selection_after_completion() {
        let mut session = UploadSession::new();
        session.select_file(loaded(&["1"])).unwrap();
        session.begin_submit().unwrap();
        session.finish(SubmissionOutcome::Accepted { accepted: 1 }).unwrap();
        assert_eq!(session.select_file(loaded(&["2"])), Err(SessionError::NotCollecting));
        assert_eq!(session.begin_submit(), Err(SessionError::NotCollecting));
    }
}
