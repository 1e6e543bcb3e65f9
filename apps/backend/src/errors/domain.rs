//! Domain-level error type used across services and adapters.
//!
//! This error type is HTTP- and DB-agnostic. Handlers should return
//! `Result<T, crate::error::AppError>` and convert from `DomainError`
//! using the provided `From<DomainError> for AppError` implementation.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Validation failure kinds (client-caused, non-retryable)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationKind {
    InvalidMove,
    WrongTurn,
    MissingField,
    UnknownGameType,
    PlayerNotInSession,
    Other,
}

impl ValidationKind {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationKind::InvalidMove => "INVALID_MOVE",
            ValidationKind::WrongTurn => "WRONG_TURN",
            ValidationKind::MissingField => "MISSING_FIELD",
            ValidationKind::UnknownGameType => "UNKNOWN_GAME_TYPE",
            ValidationKind::PlayerNotInSession => "PLAYER_NOT_IN_SESSION",
            ValidationKind::Other => "VALIDATION_ERROR",
        }
    }
}

/// Domain-level not found entities
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotFoundKind {
    Session,
    Other(String),
}

impl NotFoundKind {
    pub fn code(&self) -> &'static str {
        match self {
            NotFoundKind::Session => "SESSION_NOT_FOUND",
            NotFoundKind::Other(_) => "NOT_FOUND",
        }
    }
}

/// Domain-level conflict kinds
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConflictKind {
    InvalidSessionState,
    Other(String),
}

impl ConflictKind {
    pub fn code(&self) -> &'static str {
        match self {
            ConflictKind::InvalidSessionState => "INVALID_SESSION_STATE",
            ConflictKind::Other(_) => "CONFLICT",
        }
    }
}

/// Infra error kinds to distinguish operational failures
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InfraErrorKind {
    DbUnavailable,
    BrokerUnavailable,
    DataCorruption,
    Other(String),
}

/// Central domain error type
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Input/user validation or business rule violation
    Validation(ValidationKind, String),
    /// Semantic conflict (operation invalid for the current state)
    Conflict(ConflictKind, String),
    /// Missing resource in domain terms
    NotFound(NotFoundKind, String),
    /// Infrastructure/operational failures
    Infra(InfraErrorKind, String),
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DomainError::Validation(kind, d) => write!(f, "validation error {kind:?}: {d}"),
            DomainError::Conflict(kind, d) => write!(f, "conflict {kind:?}: {d}"),
            DomainError::NotFound(kind, d) => write!(f, "not found {kind:?}: {d}"),
            DomainError::Infra(kind, d) => write!(f, "infra {kind:?}: {d}"),
        }
    }
}

impl Error for DomainError {}

impl DomainError {
    pub fn validation(kind: ValidationKind, detail: impl Into<String>) -> Self {
        Self::Validation(kind, detail.into())
    }
    pub fn conflict(kind: ConflictKind, detail: impl Into<String>) -> Self {
        Self::Conflict(kind, detail.into())
    }
    pub fn not_found(kind: NotFoundKind, detail: impl Into<String>) -> Self {
        Self::NotFound(kind, detail.into())
    }
    pub fn infra(kind: InfraErrorKind, detail: impl Into<String>) -> Self {
        Self::Infra(kind, detail.into())
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        match e {
            sea_orm::DbErr::ConnectionAcquire(_) | sea_orm::DbErr::Conn(_) => {
                DomainError::infra(InfraErrorKind::DbUnavailable, e.to_string())
            }
            other => DomainError::infra(InfraErrorKind::Other("db".to_string()), other.to_string()),
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::infra(InfraErrorKind::DataCorruption, e.to_string())
    }
}
