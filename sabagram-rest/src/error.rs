use reqwest::StatusCode;
use sabagram_core::DomainError;
use serde::Deserialize;
use thiserror::Error;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const INSUFFICIENT_PRIVILEGE: &str = "42501";
const UNDEFINED_TABLE: &str = "42P01";
const NO_ROWS: &str = "PGRST116";
const SCHEMA_CACHE_MISS: &str = "PGRST205";

#[derive(Debug, Error)]
/// Ошибки крейта `sabagram-rest`.
pub enum RestError {
    /// Ошибка HTTP-транспорта (`reqwest`).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Тело ответа не удалось разобрать.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// PostgREST ответил неуспешным статусом.
    #[error("postgrest error {status}: {message}")]
    Postgrest {
        /// HTTP-статус ответа.
        status: u16,
        /// Код ошибки Postgres/PostgREST, если он есть в теле.
        code: Option<String>,
        /// Сообщение из тела ответа.
        message: String,
    },

    /// Некорректные параметры подключения.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Ответ успешен, но не содержит ожидаемых данных.
    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// Результат операций `sabagram-rest`.
pub type RestResult<T> = Result<T, RestError>;

#[derive(Debug, Deserialize)]
struct PostgrestErrorDto {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

impl RestError {
    pub(crate) fn from_response(status: StatusCode, body: &str) -> Self {
        let (code, message) = match serde_json::from_str::<PostgrestErrorDto>(body) {
            Ok(dto) => {
                let message = dto
                    .message
                    .or(dto.details)
                    .unwrap_or_else(|| format!("http status {status}"));
                (dto.code, message)
            }
            Err(_) if body.trim().is_empty() => (None, format!("http status {status}")),
            Err(_) => (None, body.trim().to_string()),
        };

        Self::Postgrest {
            status: status.as_u16(),
            code,
            message,
        }
    }

    /// Нарушено уникальное ограничение (например, повторный лайк).
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Postgrest { status, code, .. } => {
                code.as_deref() == Some(UNIQUE_VIOLATION)
                    || (code.is_none() && *status == StatusCode::CONFLICT.as_u16())
            }
            _ => false,
        }
    }

    /// Таблица отсутствует в схеме.
    pub fn is_missing_table(&self) -> bool {
        matches!(
            self,
            Self::Postgrest { code: Some(code), .. }
                if code == UNDEFINED_TABLE || code == SCHEMA_CACHE_MISS
        )
    }

    /// Таблица или колонка отсутствует. Ответы на `HEAD` приходят без тела,
    /// поэтому без кода учитываются и голые `400`/`404`.
    pub fn is_schema_mismatch(&self) -> bool {
        match self {
            Self::Postgrest {
                code: None, status, ..
            } => *status == 400 || *status == 404,
            _ => self.is_missing_table(),
        }
    }
}

impl From<RestError> for DomainError {
    fn from(value: RestError) -> Self {
        match value {
            RestError::Http(err) => {
                if err.is_timeout() || err.is_connect() || err.is_request() {
                    return DomainError::Transient(err.to_string());
                }
                match err.status() {
                    Some(status) => classify(status.as_u16(), None, err.to_string()),
                    None => DomainError::Unexpected(err.to_string()),
                }
            }
            RestError::Serde(err) => DomainError::Unexpected(format!("malformed response: {err}")),
            RestError::Postgrest {
                status,
                code,
                message,
            } => classify(status, code.as_deref(), message),
            RestError::Config(message) => DomainError::Unexpected(message),
            RestError::Unexpected(message) => DomainError::Unexpected(message),
        }
    }
}

/// Сводит статус и код PostgREST к доменной категории ошибки.
pub(crate) fn classify(status: u16, code: Option<&str>, message: String) -> DomainError {
    match code {
        Some(INSUFFICIENT_PRIVILEGE) => return DomainError::Permission(message),
        Some(NO_ROWS) | Some(FOREIGN_KEY_VIOLATION) => return DomainError::NotFound(message),
        Some(UNIQUE_VIOLATION) => return DomainError::Conflict(message),
        Some(UNDEFINED_TABLE) | Some(SCHEMA_CACHE_MISS) => {
            return DomainError::Unexpected(format!("feature unavailable: {message}"));
        }
        _ => {}
    }

    match status {
        401 | 403 => DomainError::Permission(message),
        404 => DomainError::NotFound(message),
        409 => DomainError::Conflict(message),
        408 | 429 => DomainError::Transient(message),
        500..=599 => DomainError::Transient(message),
        _ => DomainError::Unexpected(message),
    }
}
