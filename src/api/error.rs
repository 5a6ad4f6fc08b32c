#![allow(unused)]
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::borrow::Cow;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Bad Request: {0}")]
    BadRequest(Cow<'static, str>),
    #[error("Not Found: {0}")]
    NotFound(Cow<'static, str>),
    #[error("Conflict: {0}")]
    Conflict(Cow<'static, str>),
    #[error("Unprocessable Entity: {0}")]
    UnprocessableEntity(Cow<'static, str>),
    #[error("Internal Server Error")]
    InternalServer,
}

#[derive(serde::Serialize)]
pub struct ErrorBody {
    pub message: Cow<'static, str>,
}

impl Error {
    pub fn bad_request(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal_server_error() -> Self {
        Self::InternalServer
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match *self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::InternalServer => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut res = HttpResponse::build(self.status_code());

        match self {
            // Has Message
            Error::NotFound(msg)
            | Error::Conflict(msg)
            | Error::BadRequest(msg)
            | Error::UnprocessableEntity(msg) => res.json(ErrorBody { message: msg.clone() }),
            // No Message
            Error::InternalServer => {
                res.json(ErrorBody { message: "Internal Server Error".into() })
            }
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SystemError {
    // sqlx errors
    #[error("Database Error : {0}")]
    DatabaseError(Cow<'static, str>),
    #[error("Migration Error")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    // Banner workflow errors
    #[error("File upload failed: error code #{code}")]
    Upload { code: i32 },
    #[error("Cannot bind data to banner: {0}")]
    Bind(Cow<'static, str>),
    #[error("Cannot persist banner: {0}")]
    Persist(Cow<'static, str>),
    #[error("Invalid configuration: {0}")]
    Config(Cow<'static, str>),
    // Custom Errors
    #[error("Bad Request: {0}")]
    BadRequest(Cow<'static, str>),
    #[error("Database Not Found: {0}")]
    NotFound(Cow<'static, str>),
    #[error("Database Conflict: {0:?}")]
    Conflict(Option<DbErrorMeta>),
    #[error("Internal System Error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

fn conflict_message(meta: &Option<DbErrorMeta>) -> Cow<'static, str> {
    let Some(m) = meta else {
        return "Duplicate value".into();
    };

    let Some(constraint) = &m.constraint else {
        return "Duplicate value".into();
    };

    let field = constraint.split('_').next_back().unwrap_or("value");

    let mut chars = field.chars();
    let field = match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => "Value".to_string(),
    };

    format!("{field} already exists").into()
}

#[derive(Debug)]
pub struct DbErrorMeta {
    pub code: Option<String>,
    pub constraint: Option<String>,
    pub message: String,
}

impl From<SystemError> for Error {
    fn from(value: SystemError) -> Self {
        match value {
            SystemError::BadRequest(msg) | SystemError::Bind(msg) => Error::BadRequest(msg),
            SystemError::NotFound(msg) => Error::NotFound(msg),
            SystemError::Persist(msg) => Error::UnprocessableEntity(msg),
            SystemError::Conflict(meta) => Error::Conflict(conflict_message(&meta)),
            _ => {
                log::error!("Internal Server Error: {:?}", value);
                Error::InternalServer
            }
        }
    }
}

impl From<sqlx::Error> for SystemError {
    fn from(err: sqlx::Error) -> Self {
        log::error!("{:?}", err);
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some("23505") => {
                    return SystemError::Conflict(Some(DbErrorMeta {
                        code: db_err.code().map(|s| s.to_string()),
                        constraint: db_err.constraint().map(|s| s.to_string()),
                        message: db_err.message().to_string(),
                    }));
                }
                // not_null_violation, check_violation
                Some("23502") | Some("23514") => {
                    return SystemError::Persist(db_err.message().to_string().into());
                }
                Some("42P01") => {
                    return SystemError::NotFound("Resource not found".into());
                }
                _ => {
                    log::error!("Unhandled DB error: {:?}", db_err);
                    return SystemError::DatabaseError(db_err.message().to_string().into());
                }
            }
        }
        SystemError::InternalError(Box::new(err))
    }
}

impl From<validator::ValidationErrors> for SystemError {
    fn from(errors: validator::ValidationErrors) -> Self {
        SystemError::Persist(errors.to_string().into())
    }
}

impl SystemError {
    pub fn bad_request(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bind(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Bind(msg.into())
    }

    pub fn persist(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Persist(msg.into())
    }

    pub fn config(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Config(msg.into())
    }

    /// Upload failure carrying the OS error code of the failed write, `-1` when none is known.
    pub fn upload(err: &std::io::Error) -> Self {
        Self::Upload { code: err.raw_os_error().unwrap_or(-1) }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SystemError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn conflict_message_uses_constraint_suffix() {
        let meta = Some(DbErrorMeta {
            code: Some("23505".into()),
            constraint: Some("banner_name".into()),
            message: "duplicate key".into(),
        });
        assert_eq!(conflict_message(&meta), "Name already exists");
        assert_eq!(conflict_message(&None), "Duplicate value");
    }

    #[test]
    fn system_errors_map_to_http_statuses() {
        let cases = [
            (SystemError::not_found("Banner not found"), StatusCode::NOT_FOUND),
            (SystemError::bind("unknown field"), StatusCode::BAD_REQUEST),
            (SystemError::persist("name: too short"), StatusCode::UNPROCESSABLE_ENTITY),
            (SystemError::Upload { code: 13 }, StatusCode::INTERNAL_SERVER_ERROR),
            (SystemError::Conflict(None), StatusCode::CONFLICT),
        ];
        for (system, status) in cases {
            assert_eq!(Error::from(system).status_code(), status);
        }
    }

    #[test]
    fn upload_error_carries_os_code() {
        let io = std::io::Error::from_raw_os_error(28);
        let err = SystemError::upload(&io);
        assert!(matches!(err, SystemError::Upload { code: 28 }));
        assert_eq!(err.to_string(), "File upload failed: error code #28");
    }

    #[actix_web::test]
    async fn error_response_has_message_body() {
        let res = Error::NotFound("Banner not found".into()).error_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(res.into_body()).await.unwrap();
        assert_eq!(body.as_ref(), br#"{"message":"Banner not found"}"#);
    }
}
