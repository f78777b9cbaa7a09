use ulid::Ulid;

#[derive(Debug)]
pub enum EngineError {
    NotFound(Ulid),
    UnknownStudent(String),
    InvalidRange { start: u8, end: u8 },
    InvalidField(&'static str),
    LimitExceeded(&'static str),
    SnapshotError(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::UnknownStudent(name) => write!(f, "unknown student: {name}"),
            EngineError::InvalidRange { start, end } => {
                write!(f, "invalid hour range [{start}, {end})")
            }
            EngineError::InvalidField(field) => write!(f, "invalid field: {field}"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::SnapshotError(e) => write!(f, "snapshot error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
