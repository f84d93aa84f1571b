use std::fmt;

#[derive(Debug)]
pub enum Error {
    MissingVariable(&'static str),
    InvalidVariable { name: &'static str, value: String },
    InvalidCommand(String),
    Siegenia(siegenia::Error),
}

impl From<siegenia::Error> for Error {
    fn from(err: siegenia::Error) -> Self {
        Self::Siegenia(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVariable(name) => write!(f, "set ENV variable {name}"),
            Self::InvalidVariable { name, value } => {
                write!(f, "invalid value of ENV variable {name}: {value}")
            }
            Self::InvalidCommand(line) => {
                write!(f, "expected `<device-id> <property> <json-value>`, got `{line}`")
            }
            Self::Siegenia(err) => write!(f, "siegenia error: {err}"),
        }
    }
}

impl std::error::Error for Error {}
