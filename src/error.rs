use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lex,
    Syntax,
    Analysis,
}

/// Compile failure for one unit of source. `line` is 1-based.
#[derive(Error, Debug)]
pub enum NakoError {
    #[error("[字句解析エラー]{}({line}行目): {message}", .file.as_deref().unwrap_or(""))]
    Lex {
        message: String,
        line: u32,
        file: Option<String>,
    },
    #[error("[文法エラー]{}({line}行目): {message}", .file.as_deref().unwrap_or(""))]
    Syntax {
        message: String,
        line: u32,
        file: Option<String>,
    },
    #[error("[文法エラー]{}({line}行目): {message}\n{inner}", .file.as_deref().unwrap_or(""))]
    WithContext {
        message: String,
        line: u32,
        file: Option<String>,
        inner: Box<NakoError>,
    },
    #[error("[解析データエラー] {0}")]
    Analysis(#[from] serde_json::Error),
}

pub type NakoResult<T> = Result<T, NakoError>;

impl NakoError {
    pub fn lex<S: Into<String>>(message: S, line: u32, file: Option<&str>) -> Self {
        NakoError::Lex {
            message: message.into(),
            line,
            file: file.map(str::to_string),
        }
    }

    pub fn syntax<S: Into<String>>(message: S, line: u32, file: Option<&str>) -> Self {
        NakoError::Syntax {
            message: message.into(),
            line,
            file: file.map(str::to_string),
        }
    }

    /// Wraps `self` with the construct it was raised in.
    pub fn context<S: Into<String>>(self, message: S, line: u32, file: Option<&str>) -> Self {
        NakoError::WithContext {
            message: message.into(),
            line,
            file: file.map(str::to_string),
            inner: Box::new(self),
        }
    }

    /// The innermost error of a context chain.
    pub fn root_cause(&self) -> &NakoError {
        match self {
            NakoError::WithContext { inner, .. } => inner.root_cause(),
            other => other,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.root_cause() {
            NakoError::Lex { .. } => ErrorKind::Lex,
            NakoError::Analysis(_) => ErrorKind::Analysis,
            _ => ErrorKind::Syntax,
        }
    }

    pub fn line(&self) -> u32 {
        match self {
            NakoError::Lex { line, .. }
            | NakoError::Syntax { line, .. }
            | NakoError::WithContext { line, .. } => *line,
            NakoError::Analysis(e) => e.line() as u32,
        }
    }

    pub fn message(&self) -> String {
        match self {
            NakoError::Lex { message, .. }
            | NakoError::Syntax { message, .. }
            | NakoError::WithContext { message, .. } => message.clone(),
            NakoError::Analysis(e) => e.to_string(),
        }
    }

    /// Every message from the outermost context down to the root cause.
    pub fn breadcrumbs(&self) -> Vec<String> {
        let mut trail = vec![self.message()];
        let mut current = self;
        while let NakoError::WithContext { inner, .. } = current {
            trail.push(inner.message());
            current = inner;
        }
        trail
    }
}
