use thiserror::Error;

/// Failures while turning template text into concrete YAML.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("undefined variable '{name}' while rendering {context}")]
    UndefinedVariable { name: String, context: String },
    #[error("failed to render {context}: {message}")]
    Template { context: String, message: String },
    #[error("malformed variable line [{line}]: {message}")]
    VariableLine { line: String, message: String },
    #[error("unable to parse [{value}] as a timestamp or offset")]
    TimeInput { value: String },
    #[error("time window out of range for start [{start}] and end [{end}]")]
    WindowOverflow { start: String, end: String },
}

/// Failures while building typed entities from YAML nodes.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{family} declaration must be a mapping")]
    NotAMapping { family: &'static str },
    #[error("could not determine {family} type, expected '{key}' or '{short_key}'")]
    MissingType {
        family: &'static str,
        key: &'static str,
        short_key: &'static str,
    },
    #[error("could not find {family} type named [{type_name}]")]
    SubtypeNotFound {
        family: &'static str,
        type_name: String,
    },
    #[error("missing required field '{field}'")]
    MissingField { field: String },
    #[error("unexpected field '{field}'")]
    UnexpectedField { field: String },
    #[error("invalid value for field '{field}': {message}")]
    InvalidField { field: String, message: String },
    #[error("too many shorthand values: expected at most {expected}, got {found}")]
    TooManyValues { expected: usize, found: usize },
    #[error("error on {family} [{}]. Caused by: {source}", .name.as_deref().unwrap_or("<unnamed>"))]
    Entity {
        family: &'static str,
        name: Option<String>,
        source: Box<ParseError>,
    },
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ParseError {
    pub fn invalid(field: impl Into<String>, message: impl ToString) -> Self {
        ParseError::InvalidField {
            field: field.into(),
            message: message.to_string(),
        }
    }

    /// Declared names from the outermost entity down to the failing one.
    pub fn entity_chain(&self) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut current = self;
        while let ParseError::Entity { name, source, .. } = current {
            chain.push(name.as_deref().unwrap_or("<unnamed>"));
            current = source.as_ref();
        }
        chain
    }
}
