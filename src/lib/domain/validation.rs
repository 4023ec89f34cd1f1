//! Request validation for the todo routes.
//!
//! Untyped JSON bodies are decoded into tagged field variants and matched
//! exhaustively, so every malformed input maps to exactly one [`AppError`]
//! before anything reaches the store.

use std::fmt;

use serde_json::Value;

use super::error::AppError;
use super::id::{TodoId, TodoKey};
use super::todo::{NewTodo, TodoPatch};

const CREATE_EMPTY_TASK: &str = "The task property cannot be an empty string";
const UPDATE_EMPTY_TASK: &str =
    "Task cannot be an empty string. If a task property is sent, it must be a valid string";

/// The JSON type of a value, as named in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl JsonKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonKind::Null,
            Value::Bool(_) => JsonKind::Boolean,
            Value::Number(_) => JsonKind::Number,
            Value::String(_) => JsonKind::String,
            Value::Array(_) => JsonKind::Array,
            Value::Object(_) => JsonKind::Object,
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JsonKind::Null => "null",
            JsonKind::Boolean => "boolean",
            JsonKind::Number => "number",
            JsonKind::String => "string",
            JsonKind::Array => "array",
            JsonKind::Object => "object",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskField {
    Missing,
    Empty,
    WrongType(JsonKind),
    Valid(String),
}

impl TaskField {
    pub fn decode(body: &Value) -> Self {
        match body.get("task") {
            None => TaskField::Missing,
            Some(Value::String(task)) if task.is_empty() => TaskField::Empty,
            Some(Value::String(task)) => TaskField::Valid(task.clone()),
            Some(other) => TaskField::WrongType(JsonKind::of(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletedField {
    Missing,
    WrongType(JsonKind),
    Valid(bool),
}

impl CompletedField {
    pub fn decode(body: &Value) -> Self {
        match body.get("completed") {
            None => CompletedField::Missing,
            Some(Value::Bool(completed)) => CompletedField::Valid(*completed),
            Some(other) => CompletedField::WrongType(JsonKind::of(other)),
        }
    }
}

/// Parses a path token into the store's identifier format, keeping the
/// token itself for messages.
pub fn parse_id<K: TodoKey>(token: &str) -> Result<TodoId<K>, AppError> {
    token
        .parse::<TodoId<K>>()
        .map_err(|_| AppError::InvalidIdentifier(token.to_string()))
}

/// Validates a create body. Any `completed` value sent along is ignored.
pub fn validate_new_todo(body: &Value) -> Result<NewTodo, AppError> {
    match TaskField::decode(body) {
        TaskField::Missing => Err(AppError::MissingField),
        TaskField::Empty => Err(AppError::EmptyField(CREATE_EMPTY_TASK)),
        TaskField::WrongType(kind) => Err(AppError::WrongType(format!(
            "Task must be a string but type {kind} was given"
        ))),
        TaskField::Valid(task) => Ok(NewTodo::new(task)),
    }
}

/// Validates a partial update body.
pub fn validate_todo_patch(body: &Value) -> Result<TodoPatch, AppError> {
    if !body.is_object() {
        return Err(AppError::InvalidRequestBody);
    }

    let task = match TaskField::decode(body) {
        TaskField::Missing => None,
        TaskField::Empty => return Err(AppError::EmptyField(UPDATE_EMPTY_TASK)),
        TaskField::WrongType(kind) => {
            return Err(AppError::WrongType(format!(
                "Task property must be a string. Received type {kind}"
            )));
        }
        TaskField::Valid(task) => Some(task),
    };
    let completed = match CompletedField::decode(body) {
        CompletedField::Missing => None,
        CompletedField::WrongType(kind) => {
            return Err(AppError::WrongType(format!(
                "Completed property must be a Boolean. Received type {kind}"
            )));
        }
        CompletedField::Valid(completed) => Some(completed),
    };

    let patch = TodoPatch { task, completed };
    if patch.is_empty() {
        return Err(AppError::NothingToUpdate);
    }
    Ok(patch)
}
