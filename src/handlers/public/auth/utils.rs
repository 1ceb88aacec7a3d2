use std::collections::HashMap;

use crate::error::ApiError;

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_NAME_LENGTH: usize = 50;

/// Collects per-field messages so a request reports every problem at once
#[derive(Debug, Default)]
pub struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    pub fn check(&mut self, field: &str, result: Result<(), String>) {
        if let Err(msg) = result {
            self.0.insert(field.to_string(), msg);
        }
    }

    pub fn into_result(self, message: &str) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error(message, Some(self.0)))
        }
    }
}

pub fn validate_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Please add a name".to_string());
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(format!("Name can not be more than {} characters", MAX_NAME_LENGTH));
    }
    Ok(())
}

pub fn validate_email_format(email: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() {
        return Err("Please add an email".to_string());
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err("Please add a valid email".to_string());
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err("Please add a valid email".to_string());
    }
    if domain.starts_with('.') || domain.ends_with('.') {
        return Err("Please add a valid email".to_string());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }
    Ok(())
}
