//! HTML form bindings and their validation.

use std::collections::BTreeMap;

use actix_multipart::form::MultipartForm;
use actix_multipart::form::tempfile::TempFile;
use actix_multipart::form::text::Text;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

use crate::application::post_service::ImageUpload;
use crate::domain::post::{Post, PostDraft};
use crate::infrastructure::media::{IMAGE_EXTENSIONS, image_extension};

pub const NON_FIELD_ERRORS: &str = "__all__";
const DATETIME_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";
const DATETIME_INPUT_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Messages per field, rendered next to the inputs.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn merge(&mut self, other: FormErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn from_validation(errors: &ValidationErrors) -> Self {
        let mut out = Self::default();
        for (field, errs) in errors.field_errors() {
            for err in errs.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                out.add(&field.to_string(), message);
            }
        }
        out
    }

    fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("This field is required.".into());
        return Err(err);
    }
    Ok(())
}

fn username_chars(value: &str) -> Result<(), ValidationError> {
    if value
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        return Ok(());
    }
    let mut err = ValidationError::new("username");
    err.message =
        Some("Enter a valid username: letters, digits and @/./+/-/_ only.".into());
    Err(err)
}

fn optional_email(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.validate_email() {
        return Ok(());
    }
    let mut err = ValidationError::new("email");
    err.message = Some("Enter a valid email address.".into());
    Err(err)
}

fn validate(form: &impl Validate) -> FormErrors {
    match form.validate() {
        Ok(()) => FormErrors::default(),
        Err(errors) => FormErrors::from_validation(&errors),
    }
}

fn text_value(field: &Option<Text<String>>) -> String {
    field.as_ref().map(|t| t.trim().to_string()).unwrap_or_default()
}

pub fn parse_datetime_input(value: &str) -> Option<DateTime<Utc>> {
    DATETIME_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value.trim(), fmt).ok())
        .map(|naive| naive.and_utc())
}

pub fn format_datetime_input(value: DateTime<Utc>) -> String {
    value.format(DATETIME_INPUT_FORMAT).to_string()
}

/// Multipart payload of the post form.
#[derive(MultipartForm)]
pub struct PostUpload {
    pub title: Option<Text<String>>,
    pub text: Option<Text<String>>,
    pub pub_date: Option<Text<String>>,
    pub location: Option<Text<String>>,
    pub category: Option<Text<String>>,
    pub is_published: Option<Text<String>>,
    pub image_clear: Option<Text<String>>,
    pub image: Option<TempFile>,
}

impl PostUpload {
    /// Splits the payload into the re-renderable values and the uploaded file.
    ///
    /// Browsers send an empty part when no file was chosen; that counts as no upload.
    pub fn into_parts(self) -> (PostForm, bool, Option<TempFile>) {
        let form = PostForm {
            title: text_value(&self.title),
            text: text_value(&self.text),
            pub_date: text_value(&self.pub_date),
            location: text_value(&self.location),
            category: text_value(&self.category),
            is_published: self.is_published.is_some(),
        };
        let clear = self.image_clear.is_some();
        let image = self
            .image
            .filter(|f| f.size > 0 && f.file_name.as_deref().is_some_and(|n| !n.is_empty()));
        (form, clear, image)
    }
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct PostForm {
    #[validate(
        custom(function = "not_blank"),
        length(max = 256, message = "Ensure this value has at most 256 characters.")
    )]
    pub title: String,
    #[validate(custom(function = "not_blank"))]
    pub text: String,
    pub pub_date: String,
    pub location: String,
    pub category: String,
    pub is_published: bool,
}

impl PostForm {
    pub fn blank() -> Self {
        Self {
            title: String::new(),
            text: String::new(),
            pub_date: format_datetime_input(Utc::now()),
            location: String::new(),
            category: String::new(),
            is_published: true,
        }
    }

    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: format_datetime_input(post.pub_date),
            location: post.location_id.map(|id| id.to_string()).unwrap_or_default(),
            category: post.category_id.map(|id| id.to_string()).unwrap_or_default(),
            is_published: post.is_published,
        }
    }

    /// Field-level validation. Whether the chosen category and location
    /// exist is checked by the caller against the store.
    pub fn clean(&self) -> Result<PostDraft, FormErrors> {
        let mut errors = validate(self);

        let pub_date = parse_datetime_input(&self.pub_date);
        if pub_date.is_none() {
            errors.add("pub_date", "Enter a valid date/time.");
        }

        let category_id = match self.category.as_str() {
            "" => {
                errors.add("category", "This field is required.");
                None
            }
            raw => raw.parse::<i64>().ok().or_else(|| {
                errors.add("category", "Select a valid choice.");
                None
            }),
        };

        let location_id = match self.location.as_str() {
            "" => None,
            raw => raw.parse::<i64>().ok().or_else(|| {
                errors.add("location", "Select a valid choice.");
                None
            }),
        };

        errors.into_result()?;
        Ok(PostDraft {
            title: self.title.clone(),
            text: self.text.clone(),
            pub_date: pub_date.unwrap_or_else(Utc::now),
            location_id,
            category_id,
            is_published: self.is_published,
        })
    }
}

/// Checks an uploaded file and describes it for storage.
pub fn clean_image(file: &TempFile) -> Result<ImageUpload, FormErrors> {
    let file_name = file.file_name.clone().unwrap_or_default();
    if image_extension(&file_name).is_none() {
        let mut errors = FormErrors::default();
        errors.add(
            "image",
            format!(
                "Upload a valid image. Allowed extensions: {}.",
                IMAGE_EXTENSIONS.join(", ")
            ),
        );
        return Err(errors);
    }
    Ok(ImageUpload {
        path: file.file.path().to_path_buf(),
        file_name,
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub text: String,
    #[serde(default)]
    pub comment_id: Option<String>,
}

impl CommentForm {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            comment_id: None,
        }
    }

    pub fn clean(&self) -> Result<String, FormErrors> {
        validate(self).into_result()?;
        Ok(self.text.trim().to_string())
    }

    /// Id of an existing comment to update, when the form carries one.
    pub fn comment_id(&self) -> Option<i64> {
        self.comment_id
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| raw.parse().ok())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProfileForm {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 150, message = "Enter a username of at most 150 characters."),
        custom(function = "username_chars")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub last_name: String,
    #[serde(default)]
    #[validate(custom(function = "optional_email"))]
    pub email: String,
}

impl ProfileForm {
    pub fn clean(&self) -> Result<crate::domain::user::ProfileChanges, FormErrors> {
        let trimmed = Self {
            username: self.username.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
        };
        validate(&trimmed).into_result()?;
        Ok(crate::domain::user::ProfileChanges {
            username: trimmed.username,
            first_name: trimmed.first_name,
            last_name: trimmed.last_name,
            email: trimmed.email,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub username: String,
    #[serde(default, skip_serializing)]
    #[validate(custom(function = "not_blank"))]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginForm {
    pub fn clean(&self) -> Result<(), FormErrors> {
        validate(self).into_result()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RegistrationForm {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 150, message = "Enter a username of at most 150 characters."),
        custom(function = "username_chars")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[serde(default, skip_serializing)]
    #[validate(length(min = 8, message = "This password is too short. It must contain at least 8 characters."))]
    pub password1: String,
    #[serde(default, skip_serializing)]
    pub password2: String,
}

impl RegistrationForm {
    pub fn clean(&self) -> Result<(), FormErrors> {
        let mut errors = validate(self);
        if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }
        errors.into_result()
    }
}
