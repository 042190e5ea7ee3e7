use serde::{Deserialize, Serialize};

/// A rich embed attached to a message.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

/// One row of an [`Embed`]'s field table.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// Small text shown at the bottom of an [`Embed`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// An embed size limit is exceeded (title, description, field count/size,
/// or the sum of all embeds on a message).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EmbedValidationError {
    pub kind: EmbedValidationErrorType,
}

/// Reason an [`Embed`] failed validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum EmbedValidationErrorType {
    TitleTooLong { len: usize },
    DescriptionTooLong { len: usize },
    TooManyFields { len: usize },
    EmbedTooLarge { len: usize },
}

const TITLE_LIMIT: usize = 256;
const DESCRIPTION_LIMIT: usize = 4096;
const FIELD_LIMIT: usize = 25;
/// Sum of all text across the embed, including nested fields and footer.
const TOTAL_LIMIT: usize = 6000;

impl Embed {
    /// Validate the embed against the platform's documented size limits.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedValidationErrorType`] describing the first limit
    /// violated.
    pub fn validate(&self) -> Result<(), EmbedValidationError> {
        use EmbedValidationErrorType::{
            DescriptionTooLong, EmbedTooLarge, TitleTooLong, TooManyFields,
        };

        if let Some(title) = &self.title {
            if title.chars().count() > TITLE_LIMIT {
                return Err(EmbedValidationError {
                    kind: TitleTooLong {
                        len: title.chars().count(),
                    },
                });
            }
        }

        if let Some(description) = &self.description {
            if description.chars().count() > DESCRIPTION_LIMIT {
                return Err(EmbedValidationError {
                    kind: DescriptionTooLong {
                        len: description.chars().count(),
                    },
                });
            }
        }

        if self.fields.len() > FIELD_LIMIT {
            return Err(EmbedValidationError {
                kind: TooManyFields {
                    len: self.fields.len(),
                },
            });
        }

        let mut total = self.title.as_deref().map_or(0, str::len)
            + self.description.as_deref().map_or(0, str::len)
            + self.footer.as_ref().map_or(0, |f| f.text.len());

        for field in &self.fields {
            total += field.name.len() + field.value.len();
        }

        if total > TOTAL_LIMIT {
            return Err(EmbedValidationError {
                kind: EmbedTooLarge { len: total },
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Embed, EmbedField, EmbedValidationErrorType};

    #[test]
    fn round_trip() {
        let embed = Embed {
            title: Some("hello".into()),
            description: None,
            url: None,
            color: Some(0xff_00_00),
            fields: vec![EmbedField {
                name: "a".into(),
                value: "b".into(),
                inline: true,
            }],
            footer: None,
        };

        let json = serde_json::to_string(&embed).unwrap();
        let decoded: Embed = serde_json::from_str(&json).unwrap();
        assert_eq!(embed, decoded);
    }

    #[test]
    fn title_over_limit_is_rejected() {
        let embed = Embed {
            title: Some("x".repeat(300)),
            ..Embed::default()
        };

        let err = embed.validate().unwrap_err();
        assert!(matches!(err.kind, EmbedValidationErrorType::TitleTooLong { .. }));
    }

    #[test]
    fn within_limits_validates() {
        let embed = Embed {
            title: Some("ok".into()),
            ..Embed::default()
        };

        assert!(embed.validate().is_ok());
    }
}
