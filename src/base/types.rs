use std::fmt;

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

/// Marker error for a platform-level permission failure.
///
/// The chat service wraps the platform's own error message in this type so
/// that command dispatch can downcast it and report the message verbatim to
/// the invoking channel, while every other failure propagates unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionDenied(pub String);

impl fmt::Display for PermissionDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PermissionDenied {}

/// Accent color for a reply embed, resolved to a platform color by the chat
/// implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyColor {
    Info,
    Success,
    Warning,
    Danger,
    Critical,
}

/// A single titled field on a reply embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Platform-neutral rich reply.
///
/// Interaction handlers build these; the chat service renders them into
/// whatever the platform calls an embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub title: String,
    pub description: String,
    pub color: ReplyColor,
    pub fields: Vec<ReplyField>,
}

impl Reply {
    pub fn new(title: impl Into<String>, description: impl Into<String>, color: ReplyColor) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            color,
            fields: Vec::new(),
        }
    }

    /// Append an inline field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(ReplyField {
            name: name.into(),
            value: value.into(),
            inline: true,
        });
        self
    }

    /// Append a full-width field.
    pub fn block_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(ReplyField {
            name: name.into(),
            value: value.into(),
            inline: false,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_displays_platform_message() {
        let err: Err = PermissionDenied("Missing Permissions".to_string()).into();
        let denied = err.downcast_ref::<PermissionDenied>().unwrap();

        assert_eq!(denied.to_string(), "Missing Permissions");
    }

    #[test]
    fn reply_builder_preserves_field_order() {
        let reply = Reply::new("User Warned", "warned", ReplyColor::Warning)
            .field("Reason", "spam")
            .block_field("Total Warnings", "2");

        assert_eq!(reply.fields.len(), 2);
        assert_eq!(reply.fields[0].name, "Reason");
        assert!(reply.fields[0].inline);
        assert!(!reply.fields[1].inline);
    }
}
