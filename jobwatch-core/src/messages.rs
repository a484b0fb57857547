//! User-facing message templates.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Required,
}

impl Message {
    fn template(self) -> &'static str {
        match self {
            Message::Required => "`%s` parameter is required",
        }
    }
}

/// Renders `entry` with its quoted placeholder replaced by `var`.
pub fn get(entry: Message, var: &str) -> String {
    entry.template().replace("`%s`", var)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_replaces_quoted_placeholder() {
        assert_eq!(
            get(Message::Required, "client_id"),
            "client_id parameter is required"
        );
    }
}
