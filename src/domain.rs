/// The single user intent carried by an action link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOperation {
    MarkRead,
    MarkUnread,
    SaveArticle,
}

impl ActionOperation {
    /// Parse the wire name found in a token payload. Anything outside the
    /// three known operations is `None`; the dispatcher degrades to the
    /// generic error page rather than crashing.
    pub fn parse(s: &str) -> Option<ActionOperation> {
        match s {
            "mark-read" => Some(ActionOperation::MarkRead),
            "mark-unread" => Some(ActionOperation::MarkUnread),
            "save-article" => Some(ActionOperation::SaveArticle),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionOperation::MarkRead => "mark-read",
            ActionOperation::MarkUnread => "mark-unread",
            ActionOperation::SaveArticle => "save-article",
        }
    }
}
