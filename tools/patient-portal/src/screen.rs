/// Snapshot of what the terminal currently shows. When `message` is set the
/// renderer switches to message mode and ignores header, body and prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screen {
    pub title: Option<String>,
    pub header: Option<String>,
    pub body: Option<String>,
    pub prompt: Option<String>,
    pub message: Option<String>,
}

impl Screen {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.header.is_none()
            && self.body.is_none()
            && self.prompt.is_none()
            && self.message.is_none()
    }

    /// Replaces the page content while keeping the title.
    pub fn show_page(
        &mut self,
        header: impl Into<String>,
        body: impl Into<String>,
        prompt: impl Into<String>,
    ) {
        self.header = Some(header.into());
        self.body = Some(body.into());
        self.prompt = Some(prompt.into());
        self.message = None;
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn in_message_mode(&self) -> bool {
        self.message.as_deref().is_some_and(|message| !message.is_empty())
    }
}
