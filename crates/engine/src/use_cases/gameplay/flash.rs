//! Player-facing flash messages.

pub use scanquest_shared::FlashLevel;
use scanquest_shared::FlashMessageDto;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub title: String,
    pub message: String,
}

impl FlashMessage {
    fn new(level: FlashLevel, title: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: String::new(),
        }
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(FlashLevel::Success, title)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(FlashLevel::Info, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(FlashLevel::Warning, title)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(FlashLevel::Error, title)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl From<FlashMessage> for FlashMessageDto {
    fn from(flash: FlashMessage) -> Self {
        Self {
            level: flash.level,
            title: flash.title,
            message: flash.message,
        }
    }
}
