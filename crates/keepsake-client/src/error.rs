// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientErrorCode {
    Network,
    Rejected,
    NotFound,
    Storage,
    Decode,
    Invalid,
}

impl ClientErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Rejected => "rejected",
            Self::NotFound => "not_found",
            Self::Storage => "storage",
            Self::Decode => "decode",
            Self::Invalid => "invalid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    pub code: ClientErrorCode,
    pub message: String,
}

impl ClientError {
    #[must_use]
    pub fn new(code: ClientErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(id: &str) -> Self {
        Self::new(ClientErrorCode::NotFound, format!("item not found: {id}"))
    }

    #[must_use]
    pub fn storage(context: &str, err: &std::io::Error) -> Self {
        Self::new(ClientErrorCode::Storage, format!("{context}: {err}"))
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ClientError {}
