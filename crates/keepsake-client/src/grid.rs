// SPDX-License-Identifier: Apache-2.0

use crate::error::{ClientError, ClientErrorCode};

pub const FILTER_ALL: &str = "all";
pub const DEFAULT_COLUMNS: u8 = 3;
pub const MIN_COLUMNS: u8 = 1;
pub const MAX_COLUMNS: u8 = 6;

/// `all` matches every tag; anything else matches exactly.
#[must_use]
pub fn matches_filter(filter: &str, tag: &str) -> bool {
    filter == FILTER_ALL || filter == tag
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    columns: u8,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
        }
    }
}

impl GridLayout {
    pub fn new(columns: u8) -> Result<Self, ClientError> {
        let mut layout = Self::default();
        layout.set_columns(columns)?;
        Ok(layout)
    }

    #[must_use]
    pub const fn columns(&self) -> u8 {
        self.columns
    }

    pub fn set_columns(&mut self, columns: u8) -> Result<(), ClientError> {
        if !(MIN_COLUMNS..=MAX_COLUMNS).contains(&columns) {
            return Err(ClientError::new(
                ClientErrorCode::Invalid,
                format!("columns must be within {MIN_COLUMNS}..={MAX_COLUMNS}, got {columns}"),
            ));
        }
        self.columns = columns;
        Ok(())
    }

    /// Splits `items` into rows of at most `columns` entries.
    #[must_use]
    pub fn rows<'a, T>(&self, items: &'a [T]) -> Vec<&'a [T]> {
        items.chunks(usize::from(self.columns)).collect()
    }
}
