//! Inline keyboard attached to a bot message

/// Kind of inline button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    /// Pressing triggers a callback query round-trip
    Callback,
    /// Opens a link
    Url,
    /// Anything else (switch-inline, game, login, ...)
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub text: String,
    pub kind: ButtonKind,
    /// Opaque callback payload, empty for non-callback buttons
    pub data: Vec<u8>,
}

impl Button {
    pub fn callback(text: &str, data: &[u8]) -> Self {
        Self {
            text: text.to_string(),
            kind: ButtonKind::Callback,
            data: data.to_vec(),
        }
    }

    pub fn url(text: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: ButtonKind::Url,
            data: Vec::new(),
        }
    }

    pub fn is_callback(&self) -> bool {
        self.kind == ButtonKind::Callback
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyboardRow {
    pub buttons: Vec<Button>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Keyboard {
    pub rows: Vec<KeyboardRow>,
}

impl Keyboard {
    pub fn new(rows: Vec<Vec<Button>>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|buttons| KeyboardRow { buttons })
                .collect(),
        }
    }

    /// Get the button at `row`, `col` (both 0-indexed)
    pub fn button(&self, row: usize, col: usize) -> Option<&Button> {
        self.rows.get(row)?.buttons.get(col)
    }

    /// Number of buttons in `row`, 0 if the row does not exist
    pub fn row_len(&self, row: usize) -> usize {
        self.rows.get(row).map(|r| r.buttons.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.buttons.is_empty())
    }
}
