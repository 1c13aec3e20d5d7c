use serde::Serialize;

/// One labeled choice. The payload round-trips through the menu collaborator
/// untouched and comes back on the matching selection call.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub payload: String,
}

impl MenuItem {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Menu {
    pub title: String,
    pub items: Vec<MenuItem>,
}
