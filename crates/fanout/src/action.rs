use derive_more::{AsRef, Deref, Display, From, Into};
use serde::{Deserialize, Serialize};
use serde_with::DeserializeFromStr;
use std::path::PathBuf;
use strum::{Display as StrumDisplay, EnumIter, EnumString};

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct ActionId(String);

crate::string_newtype!(ActionId);

/// Built-in symbolic icons a menu button can show.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    DeserializeFromStr,
    EnumString,
    EnumIter,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Symbol {
    #[strum(to_string = "star", serialize = "favorite")]
    Star,
    #[strum(to_string = "bookmark", serialize = "save")]
    Bookmark,
    #[strum(to_string = "share")]
    Share,
    #[strum(to_string = "edit", serialize = "pencil")]
    Edit,
    #[strum(to_string = "delete", serialize = "trash")]
    Delete,
    #[strum(to_string = "add", serialize = "plus")]
    Add,
}

impl Symbol {
    /// Freedesktop symbolic icon name.
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Star => "starred-symbolic",
            Self::Bookmark => "user-bookmarks-symbolic",
            Self::Share => "emblem-shared-symbolic",
            Self::Edit => "document-edit-symbolic",
            Self::Delete => "user-trash-symbolic",
            Self::Add => "list-add-symbolic",
        }
    }

    /// Single glyph used when no icon theme is available.
    pub fn glyph(&self) -> char {
        match self {
            Self::Star => '★',
            Self::Bookmark => '⚑',
            Self::Share => '⇪',
            Self::Edit => '✎',
            Self::Delete => '✕',
            Self::Add => '+',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Icon {
    Symbol(Symbol),
    File(PathBuf),
}

impl From<Symbol> for Icon {
    fn from(symbol: Symbol) -> Self {
        Self::Symbol(symbol)
    }
}

/// One selectable entry of a radial menu. Order in the action list decides
/// the left-to-right placement around the base angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub id: ActionId,
    pub icon: Icon,
    pub title: String,
}

impl ActionSpec {
    pub fn new(id: impl Into<String>, icon: impl Into<Icon>, title: impl Into<String>) -> Self {
        Self {
            id: ActionId::new(id),
            icon: icon.into(),
            title: title.into(),
        }
    }

    /// Action whose id and title are derived from its symbol.
    pub fn from_symbol(symbol: Symbol) -> Self {
        let id = symbol.to_string().to_lowercase();
        let mut title = id.clone();
        if let Some(first) = title.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        Self::new(id, symbol, title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_deserialization_accepts_aliases() {
        let cases = vec![
            ("\"star\"", Symbol::Star),
            ("\"STAR\"", Symbol::Star),
            ("\"favorite\"", Symbol::Star),
            ("\"trash\"", Symbol::Delete),
            ("\"Bookmark\"", Symbol::Bookmark),
        ];

        for (json, expected) in cases {
            let deserialized: Symbol = serde_json::from_str(json).unwrap();
            assert_eq!(deserialized, expected);
        }
    }

    #[test]
    fn from_symbol_derives_id_and_title() {
        let spec = ActionSpec::from_symbol(Symbol::Bookmark);
        assert_eq!(spec.id.as_str(), "bookmark");
        assert_eq!(spec.title, "Bookmark");
        assert_eq!(spec.icon, Icon::Symbol(Symbol::Bookmark));
    }

    #[test]
    fn action_id_is_transparent_in_json() {
        let id: ActionId = serde_json::from_str("\"share\"").unwrap();
        assert_eq!(id, ActionId::from("share"));
    }
}
