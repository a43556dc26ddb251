//! Reserved names of the block language.

/// Name of the implicit parameter holding a block's bracketed content.
pub const CONTENT: &str = "#";

/// Parameter name marking a block as a definition: `[name:=[...]]`.
pub const DEFINITION: &str = ":";

/// Inside a parameter value, stands for the parameter being defined.
pub const ALIAS: &str = "@";

/// Block name of a list item: `[.] first [.] second`.
pub const LIST_ITEM: &str = ".";

/// Prefix of a link block: `[>https://example.com [caption]]`.
pub const LINK_PREFIX: char = '>';

// Built-in blocks the shortcuts desugar into.

pub const LINK: &str = "Link";
pub const LINK_TARGET: &str = "Target";
pub const ITEM: &str = "Item";
pub const ITEM_LIST: &str = "ItemList";
