/* src/cli/locale/src/lib.rs */

mod arguments;
mod extract;
mod fallback;
mod icu;
mod typescript;

pub use arguments::{
  ArgumentSet, CatalogIssue, Verification, collect_arguments, message_arguments, verify_catalog,
};
pub use extract::{
  DIRECTIVE_MARKER, ExtractProfile, LocaleCatalog, LocaleForest, LocaleMessages, MAIN_TAG,
  MANIFEST_TAG, Message, extract, flatten, messages_for,
};
pub use fallback::{ResolvedCatalogs, resolve_fallback};
pub use icu::{ArgKind, Branch, Node, parse as parse_message};
pub use typescript::generate_typescript;
