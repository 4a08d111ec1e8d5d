// ABOUTME: Library module for the deck-loader program.
// ABOUTME: Loads markdown slide decks, following slide imports across files and URLs.

// Reexport modules
pub mod config;
pub mod errors;
pub mod features;
pub mod frontmatter;
pub mod loader;
pub mod parser;
pub mod preparser;
pub mod range;
pub mod resources;
pub mod utils;
pub mod watch;

// Reexport common types and functions
pub use config::Config;
pub use errors::{DeckError, Result};
pub use features::{detect_features, FeatureSet};
pub use frontmatter::{Frontmatter, FrontmatterValue};
pub use loader::{load, load_document, save, LoadedDeck, SlideInfo};
pub use parser::{parse, stringify, ParseError, SlideRef, SlidevMarkdown, SourceSlideInfo};
pub use preparser::{
    clear_preparser_extension_loader, inject_preparser_extension_loader, PreparserExtension,
};
pub use range::parse_range_string;
pub use resources::{SourceFiles, SourceReader};
pub use watch::{watch_deck, WatchConfig};
