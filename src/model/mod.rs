//! Wire-contract types for the structured content source.
//!
//! These mirror the JSON shapes the content API emits: a page with a typed
//! property bag, and an ordered tree of discriminated-union blocks. Children
//! are populated lazily by the fetcher and are never part of the wire payload.

mod block;
mod page;
mod richtext;

pub use block::{
    Block, BlockKind, BlockPayload, BookmarkPayload, CalloutPayload, CodePayload, EmbedPayload,
    ExternalFile, FileRef, FileSource, HostedFile, Icon, TablePayload, TableRowPayload, TextPayload,
    TitlePayload, ToDoPayload,
};
pub use page::{
    DateValue, Page, Property, PropertyFile, PropertyValue, SelectOption, User,
};
pub use richtext::{Annotations, Link, RichText, RichTextVariant, TextContent};
