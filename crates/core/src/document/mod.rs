//! PDF object structure: the brute-force object catalog, dictionary lookups
//! and page/image location.

pub mod catalog;
pub mod dict;
pub mod page;

// Re-export main types for convenience
pub use catalog::{ObjectCatalog, PdfObject};
pub use dict::{DictView, find_entry, find_int, parse_dict_entries};
pub use page::{images_on_page, list_pages, page_content, xobject_map};
