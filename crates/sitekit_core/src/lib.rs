pub mod assets;
pub mod collections;
pub mod config;
pub mod data;
pub mod dates;
pub mod front_matter;
pub mod lang;
pub mod model;
pub mod nav;
pub mod plan;
pub mod postprocess;
pub mod records;
pub mod related;
pub mod render;
pub mod slug;
pub mod syntax_highlight;
pub mod tags;
pub mod templates;
pub mod url;
