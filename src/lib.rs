//! PocketPress: node trees to HTML and CSS, assembled into a static site.
//!
//! - [`markup`]: node model and constructors
//! - [`render`]: HTML/CSS serializer
//! - [`site`]: articles and the site index
//! - [`compiler`]: article compiler boundary
//! - [`build`]: the composition pipeline
//! - [`generator`]: sitemap, robots.txt and feeds

pub mod build;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod generator;
pub mod logger;
pub mod markup;
pub mod render;
pub mod site;
pub mod watch;
