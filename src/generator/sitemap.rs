//! Sitemap and robots.txt generation.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/</loc>
//!   </url>
//! </urlset>
//! ```

use super::trim_index;
use crate::site::SiteIndex;
use quick_xml::escape::escape;

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Sitemap listing every template not opted out with `map: false`.
pub fn build_sitemap_xml(base_url: &str, index: &SiteIndex) -> String {
    let mut xml = String::with_capacity(4096);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
    xml.push('\n');

    for template in index.templates.iter().filter(|t| t.in_sitemap()) {
        let loc = format!("{base_url}{}", trim_index(&template.location.url));
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape(loc.as_str())));
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

pub fn build_robots_txt(base_url: &str) -> String {
    format!("User-agent: *\nSitemap: {base_url}/sitemap.xml\n")
}
