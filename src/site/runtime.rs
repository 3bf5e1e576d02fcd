//! Client runtime script: the route table for client-side navigation.

use anyhow::Result;
use serde::Serialize;

use super::PageDescriptor;

/// Output path of the runtime script (relative to the output directory)
pub const RUNTIME_SCRIPT: &str = "_quire/runtime.js";

#[derive(Serialize)]
struct RouteEntry<'a> {
    route: &'a str,
    module: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    locale: Option<&'a str>,
}

/// Generate the runtime script for every page in the build.
pub fn generate_runtime(pages: &[PageDescriptor]) -> Result<String> {
    let routes: Vec<_> = pages
        .iter()
        .map(|p| RouteEntry {
            route: &p.route,
            module: &p.module,
            locale: p.locale.as_deref(),
        })
        .collect();
    let table = serde_json::to_string(&routes)?;

    Ok(format!(
        "// generated by quire, do not edit\n\
         window.__QUIRE_ROUTES__ = {table};\n\
         window.__QUIRE_HAS_ROUTE__ = (path) => window.__QUIRE_ROUTES__.some((r) => r.route === path);\n"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_runtime() {
        let pages = vec![
            PageDescriptor {
                route: "/".into(),
                source: "pages/index.md".into(),
                locale: None,
                module: "index".into(),
            },
            PageDescriptor {
                route: "/fr/about".into(),
                source: "pages/about.fr.md".into(),
                locale: Some("fr".into()),
                module: "about".into(),
            },
        ];

        let script = generate_runtime(&pages).unwrap();
        assert!(script.contains(
            r#"[{"route":"/","module":"index"},{"route":"/fr/about","module":"about","locale":"fr"}]"#
        ));
    }
}
