//! Parsing of `--source`, `--export` and `--attribute` flags.

use bundlecp_api::EntryOverrides;

fn split_pair<'a>(raw: &'a str, flag: &str) -> Result<(&'a str, &'a str), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("--{flag} expects KEY=VALUE, got '{raw}'"))
}

/// Builds overrides from `KEY=PATH`, `KEY=true|false` and
/// `KEY:NAME=VALUE` flags. An empty attribute value removes the attribute.
pub fn parse(
    sources: &[String],
    exports: &[String],
    attributes: &[String],
) -> Result<EntryOverrides, String> {
    let mut overrides = EntryOverrides::default();

    for raw in sources {
        let (key, path) = split_pair(raw, "source")?;
        overrides = overrides.with_source(key, path);
    }

    for raw in exports {
        let (key, value) = split_pair(raw, "export")?;
        let exported = value
            .parse::<bool>()
            .map_err(|_| format!("--export value must be true or false, got '{value}'"))?;
        overrides = overrides.with_exported(key, exported);
    }

    for raw in attributes {
        let (target, value) = split_pair(raw, "attribute")?;
        let (key, name) = target
            .rsplit_once(':')
            .filter(|(k, n)| !k.is_empty() && !n.is_empty())
            .ok_or_else(|| format!("--attribute expects KEY:NAME=VALUE, got '{raw}'"))?;
        let value = (!value.is_empty()).then(|| value.to_string());
        overrides = overrides.with_attribute(key, name, value);
    }

    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_all_kinds() {
        let overrides = parse(
            &strings(&["A.jar=/src/A.zip"]),
            &strings(&["B.jar=false"]),
            &strings(&["A.jar:test=true", "/ws/p/C.jar:module="]),
        )
        .unwrap();

        assert_eq!(overrides.sources["A.jar"], PathBuf::from("/src/A.zip"));
        assert_eq!(overrides.exported["B.jar"], false);
        assert_eq!(overrides.attributes["A.jar"]["test"], Some("true".to_string()));
        assert_eq!(overrides.attributes["/ws/p/C.jar"]["module"], None);
    }

    #[test]
    fn test_rejects_malformed_flags() {
        assert!(parse(&strings(&["nokey"]), &[], &[]).is_err());
        assert!(parse(&[], &strings(&["A.jar=maybe"]), &[]).is_err());
        assert!(parse(&[], &[], &strings(&["A.jar=true"])).is_err());
        assert!(parse(&strings(&["=x"]), &[], &[]).is_err());
    }
}
