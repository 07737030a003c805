use bundlecp_api::{AccessRule, AccessRuleKind, BundleDescriptor};

pub const FALLBACK_PATTERN: &str = "**/*";

/// Access rules for a bundle entry: every exported package accessible, the
/// rest of the bundle `fallback`. Bundles that export nothing get no rules.
pub fn access_rules(bundle: &BundleDescriptor, fallback: Option<AccessRuleKind>) -> Vec<AccessRule> {
    let Some(fallback) = fallback else {
        return Vec::new();
    };
    if bundle.exported_packages.is_empty() {
        return Vec::new();
    }

    let mut rules: Vec<AccessRule> = Vec::with_capacity(bundle.exported_packages.len() + 1);
    for package in &bundle.exported_packages {
        let rule = AccessRule::new(AccessRuleKind::Accessible, package_pattern(package));
        if !rules.contains(&rule) {
            rules.push(rule);
        }
    }
    rules.push(AccessRule::new(fallback, FALLBACK_PATTERN));
    rules
}

fn package_pattern(package: &str) -> String {
    format!("{}/*", package.trim().replace('.', "/"))
}
