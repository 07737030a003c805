//! Execution environment container entry.

use std::path::PathBuf;

use bundlecp_api::{ClasspathEntry, EntryKind};

pub const JRE_CONTAINER: &str = "org.eclipse.jdt.launching.JRE_CONTAINER";
pub const STANDARD_VM_TYPE: &str = "org.eclipse.jdt.internal.debug.ui.launcher.StandardVMType";

pub fn container_path(environment: Option<&str>) -> PathBuf {
    match environment {
        Some(env) => PathBuf::from(JRE_CONTAINER).join(STANDARD_VM_TYPE).join(env),
        None => PathBuf::from(JRE_CONTAINER),
    }
}

pub fn is_environment_container(entry: &ClasspathEntry) -> bool {
    entry.kind == EntryKind::Container && entry.path.starts_with(JRE_CONTAINER)
}

/// Java release named by an environment id: `JavaSE-17` -> 17,
/// `JavaSE-1.8` -> 8, `J2SE-1.5` -> 5. Non-Java environments yield `None`.
pub fn java_release(environment: &str) -> Option<u32> {
    let (family, version) = environment.split_once('-')?;
    if !matches!(family, "JavaSE" | "J2SE" | "JRE") {
        return None;
    }
    let version = version.strip_prefix("1.").unwrap_or(version);
    version.split('.').next()?.parse().ok()
}

pub fn is_modular(environment: &str, floor: u32) -> bool {
    java_release(environment).is_some_and(|release| release >= floor)
}

pub fn environment_entry(environment: Option<&str>, modular_floor: u32) -> ClasspathEntry {
    let entry = ClasspathEntry::container(container_path(environment)).derived();
    match environment {
        Some(env) if is_modular(env, modular_floor) => {
            entry.with_attribute(ClasspathEntry::ATTR_MODULE, "true")
        }
        _ => entry,
    }
}
