mod annotations;

pub use annotations::{AnnotationsContributor, OSGI_ANNOTATION_BUNDLES};
