//! Schema system - validation, blank forms and interactive entry

pub mod registry;
pub mod template;
pub mod validator;
pub mod wizard;

pub use registry::SchemaRegistry;
pub use template::{TemplateContext, TemplateGenerator};
pub use validator::{ValidationError, Validator};
pub use wizard::{PointDefaults, Wizard};
