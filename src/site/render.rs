use serde::Serialize;
use tera::{Context, Tera};

const TEMPLATES: [(&str, &str); 6] = [
    ("base.html", include_str!("../../templates/base.html")),
    ("macros.html", include_str!("../../templates/macros.html")),
    ("home.html", include_str!("../../templates/home.html")),
    ("detail.html", include_str!("../../templates/detail.html")),
    ("not_found.html", include_str!("../../templates/not_found.html")),
    ("share.html", include_str!("../../templates/share.html")),
];

/// Compiled page templates. `.html` templates are autoescaped; only values
/// piped through `safe` (already sanitized bodies) bypass escaping.
#[derive(Debug)]
pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// # Errors
    /// Returns an error if an embedded template fails to parse.
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)?;
        Ok(Self { tera })
    }

    /// # Errors
    /// Returns an error if the context does not serialize or rendering fails.
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, tera::Error> {
        let context = Context::from_serialize(data)?;
        self.tera.render(name, &context)
    }
}
